/// Entry point and game loop.

mod config;
mod domain;
mod error;
mod sim;
mod ui;

use std::fs::File;
use std::path::Path;
use std::sync::Mutex;
use std::time::{Duration, Instant};

use tracing::{error, info};
use tracing_subscriber::EnvFilter;

use config::GameConfig;
use domain::catalog::BuiltinCatalog;
use sim::controller::ViewModeController;
use sim::save;
use ui::input::InputState;
use ui::renderer::Renderer;
use ui::sound::SoundEngine;

fn main() {
    let mut config = GameConfig::load();
    let save_dir = save::save_dir(config.save_dir.as_deref());
    if let Some(prefs) = config::load_preferences(&save_dir) {
        config.apply_preferences(&prefs);
    }
    init_logging(&config, &save_dir);
    info!(save_dir = %save_dir.display(), "starting");

    let mut controller =
        match ViewModeController::new(Box::new(BuiltinCatalog::new()), &config, Some(save_dir)) {
            Ok(c) => c,
            Err(e) => {
                error!(error = %e, "level catalog rejected");
                eprintln!("Level catalog error: {e}");
                return;
            }
        };

    let mut renderer = Renderer::new();

    if let Err(e) = renderer.init() {
        eprintln!("Terminal init failed: {e}");
        return;
    }

    let mut sound = SoundEngine::new();

    let result = game_loop(&mut controller, &mut renderer, sound.as_mut(), &config);

    if let Err(e) = renderer.cleanup() {
        eprintln!("Terminal cleanup failed: {e}");
    }

    if let Err(e) = result {
        error!(error = %e, "game loop failed");
        eprintln!("Game error: {e}");
    }

    info!("exiting");
    println!();
    println!("Thanks for playing NullOS!");
}

/// Log to a file: the terminal belongs to the renderer.
/// A relative `log_file` lives in the save directory.
fn init_logging(config: &GameConfig, save_dir: &Path) {
    let path = if config.log_file.is_absolute() {
        config.log_file.clone()
    } else {
        save_dir.join(&config.log_file)
    };
    let Ok(file) = File::create(&path) else {
        // No log file, no logging
        return;
    };
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(config.log_filter.as_str()));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(Mutex::new(file))
        .with_ansi(false)
        .init();
}

fn game_loop(
    controller: &mut ViewModeController,
    renderer: &mut Renderer,
    mut sound: Option<&mut SoundEngine>,
    config: &GameConfig,
) -> Result<(), Box<dyn std::error::Error>> {
    let mut input = InputState::new();
    let frame = Duration::from_secs_f32(1.0 / config.timing.fps as f32);
    let mut last_frame = Instant::now();
    let mut music_on: Option<bool> = None;

    loop {
        let frame_start = Instant::now();

        input.drain_events();
        if input.ctrl_c_pressed() {
            info!("ctrl+c");
            break;
        }
        if let Some((w, h)) = input.take_resize() {
            renderer.resize(w, h);
        }
        let v = renderer.viewport();
        controller.set_viewport(v.width, v.height);

        for event in input.events.drain(..) {
            controller.route_event(event);
        }

        let dt = frame_start
            .duration_since(last_frame)
            .as_secs_f32()
            .min(config.timing.max_dt);
        last_frame = frame_start;
        controller.update(dt);

        // ── Audio ──
        let events = controller.take_events();
        if let Some(sfx) = sound.as_deref_mut() {
            if controller.prefs.sound_effects {
                for event in events {
                    sfx.play_event(event);
                }
            }
            if music_on != Some(controller.prefs.music) {
                music_on = Some(controller.prefs.music);
                sfx.set_music(controller.prefs.music);
            }
        }

        if controller.should_quit() {
            break;
        }

        renderer.render(controller)?;

        std::thread::sleep(frame.saturating_sub(frame_start.elapsed()));
    }

    Ok(())
}
