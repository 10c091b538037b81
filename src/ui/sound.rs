/// Sound engine: procedural sound effects and an ambient loop via rodio.
///
/// All sounds are generated as in-memory WAV buffers at init time.
/// Effects are fire-and-forget (non-blocking) via rodio's Sink; the ambient
/// loop keeps its own Sink so it can be paused from the settings menu.
///
/// Compile with `--no-default-features` or without "sound" feature
/// to disable audio entirely (the stub SoundEngine does nothing).

#[cfg(feature = "sound")]
mod inner {
    use std::io::Cursor;
    use std::sync::Arc;

    use rodio::{OutputStream, OutputStreamHandle, Sink, Source};
    use tracing::debug;

    use crate::sim::event::GameEvent;

    const SAMPLE_RATE: u32 = 22050;

    /// Pre-generated WAV buffers for each event.
    pub struct SoundEngine {
        _stream: OutputStream,
        handle: OutputStreamHandle,
        music: Option<Sink>,
        sfx_level_won: Arc<Vec<u8>>,
        sfx_game_finished: Arc<Vec<u8>>,
        sfx_dialogue: Arc<Vec<u8>>,
        sfx_menu: Arc<Vec<u8>>,
        ambient: Arc<Vec<u8>>,
    }

    impl SoundEngine {
        pub fn new() -> Option<Self> {
            let (stream, handle) = OutputStream::try_default().ok()?;

            // ── Generate all sound buffers ──
            Some(SoundEngine {
                _stream: stream,
                handle,
                music: None,
                sfx_level_won: Arc::new(make_wav(&gen_level_won())),
                sfx_game_finished: Arc::new(make_wav(&gen_game_finished())),
                sfx_dialogue: Arc::new(make_wav(&gen_blip(660.0, 0.05, 0.2))),
                sfx_menu: Arc::new(make_wav(&gen_blip(880.0, 0.03, 0.2))),
                ambient: Arc::new(make_wav(&gen_ambient())),
            })
        }

        fn play(&self, buf: &Arc<Vec<u8>>) {
            if let Ok(sink) = Sink::try_new(&self.handle) {
                let cursor = Cursor::new(buf.as_ref().clone());
                if let Ok(src) = rodio::Decoder::new(cursor) {
                    sink.append(src);
                    sink.detach(); // fire-and-forget
                }
            }
        }

        pub fn play_event(&self, event: GameEvent) {
            match event {
                GameEvent::LevelWon => self.play(&self.sfx_level_won),
                GameEvent::GameFinished => self.play(&self.sfx_game_finished),
                GameEvent::DialogueSegment => self.play(&self.sfx_dialogue),
                GameEvent::MenuSelect => self.play(&self.sfx_menu),
            }
        }

        /// Start or pause the ambient loop.
        pub fn set_music(&mut self, on: bool) {
            match (&self.music, on) {
                (Some(sink), true) => sink.play(),
                (Some(sink), false) => sink.pause(),
                (None, true) => {
                    let Ok(sink) = Sink::try_new(&self.handle) else { return };
                    let cursor = Cursor::new(self.ambient.as_ref().clone());
                    match rodio::Decoder::new(cursor) {
                        Ok(src) => {
                            sink.append(src.repeat_infinite());
                            self.music = Some(sink);
                        }
                        Err(e) => debug!(error = %e, "ambient loop unavailable"),
                    }
                }
                (None, false) => {}
            }
        }
    }

    // ════════════════════════════════════════════════════════════
    //  Waveform generators: all produce Vec<f32> mono samples
    // ════════════════════════════════════════════════════════════

    fn tone(freq: f32, i: usize) -> f32 {
        let t = i as f32 / SAMPLE_RATE as f32;
        (t * freq * 2.0 * std::f32::consts::PI).sin()
    }

    /// Simple sine blip at given frequency and duration
    fn gen_blip(freq: f32, duration: f32, volume: f32) -> Vec<f32> {
        let n = (SAMPLE_RATE as f32 * duration) as usize;
        (0..n)
            .map(|i| {
                let env = 1.0 - (i as f32 / n as f32); // linear fade out
                tone(freq, i) * env * volume
            })
            .collect()
    }

    /// Notes played back to back with a soft decay on each.
    fn arpeggio(notes: &[f32], note_dur: f32, volume: f32) -> Vec<f32> {
        let mut samples = Vec::new();
        for &freq in notes {
            let n = (SAMPLE_RATE as f32 * note_dur) as usize;
            for i in 0..n {
                let env = 1.0 - (i as f32 / n as f32) * 0.3;
                let wave = tone(freq, i) * 0.6 + tone(freq * 2.0, i) * 0.3 + tone(freq * 3.0, i) * 0.1;
                samples.push(wave * env * volume);
            }
        }
        samples
    }

    /// Level won: short ascending C-E-G
    fn gen_level_won() -> Vec<f32> {
        arpeggio(&[523.0, 659.0, 784.0], 0.09, 0.3)
    }

    /// Game finished: C-E-G-C fanfare with a sustained top note
    fn gen_game_finished() -> Vec<f32> {
        let mut samples = arpeggio(&[523.0, 659.0, 784.0, 1047.0], 0.1, 0.3);
        let n = (SAMPLE_RATE as f32 * 0.4) as usize;
        for i in 0..n {
            let env = 1.0 - (i as f32 / n as f32);
            samples.push(tone(1047.0, i) * env * 0.3);
        }
        samples
    }

    /// Ambient: a slow two-note drone, four seconds, loop-friendly
    fn gen_ambient() -> Vec<f32> {
        let n = SAMPLE_RATE as usize * 4;
        (0..n)
            .map(|i| {
                let t = i as f32 / n as f32;
                let swell = 0.5 - 0.5 * (t * 2.0 * std::f32::consts::PI).cos();
                (tone(110.0, i) * 0.6 + tone(164.8, i) * 0.4) * (0.04 + 0.04 * swell)
            })
            .collect()
    }

    // ════════════════════════════════════════════════════════════
    //  WAV encoder: wraps f32 samples into a valid WAV buffer
    // ════════════════════════════════════════════════════════════

    pub(super) fn make_wav(samples: &[f32]) -> Vec<u8> {
        let num_channels: u16 = 1;
        let bits_per_sample: u16 = 16;
        let byte_rate = SAMPLE_RATE * (num_channels as u32) * (bits_per_sample as u32) / 8;
        let block_align = num_channels * bits_per_sample / 8;
        let data_size = samples.len() as u32 * 2; // 16-bit = 2 bytes per sample
        let file_size = 36 + data_size;

        let mut buf = Vec::with_capacity(44 + data_size as usize);

        // RIFF header
        buf.extend_from_slice(b"RIFF");
        buf.extend_from_slice(&file_size.to_le_bytes());
        buf.extend_from_slice(b"WAVE");

        // fmt chunk
        buf.extend_from_slice(b"fmt ");
        buf.extend_from_slice(&16u32.to_le_bytes()); // chunk size
        buf.extend_from_slice(&1u16.to_le_bytes()); // PCM format
        buf.extend_from_slice(&num_channels.to_le_bytes());
        buf.extend_from_slice(&SAMPLE_RATE.to_le_bytes());
        buf.extend_from_slice(&byte_rate.to_le_bytes());
        buf.extend_from_slice(&block_align.to_le_bytes());
        buf.extend_from_slice(&bits_per_sample.to_le_bytes());

        // data chunk
        buf.extend_from_slice(b"data");
        buf.extend_from_slice(&data_size.to_le_bytes());

        for &s in samples {
            let val = (s.clamp(-1.0, 1.0) * 32767.0) as i16;
            buf.extend_from_slice(&val.to_le_bytes());
        }

        buf
    }

}

// ════════════════════════════════════════════════════════════
//  Public API: compiles to no-ops when sound feature is off
// ════════════════════════════════════════════════════════════

#[cfg(feature = "sound")]
pub use inner::SoundEngine;

#[cfg(not(feature = "sound"))]
pub struct SoundEngine;

#[cfg(not(feature = "sound"))]
impl SoundEngine {
    pub fn new() -> Option<Self> { Some(SoundEngine) }
    pub fn play_event(&self, _event: crate::sim::event::GameEvent) {}
    pub fn set_music(&mut self, _on: bool) {}
}
