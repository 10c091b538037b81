/// Events flowing into and out of the session each frame.
///
/// `InputEvent` is what the controller routes; `GameEvent` is what the
/// presentation layer consumes for sound.

#[derive(Clone, PartialEq, Eq, Debug)]
pub enum InputEvent {
    Char(char),
    Enter,
    Backspace,
    Delete,
    Left,
    Right,
    Up,
    Down,
    Home,
    End,
    PageUp,
    PageDown,
    Tab,
    Esc,
    Function(u8),
    Paste(String),
    Click { col: u16, row: u16 },
    ScrollUp,
    ScrollDown,
}

#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum GameEvent {
    /// Correct flag submitted and another level follows.
    LevelWon,
    /// Correct flag submitted on the last level.
    GameFinished,
    DialogueSegment,
    MenuSelect,
}
