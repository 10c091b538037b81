/// Error types for the session lifecycle and save files.
///
/// Command handlers never return these: user mistakes, missing files and
/// bad Base64 are reported as terminal lines instead.

use thiserror::Error;

use crate::domain::level::LevelId;

#[derive(Debug, Error)]
pub enum GameError {
    #[error("level {0} is not in the catalog")]
    LevelNotFound(LevelId),

    #[error("no saved session to restore")]
    NoSnapshot,

    #[error("level {from} continues to level {to}, which does not exist")]
    BrokenChain { from: LevelId, to: LevelId },

    #[error("presentation for level {level} has no segment {index}")]
    SegmentOutOfRange { level: LevelId, index: usize },

    #[error("snapshot could not be encoded: {0}")]
    SnapshotEncode(String),

    #[error("snapshot could not be decoded: {0}")]
    SnapshotDecode(String),

    #[error("preferences could not be encoded: {0}")]
    PreferencesEncode(String),

    #[error(transparent)]
    Io(#[from] std::io::Error),
}
