use crate::store::StoreError;
use crate::turn::TransitionError;
use crate::types::RoomCode;

/// Result type for synchronization operations
pub type SyncResult<T> = Result<T, SyncError>;

/// Errors surfaced by the game client
#[derive(Debug, thiserror::Error)]
pub enum SyncError {
    #[error("authentication failed: {0}")]
    Authentication(String),

    #[error("room {0} not found")]
    RoomNotFound(RoomCode),

    #[error("game in room {0} has already started")]
    GameAlreadyStarted(RoomCode),

    #[error("operation requires the host role: {0}")]
    NotHost(&'static str),

    #[error("it is not your turn")]
    NotYourTurn,

    #[error("no active room session")]
    NotInRoom,

    #[error("pack '{0}' is not unlocked")]
    PackLocked(String),

    #[error("pack '{0}' not found")]
    PackNotFound(String),

    #[error("invalid operation: {0}")]
    InvalidOperation(&'static str),

    #[error(transparent)]
    Transition(#[from] TransitionError),

    #[error(transparent)]
    Store(#[from] StoreError),

    #[error("serialization failed: {0}")]
    Serialization(#[from] serde_json::Error),
}
