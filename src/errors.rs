#[derive(Debug, thiserror::Error)]
pub enum BookingError {
    #[error("network error: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("unauthorized")]
    Unauthorized,

    #[error("{0}")]
    Validation(String),

    #[error("the {time_slot} slot on {date} is no longer available")]
    SlotTaken { date: String, time_slot: String },

    #[error("unknown service: {0}")]
    UnknownService(String),

    #[error("not found: {0}")]
    NotFound(String),

    #[error("forbidden: {0}")]
    Forbidden(String),

    #[error("backend error ({status}): {message}")]
    Api { status: u16, message: String },

    #[error("assistant error: {0}")]
    Assistant(String),
}

impl BookingError {
    pub fn validation(msg: impl Into<String>) -> Self {
        BookingError::Validation(msg.into())
    }

    /// Errors the user can retry without changing anything.
    pub fn is_transient(&self) -> bool {
        match self {
            BookingError::Transport(_) | BookingError::Assistant(_) => true,
            BookingError::Api { status, .. } => *status >= 500,
            _ => false,
        }
    }
}

pub type Result<T> = std::result::Result<T, BookingError>;
