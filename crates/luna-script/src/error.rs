use thiserror::Error;

/// Errors raised while encoding or decoding a structured participant name.
///
/// Decoding errors are never fatal to a session: the name parser downgrades
/// them to "script mode disabled" and keeps going. `UnpackableField` comes
/// from [`crate::format_participant_name`] and is reported to the caller.
#[derive(Error, Debug)]
pub enum ScriptError {
    #[error("script is not valid base64: {0}")]
    InvalidBase64(#[from] base64::DecodeError),

    #[error("script is not valid UTF-8: {0}")]
    InvalidUtf8(#[from] std::string::FromUtf8Error),

    #[error("script is not a valid turn array: {0}")]
    InvalidJson(#[from] serde_json::Error),

    #[error("missing scenario field: {0}")]
    MissingField(&'static str),

    #[error("turn numbers must be positive, got {0}")]
    InvalidTurnNumber(u32),

    #[error("turn {0} appears more than once")]
    DuplicateTurn(u32),

    #[error("invalid turn budget: {0:?}")]
    InvalidTurnBudget(String),

    #[error("{field} cannot be packed into a participant name: {value:?}")]
    UnpackableField { field: &'static str, value: String },
}
