use thiserror::Error;

#[derive(Error, Debug)]
pub enum VoiceError {
    #[error("LiveKit API error: {0}")]
    LiveKit(#[from] livekit_api::access_token::AccessTokenError),

    #[error("Room service error: {0}")]
    RoomService(String),

    #[error("Invalid configuration: {0}")]
    Config(String),

    #[error("Agent session error: {0}")]
    Session(String),

    #[error("Plugin error: {0}")]
    Plugin(String),

    #[error("Unknown RPC method: {0}")]
    UnknownRpcMethod(String),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}
