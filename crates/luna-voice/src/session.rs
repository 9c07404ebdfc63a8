//! Seams to the hosting agent framework.
//!
//! The framework owns audio routing, STT/LLM/TTS execution and the room
//! connection. The agent only needs the handful of session controls below.

use crate::error::VoiceError;
use async_trait::async_trait;
use std::time::Duration;

/// Controls of a running voice session.
#[async_trait]
pub trait AgentSession: Send + Sync {
    /// Speaks `text` through the TTS plugin.
    async fn say(&self, text: &str) -> Result<(), VoiceError>;

    /// Stops any speech in progress.
    fn interrupt(&self);

    /// Discards the user turn being collected.
    fn clear_user_turn(&self);

    /// Turns the room audio input on or off.
    fn set_audio_enabled(&self, enabled: bool);

    /// Closes the user turn and waits up to `transcript_timeout` for the
    /// final transcript.
    fn commit_user_turn(&self, transcript_timeout: Duration);
}

/// How the framework runs the session of one job.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SessionOptions {
    /// User turns end only when `end_turn` commits them.
    pub manual_turn_detection: bool,
    /// Whether the session ends when the learner disconnects.
    pub close_on_disconnect: bool,
}

impl Default for SessionOptions {
    fn default() -> Self {
        Self {
            manual_turn_detection: true,
            close_on_disconnect: false,
        }
    }
}

/// Whether the framework should generate its default LLM reply.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReplyDirective {
    Generate,
    Suppress,
}

/// A participant as seen from inside the room.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParticipantInfo {
    pub identity: String,
    /// Display name; carries the structured greeting and scenario data.
    pub name: Option<String>,
}

impl ParticipantInfo {
    pub fn new(identity: impl Into<String>, name: Option<&str>) -> Self {
        Self {
            identity: identity.into(),
            name: name.map(str::to_string),
        }
    }
}
