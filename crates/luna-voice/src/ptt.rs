//! Push-to-talk turn control.
//!
//! Audio input stays off until the learner explicitly opens a turn through
//! the `start_turn` RPC; `end_turn` commits what was said and `cancel_turn`
//! throws it away. This lets several participants share a room with a single
//! agent without it reacting to cross-talk.

use crate::error::VoiceError;
use crate::session::AgentSession;
use std::str::FromStr;
use std::sync::Arc;
use std::time::Duration;
use tracing::info;

/// RPC methods the agent registers on its local participant.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RpcMethod {
    StartTurn,
    EndTurn,
    CancelTurn,
}

impl RpcMethod {
    pub const ALL: [RpcMethod; 3] = [Self::StartTurn, Self::EndTurn, Self::CancelTurn];

    pub fn as_str(self) -> &'static str {
        match self {
            Self::StartTurn => "start_turn",
            Self::EndTurn => "end_turn",
            Self::CancelTurn => "cancel_turn",
        }
    }
}

impl FromStr for RpcMethod {
    type Err = VoiceError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "start_turn" => Ok(Self::StartTurn),
            "end_turn" => Ok(Self::EndTurn),
            "cancel_turn" => Ok(Self::CancelTurn),
            other => Err(VoiceError::UnknownRpcMethod(other.to_string())),
        }
    }
}

/// Drives a session's audio input from push-to-talk RPCs.
#[derive(Debug)]
pub struct PushToTalk<S> {
    session: Arc<S>,
    transcript_timeout: Duration,
}

impl<S: AgentSession> PushToTalk<S> {
    pub fn new(session: Arc<S>, transcript_timeout: Duration) -> Self {
        Self {
            session,
            transcript_timeout,
        }
    }

    /// Disables audio input. Call right after the session starts, before
    /// joining the room, so no audio slips through ahead of the first turn.
    pub fn start(&self) {
        self.session.set_audio_enabled(false);
    }

    /// Method names to register with the room.
    pub fn methods(&self) -> impl Iterator<Item = &'static str> {
        RpcMethod::ALL.into_iter().map(RpcMethod::as_str)
    }

    /// Handles one RPC invocation by name.
    pub fn handle_rpc(&self, method: &str, caller_identity: &str) -> Result<(), VoiceError> {
        let method: RpcMethod = method.parse()?;
        info!(method = method.as_str(), caller = caller_identity, "push-to-talk rpc");
        self.dispatch(method);
        Ok(())
    }

    pub fn dispatch(&self, method: RpcMethod) {
        match method {
            RpcMethod::StartTurn => {
                self.session.interrupt();
                self.session.clear_user_turn();
                self.session.set_audio_enabled(true);
            }
            RpcMethod::EndTurn => {
                self.session.set_audio_enabled(false);
                self.session.commit_user_turn(self.transcript_timeout);
            }
            RpcMethod::CancelTurn => {
                self.session.set_audio_enabled(false);
                self.session.clear_user_turn();
                info!("cancel turn");
            }
        }
    }
}
