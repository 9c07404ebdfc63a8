//! Voice plumbing for the Luna practice agent.
//!
//! Integrates with LiveKit for join tokens and room data messages, and
//! provides the pieces the hosting agent framework calls into: the
//! [`ScenarioAgent`] that greets learners and runs scripted turns, the
//! [`PushToTalk`] controller behind the `start_turn`/`end_turn`/`cancel_turn`
//! RPCs, and the [`Worker`] that accepts jobs, prewarms plugins and runs the
//! per-job entrypoint.
//!
//! Audio transport and the STT, LLM and TTS plugins themselves belong to the
//! framework and are reached through the traits in [`session`], [`notify`]
//! and [`worker`].

pub mod agent;
pub mod config;
pub mod error;
pub mod notify;
pub mod ptt;
pub mod service;
pub mod session;
pub mod worker;

pub use agent::ScenarioAgent;
pub use config::{AgentConfig, LiveKitConfig, PluginConfig};
pub use error::VoiceError;
pub use notify::{RoomTurnNotifier, TurnNotifier};
pub use ptt::{PushToTalk, RpcMethod};
pub use service::VoiceService;
pub use session::{AgentSession, ParticipantInfo, ReplyDirective, SessionOptions};
pub use worker::{
    job_acceptance, prewarm, JobAcceptance, JobContext, JobHandle, PluginFactory, PluginSet,
    SessionPlugins, Worker,
};
