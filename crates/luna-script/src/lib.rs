//! Scripted conversation logic for Luna practice sessions.
//!
//! A learner joins with a structured display name ([`identity`]) that may
//! carry a practice scenario: a proficiency level, a turn budget and a
//! base64-encoded script of expected answers and agent lines. For each
//! completed utterance the [`engine`] decides whether the answer was close
//! enough to the script ([`similarity`]) to play the next scripted line,
//! whether to repeat the current line with an apology, whether to close the
//! session, or whether to let the language model answer freely.
//!
//! Everything here is synchronous and side-effect free apart from logging.
//! The voice crate owns speaking, data-channel notifications and the
//! language model.

pub mod engine;
pub mod error;
pub mod identity;
pub mod similarity;

pub use engine::{
    LineKind, ScriptPhrases, SessionState, TurnAction, TurnDecision, TurnScriptEngine,
};
pub use error::ScriptError;
pub use identity::{
    decode_script, encode_script, format_participant_name, ParticipantProfile, ScenarioProfile,
    ScenarioRequest,
};
pub use similarity::{is_on_script, utterance_similarity, ON_SCRIPT_THRESHOLD};
