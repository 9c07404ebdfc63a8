//! Shared types and constants for the Luna practice agent.
//!
//! This crate holds the data shapes that cross crate boundaries: scripted
//! conversation turns decoded from a participant's name, proficiency levels,
//! and the data-channel messages the agent sends to the frontend.
//!
//! Nothing in here performs I/O. The turn engine lives in `luna-script` and
//! the LiveKit plumbing in `luna-voice`.

use serde::{Deserialize, Serialize};

/// Participant attribute advertising push-to-talk support to the frontend.
pub const PUSH_TO_TALK_ATTRIBUTE: &str = "push-to-talk";

/// One scripted exchange in a practice scenario.
///
/// `turn` is the turn number this entry belongs to. `suggested_response` is
/// what the learner is expected to say, and `agent` is the line the agent
/// speaks when the conversation arrives at this turn.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScriptTurn {
    pub turn: u32,
    #[serde(rename = "suggestedResponse")]
    pub suggested_response: String,
    pub agent: String,
}

/// Scenario difficulty as chosen in the scenario dashboard.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ProficiencyLevel {
    Beginner,
    Intermediate,
    Advanced,
}

impl ProficiencyLevel {
    /// Returns the canonical upper-case label.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Beginner => "BEGINNER",
            Self::Intermediate => "INTERMEDIATE",
            Self::Advanced => "ADVANCED",
        }
    }
}

impl std::fmt::Display for ProficiencyLevel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for ProficiencyLevel {
    type Err = ParseLevelError;

    /// Parses a level label, ignoring ASCII case.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_uppercase().as_str() {
            "BEGINNER" => Ok(Self::Beginner),
            "INTERMEDIATE" => Ok(Self::Intermediate),
            "ADVANCED" => Ok(Self::Advanced),
            _ => Err(ParseLevelError(s.to_string())),
        }
    }
}

/// Error returned when parsing an unknown proficiency level string.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParseLevelError(pub String);

impl std::fmt::Display for ParseLevelError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "unknown proficiency level: {}", self.0)
    }
}

impl std::error::Error for ParseLevelError {}

/// Messages the agent publishes on the room data channel.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum AgentDataMessage {
    /// The scripted conversation moved to a new turn.
    TurnAdvancement {
        /// The new current turn number.
        turn: u32,
        /// Seconds since the Unix epoch, with sub-second precision.
        timestamp: f64,
    },
}

impl AgentDataMessage {
    /// Builds a turn advancement message stamped with the current time.
    pub fn turn_advancement(turn: u32) -> Self {
        let now = chrono::Utc::now();
        Self::TurnAdvancement {
            turn,
            timestamp: now.timestamp_millis() as f64 / 1000.0,
        }
    }

    /// Serializes the message into the JSON bytes sent over the data channel.
    pub fn to_bytes(&self) -> Result<Vec<u8>, serde_json::Error> {
        serde_json::to_vec(self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::Value;

    #[test]
    fn script_turn_uses_camel_case_suggested_response() {
        let json = r#"{"turn":1,"suggestedResponse":"hello there","agent":"Hi!"}"#;
        let turn: ScriptTurn = serde_json::from_str(json).unwrap();
        assert_eq!(turn.turn, 1);
        assert_eq!(turn.suggested_response, "hello there");
        assert_eq!(turn.agent, "Hi!");
    }

    #[test]
    fn script_turn_requires_all_fields() {
        let json = r#"{"turn":1,"agent":"Hi!"}"#;
        assert!(serde_json::from_str::<ScriptTurn>(json).is_err());
    }

    #[test]
    fn level_parsing_is_case_insensitive() {
        assert_eq!(
            "beginner".parse::<ProficiencyLevel>(),
            Ok(ProficiencyLevel::Beginner)
        );
        assert_eq!(
            "Advanced".parse::<ProficiencyLevel>(),
            Ok(ProficiencyLevel::Advanced)
        );
        assert!("expert".parse::<ProficiencyLevel>().is_err());
    }

    #[test]
    fn level_labels() {
        assert_eq!(ProficiencyLevel::Beginner.to_string(), "BEGINNER");
        assert_eq!(ProficiencyLevel::Intermediate.to_string(), "INTERMEDIATE");
        assert_eq!(ProficiencyLevel::Advanced.to_string(), "ADVANCED");
    }

    #[test]
    fn turn_advancement_wire_shape() {
        let msg = AgentDataMessage::turn_advancement(3);
        let value: Value = serde_json::from_slice(&msg.to_bytes().unwrap()).unwrap();
        assert_eq!(value["type"], "turn_advancement");
        assert_eq!(value["turn"], 3);
        assert!(value["timestamp"].as_f64().unwrap() > 1_600_000_000.0);
    }
}
