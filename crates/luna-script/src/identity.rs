//! Structured participant names.
//!
//! The connection-details endpoint packs everything the agent needs into the
//! participant's display name, since that is the only field the agent can
//! read before the first utterance:
//!
//! ```text
//! user_0427_say_hi_i_am_luna_scenario_coffee-corner_level_BEGINNER_turns_5_script_W3sidHVybiI6...
//! ```
//!
//! [`ParticipantProfile::parse`] recovers the pieces and
//! [`format_participant_name`] produces them.

use crate::error::ScriptError;
use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use luna_types::{ProficiencyLevel, ScriptTurn};
use std::collections::HashSet;
use tracing::{debug, warn};

const USER_PREFIX: &str = "user_";
const SAY_MARKER: &str = "_say_";
const SCENARIO_MARKER: &str = "_scenario_";
const LEVEL_MARKER: &str = "_level_";
const TURNS_MARKER: &str = "_turns_";
const SCRIPT_MARKER: &str = "_script_";

/// Number of digits in the per-connection user identifier.
pub const USER_DIGITS_LEN: usize = 4;

/// Everything recovered from a structured participant name.
#[derive(Debug, Clone, PartialEq)]
pub struct ParticipantProfile {
    /// The four-digit identifier assigned at connection time.
    pub user_digits: String,
    /// Greeting the agent speaks when it enters, underscores turned to spaces.
    pub greeting: String,
    /// Scenario data, when the learner picked a practice scenario.
    pub scenario: Option<ScenarioProfile>,
}

/// Scenario block of a participant name.
///
/// `turn_budget` and `script` are `None` when their part of the name could
/// not be decoded. A scenario without a script runs in unstructured mode.
#[derive(Debug, Clone, PartialEq)]
pub struct ScenarioProfile {
    pub id: String,
    pub level: Option<ProficiencyLevel>,
    pub turn_budget: Option<u32>,
    pub script: Option<Vec<ScriptTurn>>,
}

impl ScenarioProfile {
    /// Returns `true` when a decoded, non-empty script is available.
    pub fn script_mode(&self) -> bool {
        self.script.as_ref().is_some_and(|s| !s.is_empty())
    }
}

impl ParticipantProfile {
    /// Parses a participant display name.
    ///
    /// Returns `None` when the name does not follow the `user_XXXX_say_...`
    /// convention; the agent then behaves as a plain conversation partner.
    /// Problems inside the scenario block never make this return `None`:
    /// they are logged and leave script mode disabled.
    pub fn parse(name: &str) -> Option<Self> {
        if !name.starts_with(USER_PREFIX) || !name.contains(SAY_MARKER) {
            return None;
        }

        let parts: Vec<&str> = name.split('_').collect();
        if parts.len() < 4 {
            return None;
        }

        let digits = parts[1];
        if digits.len() != USER_DIGITS_LEN || !digits.bytes().all(|b| b.is_ascii_digit()) {
            debug!(name, "participant name has a malformed user identifier");
            return None;
        }

        let say_index = name.find(SAY_MARKER)?;
        let scenario_index = name.find(SCENARIO_MARKER);

        let greeting_start = say_index + SAY_MARKER.len();
        let greeting_end = scenario_index.unwrap_or(name.len()).max(greeting_start);
        let greeting = name[greeting_start..greeting_end]
            .replace('_', " ")
            .trim()
            .to_string();

        let scenario = scenario_index
            .map(|index| parse_scenario_block(&name[index + SCENARIO_MARKER.len()..]));

        Some(Self {
            user_digits: digits.to_string(),
            greeting,
            scenario,
        })
    }
}

/// Splits `<id>_level_<lvl>_turns_<n>_script_<b64>` into its parts.
fn parse_scenario_block(block: &str) -> ScenarioProfile {
    let (Some(level_at), Some(turns_at), Some(script_at)) = (
        block.find(LEVEL_MARKER),
        block.find(TURNS_MARKER),
        block.find(SCRIPT_MARKER),
    ) else {
        warn!(
            scenario = block,
            "scenario block is missing level/turns/script markers, script mode disabled"
        );
        return ScenarioProfile {
            id: block.to_string(),
            level: None,
            turn_budget: None,
            script: None,
        };
    };

    if !(level_at < turns_at && turns_at < script_at) {
        warn!(
            scenario = block,
            "scenario markers are out of order, script mode disabled"
        );
        return ScenarioProfile {
            id: block[..level_at.min(turns_at).min(script_at)].to_string(),
            level: None,
            turn_budget: None,
            script: None,
        };
    }

    let id = block[..level_at].to_string();
    let level_text = &block[level_at + LEVEL_MARKER.len()..turns_at];
    let turns_text = &block[turns_at + TURNS_MARKER.len()..script_at];
    let script_text = &block[script_at + SCRIPT_MARKER.len()..];

    let level = if level_text.is_empty() {
        None
    } else {
        match level_text.parse::<ProficiencyLevel>() {
            Ok(level) => Some(level),
            Err(e) => {
                warn!(scenario = %id, "ignoring scenario level: {}", e);
                None
            }
        }
    };

    let decoded = parse_turn_budget(turns_text)
        .and_then(|budget| decode_script(script_text).map(|script| (budget, script)));

    match decoded {
        Ok((budget, script)) => {
            debug!(
                scenario = %id,
                turn_budget = budget,
                script_turns = script.len(),
                "decoded scenario script"
            );
            ScenarioProfile {
                id,
                level,
                turn_budget: Some(budget),
                script: Some(script),
            }
        }
        Err(e) => {
            warn!(scenario = %id, "failed to decode scenario, script mode disabled: {}", e);
            ScenarioProfile {
                id,
                level,
                turn_budget: parse_turn_budget(turns_text).ok(),
                script: None,
            }
        }
    }
}

/// Parses the turn budget field. Budgets must be at least one.
pub fn parse_turn_budget(text: &str) -> Result<u32, ScriptError> {
    match text.trim().parse::<u32>() {
        Ok(budget) if budget >= 1 => Ok(budget),
        _ => Err(ScriptError::InvalidTurnBudget(text.to_string())),
    }
}

/// Decodes a base64-encoded JSON array of script turns.
///
/// Rejects empty input, non-positive turn numbers, and duplicate turns.
/// The returned turns keep the order in which they were encoded.
pub fn decode_script(encoded: &str) -> Result<Vec<ScriptTurn>, ScriptError> {
    if encoded.trim().is_empty() {
        return Err(ScriptError::MissingField("script"));
    }

    let bytes = STANDARD.decode(encoded.trim())?;
    let json = String::from_utf8(bytes)?;
    let turns: Vec<ScriptTurn> = serde_json::from_str(&json)?;

    let mut seen = HashSet::with_capacity(turns.len());
    for entry in &turns {
        if entry.turn == 0 {
            return Err(ScriptError::InvalidTurnNumber(entry.turn));
        }
        if !seen.insert(entry.turn) {
            return Err(ScriptError::DuplicateTurn(entry.turn));
        }
    }

    Ok(turns)
}

/// Encodes script turns the way [`decode_script`] expects them.
pub fn encode_script(turns: &[ScriptTurn]) -> Result<String, ScriptError> {
    let json = serde_json::to_string(turns)?;
    Ok(STANDARD.encode(json))
}

/// Scenario fields supplied when a learner starts a practice session.
///
/// `script_json` is passed through as-is; the frontend already holds it as
/// JSON text.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ScenarioRequest {
    pub id: String,
    pub level: String,
    pub turns: String,
    pub script_json: String,
}

/// Builds a structured participant name.
///
/// Whitespace runs in the greeting become single underscores and the
/// greeting is lower-cased. The scenario suffix is only appended when the
/// request carries a non-empty scenario id.
///
/// Fails when a field would be misread by [`ParticipantProfile::parse`]: a
/// greeting containing the word `scenario`, or scenario id, level or turns
/// containing an underscore.
pub fn format_participant_name(
    user_digits: &str,
    greeting: &str,
    scenario: Option<&ScenarioRequest>,
) -> Result<String, ScriptError> {
    if user_digits.len() != USER_DIGITS_LEN || !user_digits.bytes().all(|b| b.is_ascii_digit()) {
        return Err(unpackable("user_digits", user_digits));
    }

    let greeting = greeting
        .split_whitespace()
        .collect::<Vec<_>>()
        .join("_")
        .to_lowercase();
    if format!("_{greeting}_").contains(SCENARIO_MARKER) {
        return Err(unpackable("greeting", &greeting));
    }

    let mut name = format!("{USER_PREFIX}{user_digits}{SAY_MARKER}{greeting}");

    if let Some(request) = scenario.filter(|r| !r.id.is_empty()) {
        for (field, value) in [
            ("scenario", &request.id),
            ("scenarioLevel", &request.level),
            ("scenarioTurns", &request.turns),
        ] {
            if value.contains('_') {
                return Err(unpackable(field, value));
            }
        }

        let script = if request.script_json.is_empty() {
            String::new()
        } else {
            STANDARD.encode(&request.script_json)
        };
        name.push_str(&format!(
            "{SCENARIO_MARKER}{}{LEVEL_MARKER}{}{TURNS_MARKER}{}{SCRIPT_MARKER}{}",
            request.id, request.level, request.turns, script
        ));
    }

    Ok(name)
}

fn unpackable(field: &'static str, value: &str) -> ScriptError {
    ScriptError::UnpackableField {
        field,
        value: value.to_string(),
    }
}
