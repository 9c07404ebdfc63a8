//! Per-session turn engine.
//!
//! A [`TurnScriptEngine`] owns the [`SessionState`] of one learner and turns
//! each completed utterance into a [`TurnDecision`]. It never performs I/O:
//! the caller speaks the returned line, publishes the new turn, and lets the
//! language model run when the decision says so.

use crate::identity::ScenarioProfile;
use crate::similarity::{utterance_similarity, ON_SCRIPT_THRESHOLD};
use luna_types::ScriptTurn;
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

fn default_apology_prefix() -> String {
    "I'm sorry, that's not quite what I expected. Let's try again. ".to_string()
}

fn default_closing_line() -> String {
    "Thank you for practicing with me today! Great job completing this conversation.".to_string()
}

/// Fixed lines the engine speaks outside the script itself.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScriptPhrases {
    /// Prepended to the current turn's line when the learner goes off script.
    #[serde(default = "default_apology_prefix")]
    pub apology_prefix: String,
    /// Spoken once the turn budget is used up.
    #[serde(default = "default_closing_line")]
    pub closing_line: String,
}

impl Default for ScriptPhrases {
    fn default() -> Self {
        Self {
            apology_prefix: default_apology_prefix(),
            closing_line: default_closing_line(),
        }
    }
}

/// Mutable state of one practice session.
#[derive(Debug, Clone, PartialEq)]
pub struct SessionState {
    current_turn: u32,
    turn_budget: u32,
    script: Vec<ScriptTurn>,
}

impl SessionState {
    /// Creates a session following `script`. An empty script means
    /// unstructured turn counting.
    ///
    /// A budget of zero is raised to one.
    pub fn new(turn_budget: u32, script: Vec<ScriptTurn>) -> Self {
        Self {
            current_turn: 1,
            turn_budget: turn_budget.max(1),
            script,
        }
    }

    /// Creates a session that only counts turns.
    pub fn unstructured(turn_budget: u32) -> Self {
        Self::new(turn_budget, Vec::new())
    }

    pub fn current_turn(&self) -> u32 {
        self.current_turn
    }

    pub fn turn_budget(&self) -> u32 {
        self.turn_budget
    }

    pub fn script(&self) -> &[ScriptTurn] {
        &self.script
    }

    /// Whether replies are drawn from the script.
    pub fn script_mode(&self) -> bool {
        !self.script.is_empty()
    }

    /// The session is over once the turn counter passes the budget.
    pub fn is_complete(&self) -> bool {
        self.current_turn > self.turn_budget
    }

    fn script_turn(&self, turn: u32) -> Option<&ScriptTurn> {
        self.script.iter().find(|entry| entry.turn == turn)
    }

    fn advance(&mut self) {
        self.current_turn += 1;
    }
}

/// Why a scripted line is being spoken.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LineKind {
    /// The next line of the script, after an on-script answer.
    Scripted,
    /// The fixed closing line at the end of the budget.
    Closing,
    /// The apology plus a repeat of the current line.
    OffScript,
}

/// What the agent should do with a completed utterance.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TurnAction {
    /// Nothing was said, or the session is already complete. Do not reply.
    Ignore,
    /// Speak `text` and suppress the language model reply.
    Speak { text: String, kind: LineKind },
    /// Let the language model reply freely.
    Defer,
}

/// Outcome of processing one utterance.
#[derive(Debug, Clone, PartialEq)]
pub struct TurnDecision {
    pub action: TurnAction,
    /// Turn counter before the utterance was processed.
    pub previous_turn: u32,
    /// Turn counter afterwards.
    pub current_turn: u32,
    /// Similarity against the expected line, when one existed.
    pub similarity: Option<f32>,
}

impl TurnDecision {
    /// Whether the room should be told about a new turn.
    pub fn turn_changed(&self) -> bool {
        self.current_turn != self.previous_turn
    }

    /// Whether the default language model reply must be suppressed.
    pub fn suppresses_reply(&self) -> bool {
        !matches!(self.action, TurnAction::Defer)
    }

    /// The line to speak, if any.
    pub fn spoken_line(&self) -> Option<&str> {
        match &self.action {
            TurnAction::Speak { text, .. } => Some(text),
            _ => None,
        }
    }
}

/// Drives one session through its scripted or unstructured turns.
#[derive(Debug, Clone)]
pub struct TurnScriptEngine {
    state: SessionState,
    phrases: ScriptPhrases,
}

impl TurnScriptEngine {
    pub fn new(state: SessionState, phrases: ScriptPhrases) -> Self {
        Self { state, phrases }
    }

    /// Builds an engine for a parsed scenario.
    ///
    /// A scenario without a decoded script falls back to unstructured
    /// counting with `default_budget` when its own budget is also missing.
    pub fn for_scenario(
        scenario: &ScenarioProfile,
        default_budget: u32,
        phrases: ScriptPhrases,
    ) -> Self {
        let budget = scenario.turn_budget.unwrap_or(default_budget);
        let script = scenario.script.clone().unwrap_or_default();
        Self::new(SessionState::new(budget, script), phrases)
    }

    pub fn state(&self) -> &SessionState {
        &self.state
    }

    /// Processes one completed user utterance.
    pub fn process_utterance(&mut self, utterance: &str) -> TurnDecision {
        let previous_turn = self.state.current_turn;

        if utterance.trim().is_empty() {
            debug!(turn = previous_turn, "ignoring empty user turn");
            return self.decision(TurnAction::Ignore, previous_turn, None);
        }

        if self.state.is_complete() {
            debug!(turn = previous_turn, "session complete, ignoring user turn");
            return self.decision(TurnAction::Ignore, previous_turn, None);
        }

        let Some(expected) = self.state.script_turn(previous_turn).cloned() else {
            let action = self.unstructured_step();
            return self.decision(action, previous_turn, None);
        };

        let similarity = utterance_similarity(utterance, &expected.suggested_response);
        let action = if similarity > ON_SCRIPT_THRESHOLD {
            debug!(turn = previous_turn, similarity, "utterance is on script");
            self.on_script_step()
        } else {
            info!(turn = previous_turn, similarity, "utterance is off script");
            TurnAction::Speak {
                text: format!("{}{}", self.phrases.apology_prefix, expected.agent),
                kind: LineKind::OffScript,
            }
        };

        self.decision(action, previous_turn, Some(similarity))
    }

    fn unstructured_step(&mut self) -> TurnAction {
        let turn = self.state.current_turn;
        if turn >= self.state.turn_budget {
            self.state.advance();
            info!(turn, budget = self.state.turn_budget, "turn budget reached, closing");
            self.closing()
        } else {
            self.state.advance();
            TurnAction::Defer
        }
    }

    fn on_script_step(&mut self) -> TurnAction {
        let next_turn = self.state.current_turn + 1;
        let next_line = self.state.script_turn(next_turn).map(|t| t.agent.clone());
        self.state.advance();

        match next_line {
            Some(text) => TurnAction::Speak {
                text,
                kind: LineKind::Scripted,
            },
            None if next_turn > self.state.turn_budget => {
                info!(turn = next_turn, "script finished, closing");
                self.closing()
            }
            None => TurnAction::Defer,
        }
    }

    fn closing(&self) -> TurnAction {
        TurnAction::Speak {
            text: self.phrases.closing_line.clone(),
            kind: LineKind::Closing,
        }
    }

    fn decision(
        &self,
        action: TurnAction,
        previous_turn: u32,
        similarity: Option<f32>,
    ) -> TurnDecision {
        TurnDecision {
            action,
            previous_turn,
            current_turn: self.state.current_turn,
            similarity,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn turn(turn: u32, suggested: &str, agent: &str) -> ScriptTurn {
        ScriptTurn {
            turn,
            suggested_response: suggested.to_string(),
            agent: agent.to_string(),
        }
    }

    fn two_turn_engine() -> TurnScriptEngine {
        let script = vec![
            turn(1, "hello there", "Hi, how are you?"),
            turn(2, "fine", "Great to hear!"),
        ];
        TurnScriptEngine::new(SessionState::new(2, script), ScriptPhrases::default())
    }

    #[test]
    fn on_script_speaks_next_line() {
        let mut engine = two_turn_engine();
        let decision = engine.process_utterance("hello there");

        assert_eq!(
            decision.action,
            TurnAction::Speak {
                text: "Great to hear!".to_string(),
                kind: LineKind::Scripted
            }
        );
        assert_eq!(decision.current_turn, 2);
        assert!(decision.turn_changed());
        assert!(decision.suppresses_reply());
        assert!((decision.similarity.unwrap() - 1.0).abs() < 1e-6);
    }

    #[test]
    fn off_script_repeats_current_line() {
        let mut engine = two_turn_engine();
        let decision = engine.process_utterance("xyz abc");

        let expected = format!("{}Hi, how are you?", default_apology_prefix());
        assert_eq!(decision.spoken_line(), Some(expected.as_str()));
        assert_eq!(decision.current_turn, 1);
        assert!(!decision.turn_changed());
        assert_eq!(decision.similarity, Some(0.0));
    }

    #[test]
    fn empty_utterance_is_ignored() {
        let mut engine = two_turn_engine();
        let decision = engine.process_utterance("   ");
        assert_eq!(decision.action, TurnAction::Ignore);
        assert!(decision.suppresses_reply());
        assert_eq!(engine.state().current_turn(), 1);
    }

    #[test]
    fn budget_reached_on_script_closes() {
        let mut engine = two_turn_engine();
        engine.process_utterance("hello there");
        let decision = engine.process_utterance("fine thanks");

        assert_eq!(decision.spoken_line(), Some(default_closing_line().as_str()));
        assert_eq!(decision.current_turn, 3);
        assert!(engine.state().is_complete());
    }

    #[test]
    fn missing_next_entry_within_budget_defers() {
        let script = vec![turn(1, "hello there", "Hi!")];
        let mut engine =
            TurnScriptEngine::new(SessionState::new(4, script), ScriptPhrases::default());

        let decision = engine.process_utterance("hello there");
        assert_eq!(decision.action, TurnAction::Defer);
        assert!(!decision.suppresses_reply());
        assert_eq!(decision.current_turn, 2);

        // turn 2 has no entry: unstructured counting takes over
        let decision = engine.process_utterance("anything at all");
        assert_eq!(decision.action, TurnAction::Defer);
        assert_eq!(decision.current_turn, 3);
    }

    #[test]
    fn unstructured_counts_then_closes() {
        let mut engine =
            TurnScriptEngine::new(SessionState::unstructured(3), ScriptPhrases::default());
        assert!(!engine.state().script_mode());

        assert_eq!(engine.process_utterance("one").action, TurnAction::Defer);
        assert_eq!(engine.process_utterance("two").action, TurnAction::Defer);

        let decision = engine.process_utterance("three");
        assert!(matches!(
            decision.action,
            TurnAction::Speak {
                kind: LineKind::Closing,
                ..
            }
        ));
        assert_eq!(decision.current_turn, 4);
        assert!(engine.state().is_complete());
    }

    #[test]
    fn completed_session_stays_at_final_turn() {
        let mut engine = two_turn_engine();
        engine.process_utterance("hello there");
        engine.process_utterance("fine");
        assert_eq!(engine.state().current_turn(), 3);

        for utterance in ["thanks bye", "still here?", "hello again"] {
            let decision = engine.process_utterance(utterance);
            assert_eq!(decision.action, TurnAction::Ignore);
            assert!(decision.suppresses_reply());
            assert!(!decision.turn_changed());
            assert_eq!(decision.current_turn, 3);
        }
        assert!(engine.state().is_complete());
    }

    #[test]
    fn completed_unstructured_session_does_not_close_twice() {
        let mut engine =
            TurnScriptEngine::new(SessionState::unstructured(1), ScriptPhrases::default());
        assert_eq!(
            engine.process_utterance("one").spoken_line(),
            Some(default_closing_line().as_str())
        );

        let decision = engine.process_utterance("two");
        assert_eq!(decision.spoken_line(), None);
        assert_eq!(engine.state().current_turn(), 2);
    }

    #[test]
    fn zero_budget_is_raised_to_one() {
        let state = SessionState::unstructured(0);
        assert_eq!(state.turn_budget(), 1);
    }

    #[test]
    fn custom_phrases_are_used() {
        let phrases = ScriptPhrases {
            apology_prefix: "Again: ".to_string(),
            closing_line: "Bye.".to_string(),
        };
        let script = vec![turn(1, "hello there", "Hi!")];
        let mut engine = TurnScriptEngine::new(SessionState::new(1, script), phrases);

        let decision = engine.process_utterance("nope");
        assert_eq!(decision.spoken_line(), Some("Again: Hi!"));

        let decision = engine.process_utterance("hello there");
        assert_eq!(decision.spoken_line(), Some("Bye."));
    }
}
