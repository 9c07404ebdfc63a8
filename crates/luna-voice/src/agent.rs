use crate::config::AgentConfig;
use crate::notify::TurnNotifier;
use crate::session::{AgentSession, ParticipantInfo, ReplyDirective};
use luna_script::{ParticipantProfile, TurnAction, TurnScriptEngine};
use std::sync::Arc;
use tracing::{debug, info, warn};

/// The practice agent attached to one room session.
///
/// Greets the learner with the text packed into their participant name and,
/// when a scenario was chosen, runs every completed utterance through the
/// turn engine before the language model gets a chance to answer.
pub struct ScenarioAgent<S, N> {
    config: AgentConfig,
    session: Arc<S>,
    notifier: N,
    profile: Option<ParticipantProfile>,
    engine: Option<TurnScriptEngine>,
}

impl<S: AgentSession, N: TurnNotifier> ScenarioAgent<S, N> {
    pub fn new(config: AgentConfig, session: Arc<S>, notifier: N) -> Self {
        Self {
            config,
            session,
            notifier,
            profile: None,
            engine: None,
        }
    }

    pub fn instructions(&self) -> &str {
        &self.config.instructions
    }

    pub fn profile(&self) -> Option<&ParticipantProfile> {
        self.profile.as_ref()
    }

    pub fn engine(&self) -> Option<&TurnScriptEngine> {
        self.engine.as_ref()
    }

    /// Runs when the agent enters the room.
    ///
    /// Waits for participants to settle, then greets the first one whose
    /// name follows the structured convention. Returns `true` when a
    /// greeting was spoken.
    pub async fn on_enter(&mut self, participants: &[ParticipantInfo]) -> bool {
        tokio::time::sleep(self.config.greeting_delay()).await;

        info!(count = participants.len(), "checking participants for a greeting");

        let Some((participant, profile)) = participants.iter().find_map(|p| {
            p.name
                .as_deref()
                .and_then(ParticipantProfile::parse)
                .map(|profile| (p, profile))
        }) else {
            info!("no structured participant name found, using default behaviour");
            return false;
        };

        info!(
            identity = %participant.identity,
            user = %profile.user_digits,
            greeting = %profile.greeting,
            "greeting participant"
        );

        if let Some(scenario) = &profile.scenario {
            let engine = TurnScriptEngine::for_scenario(
                scenario,
                self.config.default_turn_budget,
                self.config.phrases.clone(),
            );
            info!(
                scenario = %scenario.id,
                level = ?scenario.level,
                turn_budget = engine.state().turn_budget(),
                script_mode = engine.state().script_mode(),
                "scenario session started"
            );
            self.engine = Some(engine);
        }

        if let Err(e) = self.session.say(&profile.greeting).await {
            warn!("failed to speak greeting: {}", e);
        }

        self.profile = Some(profile);
        true
    }

    /// Runs after the user's turn is committed, before the default reply.
    pub async fn on_user_turn_completed(&mut self, text: &str) -> ReplyDirective {
        let Some(engine) = self.engine.as_mut() else {
            if text.trim().is_empty() {
                debug!("ignore empty user turn");
                return ReplyDirective::Suppress;
            }
            return ReplyDirective::Generate;
        };

        let decision = engine.process_utterance(text);

        if let TurnAction::Speak { text, kind } = &decision.action {
            debug!(?kind, turn = decision.current_turn, "speaking scripted line");
            if let Err(e) = self.session.say(text).await {
                warn!("failed to speak scripted line: {}", e);
            }
        }

        if decision.turn_changed() {
            if let Err(e) = self.notifier.notify_turn(decision.current_turn).await {
                warn!(turn = decision.current_turn, "failed to publish turn advancement: {}", e);
            }
        }

        if decision.suppresses_reply() {
            ReplyDirective::Suppress
        } else {
            ReplyDirective::Generate
        }
    }
}
