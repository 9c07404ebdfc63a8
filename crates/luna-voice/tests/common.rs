#![allow(dead_code)]

use async_trait::async_trait;
use luna_voice::{AgentSession, TurnNotifier, VoiceError};
use std::sync::{Arc, Mutex};
use std::time::Duration;

#[derive(Default)]
pub struct RecordingSession {
    pub calls: Mutex<Vec<String>>,
    pub fail_say: bool,
}

impl RecordingSession {
    pub fn calls(&self) -> Vec<String> {
        self.calls.lock().unwrap().clone()
    }

    pub fn spoken(&self) -> Vec<String> {
        self.calls()
            .into_iter()
            .filter_map(|c| c.strip_prefix("say:").map(str::to_string))
            .collect()
    }

    pub fn record(&self, call: String) {
        self.calls.lock().unwrap().push(call);
    }
}

#[async_trait]
impl AgentSession for RecordingSession {
    async fn say(&self, text: &str) -> Result<(), VoiceError> {
        self.record(format!("say:{text}"));
        if self.fail_say {
            return Err(VoiceError::Session("tts unavailable".to_string()));
        }
        Ok(())
    }

    fn interrupt(&self) {
        self.record("interrupt".to_string());
    }

    fn clear_user_turn(&self) {
        self.record("clear_user_turn".to_string());
    }

    fn set_audio_enabled(&self, enabled: bool) {
        self.record(format!("audio:{enabled}"));
    }

    fn commit_user_turn(&self, transcript_timeout: Duration) {
        self.record(format!("commit:{}", transcript_timeout.as_secs()));
    }
}

#[derive(Clone, Default)]
pub struct RecordingNotifier {
    pub turns: Arc<Mutex<Vec<u32>>>,
}

#[async_trait]
impl TurnNotifier for RecordingNotifier {
    async fn notify_turn(&self, turn: u32) -> Result<(), VoiceError> {
        self.turns.lock().unwrap().push(turn);
        Ok(())
    }
}
