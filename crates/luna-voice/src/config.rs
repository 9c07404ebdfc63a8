use luna_script::ScriptPhrases;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::time::Duration;

fn default_token_ttl_seconds() -> u64 {
    900
}

#[derive(Clone, Serialize, Deserialize)]
pub struct LiveKitConfig {
    #[serde(default)]
    pub url: String,
    #[serde(default)]
    pub api_key: String,
    #[serde(default, skip_serializing)]
    pub api_secret: String,
    /// JWT token TTL in seconds for LiveKit join tokens. Default: 900 (15 minutes).
    #[serde(default = "default_token_ttl_seconds")]
    pub token_ttl_seconds: u64,
}

impl Default for LiveKitConfig {
    fn default() -> Self {
        Self {
            url: String::new(),
            api_key: String::new(),
            api_secret: String::new(),
            token_ttl_seconds: default_token_ttl_seconds(),
        }
    }
}

impl fmt::Debug for LiveKitConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LiveKitConfig")
            .field("url", &self.url)
            .field("api_key", &self.api_key)
            .field("api_secret", &"[REDACTED]")
            .field("token_ttl_seconds", &self.token_ttl_seconds)
            .finish()
    }
}

impl LiveKitConfig {
    pub fn new(
        url: impl Into<String>,
        api_key: impl Into<String>,
        api_secret: impl Into<String>,
    ) -> Self {
        Self {
            url: url.into(),
            api_key: api_key.into(),
            api_secret: api_secret.into(),
            token_ttl_seconds: default_token_ttl_seconds(),
        }
    }

    /// Returns the names of required fields that are still empty.
    pub fn missing_fields(&self) -> Vec<&'static str> {
        let mut missing = Vec::new();
        if self.url.is_empty() {
            missing.push("url");
        }
        if self.api_key.is_empty() {
            missing.push("api_key");
        }
        if self.api_secret.is_empty() {
            missing.push("api_secret");
        }
        missing
    }
}

fn default_identity() -> String {
    "ptt-agent".to_string()
}

fn default_instructions() -> String {
    "You are a helpful English conversation practice assistant. Follow the scenario \
     instructions provided when available, or engage in general conversation practice."
        .to_string()
}

fn default_greeting_delay_ms() -> u64 {
    2000
}

fn default_transcript_timeout_secs() -> f64 {
    10.0
}

fn default_turn_budget() -> u32 {
    5
}

/// Settings for the voice agent that joins practice rooms.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AgentConfig {
    /// Identity the agent takes when it accepts a job.
    #[serde(default = "default_identity")]
    pub identity: String,

    /// System instructions handed to the language model.
    #[serde(default = "default_instructions")]
    pub instructions: String,

    /// How long to wait for participants before looking for a greeting.
    #[serde(default = "default_greeting_delay_ms")]
    pub greeting_delay_ms: u64,

    /// How long to wait for the final transcript after `end_turn`.
    /// Raise this when the STT provider is slow.
    #[serde(default = "default_transcript_timeout_secs")]
    pub transcript_timeout_secs: f64,

    /// Turn budget used when a scenario does not carry one.
    #[serde(default = "default_turn_budget")]
    pub default_turn_budget: u32,

    #[serde(default)]
    pub plugins: PluginConfig,

    #[serde(default)]
    pub phrases: ScriptPhrases,
}

impl Default for AgentConfig {
    fn default() -> Self {
        Self {
            identity: default_identity(),
            instructions: default_instructions(),
            greeting_delay_ms: default_greeting_delay_ms(),
            transcript_timeout_secs: default_transcript_timeout_secs(),
            default_turn_budget: default_turn_budget(),
            plugins: PluginConfig::default(),
            phrases: ScriptPhrases::default(),
        }
    }
}

impl AgentConfig {
    pub fn greeting_delay(&self) -> Duration {
        Duration::from_millis(self.greeting_delay_ms)
    }

    /// Transcript timeout as a `Duration`. Negative or non-finite values
    /// collapse to zero.
    pub fn transcript_timeout(&self) -> Duration {
        Duration::try_from_secs_f64(self.transcript_timeout_secs).unwrap_or(Duration::ZERO)
    }
}

fn default_stt() -> String {
    "deepgram".to_string()
}

fn default_llm() -> String {
    "openai".to_string()
}

fn default_llm_model() -> String {
    "gpt-4o-mini".to_string()
}

fn default_tts() -> String {
    "cartesia".to_string()
}

/// Which STT, LLM and TTS providers the agent wires together.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PluginConfig {
    #[serde(default = "default_stt")]
    pub stt: String,
    #[serde(default = "default_llm")]
    pub llm: String,
    #[serde(default = "default_llm_model")]
    pub llm_model: String,
    #[serde(default = "default_tts")]
    pub tts: String,
}

impl Default for PluginConfig {
    fn default() -> Self {
        Self {
            stt: default_stt(),
            llm: default_llm(),
            llm_model: default_llm_model(),
            tts: default_tts(),
        }
    }
}
