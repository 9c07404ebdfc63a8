//! Worker-level setup: job acceptance, plugin prewarming and the per-job
//! entrypoint.

use crate::agent::ScenarioAgent;
use crate::config::{AgentConfig, PluginConfig};
use crate::error::VoiceError;
use crate::notify::RoomTurnNotifier;
use crate::ptt::{PushToTalk, RpcMethod};
use crate::service::VoiceService;
use crate::session::{AgentSession, SessionOptions};
use async_trait::async_trait;
use luna_types::PUSH_TO_TALK_ATTRIBUTE;
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Instant;
use tracing::{error, info};

/// How the agent identifies itself when accepting a room job.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct JobAcceptance {
    pub identity: String,
    pub attributes: HashMap<String, String>,
}

/// Builds the job acceptance for this agent.
///
/// The `push-to-talk` attribute tells the frontend to show PTT controls.
pub fn job_acceptance(config: &AgentConfig) -> JobAcceptance {
    let mut attributes = HashMap::new();
    attributes.insert(PUSH_TO_TALK_ATTRIBUTE.to_string(), "1".to_string());
    JobAcceptance {
        identity: config.identity.clone(),
        attributes,
    }
}

/// Creates the STT, LLM and TTS plugin handles for a provider name.
pub trait PluginFactory {
    type Stt: Send + Sync;
    type Llm: Send + Sync;
    type Tts: Send + Sync;

    fn create_stt(&self, provider: &str) -> Result<Self::Stt, VoiceError>;
    fn create_llm(&self, provider: &str, model: &str) -> Result<Self::Llm, VoiceError>;
    fn create_tts(&self, provider: &str) -> Result<Self::Tts, VoiceError>;
}

/// Plugins built once per worker process and shared by its sessions.
pub struct PluginSet<F: PluginFactory> {
    pub stt: Option<Arc<F::Stt>>,
    pub llm: Option<Arc<F::Llm>>,
    pub tts: Option<Arc<F::Tts>>,
}

impl<F: PluginFactory> Default for PluginSet<F> {
    fn default() -> Self {
        Self {
            stt: None,
            llm: None,
            tts: None,
        }
    }
}

/// Plugins ready to hand to a session.
pub struct SessionPlugins<F: PluginFactory> {
    pub stt: Arc<F::Stt>,
    pub llm: Arc<F::Llm>,
    pub tts: Arc<F::Tts>,
}

fn timed<T>(label: &str, build: impl FnOnce() -> Result<T, VoiceError>) -> Option<Arc<T>> {
    info!("initializing {}", label);
    let started = Instant::now();
    match build() {
        Ok(plugin) => {
            info!(elapsed_ms = started.elapsed().as_millis() as u64, "{} initialized", label);
            Some(Arc::new(plugin))
        }
        Err(e) => {
            error!("error during prewarm of {}: {}", label, e);
            None
        }
    }
}

/// Builds every plugin ahead of the first job so job handling stays fast.
///
/// A failing plugin is logged and left empty; [`PluginSet::resolve`] builds
/// it again when a session needs it.
pub fn prewarm<F: PluginFactory>(factory: &F, plugins: &PluginConfig) -> PluginSet<F> {
    info!("prewarming agent worker");
    let started = Instant::now();

    let set = PluginSet {
        stt: timed("STT", || factory.create_stt(&plugins.stt)),
        llm: timed("LLM", || factory.create_llm(&plugins.llm, &plugins.llm_model)),
        tts: timed("TTS", || factory.create_tts(&plugins.tts)),
    };

    info!(
        elapsed_ms = started.elapsed().as_millis() as u64,
        "agent plugins prewarmed"
    );
    set
}

impl<F: PluginFactory> PluginSet<F> {
    /// Returns the prewarmed plugins, building any that are missing.
    pub fn resolve(
        &self,
        factory: &F,
        plugins: &PluginConfig,
    ) -> Result<SessionPlugins<F>, VoiceError> {
        let stt = match &self.stt {
            Some(stt) => Arc::clone(stt),
            None => Arc::new(factory.create_stt(&plugins.stt)?),
        };
        let llm = match &self.llm {
            Some(llm) => Arc::clone(llm),
            None => Arc::new(factory.create_llm(&plugins.llm, &plugins.llm_model)?),
        };
        let tts = match &self.tts {
            Some(tts) => Arc::clone(tts),
            None => Arc::new(factory.create_tts(&plugins.tts)?),
        };
        Ok(SessionPlugins { stt, llm, tts })
    }
}

/// Room access for one job, provided by the hosting framework.
#[async_trait]
pub trait JobContext: Send + Sync {
    type Factory: PluginFactory;
    type Session: AgentSession;

    fn room_name(&self) -> &str;

    /// Creates the session with `plugins` and starts it in the job's room.
    async fn start_session(
        &self,
        plugins: SessionPlugins<Self::Factory>,
        options: SessionOptions,
    ) -> Result<Arc<Self::Session>, VoiceError>;

    /// Joins the room.
    async fn connect(&self) -> Result<(), VoiceError>;

    /// Registers `method` on the agent's local participant, answered by
    /// `handler`.
    fn register_rpc(
        &self,
        method: RpcMethod,
        handler: Arc<PushToTalk<Self::Session>>,
    ) -> Result<(), VoiceError>;
}

/// What a started job hands back to the framework's event loop.
pub struct JobHandle<S, N> {
    pub agent: ScenarioAgent<S, N>,
    pub push_to_talk: Arc<PushToTalk<S>>,
}

/// State of one worker process, shared by every job it runs.
pub struct Worker<F: PluginFactory> {
    config: AgentConfig,
    factory: F,
    plugins: PluginSet<F>,
    voice: Arc<VoiceService>,
}

impl<F: PluginFactory> Worker<F> {
    /// Prewarms the configured plugins.
    pub fn new(config: AgentConfig, factory: F, voice: Arc<VoiceService>) -> Self {
        let plugins = prewarm(&factory, &config.plugins);
        Self {
            config,
            factory,
            plugins,
            voice,
        }
    }

    pub fn acceptance(&self) -> JobAcceptance {
        job_acceptance(&self.config)
    }

    pub fn plugins(&self) -> &PluginSet<F> {
        &self.plugins
    }

    /// Runs the entrypoint of one job.
    ///
    /// Audio input is disabled before the room is joined and the
    /// push-to-talk RPCs are registered only once connected.
    pub async fn run_job<C>(
        &self,
        ctx: &C,
    ) -> Result<JobHandle<C::Session, RoomTurnNotifier>, VoiceError>
    where
        C: JobContext<Factory = F>,
    {
        let room = ctx.room_name();
        let started = Instant::now();
        info!(room, "starting entrypoint");

        let plugins = self.plugins.resolve(&self.factory, &self.config.plugins)?;

        let step = Instant::now();
        let session = ctx
            .start_session(plugins, SessionOptions::default())
            .await?;
        info!(room, elapsed_ms = step.elapsed().as_millis() as u64, "session started");

        let push_to_talk = Arc::new(PushToTalk::new(
            Arc::clone(&session),
            self.config.transcript_timeout(),
        ));
        push_to_talk.start();

        let step = Instant::now();
        ctx.connect().await?;
        info!(room, elapsed_ms = step.elapsed().as_millis() as u64, "connected to room");

        for method in RpcMethod::ALL {
            ctx.register_rpc(method, Arc::clone(&push_to_talk))?;
        }

        let notifier = RoomTurnNotifier::new(Arc::clone(&self.voice), room);
        let agent = ScenarioAgent::new(self.config.clone(), session, notifier);

        info!(
            room,
            elapsed_ms = started.elapsed().as_millis() as u64,
            "entrypoint completed"
        );
        Ok(JobHandle {
            agent,
            push_to_talk,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    #[derive(Default)]
    struct CountingFactory {
        fail_llm: bool,
        built: AtomicUsize,
    }

    impl PluginFactory for CountingFactory {
        type Stt = String;
        type Llm = String;
        type Tts = String;

        fn create_stt(&self, provider: &str) -> Result<String, VoiceError> {
            self.built.fetch_add(1, Ordering::SeqCst);
            Ok(format!("stt:{provider}"))
        }

        fn create_llm(&self, provider: &str, model: &str) -> Result<String, VoiceError> {
            if self.fail_llm {
                return Err(VoiceError::Plugin("no api key".to_string()));
            }
            self.built.fetch_add(1, Ordering::SeqCst);
            Ok(format!("llm:{provider}:{model}"))
        }

        fn create_tts(&self, provider: &str) -> Result<String, VoiceError> {
            self.built.fetch_add(1, Ordering::SeqCst);
            Ok(format!("tts:{provider}"))
        }
    }

    #[test]
    fn acceptance_advertises_push_to_talk() {
        let acceptance = job_acceptance(&AgentConfig::default());
        assert_eq!(acceptance.identity, "ptt-agent");
        assert_eq!(
            acceptance.attributes.get("push-to-talk").map(String::as_str),
            Some("1")
        );
    }

    #[test]
    fn prewarmed_plugins_are_reused() {
        let factory = CountingFactory::default();
        let plugins = PluginConfig::default();
        let set = prewarm(&factory, &plugins);
        assert_eq!(factory.built.load(Ordering::SeqCst), 3);

        let resolved = set.resolve(&factory, &plugins).unwrap();
        assert_eq!(factory.built.load(Ordering::SeqCst), 3);
        assert_eq!(resolved.llm.as_str(), "llm:openai:gpt-4o-mini");
        assert!(Arc::ptr_eq(&resolved.stt, set.stt.as_ref().unwrap()));
    }

    #[test]
    fn failed_prewarm_leaves_slot_empty() {
        let factory = CountingFactory {
            fail_llm: true,
            ..Default::default()
        };
        let set = prewarm(&factory, &PluginConfig::default());
        assert!(set.stt.is_some());
        assert!(set.llm.is_none());
        assert!(set.tts.is_some());

        assert!(set.resolve(&factory, &PluginConfig::default()).is_err());
    }

    #[test]
    fn resolve_builds_missing_plugins() {
        let factory = CountingFactory::default();
        let plugins = PluginConfig::default();
        let set = PluginSet::<CountingFactory>::default();

        let resolved = set.resolve(&factory, &plugins).unwrap();
        assert_eq!(resolved.tts.as_str(), "tts:cartesia");
        assert_eq!(factory.built.load(Ordering::SeqCst), 3);
    }
}
