use crate::error::VoiceError;
use crate::service::VoiceService;
use async_trait::async_trait;
use luna_types::AgentDataMessage;
use std::sync::Arc;

/// Tells the frontend which scripted turn the conversation is on.
#[async_trait]
pub trait TurnNotifier: Send + Sync {
    async fn notify_turn(&self, turn: u32) -> Result<(), VoiceError>;
}

/// Publishes turn advancements on a room's data channel.
#[derive(Debug, Clone)]
pub struct RoomTurnNotifier {
    service: Arc<VoiceService>,
    room: String,
}

impl RoomTurnNotifier {
    pub fn new(service: Arc<VoiceService>, room: impl Into<String>) -> Self {
        Self {
            service,
            room: room.into(),
        }
    }
}

#[async_trait]
impl TurnNotifier for RoomTurnNotifier {
    async fn notify_turn(&self, turn: u32) -> Result<(), VoiceError> {
        let payload = AgentDataMessage::turn_advancement(turn).to_bytes()?;
        self.service.send_data(&self.room, payload).await
    }
}
