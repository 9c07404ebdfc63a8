use crate::config::LiveKitConfig;
use crate::error::VoiceError;
use livekit_api::access_token::{AccessToken, VideoGrants};
use livekit_api::services::room::{RoomClient, SendDataOptions};
use std::time::Duration;
use tracing::debug;

/// Server-side access to LiveKit: join tokens and room service calls.
#[derive(Debug)]
pub struct VoiceService {
    config: LiveKitConfig,
    room_client: RoomClient,
}

impl VoiceService {
    pub fn new(config: LiveKitConfig) -> Self {
        let room_client =
            RoomClient::with_api_key(&config.url, &config.api_key, &config.api_secret);
        Self {
            config,
            room_client,
        }
    }

    pub fn is_enabled(&self) -> bool {
        !self.config.url.is_empty()
    }

    pub fn get_url(&self) -> &str {
        &self.config.url
    }

    /// Checks that URL, key and secret are all set.
    pub fn ensure_configured(&self) -> Result<(), VoiceError> {
        match self.config.missing_fields().first() {
            Some(field) => Err(VoiceError::Config(format!("livekit.{} is not defined", field))),
            None => Ok(()),
        }
    }

    /// Issues a join token that lets a learner publish audio and data.
    pub fn generate_join_token(
        &self,
        room_name: &str,
        participant_identity: &str,
        participant_name: &str,
    ) -> Result<String, VoiceError> {
        let token = AccessToken::with_api_key(&self.config.api_key, &self.config.api_secret)
            .with_identity(participant_identity)
            .with_name(participant_name)
            .with_grants(VideoGrants {
                room_join: true,
                room: room_name.to_string(),
                can_publish: true,
                can_subscribe: true,
                can_publish_data: true,
                ..Default::default()
            })
            .with_ttl(Duration::from_secs(self.config.token_ttl_seconds));

        token.to_jwt().map_err(VoiceError::LiveKit)
    }

    /// Publishes a reliable data packet to every participant in a room.
    pub async fn send_data(&self, room: &str, data: Vec<u8>) -> Result<(), VoiceError> {
        debug!(room, bytes = data.len(), "sending room data packet");
        self.room_client
            .send_data(room, data, SendDataOptions::default())
            .await
            .map_err(|e| VoiceError::RoomService(e.to_string()))
    }
}
