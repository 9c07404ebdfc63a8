use luna_voice::{LiveKitConfig, VoiceError, VoiceService};

const DEFAULT_URL: &str = "http://localhost:7880";
const DEFAULT_KEY: &str = "devkey";
const DEFAULT_SECRET: &str = "secret";

#[tokio::test]
async fn test_generate_join_token() {
    let config = LiveKitConfig::new(DEFAULT_URL, DEFAULT_KEY, DEFAULT_SECRET);
    let service = VoiceService::new(config);

    let token = service
        .generate_join_token("test-room", "user-123", "user_0001_say_hello")
        .expect("Failed to generate token");

    assert!(!token.is_empty());
}

#[tokio::test]
async fn test_token_claims() {
    use jsonwebtoken::{decode, Algorithm, DecodingKey, Validation};
    use serde::Deserialize;

    let config = LiveKitConfig::new(DEFAULT_URL, DEFAULT_KEY, DEFAULT_SECRET);
    let service = VoiceService::new(config);

    let token = service
        .generate_join_token("perm-room", "voice_assistant_user_7", "user_0042_say_hi_i_am_luna")
        .expect("Failed to generate token");

    #[derive(Deserialize)]
    struct Claims {
        sub: String,
        name: String,
        exp: u64,
        video: VideoClaims,
    }

    #[derive(Deserialize)]
    struct VideoClaims {
        room: String,
        #[serde(rename = "canPublish")]
        can_publish: bool,
        #[serde(rename = "canSubscribe")]
        can_subscribe: bool,
        #[serde(rename = "canPublishData")]
        can_publish_data: bool,
        #[serde(rename = "roomJoin")]
        room_join: bool,
    }

    let validation = Validation::new(Algorithm::HS256);
    let key = DecodingKey::from_secret(DEFAULT_SECRET.as_bytes());
    let token_data = decode::<Claims>(&token, &key, &validation).expect("Failed to decode token");
    let claims = token_data.claims;

    assert_eq!(claims.sub, "voice_assistant_user_7");
    assert_eq!(claims.name, "user_0042_say_hi_i_am_luna");
    assert_eq!(claims.video.room, "perm-room");
    assert!(claims.video.room_join, "roomJoin should be true");
    assert!(claims.video.can_publish, "canPublish should be true");
    assert!(claims.video.can_subscribe, "canSubscribe should be true");
    assert!(claims.video.can_publish_data, "canPublishData should be true");

    // default TTL is fifteen minutes
    let now = std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .unwrap()
        .as_secs();
    let ttl = claims.exp.saturating_sub(now);
    assert!((880..=901).contains(&ttl), "unexpected ttl {ttl}");
}

#[test]
fn test_unconfigured_service_is_rejected() {
    let service = VoiceService::new(LiveKitConfig::default());
    assert!(!service.is_enabled());
    match service.ensure_configured() {
        Err(VoiceError::Config(msg)) => assert!(msg.contains("livekit.url")),
        other => panic!("expected config error, got {:?}", other),
    }

    let service = VoiceService::new(LiveKitConfig::new(DEFAULT_URL, DEFAULT_KEY, ""));
    assert!(service.is_enabled());
    match service.ensure_configured() {
        Err(VoiceError::Config(msg)) => assert!(msg.contains("api_secret")),
        other => panic!("expected config error, got {:?}", other),
    }
}

#[test]
fn test_livekit_config_from_toml() {
    let config: LiveKitConfig = toml::from_str(
        r#"
        url = "wss://example.livekit.cloud"
        api_key = "key"
        api_secret = "secret"
        "#,
    )
    .unwrap();
    assert_eq!(config.url, "wss://example.livekit.cloud");
    assert_eq!(config.token_ttl_seconds, 900);
}
