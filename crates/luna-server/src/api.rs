//! API handlers for the Luna server.

use crate::AppState;
use axum::{
    extract::{Extension, Json, Query},
    http::{header, StatusCode},
    response::{IntoResponse, Response},
};
use luna_script::{format_participant_name, ScenarioRequest};
use luna_voice::{job_acceptance, RpcMethod};
use rand::Rng;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::Arc;
use thiserror::Error;

/// API error type mapping to HTTP status codes.
#[derive(Debug, Error)]
pub enum ApiError {
    #[error("invalid input: {0}")]
    BadRequest(String),
    #[error("internal server error: {0}")]
    InternalServerError(String),
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, message) = match self {
            ApiError::BadRequest(msg) => (StatusCode::BAD_REQUEST, msg),
            ApiError::InternalServerError(msg) => (StatusCode::INTERNAL_SERVER_ERROR, msg),
        };

        let body = Json(serde_json::json!({
            "error": message
        }));

        (status, body).into_response()
    }
}

/// Query parameters for `GET /api/connection-details`.
#[derive(Debug, Default, Deserialize)]
pub struct ConnectionDetailsQuery {
    pub greeting: Option<String>,
    pub scenario: Option<String>,
    #[serde(rename = "conversationScript")]
    pub conversation_script: Option<String>,
    #[serde(rename = "scenarioLevel")]
    pub scenario_level: Option<String>,
    #[serde(rename = "scenarioTurns")]
    pub scenario_turns: Option<String>,
}

/// Everything a client needs to join a practice room.
#[derive(Debug, Serialize, Deserialize)]
pub struct ConnectionDetails {
    #[serde(rename = "serverUrl")]
    pub server_url: String,
    #[serde(rename = "roomName")]
    pub room_name: String,
    #[serde(rename = "participantToken")]
    pub participant_token: String,
    #[serde(rename = "participantName")]
    pub participant_name: String,
}

/// Largest scenario script accepted, before base64 encoding.
///
/// The encoded script travels inside the token's `name` claim, so it has to
/// stay well below typical header limits.
const MAX_SCRIPT_BYTES: usize = 16 * 1024;

fn non_empty(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.trim().is_empty())
}

/// Handler for `GET /api/connection-details`.
///
/// Mints a room, a participant identity and a join token. The greeting and
/// scenario are packed into the participant name for the agent to read.
pub async fn connection_details_handler(
    Extension(state): Extension<Arc<AppState>>,
    Query(query): Query<ConnectionDetailsQuery>,
) -> Result<Response, ApiError> {
    state
        .voice_service
        .ensure_configured()
        .map_err(|e| ApiError::InternalServerError(e.to_string()))?;

    let script_json = query.conversation_script.unwrap_or_default();
    if script_json.len() > MAX_SCRIPT_BYTES {
        return Err(ApiError::BadRequest(format!(
            "conversationScript exceeds {} bytes",
            MAX_SCRIPT_BYTES
        )));
    }

    let scenario = non_empty(query.scenario).map(|id| ScenarioRequest {
        id,
        level: query.scenario_level.unwrap_or_default(),
        turns: query.scenario_turns.unwrap_or_default(),
        script_json,
    });

    if let Some(request) = &scenario {
        tracing::info!(
            scenario = %request.id,
            level = %request.level,
            turns = %request.turns,
            script_len = request.script_json.len(),
            "connection details requested for scenario"
        );
    }

    let greeting =
        non_empty(query.greeting).unwrap_or_else(|| state.connection.default_greeting.clone());

    let (digits, identity_suffix, room_suffix) = {
        let mut rng = rand::thread_rng();
        (
            rng.gen_range(0..10_000u32),
            rng.gen_range(0..10_000u32),
            rng.gen_range(0..10_000u32),
        )
    };

    let participant_name =
        format_participant_name(&format!("{:04}", digits), &greeting, scenario.as_ref())
            .map_err(|e| ApiError::BadRequest(e.to_string()))?;
    let participant_identity = format!("voice_assistant_user_{}", identity_suffix);
    let room_name = format!("voice_assistant_room_{}", room_suffix);

    let participant_token = state
        .voice_service
        .generate_join_token(&room_name, &participant_identity, &participant_name)
        .map_err(|e| ApiError::InternalServerError(e.to_string()))?;

    tracing::info!(room = %room_name, identity = %participant_identity, "issued connection details");

    let details = ConnectionDetails {
        server_url: state.voice_service.get_url().to_string(),
        room_name,
        participant_token,
        participant_name,
    };

    Ok(([(header::CACHE_CONTROL, "no-store")], Json(details)).into_response())
}

/// Response body for agent capability inspection.
#[derive(Debug, Serialize, Deserialize)]
pub struct AgentInfoResponse {
    pub identity: String,
    pub attributes: HashMap<String, String>,
    #[serde(rename = "rpcMethods")]
    pub rpc_methods: Vec<String>,
}

/// Handler for `GET /api/agent`.
///
/// Tells the frontend how the agent will appear in the room and which
/// push-to-talk RPCs it answers.
pub async fn agent_info_handler(
    Extension(state): Extension<Arc<AppState>>,
) -> Json<AgentInfoResponse> {
    let acceptance = job_acceptance(&state.agent);
    Json(AgentInfoResponse {
        identity: acceptance.identity,
        attributes: acceptance.attributes,
        rpc_methods: RpcMethod::ALL
            .iter()
            .map(|m| m.as_str().to_string())
            .collect(),
    })
}
