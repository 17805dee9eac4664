// SPDX-FileCopyrightText: 2026 Mnemos Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! HTTP request handlers for the gateway REST API.
//!
//! Every handler resolves the agent through the service, so an unknown id
//! yields 404 on every route.

use std::collections::BTreeMap;

use axum::{
    body::Bytes,
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};
use mnemos_agent::NewAgent;
use mnemos_core::types::{
    AgentMessage, AgentRecord, ArchivalItem, FinishReason, HealthStatus, MessageType, Metadata,
};
use mnemos_core::MnemosError;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::ApiError;
use crate::server::GatewayState;

/// Default number of entries for `GET .../memory/recall`.
const DEFAULT_RECALL_LIMIT: usize = 10;

type ApiResult<T> = Result<T, ApiError>;

/// Response body for POST /agents.
#[derive(Debug, Serialize)]
pub struct CreatedAgent {
    pub id: String,
    pub name: String,
    pub model: String,
}

/// Public view of an agent record.
#[derive(Debug, Serialize)]
pub struct AgentView {
    pub id: String,
    pub name: String,
    pub model: String,
    pub persona: String,
    pub context_window_limit: u32,
    pub active: bool,
    pub created_at: String,
    pub updated_at: String,
}

impl From<AgentRecord> for AgentView {
    fn from(record: AgentRecord) -> Self {
        Self {
            id: record.id,
            name: record.name,
            model: record.model,
            persona: record.persona,
            context_window_limit: record.context_window_limit,
            active: record.active,
            created_at: record.created_at.to_rfc3339(),
            updated_at: record.updated_at.to_rfc3339(),
        }
    }
}

/// Request body for POST /agents/{id}/messages.
#[derive(Debug, Deserialize)]
pub struct MessageRequest {
    /// Message content text.
    pub content: String,
    #[serde(default = "default_sender")]
    pub sender_id: String,
    #[serde(default)]
    pub metadata: Metadata,
}

fn default_sender() -> String {
    "user".to_string()
}

/// Response body for POST /agents/{id}/messages.
#[derive(Debug, Serialize)]
pub struct MessageResponse {
    /// The agent's reply text.
    pub response: String,
    pub agent_id: String,
    /// Seconds since the Unix epoch.
    pub timestamp: f64,
    pub finish_reason: FinishReason,
    /// Tool calls executed while producing the reply.
    pub tool_calls: usize,
}

/// Request body for POST /agents/{id}/mail.
#[derive(Debug, Deserialize)]
pub struct MailRequest {
    pub receiver_id: String,
    pub content: String,
    #[serde(default)]
    pub message_type: MessageType,
    #[serde(default)]
    pub metadata: Metadata,
}

#[derive(Debug, Deserialize)]
pub struct LimitQuery {
    pub limit: Option<usize>,
}

#[derive(Debug, Deserialize)]
pub struct SearchQuery {
    pub query: String,
    pub limit: Option<usize>,
}

#[derive(Debug, Deserialize)]
pub struct ValueQuery {
    pub value: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct ArchivalQuery {
    pub content: String,
}

/// Response body for POST /agents/{id}/memory/core/{key}.
#[derive(Debug, Serialize)]
pub struct CoreUpdated {
    pub status: &'static str,
    /// The value as stored, after truncation.
    pub value: String,
}

/// Response body for POST /agents/{id}/memory/archival.
#[derive(Debug, Serialize)]
pub struct ArchivalCreated {
    pub memory_id: String,
}

/// Response body for GET /health.
#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: String,
    pub version: String,
    pub uptime_secs: u64,
    pub loaded_agents: usize,
}

// --- Agents ---

/// POST /agents
///
/// An empty body creates an agent entirely from `[agent]` defaults.
pub async fn create_agent(
    State(state): State<GatewayState>,
    body: Bytes,
) -> ApiResult<Json<CreatedAgent>> {
    let request: NewAgent = if body.iter().all(u8::is_ascii_whitespace) {
        NewAgent::default()
    } else {
        serde_json::from_slice(&body)
            .map_err(|e| ApiError::BadRequest(format!("invalid agent definition: {e}")))?
    };
    let record = state.service.create_agent(request).await?;
    Ok(Json(CreatedAgent {
        id: record.id,
        name: record.name,
        model: record.model,
    }))
}

/// GET /agents
pub async fn list_agents(State(state): State<GatewayState>) -> ApiResult<Json<Vec<AgentView>>> {
    let agents = state.service.list_agents().await?;
    Ok(Json(agents.into_iter().map(AgentView::from).collect()))
}

/// GET /agents/{id}
pub async fn get_agent(
    State(state): State<GatewayState>,
    Path(id): Path<String>,
) -> ApiResult<Json<AgentView>> {
    Ok(Json(state.service.get_agent(&id).await?.into()))
}

/// DELETE /agents/{id}
pub async fn delete_agent(
    State(state): State<GatewayState>,
    Path(id): Path<String>,
) -> ApiResult<StatusCode> {
    state.service.delete_agent(&id).await?;
    Ok(StatusCode::NO_CONTENT)
}

/// POST /agents/{id}/messages
///
/// Runs one full turn and returns the agent's reply.
pub async fn send_message(
    State(state): State<GatewayState>,
    Path(id): Path<String>,
    Json(body): Json<MessageRequest>,
) -> ApiResult<Json<MessageResponse>> {
    let reply = state
        .service
        .send_message(&id, &body.content, &body.sender_id, body.metadata)
        .await?;
    Ok(Json(MessageResponse {
        response: reply.content,
        agent_id: id,
        timestamp: reply.timestamp,
        finish_reason: reply.finish_reason,
        tool_calls: reply.tool_calls,
    }))
}

/// POST /agents/{id}/mail
///
/// Queues a message from agent `id` in the receiver's mailbox.
pub async fn send_mail(
    State(state): State<GatewayState>,
    Path(id): Path<String>,
    Json(body): Json<MailRequest>,
) -> ApiResult<(StatusCode, Json<AgentMessage>)> {
    let message = state
        .service
        .send_mail(
            &id,
            &body.receiver_id,
            &body.content,
            body.message_type,
            body.metadata,
        )
        .await?;
    Ok((StatusCode::ACCEPTED, Json(message)))
}

// --- Core memory ---

/// GET /agents/{id}/memory/core
pub async fn get_core_memory(
    State(state): State<GatewayState>,
    Path(id): Path<String>,
) -> ApiResult<Json<BTreeMap<String, String>>> {
    Ok(Json(state.service.core_memory(&id).await?))
}

/// POST /agents/{id}/memory/core/{key}
///
/// The raw request body is the value. `?value=` is accepted when the body
/// is empty.
pub async fn set_core_memory(
    State(state): State<GatewayState>,
    Path((id, key)): Path<(String, String)>,
    Query(query): Query<ValueQuery>,
    body: String,
) -> ApiResult<Json<CoreUpdated>> {
    let value = if body.is_empty() {
        query
            .value
            .ok_or_else(|| ApiError::BadRequest("missing value for core memory block".into()))?
    } else {
        body
    };
    debug!(agent_id = %id, key = %key, "updating core memory via gateway");
    let stored = state.service.set_core_memory(&id, &key, &value).await?;
    Ok(Json(CoreUpdated {
        status: "success",
        value: stored,
    }))
}

/// DELETE /agents/{id}/memory/core/{key}
pub async fn delete_core_memory(
    State(state): State<GatewayState>,
    Path((id, key)): Path<(String, String)>,
) -> ApiResult<StatusCode> {
    if state.service.delete_core_memory(&id, &key).await? {
        Ok(StatusCode::NO_CONTENT)
    } else {
        Err(MnemosError::NotFound {
            entity: "Core block".to_string(),
            id: key,
        }
        .into())
    }
}

// --- Recall memory ---

/// GET /agents/{id}/memory/recall?limit=
pub async fn get_recall(
    State(state): State<GatewayState>,
    Path(id): Path<String>,
    Query(query): Query<LimitQuery>,
) -> ApiResult<Json<Vec<AgentMessage>>> {
    let limit = query.limit.unwrap_or(DEFAULT_RECALL_LIMIT);
    Ok(Json(state.service.recall(&id, limit).await?))
}

/// GET /agents/{id}/memory/recall/search?query=&limit=
pub async fn search_recall(
    State(state): State<GatewayState>,
    Path(id): Path<String>,
    Query(query): Query<SearchQuery>,
) -> ApiResult<Json<Vec<AgentMessage>>> {
    Ok(Json(
        state
            .service
            .search_recall(&id, &query.query, query.limit)
            .await?,
    ))
}

// --- Archival memory ---

/// POST /agents/{id}/memory/archival?content=
///
/// An optional JSON body supplies the item's metadata.
pub async fn insert_archival(
    State(state): State<GatewayState>,
    Path(id): Path<String>,
    Query(query): Query<ArchivalQuery>,
    metadata: Option<Json<Metadata>>,
) -> ApiResult<Json<ArchivalCreated>> {
    let metadata = metadata.map(|Json(m)| m).unwrap_or_default();
    let item = state
        .service
        .insert_archival(&id, &query.content, metadata)
        .await?;
    Ok(Json(ArchivalCreated { memory_id: item.id }))
}

/// GET /agents/{id}/memory/archival/search?query=&limit=
pub async fn search_archival(
    State(state): State<GatewayState>,
    Path(id): Path<String>,
    Query(query): Query<SearchQuery>,
) -> ApiResult<Json<Vec<ArchivalItem>>> {
    Ok(Json(
        state
            .service
            .search_archival(&id, &query.query, query.limit)
            .await?,
    ))
}

/// GET /agents/{id}/memory/archival/{item_id}
pub async fn get_archival(
    State(state): State<GatewayState>,
    Path((id, item_id)): Path<(String, String)>,
) -> ApiResult<Json<ArchivalItem>> {
    Ok(Json(state.service.get_archival(&id, &item_id).await?))
}

/// DELETE /agents/{id}/memory/archival/{item_id}
pub async fn delete_archival(
    State(state): State<GatewayState>,
    Path((id, item_id)): Path<(String, String)>,
) -> ApiResult<StatusCode> {
    state.service.delete_archival(&id, &item_id).await?;
    Ok(StatusCode::NO_CONTENT)
}

/// GET /agents/{id}/memory/stats
pub async fn get_memory_stats(
    State(state): State<GatewayState>,
    Path(id): Path<String>,
) -> ApiResult<Json<serde_json::Value>> {
    let stats = state.service.memory_stats(&id).await?;
    let body = serde_json::to_value(stats)
        .map_err(|e| MnemosError::Internal(format!("failed to encode memory stats: {e}")))?;
    Ok(Json(body))
}

// --- Health ---

/// GET /health
///
/// Reports storage health; 503 when storage is unreachable or closed.
pub async fn get_health(State(state): State<GatewayState>) -> (StatusCode, Json<HealthResponse>) {
    let (status, label) = match state.service.health().await {
        Ok(HealthStatus::Healthy) => (StatusCode::OK, "ok".to_string()),
        Ok(HealthStatus::Degraded(reason)) => (StatusCode::OK, format!("degraded: {reason}")),
        Ok(HealthStatus::Unhealthy(reason)) => (
            StatusCode::SERVICE_UNAVAILABLE,
            format!("unhealthy: {reason}"),
        ),
        Err(e) => (StatusCode::SERVICE_UNAVAILABLE, format!("unhealthy: {e}")),
    };
    (
        status,
        Json(HealthResponse {
            status: label,
            version: env!("CARGO_PKG_VERSION").to_string(),
            uptime_secs: state.start_time.elapsed().as_secs(),
            loaded_agents: state.service.registry().loaded().len(),
        }),
    )
}

#[cfg(test)]
mod tests {
    use axum::body::Body;
    use axum::http::{header, Request};
    use axum::Router;
    use mnemos_test_utils::TestHarness;
    use serde_json::{json, Value};
    use tower::ServiceExt;

    use super::*;
    use crate::server::router;

    fn app(harness: &TestHarness) -> Router {
        router(GatewayState::new(harness.service.clone()))
    }

    async fn call(app: &Router, request: Request<Body>) -> (StatusCode, Value) {
        let response = app.clone().oneshot(request).await.unwrap();
        let status = response.status();
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        let body = if bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&bytes).unwrap()
        };
        (status, body)
    }

    fn get(uri: &str) -> Request<Body> {
        Request::builder().uri(uri).body(Body::empty()).unwrap()
    }

    fn post_json(uri: &str, body: Value) -> Request<Body> {
        Request::builder()
            .method("POST")
            .uri(uri)
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(body.to_string()))
            .unwrap()
    }

    fn post_raw(uri: &str, body: &str) -> Request<Body> {
        Request::builder()
            .method("POST")
            .uri(uri)
            .body(Body::from(body.to_string()))
            .unwrap()
    }

    fn delete(uri: &str) -> Request<Body> {
        Request::builder()
            .method("DELETE")
            .uri(uri)
            .body(Body::empty())
            .unwrap()
    }

    async fn create(app: &Router, body: Value) -> String {
        let (status, created) = call(app, post_json("/agents", body)).await;
        assert_eq!(status, StatusCode::OK);
        created["id"].as_str().unwrap().to_string()
    }

    #[test]
    fn message_request_defaults_sender() {
        let req: MessageRequest = serde_json::from_str(r#"{"content": "Hello"}"#).unwrap();
        assert_eq!(req.content, "Hello");
        assert_eq!(req.sender_id, "user");
        assert!(req.metadata.is_empty());
    }

    #[test]
    fn mail_request_defaults_to_text() {
        let req: MailRequest =
            serde_json::from_str(r#"{"receiver_id": "agent-b", "content": "hi"}"#).unwrap();
        assert_eq!(req.message_type, MessageType::Text);
    }

    #[tokio::test]
    async fn create_then_get_agent() {
        let harness = TestHarness::builder().build().await.unwrap();
        let app = app(&harness);

        let (status, created) = call(
            &app,
            post_json(
                "/agents",
                json!({"name": "Ada", "model": "m-1", "persona": "curious", "context_window_limit": 2048}),
            ),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(created["name"], "Ada");
        assert_eq!(created["model"], "m-1");
        let id = created["id"].as_str().unwrap();
        assert!(id.starts_with("agent-"));

        let (status, agent) = call(&app, get(&format!("/agents/{id}"))).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(agent["persona"], "curious");
        assert_eq!(agent["context_window_limit"], 2048);
        assert_eq!(agent["active"], true);
    }

    #[tokio::test]
    async fn empty_create_body_uses_defaults() {
        let harness = TestHarness::builder()
            .with_config(|c| c.agent.name = "Bramble".into())
            .build()
            .await
            .unwrap();
        let app = app(&harness);

        let (status, created) = call(&app, post_raw("/agents", "")).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(created["name"], "Bramble");
        assert_eq!(created["model"], "mock-model");
    }

    #[tokio::test]
    async fn malformed_create_body_is_bad_request() {
        let harness = TestHarness::builder().build().await.unwrap();
        let app = app(&harness);
        let (status, body) = call(&app, post_raw("/agents", "{not json")).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert!(body["error"].as_str().unwrap().contains("invalid agent definition"));
    }

    #[tokio::test]
    async fn unknown_agent_is_not_found_everywhere() {
        let harness = TestHarness::builder().build().await.unwrap();
        let app = app(&harness);

        let requests = [
            get("/agents/agent-missing"),
            post_json("/agents/agent-missing/messages", json!({"content": "hi"})),
            get("/agents/agent-missing/memory/core"),
            post_raw("/agents/agent-missing/memory/core/human", "Ada"),
            get("/agents/agent-missing/memory/recall"),
            post_raw("/agents/agent-missing/memory/archival?content=x", ""),
            get("/agents/agent-missing/memory/archival/search?query=x"),
            get("/agents/agent-missing/memory/stats"),
            delete("/agents/agent-missing"),
        ];
        for request in requests {
            let uri = request.uri().to_string();
            let (status, body) = call(&app, request).await;
            assert_eq!(status, StatusCode::NOT_FOUND, "{uri}");
            assert_eq!(body["error"], "Agent agent-missing not found", "{uri}");
        }
        assert_eq!(harness.mock_provider.generate_calls(), 0);
    }

    #[tokio::test]
    async fn message_round_trip_lands_in_recall() {
        let harness = TestHarness::builder()
            .with_mock_responses(vec!["hello there".to_string()])
            .build()
            .await
            .unwrap();
        let app = app(&harness);
        let id = create(&app, json!({})).await;

        let (status, reply) = call(
            &app,
            post_json(
                &format!("/agents/{id}/messages"),
                json!({"content": "hi", "sender_id": "ada"}),
            ),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(reply["response"], "hello there");
        assert_eq!(reply["agent_id"], id.as_str());
        assert_eq!(reply["finish_reason"], "stop");
        assert!(reply["timestamp"].as_f64().unwrap() > 0.0);

        let (status, recall) = call(&app, get(&format!("/agents/{id}/memory/recall?limit=10"))).await;
        assert_eq!(status, StatusCode::OK);
        let recall = recall.as_array().unwrap();
        assert_eq!(recall.len(), 2);
        assert_eq!(recall[0]["content"], "hi");
        assert_eq!(recall[0]["sender_id"], "ada");
        assert_eq!(recall[1]["content"], "hello there");
        assert_eq!(recall[1]["receiver_id"], "ada");
    }

    #[tokio::test]
    async fn context_overflow_is_413_without_generation() {
        let harness = TestHarness::builder()
            .with_max_context(10)
            .build()
            .await
            .unwrap();
        let app = app(&harness);
        let id = create(&app, json!({})).await;

        let long = "word ".repeat(200);
        let (status, body) = call(
            &app,
            post_json(&format!("/agents/{id}/messages"), json!({"content": long})),
        )
        .await;
        assert_eq!(status, StatusCode::PAYLOAD_TOO_LARGE);
        assert!(body["error"].as_str().unwrap().contains("context overflow"));
        assert_eq!(harness.mock_provider.generate_calls(), 0);
    }

    #[tokio::test]
    async fn provider_failure_is_bad_gateway() {
        let harness = TestHarness::builder().build().await.unwrap();
        harness.mock_provider.push_error("upstream down").await;
        let app = app(&harness);
        let id = create(&app, json!({})).await;

        let (status, body) = call(
            &app,
            post_json(&format!("/agents/{id}/messages"), json!({"content": "hi"})),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_GATEWAY);
        assert!(body["error"].as_str().unwrap().contains("upstream down"));
    }

    #[tokio::test]
    async fn core_memory_raw_body_and_query_value() {
        let harness = TestHarness::builder()
            .with_config(|c| c.memory.max_block_size = 8)
            .build()
            .await
            .unwrap();
        let app = app(&harness);
        let id = create(&app, json!({})).await;

        let (status, body) = call(&app, post_raw(&format!("/agents/{id}/memory/core/human"), "Ada")).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body, json!({"status": "success", "value": "Ada"}));

        let (_, body) = call(
            &app,
            post_raw(&format!("/agents/{id}/memory/core/goal?value=overflowing"), ""),
        )
        .await;
        assert_eq!(body["value"], "overflow");

        let (status, _) = call(&app, post_raw(&format!("/agents/{id}/memory/core/empty"), "")).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);

        let (_, core) = call(&app, get(&format!("/agents/{id}/memory/core"))).await;
        assert_eq!(core["human"], "Ada");
        assert_eq!(core["goal"], "overflow");
        assert!(core.get("empty").is_none());

        let (status, _) = call(&app, delete(&format!("/agents/{id}/memory/core/human"))).await;
        assert_eq!(status, StatusCode::NO_CONTENT);
        let (status, _) = call(&app, delete(&format!("/agents/{id}/memory/core/human"))).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn archival_insert_search_get_delete() {
        let harness = TestHarness::builder().build().await.unwrap();
        let app = app(&harness);
        let id = create(&app, json!({})).await;

        let (status, created) = call(
            &app,
            post_json(
                &format!("/agents/{id}/memory/archival?content=The%20cat%20sat"),
                json!({"source": "notes"}),
            ),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        let memory_id = created["memory_id"].as_str().unwrap().to_string();
        call(&app, post_raw(&format!("/agents/{id}/memory/archival?content=dogs%20bark"), "")).await;

        let (_, hits) = call(
            &app,
            get(&format!("/agents/{id}/memory/archival/search?query=CAT&limit=5")),
        )
        .await;
        let hits = hits.as_array().unwrap();
        assert_eq!(hits.len(), 1);
        assert_eq!(hits[0]["content"], "The cat sat");
        assert_eq!(hits[0]["metadata"]["source"], "notes");

        let (status, item) = call(&app, get(&format!("/agents/{id}/memory/archival/{memory_id}"))).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(item["id"], memory_id.as_str());

        let uri = format!("/agents/{id}/memory/archival/{memory_id}");
        assert_eq!(call(&app, delete(&uri)).await.0, StatusCode::NO_CONTENT);
        assert_eq!(call(&app, delete(&uri)).await.0, StatusCode::NOT_FOUND);
        assert_eq!(call(&app, get(&uri)).await.0, StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn mail_reaches_receiver_on_next_turn() {
        let harness = TestHarness::builder().build().await.unwrap();
        let app = app(&harness);
        let alice = create(&app, json!({"name": "alice"})).await;
        let bob = create(&app, json!({"name": "bob"})).await;

        let (status, mail) = call(
            &app,
            post_json(
                &format!("/agents/{alice}/mail"),
                json!({"receiver_id": bob, "content": "meet at noon"}),
            ),
        )
        .await;
        assert_eq!(status, StatusCode::ACCEPTED);
        assert_eq!(mail["sender_id"], alice.as_str());
        assert_eq!(mail["message_type"], "text");

        call(
            &app,
            post_json(&format!("/agents/{bob}/messages"), json!({"content": "any news?"})),
        )
        .await;
        let (_, recall) = call(&app, get(&format!("/agents/{bob}/memory/recall"))).await;
        let contents: Vec<&str> = recall
            .as_array()
            .unwrap()
            .iter()
            .map(|m| m["content"].as_str().unwrap())
            .collect();
        assert_eq!(contents[..2], ["meet at noon", "any news?"]);
    }

    #[tokio::test]
    async fn mail_to_unknown_receiver_is_not_found() {
        let harness = TestHarness::builder().build().await.unwrap();
        let app = app(&harness);
        let alice = create(&app, json!({})).await;
        let (status, _) = call(
            &app,
            post_json(
                &format!("/agents/{alice}/mail"),
                json!({"receiver_id": "agent-nobody", "content": "hello?"}),
            ),
        )
        .await;
        assert_eq!(status, StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn list_and_delete_agents() {
        let harness = TestHarness::builder().build().await.unwrap();
        let app = app(&harness);
        let first = create(&app, json!({"name": "one"})).await;
        create(&app, json!({"name": "two"})).await;

        let (_, agents) = call(&app, get("/agents")).await;
        assert_eq!(agents.as_array().unwrap().len(), 2);

        let (status, _) = call(&app, delete(&format!("/agents/{first}"))).await;
        assert_eq!(status, StatusCode::NO_CONTENT);
        let (status, _) = call(&app, get(&format!("/agents/{first}"))).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        let (_, agents) = call(&app, get("/agents")).await;
        assert_eq!(agents.as_array().unwrap().len(), 1);
    }

    #[tokio::test]
    async fn stats_reflect_tiers() {
        let harness = TestHarness::builder().build().await.unwrap();
        let app = app(&harness);
        let id = create(&app, json!({})).await;
        call(&app, post_raw(&format!("/agents/{id}/memory/archival?content=abc"), "")).await;

        let (status, stats) = call(&app, get(&format!("/agents/{id}/memory/stats"))).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(stats["archival_memory"]["count"], 1);
        assert_eq!(stats["archival_memory"]["total_size"], 3);
        assert_eq!(stats["recall_memory"]["count"], 0);
    }

    #[tokio::test]
    async fn health_reports_ok_then_unavailable_after_shutdown() {
        let harness = TestHarness::builder().build().await.unwrap();
        let app = app(&harness);

        let (status, body) = call(&app, get("/health")).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["status"], "ok");

        harness.service.shutdown().await.unwrap();
        let (status, _) = call(&app, get("/health")).await;
        assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
    }
}
