// SPDX-FileCopyrightText: 2026 Mnemos Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! End-to-end integration tests for the complete Mnemos pipeline.
//!
//! Each test creates an isolated TestHarness with temp SQLite and a mock
//! provider. Tests are independent and order-insensitive.

use std::sync::Arc;

use axum::body::Body;
use axum::http::{Request, StatusCode};
use mnemos_agent::AgentService;
use mnemos_core::types::{AgentMessage, MessageType, Metadata, ToolCall};
use mnemos_core::{MnemosError, StorageAdapter};
use mnemos_gateway::{router, GatewayState};
use mnemos_test_utils::TestHarness;
use tower::ServiceExt;

fn tool_call(name: &str, arguments: serde_json::Value) -> ToolCall {
    ToolCall {
        id: Some(format!("call-{name}")),
        name: name.to_string(),
        arguments: match arguments {
            serde_json::Value::Object(map) => map,
            _ => Metadata::new(),
        },
    }
}

// ---- Core memory truncation ----

#[tokio::test]
async fn core_block_is_truncated_to_max_block_size() {
    let harness = TestHarness::builder()
        .with_config(|c| c.memory.max_block_size = 1024)
        .build()
        .await
        .unwrap();
    let agent = harness.create_agent().await.unwrap();

    let stored = harness
        .service
        .set_core_memory(&agent.id, "bio", &"A".repeat(2000))
        .await
        .unwrap();
    assert_eq!(stored.chars().count(), 1024);

    let core = harness.service.core_memory(&agent.id).await.unwrap();
    assert_eq!(core["bio"], "A".repeat(1024));
}

// ---- Recall FIFO bound ----

#[tokio::test]
async fn recall_keeps_only_the_last_max_messages() {
    let harness = TestHarness::builder()
        .with_config(|c| c.memory.max_messages = 3)
        .build()
        .await
        .unwrap();
    let record = harness.create_agent().await.unwrap();
    let agent = harness.service.registry().load(&record.id).await.unwrap();

    for i in 0..5 {
        agent
            .record_outgoing(AgentMessage::new(&record.id, "elsewhere", format!("m{i}")))
            .await
            .unwrap();
    }

    let recent = harness.service.recall(&record.id, 10).await.unwrap();
    let contents: Vec<&str> = recent.iter().map(|m| m.content.as_str()).collect();
    assert_eq!(contents, ["m2", "m3", "m4"]);
}

// ---- Archival round trip ----

#[tokio::test]
async fn archival_insert_then_search_finds_content() {
    let harness = TestHarness::builder().build().await.unwrap();
    let agent = harness.create_agent().await.unwrap();

    harness
        .service
        .insert_archival(&agent.id, "cats are great", Metadata::new())
        .await
        .unwrap();
    harness
        .service
        .insert_archival(&agent.id, "dogs are loyal", Metadata::new())
        .await
        .unwrap();

    let hits = harness
        .service
        .search_archival(&agent.id, "cats", Some(5))
        .await
        .unwrap();
    assert_eq!(hits.len(), 1);
    assert_eq!(hits[0].content, "cats are great");
}

// ---- Search ordering differs between tiers ----

#[tokio::test]
async fn recall_search_is_newest_first_archival_is_insertion_order() {
    let harness = TestHarness::builder().build().await.unwrap();
    let record = harness.create_agent().await.unwrap();
    let agent = harness.service.registry().load(&record.id).await.unwrap();

    for text in ["note one", "note two", "note three"] {
        agent
            .record_outgoing(AgentMessage::new(&record.id, "elsewhere", text))
            .await
            .unwrap();
        harness
            .service
            .insert_archival(&record.id, text, Metadata::new())
            .await
            .unwrap();
    }

    let recall: Vec<String> = harness
        .service
        .search_recall(&record.id, "note", Some(5))
        .await
        .unwrap()
        .into_iter()
        .map(|m| m.content)
        .collect();
    let archival: Vec<String> = harness
        .service
        .search_archival(&record.id, "note", Some(5))
        .await
        .unwrap()
        .into_iter()
        .map(|i| i.content)
        .collect();

    assert_eq!(recall, ["note three", "note two", "note one"]);
    assert_eq!(archival, ["note one", "note two", "note three"]);
}

// ---- Context overflow never reaches the provider ----

#[tokio::test]
async fn overflow_is_raised_before_generation() {
    let harness = TestHarness::builder()
        .with_max_context(10)
        .build()
        .await
        .unwrap();
    let agent = harness.create_agent().await.unwrap();

    let payload = "an oversized payload ".repeat(50);
    let err = harness.send_message(&agent.id, &payload).await.unwrap_err();
    assert!(
        matches!(err, MnemosError::ContextOverflow { limit: 10, .. }),
        "unexpected error: {err}"
    );
    assert_eq!(harness.mock_provider.generate_calls(), 0);
}

// ---- Tool calls mutate memory and persist ----

#[tokio::test]
async fn tool_call_updates_core_memory_durably() {
    let harness = TestHarness::builder().build().await.unwrap();
    harness
        .mock_provider
        .push_tool_calls(vec![tool_call(
            "core_memory_add",
            serde_json::json!({"key": "human", "value": "Prefers tea"}),
        )])
        .await;
    harness.mock_provider.add_response("Got it.".into()).await;
    let agent = harness.create_agent().await.unwrap();

    let reply = harness.send_message(&agent.id, "I prefer tea").await.unwrap();
    assert_eq!(reply.content, "Got it.");
    assert_eq!(reply.tool_calls, 1);

    let blocks = harness.storage.get_memory_blocks(&agent.id).await.unwrap();
    assert_eq!(blocks.get("human").map(String::as_str), Some("Prefers tea"));

    let stored = harness.storage.get_recent_messages(&agent.id, 10).await.unwrap();
    let kinds: Vec<MessageType> = stored.iter().map(|m| m.message_type).collect();
    assert_eq!(
        kinds,
        [
            MessageType::Text,
            MessageType::ToolCall,
            MessageType::ToolResult,
            MessageType::Text
        ]
    );
}

// ---- Rehydration from storage ----

#[tokio::test]
async fn fresh_service_rehydrates_agent_from_storage() {
    let harness = TestHarness::builder()
        .with_mock_responses(vec!["first reply".to_string()])
        .build()
        .await
        .unwrap();
    let agent = harness.create_agent().await.unwrap();
    harness
        .service
        .set_core_memory(&agent.id, "human", "Ada")
        .await
        .unwrap();
    harness
        .service
        .insert_archival(&agent.id, "Ada builds engines", Metadata::new())
        .await
        .unwrap();
    harness.send_message(&agent.id, "hello").await.unwrap();

    let restarted = AgentService::new(
        &harness.config,
        "mock-model",
        harness.mock_provider.clone(),
        Arc::clone(&harness.storage),
    );
    assert!(!restarted.registry().is_loaded(&agent.id));

    let core = restarted.core_memory(&agent.id).await.unwrap();
    assert_eq!(core["human"], "Ada");
    let hits = restarted
        .search_archival(&agent.id, "engines", None)
        .await
        .unwrap();
    assert_eq!(hits.len(), 1);
    let recall = restarted.recall(&agent.id, 10).await.unwrap();
    let contents: Vec<&str> = recall.iter().map(|m| m.content.as_str()).collect();
    assert_eq!(contents, ["hello", "first reply"]);
}

// ---- Mail between agents ----

#[tokio::test]
async fn mail_is_drained_before_the_next_inbound_message() {
    let harness = TestHarness::builder().build().await.unwrap();
    let alice = harness.create_agent().await.unwrap();
    let bob = harness.create_agent().await.unwrap();

    for text in ["first note", "second note"] {
        harness
            .service
            .send_mail(&alice.id, &bob.id, text, MessageType::Text, Metadata::new())
            .await
            .unwrap();
    }
    harness.send_message(&bob.id, "what's new?").await.unwrap();

    let recall = harness.service.recall(&bob.id, 10).await.unwrap();
    let senders: Vec<&str> = recall.iter().map(|m| m.sender_id.as_str()).collect();
    let contents: Vec<&str> = recall.iter().map(|m| m.content.as_str()).collect();
    assert_eq!(contents[..3], ["first note", "second note", "what's new?"]);
    assert_eq!(senders[..3], [alice.id.as_str(), alice.id.as_str(), "test-user"]);

    let outgoing = harness.service.recall(&alice.id, 10).await.unwrap();
    assert_eq!(outgoing.len(), 2);
}

// ---- HTTP surface over the same service ----

#[tokio::test]
async fn http_unknown_agent_is_404_and_known_agent_answers() {
    let harness = TestHarness::builder()
        .with_mock_responses(vec!["over http".to_string()])
        .build()
        .await
        .unwrap();
    let agent = harness.create_agent().await.unwrap();
    let app = router(GatewayState::new(harness.service.clone()));

    let missing = app
        .clone()
        .oneshot(
            Request::builder()
                .uri("/agents/agent-00000000/memory/core")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(missing.status(), StatusCode::NOT_FOUND);

    let response = app
        .oneshot(
            Request::builder()
                .method("POST")
                .uri(format!("/agents/{}/messages", agent.id))
                .header("content-type", "application/json")
                .body(Body::from(r#"{"content": "ping"}"#))
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    let body: serde_json::Value = serde_json::from_slice(&bytes).unwrap();
    assert_eq!(body["response"], "over http");
}

// ---- Shutdown ----

#[tokio::test]
async fn shutdown_evicts_agents_and_closes_storage() {
    let harness = TestHarness::builder().build().await.unwrap();
    let agent = harness.create_agent().await.unwrap();
    assert!(harness.service.registry().is_loaded(&agent.id));

    mnemos_agent::shutdown::drain_and_close(&harness.service, std::time::Duration::from_secs(5))
        .await
        .unwrap();

    assert!(harness.service.registry().loaded().is_empty());
    assert!(harness.service.health().await.is_err());
}
