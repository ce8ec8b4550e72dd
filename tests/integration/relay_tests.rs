//! Relay integration tests against a mock webhook.
//!
//! Tests verify:
//! - Envelope contents (formData, fileMetadata, binaryFile)
//! - Authorization pass-through
//! - Translation of webhook replies, failures, and timeouts
//! - Malformed input never reaches the webhook

use std::time::Duration;

use axum::body::Body;
use axum::http::{HeaderValue, Request, StatusCode};
use http_body_util::BodyExt;
use serde_json::{json, Value};
use tower::ServiceExt;

use form_relay::error::ForwardError;
use form_relay::relay::{EnvelopePart, RelayService};
use form_relay::server::{create_router, RouterConfig, LIVENESS_MESSAGE};

use super::test_utils::{
    relay_request, relay_request_with_auth, router, router_with,
    send_json, MockBehavior, MockWebhook, MultipartBuilder, TEST_ORIGIN,
};

// =============================================================================
// Envelope Contents
// =============================================================================

#[tokio::test]
async fn test_single_field_and_file_relayed() {
    let webhook = MockWebhook::ok_json();
    let photo = vec![0xABu8; 1024];
    let body = MultipartBuilder::new()
        .text("name", "Alice")
        .file("photo", Some("photo.png"), Some("image/png"), &photo)
        .build();

    let (status, reply) = send_json(router(webhook.clone()), relay_request(body)).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(reply, json!({"received": true}));

    let calls = webhook.calls();
    assert_eq!(calls.len(), 1);
    let envelope = &calls[0].envelope;

    assert_eq!(envelope.form_data(), Some(r#"{"name":"Alice"}"#));
    assert_eq!(
        envelope.metadata_parts(),
        [r#"{"originalName":"photo.png","mimeType":"image/png","size":1024,"fieldName":"photo","index":0}"#]
    );

    let binaries = envelope.binary_parts();
    assert_eq!(binaries.len(), 1);
    match binaries[0] {
        EnvelopePart::Binary { data, .. } => assert_eq!(data.as_ref(), photo.as_slice()),
        other => panic!("expected binary part, got {:?}", other),
    }
}

#[tokio::test]
async fn test_fields_keep_first_value_and_every_key() {
    let webhook = MockWebhook::ok_json();
    let body = MultipartBuilder::new()
        .text("email", "alice@example.com")
        .text("topic", "billing")
        .text("topic", "support")
        .text("message", "")
        .build();

    let (status, _) = send_json(router(webhook.clone()), relay_request(body)).await;
    assert_eq!(status, StatusCode::OK);

    let form_data: Value =
        serde_json::from_str(webhook.calls()[0].envelope.form_data().unwrap()).unwrap();
    assert_eq!(
        form_data,
        json!({"email": "alice@example.com", "topic": "billing", "message": ""})
    );
}

#[tokio::test]
async fn test_file_defaults_and_per_key_indexes() {
    let webhook = MockWebhook::ok_json();
    let body = MultipartBuilder::new()
        .file("docs", Some("a.pdf"), Some("application/pdf"), b"aaa")
        .file("docs", None, Some("text/csv"), b"b,c")
        .file("avatar", Some("me.jpg"), None, b"jpeg")
        .build();

    let (status, _) = send_json(router(webhook.clone()), relay_request(body)).await;
    assert_eq!(status, StatusCode::OK);

    let envelope = webhook.calls()[0].envelope.clone();
    let metadata: Vec<Value> = envelope
        .metadata_parts()
        .iter()
        .map(|m| serde_json::from_str(m).unwrap())
        .collect();

    assert_eq!(metadata.len(), 3);
    assert_eq!(envelope.binary_parts().len(), 3);

    assert_eq!(metadata[0]["originalName"], "a.pdf");
    assert_eq!(metadata[0]["index"], 0);

    assert_eq!(metadata[1]["originalName"], "file-1");
    assert_eq!(metadata[1]["mimeType"], "text/csv");
    assert_eq!(metadata[1]["fieldName"], "docs");
    assert_eq!(metadata[1]["index"], 1);
    assert_eq!(metadata[1]["size"], 3);

    assert_eq!(metadata[2]["originalName"], "me.jpg");
    assert_eq!(metadata[2]["mimeType"], "application/octet-stream");
    assert_eq!(metadata[2]["fieldName"], "avatar");
    assert_eq!(metadata[2]["index"], 0);

    // form data stays empty when only files are sent
    assert_eq!(envelope.form_data(), Some("{}"));
}

#[tokio::test]
async fn test_metadata_pairs_with_binary_in_order() {
    let webhook = MockWebhook::ok_json();
    let body = MultipartBuilder::new()
        .file("upload", Some("one.txt"), Some("text/plain"), b"1")
        .file("upload", Some("two.txt"), Some("text/plain"), b"22")
        .build();

    send_json(router(webhook.clone()), relay_request(body)).await;

    let envelope = webhook.calls()[0].envelope.clone();
    for (meta, binary) in envelope.metadata_parts().iter().zip(envelope.binary_parts()) {
        let meta: Value = serde_json::from_str(meta).unwrap();
        match binary {
            EnvelopePart::Binary {
                file_name, data, ..
            } => {
                assert_eq!(meta["originalName"], file_name.as_str());
                assert_eq!(meta["size"], data.len() as u64);
            }
            other => panic!("expected binary part, got {:?}", other),
        }
    }
}

// =============================================================================
// Authorization
// =============================================================================

#[tokio::test]
async fn test_authorization_forwarded_verbatim() {
    let webhook = MockWebhook::ok_json();
    let value = HeaderValue::from_bytes(b"Bearer  tok\xe9n==").unwrap();
    let body = MultipartBuilder::new().text("a", "b").build();

    let (status, _) = send_json(
        router(webhook.clone()),
        relay_request_with_auth(body, value.clone()),
    )
    .await;
    assert_eq!(status, StatusCode::OK);

    let forwarded = webhook.calls()[0].authorization.clone().unwrap();
    assert_eq!(forwarded.as_bytes(), value.as_bytes());
}

#[tokio::test]
async fn test_absent_authorization_not_forwarded() {
    let webhook = MockWebhook::ok_json();
    let body = MultipartBuilder::new().text("a", "b").build();

    send_json(router(webhook.clone()), relay_request(body)).await;

    assert!(webhook.calls()[0].authorization.is_none());
}

// =============================================================================
// Reply Translation
// =============================================================================

#[tokio::test]
async fn test_success_reply_mirrored_with_200() {
    let webhook = MockWebhook::replying(StatusCode::CREATED, r#"{"id":42,"tags":["a"]}"#);
    let body = MultipartBuilder::new().text("a", "b").build();

    let (status, reply) = send_json(router(webhook), relay_request(body)).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(reply, json!({"id": 42, "tags": ["a"]}));
}

#[tokio::test]
async fn test_webhook_error_status_propagated() {
    let webhook = MockWebhook::replying(StatusCode::UNPROCESSABLE_ENTITY, "bad request");
    let body = MultipartBuilder::new().text("a", "b").build();

    let (status, reply) = send_json(router(webhook), relay_request(body)).await;

    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    assert_eq!(
        reply,
        json!({"error": "N8N webhook error: 422", "details": "bad request"})
    );
}

#[tokio::test]
async fn test_non_json_success_reply_is_request_failure() {
    let webhook = MockWebhook::replying(StatusCode::OK, "Workflow was started");
    let body = MultipartBuilder::new().text("a", "b").build();

    let (status, reply) = send_json(router(webhook), relay_request(body)).await;

    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(reply["error"], "Failed to process request");
    assert!(reply["message"].as_str().unwrap().contains("invalid JSON"));
}

#[tokio::test]
async fn test_transport_failure_is_500() {
    let webhook = MockWebhook::new(MockBehavior::Fail(ForwardError::Transport(
        "connection refused".to_string(),
    )));
    let body = MultipartBuilder::new().text("a", "b").build();

    let (status, reply) = send_json(router(webhook), relay_request(body)).await;

    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(
        reply,
        json!({"error": "Failed to process request", "message": "connection refused"})
    );
}

#[tokio::test]
async fn test_envelope_failure_is_form_processing_error() {
    let webhook = MockWebhook::new(MockBehavior::Fail(ForwardError::Envelope(
        "bad mime".to_string(),
    )));
    let body = MultipartBuilder::new().text("a", "b").build();

    let (status, reply) = send_json(router(webhook), relay_request(body)).await;

    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(
        reply,
        json!({"error": "Failed to process form data", "message": "bad mime"})
    );
}

#[tokio::test]
async fn test_ceiling_cancels_hanging_call() {
    let webhook = MockWebhook::new(MockBehavior::Hang);
    let body = MultipartBuilder::new().text("a", "b").build();

    let (status, reply) = send_json(
        router_with(webhook.clone(), Duration::from_millis(50)),
        relay_request(body),
    )
    .await;

    assert_eq!(status, StatusCode::GATEWAY_TIMEOUT);
    assert_eq!(
        reply,
        json!({
            "error": "Gateway Timeout",
            "message": "The request took too long to process. Your data may still be processing."
        })
    );
    assert_eq!(webhook.call_count(), 1);
    assert!(webhook.was_cancelled(), "in-flight call should be dropped");
}

#[tokio::test]
async fn test_panic_caught_as_form_processing_error() {
    let webhook = MockWebhook::new(MockBehavior::Panic);
    let body = MultipartBuilder::new().text("a", "b").build();

    let (status, reply) = send_json(router(webhook), relay_request(body)).await;

    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(reply["error"], "Failed to process form data");
    assert_eq!(reply["message"], "mock webhook panicked");
}

// =============================================================================
// Malformed Input
// =============================================================================

#[tokio::test]
async fn test_truncated_multipart_is_400_without_forwarding() {
    let webhook = MockWebhook::ok_json();
    let body = b"--relay-test-boundary\r\nContent-Disposition: form-data; name=\"a\"\r\n".to_vec();

    let (status, reply) = send_json(router(webhook.clone()), relay_request(body)).await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(reply, json!({"error": "Invalid form data"}));
    assert_eq!(webhook.call_count(), 0);
}

#[tokio::test]
async fn test_non_multipart_content_type_is_400() {
    let webhook = MockWebhook::ok_json();
    let request = Request::builder()
        .method("POST")
        .uri("/request")
        .header("content-type", "application/json")
        .body(Body::from(r#"{"name":"Alice"}"#))
        .unwrap();

    let (status, reply) = send_json(router(webhook.clone()), request).await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(reply["error"], "Invalid form data");
    assert_eq!(webhook.call_count(), 0);
}

#[tokio::test]
async fn test_missing_boundary_is_400() {
    let webhook = MockWebhook::ok_json();
    let request = Request::builder()
        .method("POST")
        .uri("/request")
        .header("content-type", "multipart/form-data")
        .body(Body::from("irrelevant"))
        .unwrap();

    let (status, _) = send_json(router(webhook.clone()), request).await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(webhook.call_count(), 0);
}

#[tokio::test]
async fn test_oversized_body_is_413() {
    let webhook = MockWebhook::ok_json();
    let relay = RelayService::new(webhook.clone());
    let router = create_router(
        relay,
        RouterConfig::new(TEST_ORIGIN)
            .with_max_body_size(256)
            .with_tracing(false),
    );

    let body = MultipartBuilder::new()
        .file("big", Some("big.bin"), None, &[0u8; 4096])
        .build();

    let (status, reply) = send_json(router, relay_request(body)).await;

    assert_eq!(status, StatusCode::PAYLOAD_TOO_LARGE);
    assert_eq!(reply["error"], "Payload too large");
    assert_eq!(webhook.call_count(), 0);
}

// =============================================================================
// Other Routes
// =============================================================================

#[tokio::test]
async fn test_liveness() {
    let request = Request::builder().uri("/").body(Body::empty()).unwrap();

    let response = router(MockWebhook::ok_json())
        .oneshot(request)
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let body = response.into_body().collect().await.unwrap().to_bytes();
    assert_eq!(body.as_ref(), LIVENESS_MESSAGE.as_bytes());
}

#[tokio::test]
async fn test_unknown_route_is_404() {
    let request = Request::builder()
        .uri("/nope")
        .body(Body::empty())
        .unwrap();

    let (status, reply) = send_json(router(MockWebhook::ok_json()), request).await;

    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(reply["error"], "Not found");
}
