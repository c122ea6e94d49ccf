//! Integration tests for the Discord REST client.

use serde_json::json;
use vidrelay::chat::{embed_message, error_embed, ChatTarget, DiscordClient, Embed, MessageRef, RED};
use vidrelay::config::DiscordConfig;
use wiremock::matchers::{
    body_partial_json, body_string_contains, header, method, path, path_regex,
};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn client_for(server: &MockServer) -> DiscordClient {
    let config = DiscordConfig {
        token: Some("test-token".into()),
        api_base: server.uri(),
        ..DiscordConfig::default()
    };
    DiscordClient::new(&config).unwrap()
}

fn created(id: &str) -> ResponseTemplate {
    ResponseTemplate::new(200).set_body_json(json!({
        "id": id,
        "channel_id": "100",
        "content": "",
    }))
}

#[tokio::test]
async fn suppress_embeds_sets_flag() {
    let server = MockServer::start().await;
    Mock::given(method("PATCH"))
        .and(path("/channels/100/messages/200"))
        .and(header("authorization", "Bot test-token"))
        .and(body_partial_json(json!({ "flags": 4 })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({})))
        .expect(1)
        .mount(&server)
        .await;

    let message = client_for(&server).message("100", "200");
    message.suppress_embeds().await.unwrap();
}

#[tokio::test]
async fn reply_text_references_trigger() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/channels/100/messages"))
        .and(body_partial_json(json!({
            "content": "Please wait a moment...",
            "message_reference": { "message_id": "200" },
        })))
        .respond_with(created("300"))
        .expect(1)
        .mount(&server)
        .await;

    let message = client_for(&server).message("100", "200");
    let reply = message.reply_text("Please wait a moment...").await.unwrap();

    assert_eq!(
        reply,
        MessageRef {
            channel_id: "100".into(),
            message_id: "300".into(),
        }
    );
}

#[tokio::test]
async fn replace_with_file_uploads_multipart() {
    let server = MockServer::start().await;
    Mock::given(method("PATCH"))
        .and(path("/channels/100/messages/300"))
        .and(header("authorization", "Bot test-token"))
        .and(body_string_contains("payload_json"))
        .and(body_string_contains("files[0]"))
        .and(body_string_contains("\"content\":null"))
        .and(body_string_contains("video.mp4"))
        .and(body_string_contains("fake-video-bytes"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({})))
        .expect(1)
        .mount(&server)
        .await;

    let dir = tempfile::tempdir().unwrap();
    let file = dir.path().join("video.mp4");
    std::fs::write(&file, b"fake-video-bytes").unwrap();

    let message = client_for(&server).message("100", "200");
    let reply = MessageRef {
        channel_id: "100".into(),
        message_id: "300".into(),
    };
    message.replace_with_file(&reply, &file).await.unwrap();
}

#[tokio::test]
async fn delete_message_removes_reply() {
    let server = MockServer::start().await;
    Mock::given(method("DELETE"))
        .and(path("/channels/100/messages/300"))
        .and(header("authorization", "Bot test-token"))
        .respond_with(ResponseTemplate::new(204))
        .expect(1)
        .mount(&server)
        .await;

    let message = client_for(&server).message("100", "200");
    let reply = MessageRef {
        channel_id: "100".into(),
        message_id: "300".into(),
    };
    message.delete_message(&reply).await.unwrap();
}

#[tokio::test]
async fn error_embed_is_red_reply() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/channels/100/messages"))
        .and(body_partial_json(json!({
            "embeds": [{ "color": RED, "title": "Video requested is longer than 300 seconds" }],
            "message_reference": { "message_id": "200" },
        })))
        .respond_with(created("301"))
        .expect(1)
        .mount(&server)
        .await;

    let message = client_for(&server).message("100", "200");
    let sent = error_embed(&message, "Video requested is longer than 300 seconds")
        .await
        .unwrap();
    assert_eq!(sent.message_id, "301");
}

#[tokio::test]
async fn embed_message_adds_reactions_in_order() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/channels/100/messages"))
        .and(body_partial_json(json!({ "embeds": [{ "title": "poll" }] })))
        .respond_with(created("302"))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("PUT"))
        .and(path_regex(r"^/channels/100/messages/302/reactions/.+/@me$"))
        .respond_with(ResponseTemplate::new(204))
        .expect(2)
        .mount(&server)
        .await;

    let message = client_for(&server).message("100", "200");
    let embed = Embed::default().title("poll");
    let sent = embed_message(&message, &embed, false, &["👍", "👎"])
        .await
        .unwrap();
    assert_eq!(sent.message_id, "302");

    let requests = server.received_requests().await.unwrap();
    let reactions: Vec<String> = requests
        .iter()
        .filter(|r| r.method.as_str() == "PUT")
        .map(|r| r.url.path().to_string())
        .collect();
    assert_eq!(
        reactions,
        vec![
            "/channels/100/messages/302/reactions/%F0%9F%91%8D/@me",
            "/channels/100/messages/302/reactions/%F0%9F%91%8E/@me",
        ]
    );
}

#[tokio::test]
async fn api_errors_carry_status_and_body() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/channels/100/messages"))
        .respond_with(ResponseTemplate::new(403).set_body_string("Missing Permissions"))
        .mount(&server)
        .await;

    let message = client_for(&server).message("100", "200");
    let err = message.reply_text("hi").await.unwrap_err().to_string();

    assert!(err.contains("403"), "{err}");
    assert!(err.contains("Missing Permissions"), "{err}");
}
