//! OpenAIクライアントの結合テスト（モックサーバー使用）

use httpmock::prelude::*;
use return_grader::analyzer::{build_chat_request, ChatModel, GradeOptions, Grader, OpenAiClient};
use return_grader::error::GraderError;
use return_grader::intake::{collect_uploads, AcceptedImage};
use return_grader_common::{GradingMode, ReasonPolicy};
use serde_json::json;
use tempfile::tempdir;

fn write_image(path: &std::path::Path) {
    image::RgbImage::from_pixel(6, 6, image::Rgb([180, 160, 140]))
        .save(path)
        .unwrap();
}

fn completion(content: &str) -> serde_json::Value {
    json!({
        "id": "chatcmpl-test",
        "object": "chat.completion",
        "choices": [{
            "index": 0,
            "message": { "role": "assistant", "content": content },
            "finish_reason": "stop"
        }]
    })
}

#[tokio::test]
async fn test_complete_sends_bearer_and_returns_text() {
    let server = MockServer::start_async().await;
    let mock = server
        .mock_async(|when, then| {
            when.method(POST)
                .path("/v1/chat/completions")
                .header("authorization", "Bearer sk-test")
                .body_contains("\"model\":\"gpt-4o\"")
                .body_contains("You are an AI that assesses returned products for condition.");
            then.status(200).json_body(completion("  {\"ok\": true}  "));
        })
        .await;

    let client = OpenAiClient::new("sk-test", server.url("/v1"), None).unwrap();
    let request = build_chat_request("gpt-4o", GradingMode::Batch, &Vec::<AcceptedImage>::new());
    let text = client.complete(&request).await.unwrap();

    assert_eq!(text, "{\"ok\": true}");
    mock.assert_async().await;
}

#[tokio::test]
async fn test_http_error_is_api_call_error() {
    let server = MockServer::start_async().await;
    server
        .mock_async(|when, then| {
            when.method(POST).path("/v1/chat/completions");
            then.status(429).body("rate limited");
        })
        .await;

    let client = OpenAiClient::new("sk-test", server.url("/v1"), None).unwrap();
    let request = build_chat_request("gpt-4o", GradingMode::Batch, &[]);
    let err = client.complete(&request).await.unwrap_err();

    match err {
        GraderError::ApiCall(msg) => {
            assert!(msg.contains("429"));
            assert!(msg.contains("rate limited"));
        }
        other => panic!("expected ApiCall, got {:?}", other),
    }
}

#[tokio::test]
async fn test_empty_choices_is_parse_error() {
    let server = MockServer::start_async().await;
    server
        .mock_async(|when, then| {
            when.method(POST).path("/v1/chat/completions");
            then.status(200).json_body(json!({ "choices": [] }));
        })
        .await;

    let client = OpenAiClient::new("sk-test", server.url("/v1"), None).unwrap();
    let request = build_chat_request("gpt-4o", GradingMode::Batch, &[]);
    let err = client.complete(&request).await.unwrap_err();

    assert!(matches!(err, GraderError::ApiParse(_)));
}

/// フォルダ → 検証 → 送信 → パースまでの一連の流れ
#[tokio::test]
async fn test_grade_folder_end_to_end() {
    let dir = tempdir().unwrap();
    write_image(&dir.path().join("front.png"));
    write_image(&dir.path().join("side.jpg"));
    std::fs::write(dir.path().join("broken.jpg"), b"truncated upload").unwrap();

    let server = MockServer::start_async().await;
    let mock = server
        .mock_async(|when, then| {
            when.method(POST)
                .path("/v1/chat/completions")
                .body_contains("data:image/png;base64,")
                .body_contains("data:image/jpeg;base64,")
                .body_contains("image_authenticity_reason");
            then.status(200).json_body(completion(
                "```json\n{'condition': 'used', 'reason': 'scuffed box', 'action': 'Sell as Used', \
                 'next_step': 'Send to Refurb (used)', 'image_source': 'phone camera', \
                 'image_authenticity_reason': 'natural sensor noise'}\n```",
            ));
        })
        .await;

    let batch = collect_uploads(&[dir.path().to_path_buf()], false).unwrap();
    assert_eq!(batch.len(), 3);

    let client = OpenAiClient::new("sk-test", server.url("/v1"), None).unwrap();
    let grader = Grader::new(client, "gpt-4o");
    let options = GradeOptions {
        mode: GradingMode::Authenticity,
        reason_policy: ReasonPolicy::MostFrequent,
    };
    let report = grader.grade(batch, &options, |_, _, _| {}).await.unwrap();

    mock.assert_hits_async(1).await;
    assert!(report.invoked);
    assert_eq!(report.accepted, vec!["front.png".to_string(), "side.jpg".to_string()]);
    assert_eq!(report.rejected.len(), 1);
    assert_eq!(report.rejected[0].file_name, "broken.jpg");

    let result = report.batch.unwrap();
    assert_eq!(result.condition, "used");
    assert_eq!(result.action, "Sell as Used");
    assert_eq!(result.image_source.as_deref(), Some("phone camera"));
}

/// 全て不正な画像ならリクエストを送らない
#[tokio::test]
async fn test_no_request_when_all_invalid() {
    let dir = tempdir().unwrap();
    std::fs::write(dir.path().join("a.jpg"), b"nope").unwrap();

    let server = MockServer::start_async().await;
    let mock = server
        .mock_async(|when, then| {
            when.method(POST).path("/v1/chat/completions");
            then.status(200).json_body(completion("{}"));
        })
        .await;

    let batch = collect_uploads(&[dir.path().to_path_buf()], false).unwrap();
    let client = OpenAiClient::new("sk-test", server.url("/v1"), None).unwrap();
    let grader = Grader::new(client, "gpt-4o");
    let report = grader
        .grade(batch, &GradeOptions::default(), |_, _, _| {})
        .await
        .unwrap();

    mock.assert_hits_async(0).await;
    assert!(!report.invoked);
}
