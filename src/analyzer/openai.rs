//! OpenAI Chat Completions 連携
//!
//! システム指示 + (タスク説明テキスト, 画像Data URL...) のメッセージを送信し、
//! 先頭choiceのテキストを返す。リトライは行わない。

use crate::config::Config;
use crate::encoder::to_data_url;
use crate::error::{GraderError, Result};
use crate::intake::AcceptedImage;
use async_trait::async_trait;
use return_grader_common::{build_task_prompt, GradingMode, SYSTEM_PROMPT};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::time::Duration;

/// Chat Completions リクエスト
#[derive(Debug, Clone, Serialize)]
pub struct ChatRequest {
    pub model: String,
    pub messages: Vec<ChatMessage>,
}

#[derive(Debug, Clone, Serialize)]
pub struct ChatMessage {
    pub role: String,
    pub content: MessageContent,
}

#[derive(Debug, Clone, Serialize)]
#[serde(untagged)]
pub enum MessageContent {
    Text(String),
    Parts(Vec<ContentPart>),
}

#[derive(Debug, Clone, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ContentPart {
    Text { text: String },
    ImageUrl { image_url: ImageUrl },
}

#[derive(Debug, Clone, Serialize)]
pub struct ImageUrl {
    pub url: String,
}

impl ChatRequest {
    /// 送信する画像のData URL
    pub fn image_urls(&self) -> Vec<&str> {
        self.messages
            .iter()
            .filter_map(|m| match &m.content {
                MessageContent::Parts(parts) => Some(parts),
                MessageContent::Text(_) => None,
            })
            .flatten()
            .filter_map(|p| match p {
                ContentPart::ImageUrl { image_url } => Some(image_url.url.as_str()),
                ContentPart::Text { .. } => None,
            })
            .collect()
    }
}

/// Chat Completions レスポンス
#[derive(Debug, Deserialize)]
struct ChatResponse {
    #[serde(default)]
    choices: Vec<Choice>,
}

#[derive(Debug, Deserialize)]
struct Choice {
    message: ResponseMessage,
}

#[derive(Debug, Deserialize)]
struct ResponseMessage {
    content: Option<String>,
}

/// リクエスト構築
pub fn build_chat_request(model: &str, mode: GradingMode, images: &[AcceptedImage]) -> ChatRequest {
    let mut parts = vec![ContentPart::Text {
        text: build_task_prompt(mode),
    }];

    parts.extend(images.iter().map(|img| ContentPart::ImageUrl {
        image_url: ImageUrl {
            url: to_data_url(&img.bytes, img.format),
        },
    }));

    ChatRequest {
        model: model.to_string(),
        messages: vec![
            ChatMessage {
                role: "system".into(),
                content: MessageContent::Text(SYSTEM_PROMPT.into()),
            },
            ChatMessage {
                role: "user".into(),
                content: MessageContent::Parts(parts),
            },
        ],
    }
}

/// チャットモデル呼び出し
#[async_trait]
pub trait ChatModel: Send + Sync {
    /// 応答テキストを返す
    async fn complete(&self, request: &ChatRequest) -> Result<String>;
}

/// OpenAI互換エンドポイントのクライアント
#[derive(Clone)]
pub struct OpenAiClient {
    http: reqwest::Client,
    api_base: String,
    api_key: String,
}

// APIキーはログに出さない
impl fmt::Debug for OpenAiClient {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("OpenAiClient")
            .field("api_base", &self.api_base)
            .field("api_key", &"***")
            .finish_non_exhaustive()
    }
}

impl OpenAiClient {
    pub fn new(
        api_key: impl Into<String>,
        api_base: impl Into<String>,
        timeout: Option<Duration>,
    ) -> Result<Self> {
        let mut builder = reqwest::Client::builder();
        if let Some(timeout) = timeout {
            builder = builder.timeout(timeout);
        }

        Ok(Self {
            http: builder.build()?,
            api_base: api_base.into(),
            api_key: api_key.into(),
        })
    }

    pub fn from_config(config: &Config) -> Result<Self> {
        Self::new(
            config.get_api_key()?,
            config.api_base.clone(),
            config.timeout_seconds.map(Duration::from_secs),
        )
    }

    fn endpoint(&self) -> String {
        format!("{}/chat/completions", self.api_base.trim_end_matches('/'))
    }
}

#[async_trait]
impl ChatModel for OpenAiClient {
    async fn complete(&self, request: &ChatRequest) -> Result<String> {
        let url = self.endpoint();
        tracing::debug!("POST {} (画像 {}枚)", url, request.image_urls().len());

        let response = self
            .http
            .post(&url)
            .bearer_auth(&self.api_key)
            .json(request)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(GraderError::ApiCall(format!("HTTP {}: {}", status, body)));
        }

        let payload: ChatResponse = response
            .json()
            .await
            .map_err(|e| GraderError::ApiParse(e.to_string()))?;

        let text = payload
            .choices
            .into_iter()
            .next()
            .and_then(|c| c.message.content)
            .map(|s| s.trim().to_string())
            .ok_or_else(|| GraderError::ApiParse("応答にテキストがありません".into()))?;

        tracing::debug!("応答 {} chars", text.len());
        Ok(text)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::ImageFormat;
    use std::path::PathBuf;

    fn accepted(name: &str, format: ImageFormat) -> AcceptedImage {
        AcceptedImage {
            file_name: name.to_string(),
            path: PathBuf::from(name),
            bytes: b"abc".to_vec(),
            format,
        }
    }

    #[test]
    fn test_build_chat_request_shape() {
        let images = vec![accepted("a.jpg", ImageFormat::Jpeg), accepted("b.png", ImageFormat::Png)];
        let request = build_chat_request("gpt-4o", GradingMode::Batch, &images);

        let json = serde_json::to_value(&request).unwrap();
        assert_eq!(json["model"], "gpt-4o");
        assert_eq!(json["messages"][0]["role"], "system");
        assert_eq!(json["messages"][0]["content"], SYSTEM_PROMPT);
        assert_eq!(json["messages"][1]["role"], "user");

        let content = json["messages"][1]["content"].as_array().unwrap();
        assert_eq!(content.len(), 3);
        assert_eq!(content[0]["type"], "text");
        assert!(content[0]["text"].as_str().unwrap().contains("single JSON object"));
        assert_eq!(content[1]["type"], "image_url");
        assert_eq!(content[1]["image_url"]["url"], "data:image/jpeg;base64,YWJj");
        assert_eq!(content[2]["image_url"]["url"], "data:image/png;base64,YWJj");
    }

    #[test]
    fn test_image_urls() {
        let request = build_chat_request("m", GradingMode::PerImage, &[accepted("a.png", ImageFormat::Png)]);
        assert_eq!(request.image_urls(), vec!["data:image/png;base64,YWJj"]);
    }

    #[test]
    fn test_chat_response_deserialize() {
        let json = r#"{"id": "x", "choices": [{"index": 0, "message": {"role": "assistant", "content": "{}"}}]}"#;
        let response: ChatResponse = serde_json::from_str(json).unwrap();
        assert_eq!(response.choices[0].message.content.as_deref(), Some("{}"));
    }

    #[test]
    fn test_endpoint_trims_slash() {
        let client = OpenAiClient::new("k", "http://localhost:1234/v1/", None).unwrap();
        assert_eq!(client.endpoint(), "http://localhost:1234/v1/chat/completions");
    }

    #[test]
    fn test_debug_hides_api_key() {
        let client = OpenAiClient::new("sk-secret-123", "https://api.openai.com/v1", None).unwrap();
        let printed = format!("{:?}", client);

        assert!(!printed.contains("sk-secret-123"));
        assert!(printed.contains("***"));
        assert!(printed.contains("https://api.openai.com/v1"));
    }
}
