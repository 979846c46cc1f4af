//! 判定処理
//!
//! 検証 → (画像ごと / バッチ単位で) モデル呼び出し → 応答パース → 多数決
//!
//! 有効な画像が1枚もない場合はモデルを呼び出さない。

pub mod cache;
mod openai;
mod types;

pub use cache::SessionCache;
pub use openai::{
    build_chat_request, ChatMessage, ChatModel, ChatRequest, ContentPart, ImageUrl, MessageContent,
    OpenAiClient,
};
pub use types::GradingReport;

use crate::error::{GraderError, Result};
use crate::intake::{validate_batch, UploadBatch};
use return_grader_common::{
    build_consensus, try_parse_grading_response, FileGrade, GradingMode, ReasonPolicy,
};

/// 判定オプション
#[derive(Debug, Clone, Copy, Default)]
pub struct GradeOptions {
    pub mode: GradingMode,
    pub reason_policy: ReasonPolicy,
}

pub struct Grader<C> {
    client: C,
    model: String,
}

impl<C: ChatModel> Grader<C> {
    pub fn new(client: C, model: impl Into<String>) -> Self {
        Self {
            client,
            model: model.into(),
        }
    }

    pub fn client(&self) -> &C {
        &self.client
    }

    pub fn model(&self) -> &str {
        &self.model
    }

    /// バッチを判定
    ///
    /// # Arguments
    /// * `batch` - アップロードバッチ
    /// * `options` - モードと代表理由の選び方
    /// * `on_progress` - 進捗コールバック (current, total, message)
    ///
    /// API呼び出しの失敗はそのままエラーとして返す（リトライしない）。
    pub async fn grade(
        &self,
        batch: UploadBatch,
        options: &GradeOptions,
        on_progress: impl Fn(usize, usize, &str),
    ) -> Result<GradingReport> {
        let mut report = GradingReport::new(options.mode, batch.fingerprint());

        // デコードはブロッキングスレッドで行う
        let validated = tokio::task::spawn_blocking(move || validate_batch(batch))
            .await
            .map_err(|e| GraderError::ImageLoad(format!("画像の検証に失敗しました: {}", e)))?;
        report.rejected = validated.rejected.clone();
        report.accepted = validated.accepted.iter().map(|a| a.file_name.clone()).collect();

        if validated.is_empty() {
            tracing::warn!("有効な画像がないためモデルを呼び出しません");
            return Ok(report);
        }

        report.invoked = true;

        if options.mode.is_batch() {
            on_progress(1, 1, "バッチ判定中...");
            let request = build_chat_request(&self.model, options.mode, &validated.accepted);
            let text = self.client.complete(&request).await?;

            match try_parse_grading_response(&text) {
                Ok(result) => report.batch = Some(result),
                Err(e) => {
                    tracing::warn!("バッチ判定の応答を解釈できません: {}", e);
                    report.unparsed += 1;
                }
            }
        } else {
            let total = validated.accepted.len();
            for (index, image) in validated.accepted.iter().enumerate() {
                on_progress(index + 1, total, &image.file_name);

                let request = build_chat_request(&self.model, options.mode, std::slice::from_ref(image));
                let text = self.client.complete(&request).await?;

                match try_parse_grading_response(&text) {
                    Ok(result) => report.grades.push(FileGrade {
                        file_name: image.file_name.clone(),
                        result,
                    }),
                    Err(e) => {
                        tracing::warn!("{} の応答を解釈できません: {}", image.file_name, e);
                        report.unparsed += 1;
                    }
                }
            }

            report.consensus = build_consensus(&report.grades, options.reason_policy);
        }

        Ok(report)
    }
}
