use crate::intake::RejectedImage;
use return_grader_common::{Consensus, FileGrade, GradingMode, GradingResult};
use serde::Serialize;

/// 1回の判定実行の結果
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GradingReport {
    pub mode: GradingMode,

    /// 判定日時（RFC3339）
    pub graded_at: String,

    /// アップロードバッチのフィンガープリント
    pub fingerprint: String,

    /// モデルに送った画像
    pub accepted: Vec<String>,

    /// 画像ごとの判定（per-imageモード）
    pub grades: Vec<FileGrade>,

    /// バッチ判定（batch / authenticityモード）
    #[serde(skip_serializing_if = "Option::is_none")]
    pub batch: Option<GradingResult>,

    /// 多数決結果（per-imageモード）
    #[serde(skip_serializing_if = "Option::is_none")]
    pub consensus: Option<Consensus>,

    pub rejected: Vec<RejectedImage>,

    /// 解釈できなかった応答の数
    pub unparsed: usize,

    /// モデルを呼び出したか
    pub invoked: bool,
}

impl GradingReport {
    pub fn new(mode: GradingMode, fingerprint: String) -> Self {
        Self {
            mode,
            graded_at: chrono::Utc::now().to_rfc3339(),
            fingerprint,
            accepted: Vec::new(),
            grades: Vec::new(),
            batch: None,
            consensus: None,
            rejected: Vec::new(),
            unparsed: 0,
            invoked: false,
        }
    }

    /// 表示できる判定があるか
    pub fn has_results(&self) -> bool {
        !self.grades.is_empty() || self.batch.is_some()
    }
}
