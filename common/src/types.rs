//! 判定結果の型定義
//!
//! - GradingResult: モデルが返す1件の判定
//! - FileGrade: 画像ごとの判定（per-imageモード）
//! - Consensus: 複数画像の多数決結果
//! - GradingMode: 判定モード（プロンプト版）

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// コンディション区分
pub const CONDITION_LABELS: &[&str] = &["new", "like new", "used", "damaged"];

/// 推奨アクション
pub const ACTION_LABELS: &[&str] = &[
    "Sell as New",
    "Sell as Used",
    "Charge Fee",
    "Route to Refurb",
    "Route to Donation",
];

/// 次工程
pub const NEXT_STEP_LABELS: &[&str] = &[
    "Send to FC (new)",
    "Send to Refurb (used)",
    "Send to Liquidation (damaged)",
];

/// 画像の出所
pub const IMAGE_SOURCE_LABELS: &[&str] = &["phone camera", "AI-generated", "internet image"];

/// モデルが返す判定結果
///
/// 値はモデルが出力した文字列のまま保持する（ラベル集合との照合はしない）。
/// 必須キーが欠けた応答はパース失敗として扱われる。
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GradingResult {
    pub condition: String,
    pub reason: String,
    pub action: String,
    pub next_step: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image_source: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image_authenticity_reason: Option<String>,
}

impl GradingResult {
    /// コンディションを区分に変換（未知のラベルはNone）
    pub fn grade(&self) -> Option<ConditionGrade> {
        self.condition.parse().ok()
    }
}

/// コンディション区分
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ConditionGrade {
    New,
    LikeNew,
    Used,
    Damaged,
}

impl ConditionGrade {
    pub fn label(&self) -> &'static str {
        match self {
            ConditionGrade::New => "new",
            ConditionGrade::LikeNew => "like new",
            ConditionGrade::Used => "used",
            ConditionGrade::Damaged => "damaged",
        }
    }
}

impl FromStr for ConditionGrade {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().replace(['-', '_'], " ").as_str() {
            "new" => Ok(ConditionGrade::New),
            "like new" => Ok(ConditionGrade::LikeNew),
            "used" => Ok(ConditionGrade::Used),
            "damaged" => Ok(ConditionGrade::Damaged),
            _ => Err(format!("Unknown condition: {}", s)),
        }
    }
}

impl fmt::Display for ConditionGrade {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// 画像ごとの判定結果
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FileGrade {
    pub file_name: String,
    pub result: GradingResult,
}

/// 多数決による最終判定
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Consensus {
    pub condition: String,
    pub reason: String,
    pub action: String,
    pub next_step: String,
    /// 集計に使った判定数
    pub sample_size: usize,
}

/// 判定モード
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum GradingMode {
    /// 画像ごとに1回呼び出し、多数決で集約
    PerImage,
    /// 全画像をまとめて1回呼び出し
    Batch,
    /// バッチ判定 + 画像の出所推定
    #[default]
    Authenticity,
}

impl GradingMode {
    /// バッチ単位で1回だけ呼び出すモードか
    pub fn is_batch(&self) -> bool {
        !matches!(self, GradingMode::PerImage)
    }
}

impl FromStr for GradingMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "per-image" | "per_image" | "v1" => Ok(GradingMode::PerImage),
            "batch" | "v2" => Ok(GradingMode::Batch),
            "authenticity" | "v3" => Ok(GradingMode::Authenticity),
            _ => Err(format!(
                "Unknown mode: {}. Use per-image, batch, or authenticity",
                s
            )),
        }
    }
}

impl fmt::Display for GradingMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            GradingMode::PerImage => write!(f, "per-image"),
            GradingMode::Batch => write!(f, "batch"),
            GradingMode::Authenticity => write!(f, "authenticity"),
        }
    }
}
