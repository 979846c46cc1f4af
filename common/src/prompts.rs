//! プロンプト生成モジュール
//!
//! - SYSTEM_PROMPT: 全モード共通のシステム指示
//! - build_task_prompt: モード別のタスク説明 + 出力スキーマ

use crate::types::{GradingMode, ACTION_LABELS, CONDITION_LABELS, IMAGE_SOURCE_LABELS, NEXT_STEP_LABELS};

/// システム指示
pub const SYSTEM_PROMPT: &str = "You are an AI that assesses returned products for condition.";

fn quoted_choices(labels: &[&str]) -> String {
    labels
        .iter()
        .map(|l| format!("'{}'", l))
        .collect::<Vec<_>>()
        .join(" | ")
}

/// 出力スキーマ（JSONオブジェクト）
fn schema_block(with_authenticity: bool) -> String {
    let mut lines = vec![
        format!("  'condition': {},", quoted_choices(CONDITION_LABELS)),
        "  'reason': '<short reason>',".to_string(),
        format!("  'action': '{}',", ACTION_LABELS.join(" | ")),
        format!("  'next_step': '{}'", NEXT_STEP_LABELS.join(" | ")),
    ];

    if with_authenticity {
        if let Some(last) = lines.last_mut() {
            last.push(',');
        }
        lines.push(format!("  'image_source': {},", quoted_choices(IMAGE_SOURCE_LABELS)));
        lines.push("  'image_authenticity_reason': '<short reason>'".to_string());
    }

    format!("{{\n{}\n}}", lines.join("\n"))
}

/// タスク説明プロンプト生成
///
/// # Arguments
/// * `mode` - 判定モード
///
/// # Returns
/// 画像と一緒に送るテキストブロック
pub fn build_task_prompt(mode: GradingMode) -> String {
    match mode {
        GradingMode::PerImage => format!(
            "Analyze the product image and determine its return condition:\n\
             - Is the product new, like new, used, or damaged?\n\
             - Are tags or packaging present?\n\
             - Are there visible signs of wear or damage?\n\n\
             Return a JSON object with:\n{}",
            schema_block(false)
        ),
        GradingMode::Batch => format!(
            "Analyze all of the product images together. They show the same returned item \
             from different angles. Determine its overall return condition:\n\
             - Is the product new, like new, used, or damaged?\n\
             - Are tags or packaging present in any image?\n\
             - Are there visible signs of wear or damage in any image?\n\n\
             Return a single JSON object for the whole set with:\n{}",
            schema_block(false)
        ),
        GradingMode::Authenticity => format!(
            "Analyze all of the product images together. They show the same returned item \
             from different angles. Determine its overall return condition:\n\
             - Is the product new, like new, used, or damaged?\n\
             - Are tags or packaging present in any image?\n\
             - Are there visible signs of wear or damage in any image?\n\
             - Do the images look like genuine phone camera photos, AI-generated images, \
             or images taken from the internet?\n\n\
             Return a single JSON object for the whole set with:\n{}",
            schema_block(true)
        ),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_per_image_prompt_matches_schema() {
        let prompt = build_task_prompt(GradingMode::PerImage);
        assert!(prompt.starts_with("Analyze the product image"));
        assert!(prompt.contains("'condition': 'new' | 'like new' | 'used' | 'damaged',"));
        assert!(prompt.contains(
            "'action': 'Sell as New | Sell as Used | Charge Fee | Route to Refurb | Route to Donation',"
        ));
        assert!(prompt.contains("'next_step': 'Send to FC (new) | Send to Refurb (used) | Send to Liquidation (damaged)'\n}"));
        assert!(!prompt.contains("image_source"));
    }

    #[test]
    fn test_batch_prompt_single_object() {
        let prompt = build_task_prompt(GradingMode::Batch);
        assert!(prompt.contains("single JSON object"));
        assert!(!prompt.contains("image_source"));
    }

    #[test]
    fn test_authenticity_prompt_extended_schema() {
        let prompt = build_task_prompt(GradingMode::Authenticity);
        assert!(prompt.contains("'next_step': 'Send to FC (new) | Send to Refurb (used) | Send to Liquidation (damaged)',"));
        assert!(prompt.contains("'image_source': 'phone camera' | 'AI-generated' | 'internet image',"));
        assert!(prompt.trim_end().ends_with("'image_authenticity_reason': '<short reason>'\n}"));
    }
}
