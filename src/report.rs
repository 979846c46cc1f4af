//! 判定結果の表示

use crate::analyzer::GradingReport;
use crate::cli::OutputFormat;
use crate::error::Result;
use return_grader_common::{ConditionGrade, GradingMode, GradingResult};
use std::fmt::Write;

fn condition_icon(result: &GradingResult) -> &'static str {
    match result.grade() {
        Some(ConditionGrade::New) => "🟢",
        Some(ConditionGrade::LikeNew) => "🟢",
        Some(ConditionGrade::Used) => "🟡",
        Some(ConditionGrade::Damaged) => "🔴",
        None => "⚪",
    }
}

fn write_result(out: &mut String, result: &GradingResult, with_authenticity: bool) {
    let _ = writeln!(out, "  Condition: {} {}", condition_icon(result), result.condition);
    let _ = writeln!(out, "  Why it seems {}: {}", result.condition, result.reason);
    let _ = writeln!(out, "  Recommended Action: 🚚 {}", result.action);
    let _ = writeln!(out, "  Next Step: 🏷️ {}", result.next_step);

    if with_authenticity {
        let _ = writeln!(
            out,
            "  Image Source: {}",
            result.image_source.as_deref().unwrap_or("(不明)")
        );
        if let Some(reason) = &result.image_authenticity_reason {
            let _ = writeln!(out, "  Why: {}", reason);
        }
    }
}

/// テキスト形式で描画
pub fn render_text(report: &GradingReport) -> String {
    let mut out = String::new();

    for rejected in &report.rejected {
        let _ = writeln!(out, "⚠ スキップ: {} ({})", rejected.file_name, rejected.reason);
    }
    if !report.rejected.is_empty() {
        out.push('\n');
    }

    if !report.invoked {
        let _ = writeln!(out, "有効な画像がないため判定していません");
        return out;
    }

    let _ = writeln!(out, "📊 AI Grading Results ({})", report.mode);
    let _ = writeln!(out, "{}", "-".repeat(40));

    for grade in &report.grades {
        let _ = writeln!(out, "🖼 {}", grade.file_name);
        write_result(&mut out, &grade.result, false);
        let _ = writeln!(out, "{}", "-".repeat(40));
    }

    if let Some(batch) = &report.batch {
        let _ = writeln!(out, "🖼 {}", report.accepted.join(", "));
        write_result(&mut out, batch, report.mode == GradingMode::Authenticity);
        let _ = writeln!(out, "{}", "-".repeat(40));
    }

    if let Some(consensus) = &report.consensus {
        let _ = writeln!(out, "\n🧠 Final Recommendation Across All Images ({}件)", consensus.sample_size);
        let _ = writeln!(out, "  Final Condition: {}", consensus.condition);
        let _ = writeln!(out, "  Why it seems {}: {}", consensus.condition, consensus.reason);
        let _ = writeln!(out, "  Recommended Action: {}", consensus.action);
        let _ = writeln!(out, "  Next Step: 🏷️ {}", consensus.next_step);
    }

    if report.unparsed > 0 {
        let _ = writeln!(out, "\n⚠ {}件の応答を解析できなかったため表示していません", report.unparsed);
    }

    out
}

/// JSON形式で描画
pub fn render_json(report: &GradingReport) -> serde_json::Result<String> {
    serde_json::to_string_pretty(report)
}

/// 判定結果を書き出す
///
/// JSON形式では判定結果のJSONだけを書く。進捗表示は呼び出し側で
/// `OutputFormat::status_to_stderr` に従って振り分ける。
pub fn write_report<W: std::io::Write>(
    out: &mut W,
    report: &GradingReport,
    format: OutputFormat,
) -> Result<()> {
    match format {
        OutputFormat::Text => write!(out, "{}", render_text(report))?,
        OutputFormat::Json => writeln!(out, "{}", render_json(report)?)?,
    }
    out.flush()?;
    Ok(())
}
