//! 多数決による判定集約（per-imageモード）
//!
//! condition / action / next_step をそれぞれ独立に多数決する。
//! 同数の場合は先に出現した値を採用する。

use crate::types::{Consensus, FileGrade, GradingResult};
use std::collections::HashMap;
use std::hash::Hash;
use std::str::FromStr;

/// 代表理由の選び方
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ReasonPolicy {
    /// 全判定の中で最も多い理由文（採用されたconditionと対応しない場合がある）
    #[default]
    MostFrequent,
    /// 採用されたconditionを持つ判定の中で最も多い理由文
    MatchCondition,
}

impl FromStr for ReasonPolicy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "most-frequent" | "most_frequent" => Ok(ReasonPolicy::MostFrequent),
            "match-condition" | "match_condition" => Ok(ReasonPolicy::MatchCondition),
            _ => Err(format!(
                "Unknown reason policy: {}. Use most-frequent or match-condition",
                s
            )),
        }
    }
}

/// 最頻値を返す（同数は先着順）
///
/// # Examples
/// ```
/// use return_grader_common::majority_vote;
///
/// assert_eq!(majority_vote(["new", "used", "used"]), Some("used"));
/// assert_eq!(majority_vote(["new", "used"]), Some("new"));
/// assert_eq!(majority_vote(Vec::<&str>::new()), None);
/// ```
pub fn majority_vote<T, I>(values: I) -> Option<T>
where
    T: Eq + Hash + Clone,
    I: IntoIterator<Item = T>,
{
    // 値 → (出現数, 初出位置)
    let mut counts: HashMap<T, (usize, usize)> = HashMap::new();
    for (index, value) in values.into_iter().enumerate() {
        counts.entry(value).or_insert((0, index)).0 += 1;
    }

    counts
        .into_iter()
        .max_by(|(_, (count_a, first_a)), (_, (count_b, first_b))| {
            count_a.cmp(count_b).then(first_b.cmp(first_a))
        })
        .map(|(value, _)| value)
}

/// 画像ごとの判定から最終判定を作成
///
/// 判定が1件もない場合はNone
pub fn build_consensus(grades: &[FileGrade], policy: ReasonPolicy) -> Option<Consensus> {
    let results: Vec<&GradingResult> = grades.iter().map(|g| &g.result).collect();

    let condition = majority_vote(results.iter().map(|r| r.condition.as_str()))?;
    let action = majority_vote(results.iter().map(|r| r.action.as_str()))?;
    let next_step = majority_vote(results.iter().map(|r| r.next_step.as_str()))?;

    let reason = match policy {
        ReasonPolicy::MostFrequent => majority_vote(results.iter().map(|r| r.reason.as_str())),
        ReasonPolicy::MatchCondition => majority_vote(
            results
                .iter()
                .filter(|r| r.condition == condition)
                .map(|r| r.reason.as_str()),
        ),
    }?;

    Some(Consensus {
        condition: condition.to_string(),
        reason: reason.to_string(),
        action: action.to_string(),
        next_step: next_step.to_string(),
        sample_size: results.len(),
    })
}
