//! 判定結果のセッションキャッシュ
//!
//! アップロードバッチのフィンガープリントをキーに判定結果を保持し、
//! 同じバッチに対するモデルの再呼び出しを避ける。
//! メモリ上のみで、プロセス終了とともに破棄される。

use super::types::GradingReport;
use std::collections::HashMap;

#[derive(Debug, Clone, Default)]
pub struct SessionCache {
    /// フィンガープリント → 判定結果
    entries: HashMap<String, GradingReport>,
}

impl SessionCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// キャッシュをルックアップ
    pub fn get(&self, fingerprint: &str) -> Option<&GradingReport> {
        self.entries.get(fingerprint)
    }

    /// キャッシュに追加（同じキーは上書き）
    pub fn insert(&mut self, report: GradingReport) {
        self.entries.insert(report.fingerprint.clone(), report);
    }

    pub fn contains(&self, fingerprint: &str) -> bool {
        self.entries.contains_key(fingerprint)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }
}
