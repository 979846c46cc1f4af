//! 監視モード
//!
//! 指定パスを一定間隔で読み直し、アップロードバッチの内容が
//! 変わったときだけ判定する。一度判定したバッチに戻った場合は
//! キャッシュから結果を返す。

use crate::analyzer::{ChatModel, GradeOptions, Grader, GradingReport, SessionCache};
use crate::error::Result;
use crate::intake::{collect_uploads, UploadBatch};
use std::future::Future;
use std::path::PathBuf;
use std::time::Duration;

/// ポーリング1回の結果
#[derive(Debug)]
pub enum PollOutcome {
    /// 前回と同じバッチ
    Unchanged,
    /// 以前判定したバッチ（キャッシュヒット）
    Cached(GradingReport),
    /// 新しく判定した
    Graded(GradingReport),
}

/// 監視セッションの状態
#[derive(Debug, Default)]
pub struct WatchSession {
    cache: SessionCache,
    last_seen: Option<String>,
}

impl WatchSession {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cache(&self) -> &SessionCache {
        &self.cache
    }

    /// バッチを確認し、必要なら判定する
    ///
    /// 判定に失敗したバッチも「確認済み」として扱い、内容が変わるまで
    /// 再呼び出ししない。
    pub async fn poll<C: ChatModel>(
        &mut self,
        grader: &Grader<C>,
        batch: UploadBatch,
        options: &GradeOptions,
        on_progress: impl Fn(usize, usize, &str),
    ) -> Result<PollOutcome> {
        let fingerprint = batch.fingerprint();

        if self.last_seen.as_deref() == Some(fingerprint.as_str()) {
            return Ok(PollOutcome::Unchanged);
        }
        self.last_seen = Some(fingerprint.clone());

        if let Some(report) = self.cache.get(&fingerprint) {
            tracing::debug!("キャッシュヒット: {}", &fingerprint[..12]);
            return Ok(PollOutcome::Cached(report.clone()));
        }

        let report = grader.grade(batch, options, on_progress).await?;
        self.cache.insert(report.clone());
        Ok(PollOutcome::Graded(report))
    }
}

/// 監視設定
#[derive(Debug, Clone)]
pub struct WatchOptions {
    pub paths: Vec<PathBuf>,
    pub recursive: bool,
    pub interval: Duration,
    pub grade: GradeOptions,
}

/// Ctrl-Cまで監視を続ける
pub async fn run_watch<C: ChatModel>(
    grader: &Grader<C>,
    options: &WatchOptions,
    render: impl Fn(&GradingReport),
) -> Result<()> {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!("Ctrl-Cを待ち受けできません: {}", e);
            std::future::pending::<()>().await;
        }
    };
    run_watch_until(grader, options, render, ctrl_c).await
}

/// `shutdown` が完了するまで監視を続ける
///
/// 判定中に `shutdown` が完了した場合は、進行中のモデル呼び出しを破棄して戻る。
pub async fn run_watch_until<C: ChatModel>(
    grader: &Grader<C>,
    options: &WatchOptions,
    render: impl Fn(&GradingReport),
    shutdown: impl Future<Output = ()>,
) -> Result<()> {
    tokio::pin!(shutdown);
    let mut session = WatchSession::new();
    let mut ticker = tokio::time::interval(options.interval);

    loop {
        tokio::select! {
            _ = &mut shutdown => break,
            _ = ticker.tick() => {}
        }

        let batch = match collect_uploads(&options.paths, options.recursive) {
            Ok(batch) => batch,
            Err(e) => {
                tracing::debug!("画像を収集できません: {}", e);
                continue;
            }
        };

        let progress = |i: usize, n: usize, name: &str| {
            tracing::info!("[{}/{}] 判定中: {}", i, n, name);
        };
        let outcome = tokio::select! {
            _ = &mut shutdown => break,
            outcome = session.poll(grader, batch, &options.grade, progress) => outcome,
        };

        match outcome {
            Ok(PollOutcome::Unchanged) => {}
            Ok(PollOutcome::Cached(report)) => {
                tracing::info!("以前の判定結果を表示します");
                render(&report);
            }
            Ok(PollOutcome::Graded(report)) => render(&report),
            Err(e) => tracing::error!("判定に失敗しました: {}", e),
        }
    }

    tracing::info!("監視を終了します (判定済みバッチ {}件)", session.cache().len());
    Ok(())
}
