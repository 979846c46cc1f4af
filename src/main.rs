use anyhow::Context;
use clap::Parser;
use indicatif::{ProgressBar, ProgressStyle};
use return_grader::analyzer::{GradeOptions, Grader, GradingReport, OpenAiClient};
use return_grader::cli::{Cli, Commands, OutputFormat};
use return_grader::config::{Config, API_KEY_ENV};
use return_grader::{intake, logging, report, watch};
use return_grader_common::GradingMode;
use std::time::Duration;

fn print_report(report: &GradingReport, format: OutputFormat) {
    if let Err(e) = report::write_report(&mut std::io::stdout().lock(), report, format) {
        tracing::error!("結果を出力できません: {}", e);
    }
}

/// 進捗・状態表示（JSON出力時は標準エラーへ）
fn status(format: OutputFormat, message: impl std::fmt::Display) {
    if format.status_to_stderr() {
        eprintln!("{}", message);
    } else {
        println!("{}", message);
    }
}

fn progress_bar(mode: GradingMode, total: usize) -> ProgressBar {
    let pb = if mode.is_batch() {
        ProgressBar::new_spinner()
    } else {
        ProgressBar::new(total as u64)
    };
    pb.set_style(
        ProgressStyle::with_template("{spinner} [{pos}/{len}] {msg}")
            .unwrap_or_else(|_| ProgressStyle::default_bar()),
    );
    pb.enable_steady_tick(Duration::from_millis(120));
    pb
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    logging::init_cli_logger(cli.verbose);
    // config コマンドでは壊れた設定も既定値として読む
    let config = match cli.command {
        Commands::Config { .. } => Config::load_or_default()?,
        _ => Config::load()?,
    };

    match cli.command {
        Commands::Grade { paths, mode, format, output, reason_policy, recursive } => {
            let options = GradeOptions {
                mode: mode.unwrap_or(config.default_mode),
                reason_policy,
            };
            status(
                format,
                format!("🎯 return-grader - 返品コンディション判定 ({})\n", options.mode),
            );

            // 1. 画像の受け付け
            status(format, "[1/3] 画像を読み込み中...");
            let batch = intake::collect_uploads(&paths, recursive)?;
            status(format, format!("✔ {}枚の画像を検出\n", batch.len()));

            // 2. AI判定
            status(format, "[2/3] AI判定中...");
            let client = OpenAiClient::from_config(&config)?;
            let grader = Grader::new(client, config.model.clone());
            let pb = progress_bar(options.mode, batch.len());
            logging::attach_progress_bar(&pb);
            let result = grader
                .grade(batch, &options, |current, total, message| {
                    pb.set_length(total as u64);
                    pb.set_position(current as u64);
                    pb.set_message(message.to_string());
                })
                .await;
            logging::detach_progress_bar();
            pb.finish_and_clear();
            let graded = result?;
            status(format, "✔ 判定完了\n");

            // 3. 結果表示
            status(format, "[3/3] 結果");
            print_report(&graded, format);

            if let Some(output) = output {
                let json = report::render_json(&graded)?;
                std::fs::write(&output, json)
                    .with_context(|| format!("write {}", output.display()))?;
                status(format, format!("✔ 結果を保存: {}", output.display()));
            }
        }

        Commands::Watch { paths, mode, format, reason_policy, interval, recursive } => {
            let options = watch::WatchOptions {
                paths,
                recursive,
                interval: Duration::from_secs(interval.max(1)),
                grade: GradeOptions {
                    mode: mode.unwrap_or(config.default_mode),
                    reason_policy,
                },
            };
            status(
                format,
                format!(
                    "👀 return-grader - 監視中 ({}、{}秒間隔、Ctrl-Cで終了)\n",
                    options.grade.mode,
                    options.interval.as_secs()
                ),
            );

            let client = OpenAiClient::from_config(&config)?;
            let grader = Grader::new(client, config.model.clone());
            watch::run_watch(&grader, &options, |report| print_report(report, format)).await?;
        }

        Commands::Config { set_api_key, prompt_api_key, set_model, set_api_base, show } => {
            let mut config = config;

            if let Some(key) = set_api_key {
                config.set_api_key(key)?;
                println!("✔ APIキーを設定しました");
            }

            if prompt_api_key {
                let key: String = dialoguer::Password::new()
                    .with_prompt("OpenAI APIキー")
                    .interact()?;
                config.set_api_key(key)?;
                println!("✔ APIキーを設定しました");
            }

            if let Some(model) = set_model {
                config.model = model;
                config.save()?;
                println!("✔ モデルを設定しました: {}", config.model);
            }

            if let Some(api_base) = set_api_base {
                config.api_base = api_base;
                config.save()?;
                println!("✔ APIベースURLを設定しました: {}", config.api_base);
            }

            if show {
                let key_state = if std::env::var(API_KEY_ENV).is_ok() {
                    format!("環境変数 {}", API_KEY_ENV)
                } else if config.api_key.is_some() {
                    "設定済み".to_string()
                } else {
                    "未設定".to_string()
                };

                println!("設定: {}", Config::config_path()?.display());
                println!("  モデル: {}", config.model);
                println!("  APIベースURL: {}", config.api_base);
                println!("  判定モード: {}", config.default_mode);
                println!(
                    "  タイムアウト: {}",
                    config
                        .timeout_seconds
                        .map(|s| format!("{}秒", s))
                        .unwrap_or_else(|| "なし".to_string())
                );
                println!("  APIキー: {}", key_state);
            }
        }
    }

    Ok(())
}
