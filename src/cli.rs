use clap::{Parser, Subcommand};
use return_grader_common::{GradingMode, ReasonPolicy};
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "return-grader")]
#[command(about = "返品商品写真のAIコンディション判定ツール", long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// 詳細ログを出力
    #[arg(short, long, global = true)]
    pub verbose: bool,
}

#[derive(Subcommand)]
pub enum Commands {
    /// 画像を判定して結果を表示
    Grade {
        /// 画像ファイルまたはフォルダ
        #[arg(required = true)]
        paths: Vec<PathBuf>,

        /// 判定モード (per-image/batch/authenticity、省略時は設定値)
        #[arg(short, long)]
        mode: Option<GradingMode>,

        /// 表示形式 (text/json)
        #[arg(short, long, default_value = "text")]
        format: OutputFormat,

        /// 結果JSONの保存先
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// 代表理由の選び方 (most-frequent/match-condition)
        #[arg(long, default_value = "most-frequent")]
        reason_policy: ReasonPolicy,

        /// サブフォルダも再帰的にスキャン
        #[arg(short = 'r', long)]
        recursive: bool,
    },

    /// フォルダを監視し、内容が変わったら再判定
    Watch {
        /// 画像ファイルまたはフォルダ
        #[arg(required = true)]
        paths: Vec<PathBuf>,

        /// 判定モード (per-image/batch/authenticity、省略時は設定値)
        #[arg(short, long)]
        mode: Option<GradingMode>,

        /// 表示形式 (text/json)
        #[arg(short, long, default_value = "text")]
        format: OutputFormat,

        /// 代表理由の選び方 (most-frequent/match-condition)
        #[arg(long, default_value = "most-frequent")]
        reason_policy: ReasonPolicy,

        /// 確認間隔（秒）
        #[arg(short, long, default_value = "2")]
        interval: u64,

        /// サブフォルダも再帰的にスキャン
        #[arg(short = 'r', long)]
        recursive: bool,
    },

    /// 設定を表示/編集
    Config {
        /// APIキーを設定
        #[arg(long)]
        set_api_key: Option<String>,

        /// APIキーを対話入力で設定
        #[arg(long)]
        prompt_api_key: bool,

        /// モデル名を設定
        #[arg(long)]
        set_model: Option<String>,

        /// APIベースURLを設定
        #[arg(long)]
        set_api_base: Option<String>,

        /// 設定を表示
        #[arg(long)]
        show: bool,
    },
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum OutputFormat {
    #[default]
    Text,
    Json,
}

impl OutputFormat {
    /// 進捗・状態表示を標準エラーに出すか（JSON時は標準出力をJSON専用にする）
    pub fn status_to_stderr(self) -> bool {
        self == OutputFormat::Json
    }
}

impl std::str::FromStr for OutputFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "text" | "txt" => Ok(OutputFormat::Text),
            "json" => Ok(OutputFormat::Json),
            _ => Err(format!("Unknown format: {}. Use text or json", s)),
        }
    }
}
