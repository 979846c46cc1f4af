//! 返品商品写真のAIコンディション判定
//!
//! 画像の受け付け・検証、Data URL化、OpenAI互換APIの呼び出し、
//! 応答パースと多数決集約、結果表示。

pub mod analyzer;
pub mod cli;
pub mod config;
pub mod encoder;
pub mod error;
pub mod intake;
pub mod logging;
pub mod report;
pub mod watch;
