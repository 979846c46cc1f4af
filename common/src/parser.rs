//! モデル応答パーサー
//!
//! チャット応答からコードフェンスを除去し、判定結果(GradingResult)として
//! 解釈する。モデルの出力形式は保証されないため、シングルクォートや
//! Python風リテラル(True/False/None)、末尾カンマも受け付ける。
//! 解釈できない応答はエラーにせず `None` を返す。

use crate::error::{Error, Result};
use crate::types::GradingResult;
use regex::Regex;

/// コードフェンス(```json / ```)を全て除去してトリム
///
/// # Examples
/// ```
/// use return_grader_common::strip_code_fences;
///
/// let text = "```json\n{\"condition\": \"new\"}\n```";
/// assert_eq!(strip_code_fences(text), "{\"condition\": \"new\"}");
/// ```
pub fn strip_code_fences(response: &str) -> String {
    lazy_static::lazy_static! {
        static ref FENCE_RE: Regex = Regex::new(r"```json|```").unwrap();
    }
    FENCE_RE.replace_all(response, "").trim().to_string()
}

/// 応答をパース（失敗理由付き）
///
/// 1. コードフェンス除去
/// 2. 厳密なJSONとして解釈
/// 3. 失敗時はリテラル表記を正規化して再解釈
pub fn try_parse_grading_response(response: &str) -> Result<GradingResult> {
    let body = strip_code_fences(response);
    if body.is_empty() {
        return Err(Error::Parse("応答が空です".into()));
    }

    match serde_json::from_str::<GradingResult>(&body) {
        Ok(result) => Ok(result),
        Err(strict_err) => {
            let normalized = normalize_literal(&body)?;
            serde_json::from_str::<GradingResult>(&normalized).map_err(|e| {
                Error::Parse(format!("JSONパースエラー: {} (正規化前: {})", e, strict_err))
            })
        }
    }
}

/// 応答をパース（失敗時はNone）
///
/// 判定結果が得られない場合、呼び出し側は表示をスキップする。
pub fn parse_grading_response(response: &str) -> Option<GradingResult> {
    match try_parse_grading_response(response) {
        Ok(result) => Some(result),
        Err(e) => {
            tracing::debug!("応答を判定結果として解釈できません: {}", e);
            None
        }
    }
}

/// Python風リテラルをJSONに正規化
///
/// - '...' → "..."（内部の " はエスケープ、\' はアンエスケープ）
/// - 文字列外の True / False / None → true / false / null
/// - } / ] 直前の末尾カンマを削除
pub fn normalize_literal(text: &str) -> Result<String> {
    #[derive(PartialEq)]
    enum State {
        Code,
        Double,
        Single,
    }

    let chars: Vec<char> = text.chars().collect();
    let mut out = String::with_capacity(text.len() + 8);
    let mut state = State::Code;
    let mut i = 0;

    while i < chars.len() {
        let c = chars[i];
        match state {
            State::Code => match c {
                '"' => {
                    out.push('"');
                    state = State::Double;
                }
                '\'' => {
                    out.push('"');
                    state = State::Single;
                }
                ',' => {
                    let next = chars[i + 1..].iter().find(|ch| !ch.is_whitespace());
                    if !matches!(next, Some('}') | Some(']')) {
                        out.push(',');
                    }
                }
                c if c.is_ascii_alphabetic() => {
                    let start = i;
                    while i + 1 < chars.len() && (chars[i + 1].is_ascii_alphanumeric() || chars[i + 1] == '_') {
                        i += 1;
                    }
                    let word: String = chars[start..=i].iter().collect();
                    out.push_str(match word.as_str() {
                        "True" => "true",
                        "False" => "false",
                        "None" => "null",
                        other => other,
                    });
                }
                _ => out.push(c),
            },
            State::Double => {
                out.push(c);
                match c {
                    '\\' => {
                        if let Some(&next) = chars.get(i + 1) {
                            out.push(next);
                            i += 1;
                        }
                    }
                    '"' => state = State::Code,
                    _ => {}
                }
            }
            State::Single => match c {
                '\\' => {
                    match chars.get(i + 1) {
                        Some('\'') => out.push('\''),
                        Some(&next) => {
                            out.push('\\');
                            out.push(next);
                        }
                        None => break,
                    }
                    i += 1;
                }
                '"' => out.push_str("\\\""),
                '\'' => {
                    out.push('"');
                    state = State::Code;
                }
                _ => out.push(c),
            },
        }
        i += 1;
    }

    if state != State::Code {
        return Err(Error::Parse("文字列リテラルが閉じていません".into()));
    }

    Ok(out)
}
