//! エラーケーステスト
//!
//! 各種エラー条件でのエラーハンドリングを検証

use return_grader::error::GraderError;
use return_grader::intake;
use std::path::PathBuf;
use tempfile::tempdir;

/// 存在しないパスを指定した場合
#[test]
fn test_collect_nonexistent_path() {
    let result = intake::collect_uploads(&[PathBuf::from("/nonexistent/path/12345")], false);
    let err = result.unwrap_err();
    assert!(matches!(err, GraderError::FileNotFound(_)));
}

/// 画像のないフォルダを指定した場合
#[test]
fn test_collect_folder_no_images() {
    let dir = tempdir().expect("Failed to create temp dir");
    std::fs::write(dir.path().join("test.txt"), "hello").unwrap();
    std::fs::write(dir.path().join("data.json"), "{}").unwrap();

    let result = intake::collect_uploads(&[dir.path().to_path_buf()], false);
    assert!(matches!(result, Err(GraderError::NoImagesFound(_))));
}

/// 壊れた画像だけのフォルダはエラーにならず、全て除外される
#[test]
fn test_corrupt_images_are_rejected_not_fatal() {
    let dir = tempdir().expect("Failed to create temp dir");
    std::fs::write(dir.path().join("a.jpg"), b"not a jpeg").unwrap();
    std::fs::write(dir.path().join("b.png"), b"not a png").unwrap();

    let batch = intake::collect_uploads(&[dir.path().to_path_buf()], false).unwrap();
    let validated = intake::validate_batch(batch);
    assert!(validated.is_empty());
    assert_eq!(validated.rejected.len(), 2);
}

/// GraderErrorのDisplay実装確認
#[test]
fn test_error_display() {
    let errors = vec![
        GraderError::Config("テスト設定エラー".to_string()),
        GraderError::FileNotFound("test.jpg".to_string()),
        GraderError::NoImagesFound("フォルダ".to_string()),
        GraderError::ImageLoad("壊れた画像".to_string()),
        GraderError::ApiCall("API呼び出し失敗".to_string()),
        GraderError::ApiParse("空の応答".to_string()),
    ];

    for err in errors {
        let display = format!("{}", err);
        assert!(!display.is_empty(), "エラーメッセージが空: {:?}", err);
    }
}

/// MissingApiKeyエラーのメッセージ確認
#[test]
fn test_missing_api_key_message() {
    let display = format!("{}", GraderError::MissingApiKey);
    assert!(display.contains("OPENAI_API_KEY"));
    assert!(display.contains("return-grader config"));
}

/// IOエラーからの変換
#[test]
fn test_io_error_conversion() {
    let io_err = std::io::Error::new(std::io::ErrorKind::NotFound, "file not found");
    let err: GraderError = io_err.into();

    assert!(matches!(err, GraderError::Io(_)));
    assert!(format!("{}", err).contains("IO"));
}

/// JSONエラーからの変換
#[test]
fn test_json_error_conversion() {
    let json_err = serde_json::from_str::<serde_json::Value>("{ invalid }").unwrap_err();
    let err: GraderError = json_err.into();

    assert!(matches!(err, GraderError::JsonParse(_)));
}

/// common::Errorからの変換（透過的エラー）
#[test]
fn test_common_error_conversion() {
    let common_err = return_grader_common::Error::Parse("パースエラー".to_string());
    let err: GraderError = common_err.into();

    assert!(matches!(err, GraderError::Common(_)));
    assert!(format!("{}", err).contains("パースエラー"));
}
