//! 画像の受け付け
//!
//! 指定されたファイル・フォルダからアップロード候補を集め(collect_uploads)、
//! デコードできるJPEG/PNGだけを残す(validate_batch)。
//! 不正なファイルはエラーにせず、警告してスキップする。

mod validate;

pub use validate::{detect_format, validate_batch, ALLOWED_FORMATS};

use crate::error::{GraderError, Result};
use image::ImageFormat;
use serde::Serialize;
use sha2::{Digest, Sha256};
use std::collections::HashSet;
use std::path::{Path, PathBuf};
use walkdir::WalkDir;

const IMAGE_EXTENSIONS: &[&str] = &["jpg", "jpeg", "png"];

/// アップロード候補（読み込み済み）
#[derive(Debug, Clone)]
pub struct UploadedFile {
    pub file_name: String,
    pub path: PathBuf,
    pub bytes: Vec<u8>,
}

/// 受け付けなかったファイル
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RejectedImage {
    pub file_name: String,
    pub reason: String,
}

/// 現在選択されている画像の集合
#[derive(Debug, Clone, Default)]
pub struct UploadBatch {
    pub files: Vec<UploadedFile>,
    pub rejected: Vec<RejectedImage>,
}

impl UploadBatch {
    /// バッチ内容のフィンガープリント（SHA-256, hex）
    ///
    /// ファイル名と内容を順番通りに畳み込むため、並び替えや
    /// 内容の変更で値が変わる。
    pub fn fingerprint(&self) -> String {
        let mut hasher = Sha256::new();
        for file in &self.files {
            hasher.update(file.file_name.as_bytes());
            hasher.update((file.bytes.len() as u64).to_le_bytes());
            hasher.update(&file.bytes);
        }
        for rejected in &self.rejected {
            hasher.update(b"!");
            hasher.update(rejected.file_name.as_bytes());
        }
        hex::encode(hasher.finalize())
    }

    pub fn len(&self) -> usize {
        self.files.len()
    }

    pub fn is_empty(&self) -> bool {
        self.files.is_empty()
    }
}

/// 検証済み画像
#[derive(Debug, Clone)]
pub struct AcceptedImage {
    pub file_name: String,
    pub path: PathBuf,
    pub bytes: Vec<u8>,
    pub format: ImageFormat,
}

/// 検証結果
#[derive(Debug, Clone, Default)]
pub struct ValidatedBatch {
    pub accepted: Vec<AcceptedImage>,
    pub rejected: Vec<RejectedImage>,
}

impl ValidatedBatch {
    pub fn is_empty(&self) -> bool {
        self.accepted.is_empty()
    }
}

pub(crate) fn is_image_extension(path: &Path) -> bool {
    path.extension()
        .map(|ext| ext.to_string_lossy().to_lowercase())
        .is_some_and(|ext| IMAGE_EXTENSIONS.contains(&ext.as_str()))
}

fn file_name_of(path: &Path) -> String {
    path.file_name()
        .map(|n| n.to_string_lossy().to_string())
        .unwrap_or_else(|| path.display().to_string())
}

/// フォルダ内の画像パスを列挙（ファイル名順）
fn scan_folder(folder: &Path, recursive: bool) -> Vec<PathBuf> {
    let max_depth = if recursive { usize::MAX } else { 1 };

    let mut paths: Vec<PathBuf> = WalkDir::new(folder)
        .max_depth(max_depth)
        .into_iter()
        .filter_map(|e| e.ok())
        .filter(|e| e.file_type().is_file() && is_image_extension(e.path()))
        .map(|e| e.into_path())
        .collect();

    paths.sort_by_key(|p| file_name_of(p));
    paths
}

/// 指定パスからアップロード候補を集める
///
/// - ファイル: そのまま候補にする（拡張子が対象外なら除外）
/// - フォルダ: 直下（recursive時は再帰）の .jpg/.jpeg/.png を候補にする
pub fn collect_uploads(paths: &[PathBuf], recursive: bool) -> Result<UploadBatch> {
    let mut candidates = Vec::new();
    let mut batch = UploadBatch::default();

    for path in paths {
        if !path.exists() {
            return Err(GraderError::FileNotFound(path.display().to_string()));
        }

        if path.is_dir() {
            candidates.extend(scan_folder(path, recursive));
        } else if is_image_extension(path) {
            candidates.push(path.clone());
        } else {
            tracing::warn!("対象外の拡張子のためスキップ: {}", path.display());
            batch.rejected.push(RejectedImage {
                file_name: file_name_of(path),
                reason: "対象外の拡張子です (jpg/jpeg/png)".into(),
            });
        }
    }

    // 重なったパス指定でも同じ画像は一度だけ（最初に現れた位置を残す）
    let mut seen = HashSet::new();
    candidates.retain(|path| {
        let key = std::fs::canonicalize(path).unwrap_or_else(|_| path.clone());
        seen.insert(key)
    });

    for path in candidates {
        let file_name = file_name_of(&path);
        match std::fs::read(&path) {
            Ok(bytes) => batch.files.push(UploadedFile { file_name, path, bytes }),
            Err(e) => {
                tracing::warn!("読み込めないためスキップ: {} ({})", file_name, e);
                batch.rejected.push(RejectedImage {
                    file_name,
                    reason: format!("読み込みエラー: {}", e),
                });
            }
        }
    }

    if batch.files.is_empty() && batch.rejected.is_empty() {
        let joined = paths
            .iter()
            .map(|p| p.display().to_string())
            .collect::<Vec<_>>()
            .join(", ");
        return Err(GraderError::NoImagesFound(joined));
    }

    tracing::debug!("候補 {}件 / 除外 {}件", batch.files.len(), batch.rejected.len());
    Ok(batch)
}
