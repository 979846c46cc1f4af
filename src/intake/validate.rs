use super::{AcceptedImage, RejectedImage, UploadBatch, ValidatedBatch};
use crate::error::{GraderError, Result};
use image::{ImageFormat, ImageReader};
use rayon::prelude::*;
use std::io::Cursor;

/// 受け付ける画像形式
pub const ALLOWED_FORMATS: &[ImageFormat] = &[ImageFormat::Jpeg, ImageFormat::Png];

/// 画像をデコードして形式を判定
pub fn detect_format(bytes: &[u8]) -> Result<ImageFormat> {
    let reader = ImageReader::new(Cursor::new(bytes)).with_guessed_format()?;

    let format = reader
        .format()
        .ok_or_else(|| GraderError::ImageLoad("画像形式を判別できません".into()))?;

    if !ALLOWED_FORMATS.contains(&format) {
        return Err(GraderError::ImageLoad(format!("未対応の画像形式: {:?}", format)));
    }

    reader
        .decode()
        .map_err(|e| GraderError::ImageLoad(e.to_string()))?;

    Ok(format)
}

/// バッチ内の画像を検証（並列デコード、順序は維持）
pub fn validate_batch(batch: UploadBatch) -> ValidatedBatch {
    let checked: Vec<_> = batch
        .files
        .into_par_iter()
        .map(|file| (detect_format(&file.bytes), file))
        .collect();

    let mut validated = ValidatedBatch {
        accepted: Vec::with_capacity(checked.len()),
        rejected: batch.rejected,
    };

    for (format, file) in checked {
        match format {
            Ok(format) => validated.accepted.push(AcceptedImage {
                file_name: file.file_name,
                path: file.path,
                bytes: file.bytes,
                format,
            }),
            Err(e) => {
                tracing::warn!("画像として読み込めないためスキップ: {} ({})", file.file_name, e);
                validated.rejected.push(RejectedImage {
                    file_name: file.file_name,
                    reason: e.to_string(),
                });
            }
        }
    }

    validated
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::intake::UploadedFile;
    use std::path::PathBuf;

    fn encode(format: ImageFormat) -> Vec<u8> {
        let img = image::DynamicImage::ImageRgb8(image::RgbImage::from_pixel(
            8,
            8,
            image::Rgb([10, 200, 30]),
        ));
        let mut buf = Cursor::new(Vec::new());
        img.write_to(&mut buf, format).unwrap();
        buf.into_inner()
    }

    fn upload(name: &str, bytes: Vec<u8>) -> UploadedFile {
        UploadedFile {
            file_name: name.to_string(),
            path: PathBuf::from(name),
            bytes,
        }
    }

    #[test]
    fn test_detect_format_png_and_jpeg() {
        assert_eq!(detect_format(&encode(ImageFormat::Png)).unwrap(), ImageFormat::Png);
        assert_eq!(detect_format(&encode(ImageFormat::Jpeg)).unwrap(), ImageFormat::Jpeg);
    }

    #[test]
    fn test_detect_format_garbage() {
        assert!(detect_format(b"definitely not an image").is_err());
        assert!(detect_format(&[]).is_err());
    }

    #[test]
    fn test_detect_format_truncated_png() {
        let mut png = encode(ImageFormat::Png);
        png.truncate(png.len() / 2);
        assert!(matches!(detect_format(&png), Err(GraderError::ImageLoad(_))));
    }

    #[test]
    fn test_detect_format_disallowed() {
        let bmp = encode(ImageFormat::Bmp);
        let err = detect_format(&bmp).unwrap_err();
        assert!(err.to_string().contains("未対応"));
    }

    #[test]
    fn test_validate_batch_skips_invalid_and_keeps_order() {
        let batch = UploadBatch {
            files: vec![
                upload("1.png", encode(ImageFormat::Png)),
                upload("2.jpg", b"corrupt".to_vec()),
                upload("3.jpg", encode(ImageFormat::Jpeg)),
            ],
            rejected: vec![RejectedImage {
                file_name: "0.gif".into(),
                reason: "対象外".into(),
            }],
        };

        let validated = validate_batch(batch);
        let names: Vec<&str> = validated.accepted.iter().map(|a| a.file_name.as_str()).collect();
        assert_eq!(names, vec!["1.png", "3.jpg"]);
        assert_eq!(validated.accepted[0].format, ImageFormat::Png);
        assert_eq!(validated.accepted[1].format, ImageFormat::Jpeg);

        let rejected: Vec<&str> = validated.rejected.iter().map(|r| r.file_name.as_str()).collect();
        assert_eq!(rejected, vec!["0.gif", "2.jpg"]);
    }

    #[test]
    fn test_validate_batch_all_invalid() {
        let batch = UploadBatch {
            files: vec![upload("a.jpg", b"x".to_vec()), upload("b.png", b"y".to_vec())],
            rejected: vec![],
        };
        let validated = validate_batch(batch);
        assert!(validated.is_empty());
        assert_eq!(validated.rejected.len(), 2);
    }
}
