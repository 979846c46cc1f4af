//! 画像をData URLに変換

use base64::{engine::general_purpose::STANDARD, Engine as _};
use image::ImageFormat;

/// 画像形式からMIMEタイプを取得
pub fn mime_type(format: ImageFormat) -> &'static str {
    format.to_mime_type()
}

/// バイト列を "data:<mime>;base64,..." 形式に変換
pub fn to_data_url(bytes: &[u8], format: ImageFormat) -> String {
    format!("data:{};base64,{}", mime_type(format), STANDARD.encode(bytes))
}
