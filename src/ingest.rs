//! アップロード画像の受け取りとデコード
//!
//! 受け付けるのはJPEG/PNGのみ。デコードできれば通す（サイズ制限なし）。

use crate::error::{LeafDoctorError, Result};
use image::{DynamicImage, ImageFormat};
use leaf_doctor_common::encoding;
use std::path::Path;

/// 拡張子 → 申告MIMEタイプ
const IMAGE_EXTENSIONS: &[(&str, &str)] = &[
    ("jpg", "image/jpeg"),
    ("jpeg", "image/jpeg"),
    ("png", "image/png"),
];

/// 利用者がアップロードした画像（1回の操作が所有し、終われば捨てる）
#[derive(Debug, Clone)]
pub struct UploadedImage {
    pub file_name: String,
    /// 申告されたMIMEタイプ（拡張子由来）
    pub mime_type: String,
    pub bytes: Vec<u8>,
}

/// デコード済み画像
#[derive(Debug, Clone)]
pub struct DecodedImage {
    pub width: u32,
    pub height: u32,
    pub format: ImageFormat,
    pub image: DynamicImage,
}

impl DecodedImage {
    /// 実際の形式に基づくMIMEタイプ
    pub fn mime_type(&self) -> &'static str {
        match self.format {
            ImageFormat::Png => "image/png",
            _ => "image/jpeg",
        }
    }
}

impl UploadedImage {
    pub fn from_bytes(file_name: impl Into<String>, bytes: Vec<u8>, declared_mime: Option<&str>) -> Self {
        Self {
            file_name: file_name.into(),
            mime_type: declared_mime.unwrap_or("image/jpeg").to_string(),
            bytes,
        }
    }

    /// デコード。JPEG/PNG以外、または壊れたデータは `UnsupportedFormat`
    pub fn decode(&self) -> Result<DecodedImage> {
        let format = image::guess_format(&self.bytes)
            .map_err(|e| LeafDoctorError::UnsupportedFormat(format!("{}: {}", self.file_name, e)))?;

        if !matches!(format, ImageFormat::Jpeg | ImageFormat::Png) {
            return Err(LeafDoctorError::UnsupportedFormat(format!(
                "{}: {:?}",
                self.file_name, format
            )));
        }

        let image = image::load_from_memory_with_format(&self.bytes, format)
            .map_err(|e| LeafDoctorError::UnsupportedFormat(format!("{}: {}", self.file_name, e)))?;

        let declared = self.mime_type.as_str();
        let decoded = DecodedImage {
            width: image.width(),
            height: image.height(),
            format,
            image,
        };
        if declared != decoded.mime_type() {
            tracing::debug!(
                "{}: 申告 {} / 実際 {}（実際の形式を使用）",
                self.file_name,
                declared,
                decoded.mime_type()
            );
        }
        Ok(decoded)
    }

    /// 転送用のBase64
    pub fn encoded(&self) -> String {
        encoding::encode(&self.bytes)
    }
}

/// 拡張子からMIMEタイプを引く（大文字小文字は区別しない）
pub fn mime_for_extension(ext: &str) -> Option<&'static str> {
    let ext = ext.to_ascii_lowercase();
    IMAGE_EXTENSIONS
        .iter()
        .find(|(e, _)| *e == ext)
        .map(|(_, mime)| *mime)
}

/// ファイルから画像を読み込む
pub fn load_image(path: &Path) -> Result<UploadedImage> {
    if !path.is_file() {
        return Err(LeafDoctorError::FileNotFound(path.display().to_string()));
    }

    let bytes = std::fs::read(path)?;
    let file_name = path
        .file_name()
        .map(|n| n.to_string_lossy().to_string())
        .unwrap_or_default();
    let declared = path
        .extension()
        .and_then(|e| e.to_str())
        .and_then(mime_for_extension);

    Ok(UploadedImage::from_bytes(file_name, bytes, declared))
}
