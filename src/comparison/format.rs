//! # 扩展名校验模块
//!
//! 按文件名扩展名（大小写不敏感）确定声明格式，不在支持列表内即拒绝。
//! 声明格式只用于校验与兜底解码，实际解码优先依据文件签名。

use std::path::Path;

use image::ImageFormat;

use super::CompareError;

/// 支持的扩展名（含前导点），顺序即错误提示中的展示顺序。
pub const SUPPORTED_EXTENSIONS: [&str; 8] = [
    ".jpg", ".jpeg", ".png", ".webp", ".bmp", ".gif", ".tiff", ".tif",
];

/// 已通过校验的声明格式。
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ImageExtension {
    Jpg,
    Jpeg,
    Png,
    Webp,
    Bmp,
    Gif,
    Tiff,
    Tif,
}

impl ImageExtension {
    /// 从文件名解析扩展名。
    ///
    /// # 示例
    /// ```rust
    /// use doc_tamper::comparison::ImageExtension;
    ///
    /// let ext = ImageExtension::from_file_name("scan.PNG")?;
    /// assert_eq!(ext.as_str(), ".png");
    /// # Ok::<(), doc_tamper::comparison::CompareError>(())
    /// ```
    pub fn from_file_name(file_name: &str) -> Result<Self, CompareError> {
        let extension = Path::new(file_name)
            .extension()
            .and_then(|ext| ext.to_str())
            .map(|ext| format!(".{}", ext.to_lowercase()))
            .unwrap_or_default();

        Self::from_extension(&extension)
    }

    /// 从带前导点的扩展名解析。
    pub fn from_extension(extension: &str) -> Result<Self, CompareError> {
        match extension.trim().to_lowercase().as_str() {
            ".jpg" => Ok(Self::Jpg),
            ".jpeg" => Ok(Self::Jpeg),
            ".png" => Ok(Self::Png),
            ".webp" => Ok(Self::Webp),
            ".bmp" => Ok(Self::Bmp),
            ".gif" => Ok(Self::Gif),
            ".tiff" => Ok(Self::Tiff),
            ".tif" => Ok(Self::Tif),
            other => Err(CompareError::UnsupportedFormat {
                extension: other.to_string(),
                allowed: SUPPORTED_EXTENSIONS.to_vec(),
            }),
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Jpg => ".jpg",
            Self::Jpeg => ".jpeg",
            Self::Png => ".png",
            Self::Webp => ".webp",
            Self::Bmp => ".bmp",
            Self::Gif => ".gif",
            Self::Tiff => ".tiff",
            Self::Tif => ".tif",
        }
    }

    /// 对应的 `image` 解码格式。
    pub fn image_format(self) -> ImageFormat {
        match self {
            Self::Jpg | Self::Jpeg => ImageFormat::Jpeg,
            Self::Png => ImageFormat::Png,
            Self::Webp => ImageFormat::WebP,
            Self::Bmp => ImageFormat::Bmp,
            Self::Gif => ImageFormat::Gif,
            Self::Tiff | Self::Tif => ImageFormat::Tiff,
        }
    }
}
