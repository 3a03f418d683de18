//! # 加载与校验模块
//!
//! ## 设计思路
//!
//! 统一处理不同来源（本地文件 / 内存字节）的原始字节加载，并在“尽可能早”的阶段执行输入校验。
//! 目标是尽快失败，减少不必要内存与 CPU 消耗。
//!
//! ## 实现思路
//!
//! - 扩展名：先于任何读取完成校验，不支持即返回 `UnsupportedFormat`。
//! - 文件：存在性 + metadata 体积限制 + 读取。
//! - 字节：体积限制。
//! - 内容是否可解码留给解码策略链判断，这里不做签名拦截。

use std::path::Path;

use super::format::ImageExtension;
use super::source::{ImageRole, ImageSource, RawImage};
use super::{CompareConfig, CompareError, ComparisonHandler};

impl ComparisonHandler {
    /// 按来源加载图片原始字节。
    pub fn load(&self, source: ImageSource, role: ImageRole) -> Result<RawImage, CompareError> {
        match source {
            ImageSource::FilePath(path) => self.load_from_file(&path, role),
            ImageSource::Bytes { file_name, bytes } => self.load_from_bytes(&file_name, bytes, role),
        }
    }

    /// 从本地路径加载图片原始字节。
    pub(crate) fn load_from_file(&self, path: &Path, role: ImageRole) -> Result<RawImage, CompareError> {
        log::info!("📁 开始读取{}图片 - 路径: {}", role, path.display());

        let file_name = path
            .file_name()
            .and_then(|name| name.to_str())
            .unwrap_or_default();
        let extension = ImageExtension::from_file_name(file_name)?;

        if !path.exists() {
            return Err(CompareError::FileSystem(format!("文件不存在：{}", path.display())));
        }

        let metadata = std::fs::metadata(path)
            .map_err(|e| CompareError::FileSystem(format!("无法读取文件信息：{}", e)))?;
        Self::validate_byte_length(&self.config, metadata.len())?;

        let bytes = std::fs::read(path)
            .map_err(|e| CompareError::FileSystem(format!("无法读取图片文件：{}", e)))?;

        Ok(RawImage {
            bytes,
            extension,
            role,
        })
    }

    /// 从内存字节加载，声明文件名决定扩展名。
    pub(crate) fn load_from_bytes(
        &self,
        file_name: &str,
        bytes: Vec<u8>,
        role: ImageRole,
    ) -> Result<RawImage, CompareError> {
        log::info!("📝 开始处理{}图片字节 - 文件名: {} 大小: {}B", role, file_name, bytes.len());

        let extension = ImageExtension::from_file_name(file_name)?;
        Self::validate_byte_length(&self.config, bytes.len() as u64)?;

        Ok(RawImage {
            bytes,
            extension,
            role,
        })
    }

    fn validate_byte_length(config: &CompareConfig, len: u64) -> Result<(), CompareError> {
        if len > config.max_file_size {
            return Err(CompareError::ResourceLimit(format!(
                "文件过大：{:.2} MB（限制：{:.2} MB）",
                len as f64 / 1024.0 / 1024.0,
                config.max_file_size as f64 / 1024.0 / 1024.0
            )));
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::{SystemTime, UNIX_EPOCH};

    fn unique_temp_dir() -> std::path::PathBuf {
        let nanos = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .expect("clock error")
            .as_nanos();
        let dir = std::env::temp_dir().join(format!("doc-tamper-loader-test-{nanos}"));
        std::fs::create_dir_all(&dir).expect("create temp dir");
        dir
    }

    #[test]
    fn unsupported_extension_is_rejected_before_reading() {
        let handler = ComparisonHandler::new(CompareConfig::default()).expect("handler init failed");

        let result = handler.load(
            ImageSource::FilePath("/definitely/missing/payload.exe".into()),
            ImageRole::Candidate,
        );

        assert!(matches!(result, Err(CompareError::UnsupportedFormat { .. })));
    }

    #[test]
    fn missing_file_is_a_filesystem_error() {
        let handler = ComparisonHandler::new(CompareConfig::default()).expect("handler init failed");

        let result = handler.load(
            ImageSource::FilePath("/definitely/missing/card.png".into()),
            ImageRole::Candidate,
        );

        assert!(matches!(result, Err(CompareError::FileSystem(_))));
    }

    #[test]
    fn file_is_read_with_declared_extension() {
        let dir = unique_temp_dir();
        let path = dir.join("Card.JPEG");
        std::fs::write(&path, b"not really a jpeg").expect("write file");
        let handler = ComparisonHandler::new(CompareConfig::default()).expect("handler init failed");

        let raw = handler
            .load(ImageSource::FilePath(path), ImageRole::Reference)
            .expect("load should not inspect content");

        assert_eq!(raw.extension, ImageExtension::Jpeg);
        assert_eq!(raw.role, ImageRole::Reference);
        assert_eq!(raw.bytes, b"not really a jpeg".to_vec());
        let _ = std::fs::remove_dir_all(dir);
    }

    #[test]
    fn bytes_over_limit_are_rejected() {
        let config = CompareConfig {
            max_file_size: 4,
            ..CompareConfig::default()
        };
        let handler = ComparisonHandler::new(config).expect("handler init failed");

        let result = handler.load(
            ImageSource::Bytes {
                file_name: "upload.png".to_string(),
                bytes: vec![0; 16],
            },
            ImageRole::Candidate,
        );

        assert!(matches!(result, Err(CompareError::ResourceLimit(_))));
    }

    #[test]
    fn empty_upload_surfaces_as_decode_failure() {
        let handler = ComparisonHandler::new(CompareConfig::default()).expect("handler init failed");

        let raw = handler
            .load(
                ImageSource::Bytes {
                    file_name: "upload.png".to_string(),
                    bytes: Vec::new(),
                },
                ImageRole::Candidate,
            )
            .expect("empty payload passes loading");

        assert!(matches!(
            handler.normalize(&raw),
            Err(CompareError::DecodeFailure { role: ImageRole::Candidate, .. })
        ));
    }
}
