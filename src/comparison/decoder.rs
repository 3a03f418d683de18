//! # 解码策略模块
//!
//! ## 设计思路
//!
//! 不同解码路径对格式的支持程度不一，单一路径失败不代表数据不可用。
//! 因此将解码建模为“有序策略列表”：依次尝试，首个成功即返回。
//!
//! ## 实现思路
//!
//! 默认顺序：
//! 1. `SniffedFormatDecoder`：`infer` 识别文件签名，按签名格式解码
//! 2. `GuessedFormatDecoder`：交给 `image` 自行探测格式
//! 3. `DeclaredFormatDecoder`：按声明扩展名的格式解码
//!
//! 全部失败时汇总每个策略的失败原因，返回 `DecodeFailure`。

use std::io::Cursor;

use image::{DynamicImage, ImageFormat};

use super::CompareError;
use super::source::RawImage;

/// 单个解码策略。
pub trait DecodeStrategy {
    /// 策略名（用于日志与错误汇总）。
    fn name(&self) -> &'static str;

    /// 尝试解码，失败时返回原因描述。
    fn decode(&self, raw: &RawImage) -> Result<DynamicImage, String>;
}

/// 依据文件签名（magic bytes）解码。
pub struct SniffedFormatDecoder;

impl DecodeStrategy for SniffedFormatDecoder {
    fn name(&self) -> &'static str {
        "signature"
    }

    fn decode(&self, raw: &RawImage) -> Result<DynamicImage, String> {
        let kind = infer::get(&raw.bytes).ok_or_else(|| "无法识别文件签名".to_string())?;

        if kind.matcher_type() != infer::MatcherType::Image {
            return Err(format!("文件签名不是图片类型：{}", kind.mime_type()));
        }

        let format = ImageFormat::from_mime_type(kind.mime_type())
            .ok_or_else(|| format!("签名格式暂不支持解码：{}", kind.mime_type()))?;

        image::load_from_memory_with_format(&raw.bytes, format).map_err(|e| e.to_string())
    }
}

/// 交给 `image` 自行探测格式后解码。
pub struct GuessedFormatDecoder;

impl DecodeStrategy for GuessedFormatDecoder {
    fn name(&self) -> &'static str {
        "guessed"
    }

    fn decode(&self, raw: &RawImage) -> Result<DynamicImage, String> {
        image::ImageReader::new(Cursor::new(raw.bytes.as_slice()))
            .with_guessed_format()
            .map_err(|e| e.to_string())?
            .decode()
            .map_err(|e| e.to_string())
    }
}

/// 按声明扩展名的格式解码。
pub struct DeclaredFormatDecoder;

impl DecodeStrategy for DeclaredFormatDecoder {
    fn name(&self) -> &'static str {
        "declared"
    }

    fn decode(&self, raw: &RawImage) -> Result<DynamicImage, String> {
        image::load_from_memory_with_format(&raw.bytes, raw.extension.image_format())
            .map_err(|e| e.to_string())
    }
}

/// 有序解码策略链。
pub struct DecoderChain {
    strategies: Vec<Box<dyn DecodeStrategy>>,
}

impl Default for DecoderChain {
    fn default() -> Self {
        Self::new(vec![
            Box::new(SniffedFormatDecoder),
            Box::new(GuessedFormatDecoder),
            Box::new(DeclaredFormatDecoder),
        ])
    }
}

impl DecoderChain {
    pub fn new(strategies: Vec<Box<dyn DecodeStrategy>>) -> Self {
        Self { strategies }
    }

    /// 依次尝试各策略，首个成功即返回。
    pub fn decode(&self, raw: &RawImage) -> Result<DynamicImage, CompareError> {
        let mut failures = Vec::with_capacity(self.strategies.len());

        for strategy in &self.strategies {
            match strategy.decode(raw) {
                Ok(image) => {
                    log::debug!(
                        "🧩 {}图片解码成功 - 策略: {} 尺寸: {}x{}",
                        raw.role,
                        strategy.name(),
                        image.width(),
                        image.height()
                    );
                    return Ok(image);
                }
                Err(reason) => {
                    log::debug!("⚠️ {}图片解码策略 {} 失败：{}", raw.role, strategy.name(), reason);
                    failures.push(format!("{}: {}", strategy.name(), reason));
                }
            }
        }

        if failures.is_empty() {
            failures.push("未配置任何解码策略".to_string());
        }

        Err(CompareError::DecodeFailure {
            role: raw.role,
            reason: failures.join("; "),
        })
    }
}
