//! # 错误模型模块
//!
//! ## 设计思路
//!
//! 使用单一错误枚举承载比对链路中的所有错误来源，避免字符串拼接式错误处理。
//! 通过 `thiserror` 保持人类可读错误，同时让调用侧可按分支匹配。
//!
//! 所有错误都只作用于单次比对请求：不重试、不产出部分结果，由调用侧转为描述性消息。

use super::source::ImageRole;

/// 比对链路统一错误类型。
///
/// 该类型会在应用层被上转为 `AppError`，最终输出给调用方。
#[derive(Debug, thiserror::Error)]
pub enum CompareError {
    /// 扩展名不在支持列表内。
    #[error("不支持的文件格式：{extension}（可选：{}）", .allowed.join(", "))]
    UnsupportedFormat {
        extension: String,
        allowed: Vec<&'static str>,
    },

    /// 所有解码策略均失败。
    #[error("{role}图片解码失败：{reason}")]
    DecodeFailure { role: ImageRole, reason: String },

    /// 归一化后的两张图片尺寸或通道不一致。
    #[error("图片尺寸不一致：参考图 {reference:?}，上传图 {candidate:?}")]
    ShapeMismatch {
        reference: (u32, u32),
        candidate: (u32, u32),
    },

    /// 参考图目录中找不到任何可识别的参考图。
    #[error("未找到参考图：{dir}（已尝试：{}）", .tried.join(", "))]
    MissingReference {
        dir: String,
        tried: Vec<&'static str>,
    },

    #[error("文件错误：{0}")]
    FileSystem(String),

    #[error("资源限制：{0}")]
    ResourceLimit(String),

    #[error("编码错误：{0}")]
    Encode(String),

    #[error("配置错误：{0}")]
    InvalidConfig(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unsupported_format_message_lists_allowed_extensions() {
        let err = CompareError::UnsupportedFormat {
            extension: ".exe".to_string(),
            allowed: vec![".jpg", ".png"],
        };

        let message = err.to_string();
        assert!(message.contains(".exe"));
        assert!(message.contains(".jpg, .png"));
    }

    #[test]
    fn decode_failure_message_names_role() {
        let err = CompareError::DecodeFailure {
            role: ImageRole::Candidate,
            reason: "bad header".to_string(),
        };

        assert!(err.to_string().starts_with("上传"));
    }
}
