//! 统一错误类型模块
//!
//! # 设计思路
//!
//! 定义应用级统一的 `AppError` 枚举，命令行入口与设置加载统一返回
//! `Result<T, AppError>`，避免各处分散的 `.map_err(|e| e.to_string())`。
//!
//! # 实现思路
//!
//! - 使用 `thiserror` 派生可读错误消息。
//! - 为 `CompareError` 与 `std::io::Error` 提供 `From` 转换，无需手动 map。
//! - 实现 `Serialize` 将错误序列化为字符串，便于写入 JSON 报告。

use serde::Serialize;

use crate::comparison::CompareError;

/// 应用级统一错误类型
#[derive(Debug, thiserror::Error)]
pub enum AppError {
    /// 比对流水线错误（格式 / 解码 / 尺寸 / 参考图 / 产物）
    #[error("{0}")]
    Comparison(#[from] CompareError),

    /// 文件系统 I/O 错误
    #[error("文件系统错误: {0}")]
    Io(#[from] std::io::Error),

    /// 配置文件不可用
    #[error("配置错误: {0}")]
    Config(String),
}

/// 将错误序列化为人类可读的字符串。
impl Serialize for AppError {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        serializer.serialize_str(&self.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn compare_error_passes_through_unchanged() {
        let inner = CompareError::FileSystem("磁盘已满".to_string());
        let expected = inner.to_string();

        let error: AppError = inner.into();

        assert_eq!(error.to_string(), expected);
    }

    #[test]
    fn serializes_as_plain_string() {
        let error = AppError::Config("bad json".to_string());

        let json = serde_json::to_string(&error).expect("serialize");

        assert_eq!(json, "\"配置错误: bad json\"");
    }
}
