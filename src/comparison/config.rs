//! # 配置模块
//!
//! ## 设计思路
//!
//! 将参考图/上传图/产物三个目录与资源上限集中到 `CompareConfig`，
//! 以显式参数传入各协作方，替代进程级全局路径。
//!
//! ## 实现思路
//!
//! - `Default` 提供与原部署目录结构一致的默认值。
//! - `#[serde(default)]` 允许配置文件只覆盖部分字段。
//! - `validate` 在入口处统一做范围校验，尽早失败。

use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use super::CompareError;

/// 比对配置。
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CompareConfig {
    /// 参考图所在目录。
    pub reference_dir: PathBuf,
    /// 归一化后上传图的回显目录。
    pub upload_dir: PathBuf,
    /// 比对产物输出目录。
    pub output_dir: PathBuf,
    /// 读取原始字节时允许的最大文件体积（字节）。
    pub max_file_size: u64,
    /// 解码后的像素上限（`width * height`）。
    pub max_decoded_pixels: u64,
    /// 产物 JPEG 质量（1–100）。
    pub artifact_quality: u8,
    /// 回显上传图的 JPEG 质量（1–100）。
    pub upload_quality: u8,
    /// 是否额外输出 2×2 拼接对比图。
    pub write_montage: bool,
}

impl Default for CompareConfig {
    fn default() -> Self {
        Self {
            reference_dir: PathBuf::from("app/static/original"),
            upload_dir: PathBuf::from("app/static/uploads"),
            output_dir: PathBuf::from("app/static/generated"),
            max_file_size: 50 * 1024 * 1024,
            max_decoded_pixels: 40_000_000,
            artifact_quality: 95,
            upload_quality: 100,
            write_montage: false,
        }
    }
}

impl CompareConfig {
    /// 校验配置取值范围。
    pub fn validate(&self) -> Result<(), CompareError> {
        if self.max_file_size == 0 {
            return Err(CompareError::InvalidConfig("max_file_size 不能为 0".to_string()));
        }
        if self.max_decoded_pixels == 0 {
            return Err(CompareError::InvalidConfig("max_decoded_pixels 不能为 0".to_string()));
        }
        if !(1..=100).contains(&self.artifact_quality) {
            return Err(CompareError::InvalidConfig(
                "artifact_quality 必须在 1~100 之间".to_string(),
            ));
        }
        if !(1..=100).contains(&self.upload_quality) {
            return Err(CompareError::InvalidConfig(
                "upload_quality 必须在 1~100 之间".to_string(),
            ));
        }
        for (key, dir) in [
            ("reference_dir", &self.reference_dir),
            ("upload_dir", &self.upload_dir),
            ("output_dir", &self.output_dir),
        ] {
            if dir.as_os_str().is_empty() {
                return Err(CompareError::InvalidConfig(format!("{} 不能为空", key)));
            }
        }

        Ok(())
    }
}
