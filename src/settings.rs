use std::fs;
use std::path::Path;

use crate::comparison::CompareConfig;
use crate::error::AppError;

/// 从 JSON 文件加载比对配置。
///
/// 文件不存在时返回默认配置；缺失的字段回落到默认值。
pub fn load_config(path: &Path) -> Result<CompareConfig, AppError> {
    if !path.exists() {
        log::info!("配置文件 {} 不存在，使用默认配置", path.display());
        return Ok(CompareConfig::default());
    }

    let content = fs::read_to_string(path)?;
    let config = serde_json::from_str::<CompareConfig>(&content)
        .map_err(|e| AppError::Config(format!("解析配置文件失败: {}", e)))?;

    config.validate()?;
    Ok(config)
}

/// 将配置写回 JSON 文件。
pub fn save_config(path: &Path, config: &CompareConfig) -> Result<(), AppError> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent)?;
    }

    let content = serde_json::to_string_pretty(config)
        .map_err(|e| AppError::Config(format!("序列化配置失败: {}", e)))?;

    fs::write(path, content)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;
    use std::time::{SystemTime, UNIX_EPOCH};

    fn unique_temp_dir() -> PathBuf {
        let nanos = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .expect("clock error")
            .as_nanos();
        let dir = std::env::temp_dir().join(format!("doc-tamper-settings-test-{nanos}"));
        fs::create_dir_all(&dir).expect("create temp dir");
        dir
    }

    #[test]
    fn missing_file_falls_back_to_defaults() {
        let dir = unique_temp_dir();

        let config = load_config(&dir.join("absent.json")).expect("load");

        assert_eq!(config, CompareConfig::default());
        let _ = fs::remove_dir_all(dir);
    }

    #[test]
    fn partial_file_keeps_remaining_defaults() {
        let dir = unique_temp_dir();
        let path = dir.join("compare.json");
        fs::write(&path, r#"{ "output_dir": "/tmp/out", "write_montage": true }"#).expect("write");

        let config = load_config(&path).expect("load");

        assert_eq!(config.output_dir, PathBuf::from("/tmp/out"));
        assert!(config.write_montage);
        assert_eq!(config.reference_dir, CompareConfig::default().reference_dir);
        let _ = fs::remove_dir_all(dir);
    }

    #[test]
    fn malformed_json_is_a_config_error() {
        let dir = unique_temp_dir();
        let path = dir.join("compare.json");
        fs::write(&path, "{ not json").expect("write");

        assert!(matches!(load_config(&path), Err(AppError::Config(_))));
        let _ = fs::remove_dir_all(dir);
    }

    #[test]
    fn out_of_range_values_are_rejected() {
        let dir = unique_temp_dir();
        let path = dir.join("compare.json");
        fs::write(&path, r#"{ "artifact_quality": 0 }"#).expect("write");

        assert!(matches!(load_config(&path), Err(AppError::Comparison(_))));
        let _ = fs::remove_dir_all(dir);
    }

    #[test]
    fn saved_config_loads_back() {
        let dir = unique_temp_dir();
        let path = dir.join("nested").join("compare.json");
        let config = CompareConfig {
            upload_quality: 90,
            ..CompareConfig::default()
        };

        save_config(&path, &config).expect("save");

        assert_eq!(load_config(&path).expect("load"), config);
        let _ = fs::remove_dir_all(dir);
    }
}
