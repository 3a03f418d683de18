//! 参考图定位与比对产物落盘模块
//!
//! # 设计思路
//!
//! 统一管理比对涉及的三个目录：参考图目录、上传目录、产物目录。
//! 参考图按固定优先级查找；产物文件名固定，每次比对覆盖上一次结果。
//!
//! # 实现思路
//!
//! - 参考图依次尝试 `image.jpg → image.jpeg → image.png → image.webp → image.bmp`，取第一个存在的。
//! - 所有产物先在内存中编码为 JPEG，全部成功后才开始写盘。
//! - 先写 `*.partial` 临时文件，全部写成功后再改名覆盖正式文件；
//!   写入失败时只清理临时文件，上一次请求的产物保持完整。
//! - 改名阶段中途失败（极少见）仍可能新旧产物混杂，此时返回错误由调用方重试。
//! - 目录不存在时自动 `create_dir_all`，避免上层判断。

use std::fs;
use std::path::{Path, PathBuf};

use image::DynamicImage;
use image::codecs::jpeg::JpegEncoder;
use serde::Serialize;

use crate::comparison::{CompareConfig, CompareError, ComparisonReport, ResultSink, annotate};

/// 参考图候选文件名（按优先级）。
pub const REFERENCE_CANDIDATES: [&str; 5] = [
    "image.jpg",
    "image.jpeg",
    "image.png",
    "image.webp",
    "image.bmp",
];

pub const ORIGINAL_ARTIFACT: &str = "image_original.jpg";
pub const UPLOADED_ARTIFACT: &str = "image_uploaded.jpg";
pub const DIFF_ARTIFACT: &str = "image_diff.jpg";
pub const THRESH_ARTIFACT: &str = "image_thresh.jpg";
pub const MONTAGE_ARTIFACT: &str = "image_comparison.jpg";
/// 上传目录中归一化上传图的文件名。
pub const UPLOAD_FILE_NAME: &str = "image.jpg";

/// 在参考图目录中按优先级查找参考图。
///
/// # 返回
/// - `Ok(PathBuf)` — 第一个存在的候选文件
/// - `Err(CompareError::MissingReference)` — 所有候选均不存在
pub fn locate_reference(dir: &Path) -> Result<PathBuf, CompareError> {
    for name in REFERENCE_CANDIDATES {
        let candidate = dir.join(name);
        if candidate.is_file() {
            log::debug!("📍 找到参考图：{}", candidate.display());
            return Ok(candidate);
        }
    }

    Err(CompareError::MissingReference {
        dir: dir.display().to_string(),
        tried: REFERENCE_CANDIDATES.to_vec(),
    })
}

/// 一次交付写出的产物路径。
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct DeliveredArtifacts {
    pub original: PathBuf,
    pub uploaded: PathBuf,
    pub diff: PathBuf,
    pub thresh: PathBuf,
    pub normalized_upload: PathBuf,
    pub montage: Option<PathBuf>,
}

/// 目录产物接收方：按固定文件名写入产物目录与上传目录。
#[derive(Debug, Clone)]
pub struct DirectorySink {
    output_dir: PathBuf,
    upload_dir: PathBuf,
    artifact_quality: u8,
    upload_quality: u8,
    write_montage: bool,
}

impl DirectorySink {
    pub fn from_config(config: &CompareConfig) -> Self {
        Self {
            output_dir: config.output_dir.clone(),
            upload_dir: config.upload_dir.clone(),
            artifact_quality: config.artifact_quality,
            upload_quality: config.upload_quality,
            write_montage: config.write_montage,
        }
    }

    /// 编码全部产物，返回 `(目标路径, JPEG 字节)` 列表。
    fn encode_all(&self, report: &ComparisonReport) -> Result<Vec<(PathBuf, Vec<u8>)>, CompareError> {
        let quality = self.artifact_quality;
        let mut pending = vec![
            (
                self.output_dir.join(ORIGINAL_ARTIFACT),
                encode_jpeg(DynamicImage::ImageRgb8(report.annotated_reference.clone()), quality)?,
            ),
            (
                self.output_dir.join(UPLOADED_ARTIFACT),
                encode_jpeg(DynamicImage::ImageRgb8(report.annotated_candidate.clone()), quality)?,
            ),
            (
                self.output_dir.join(DIFF_ARTIFACT),
                encode_jpeg(DynamicImage::ImageLuma8(report.similarity.difference.clone()), quality)?,
            ),
            (
                self.output_dir.join(THRESH_ARTIFACT),
                encode_jpeg(DynamicImage::ImageLuma8(report.extraction.threshold_map.clone()), quality)?,
            ),
            (
                self.upload_dir.join(UPLOAD_FILE_NAME),
                encode_jpeg(
                    DynamicImage::ImageRgb8(report.normalized_candidate.clone()),
                    self.upload_quality,
                )?,
            ),
        ];

        if self.write_montage {
            let canvas = annotate::montage(
                &report.annotated_reference,
                &report.annotated_candidate,
                &report.similarity.difference,
                &report.extraction.threshold_map,
            );
            pending.push((
                self.output_dir.join(MONTAGE_ARTIFACT),
                encode_jpeg(DynamicImage::ImageRgb8(canvas), quality)?,
            ));
        }

        Ok(pending)
    }
}

impl ResultSink for DirectorySink {
    type Receipt = DeliveredArtifacts;

    fn deliver(&mut self, report: &ComparisonReport) -> Result<DeliveredArtifacts, CompareError> {
        let pending = self.encode_all(report)?;

        for dir in [&self.output_dir, &self.upload_dir] {
            fs::create_dir_all(dir).map_err(|e| {
                CompareError::FileSystem(format!("创建目录 '{}' 失败: {}", dir.display(), e))
            })?;
        }

        // 先全部写入临时文件，全部成功后再逐个改名覆盖正式文件
        let mut staged: Vec<(PathBuf, &Path)> = Vec::with_capacity(pending.len());
        for (path, bytes) in &pending {
            let staging = staging_path(path);
            if let Err(e) = fs::write(&staging, bytes) {
                let _ = fs::remove_file(&staging);
                discard_staged(&staged);
                return Err(CompareError::FileSystem(format!(
                    "写入产物 '{}' 失败: {}",
                    path.display(),
                    e
                )));
            }
            staged.push((staging, path.as_path()));
        }

        for (index, (staging, path)) in staged.iter().enumerate() {
            if let Err(e) = fs::rename(staging, path) {
                discard_staged(&staged[index..]);
                return Err(CompareError::FileSystem(format!(
                    "替换产物 '{}' 失败: {}",
                    path.display(),
                    e
                )));
            }
        }

        log::info!("💾 已写出 {} 个比对产物到 {}", staged.len(), self.output_dir.display());

        Ok(DeliveredArtifacts {
            original: self.output_dir.join(ORIGINAL_ARTIFACT),
            uploaded: self.output_dir.join(UPLOADED_ARTIFACT),
            diff: self.output_dir.join(DIFF_ARTIFACT),
            thresh: self.output_dir.join(THRESH_ARTIFACT),
            normalized_upload: self.upload_dir.join(UPLOAD_FILE_NAME),
            montage: self
                .write_montage
                .then(|| self.output_dir.join(MONTAGE_ARTIFACT)),
        })
    }
}

/// 临时文件路径：`image_diff.jpg` → `image_diff.jpg.partial`。
fn staging_path(path: &Path) -> PathBuf {
    let mut name = path.file_name().map(|n| n.to_os_string()).unwrap_or_default();
    name.push(".partial");
    path.with_file_name(name)
}

fn discard_staged(staged: &[(PathBuf, &Path)]) {
    for (staging, _) in staged {
        if let Err(e) = fs::remove_file(staging) {
            log::warn!("清理临时产物 '{}' 失败: {}", staging.display(), e);
        }
    }
}

fn encode_jpeg(image: DynamicImage, quality: u8) -> Result<Vec<u8>, CompareError> {
    let mut buffer = Vec::new();
    let encoder = JpegEncoder::new_with_quality(&mut buffer, quality);
    image
        .write_with_encoder(encoder)
        .map_err(|e| CompareError::Encode(format!("JPEG 编码失败: {}", e)))?;
    Ok(buffer)
}
