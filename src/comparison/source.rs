//! # 数据源与中间模型
//!
//! ## 设计思路
//!
//! 将“外部输入类型”和“流水线中间结果”解耦：
//! - `ImageSource` 表示外部来源语义
//! - `RawImage` 表示已加载但未解码的字节
//! - `NormalizedImage` / `GrayscaleMap` 表示归一化后的像素
//! - `SimilarityResult` / `RegionSet` 表示比对与区域提取的结果
//!
//! 所有中间值在单次请求内创建一次、只读使用，请求结束即丢弃。

use std::fmt;
use std::path::PathBuf;

use image::{GrayImage, RgbImage};
use serde::Serialize;

use super::format::ImageExtension;

/// 归一化目标宽度（像素）。
pub const NORMALIZED_WIDTH: u32 = 250;
/// 归一化目标高度（像素）。
pub const NORMALIZED_HEIGHT: u32 = 160;

/// 图片在一次比对中的角色。
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ImageRole {
    /// 预先存放的参考图。
    Reference,
    /// 本次上传的待检图。
    Candidate,
}

impl fmt::Display for ImageRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Reference => f.write_str("参考"),
            Self::Candidate => f.write_str("上传"),
        }
    }
}

/// 待检图输入来源。
pub enum ImageSource {
    /// 本地文件路径来源。
    FilePath(PathBuf),
    /// 内存字节来源（如上传表单），附带声明的文件名。
    Bytes { file_name: String, bytes: Vec<u8> },
}

/// 加载阶段输出：原始字节、声明格式与角色。
pub struct RawImage {
    /// 原始图片字节。
    pub bytes: Vec<u8>,
    /// 由文件名扩展名得到的声明格式。
    pub extension: ImageExtension,
    /// 图片角色（用于日志与错误定位）。
    pub role: ImageRole,
}

/// 归一化输出：固定 250×160 的 RGB 图像。
#[derive(Debug, Clone)]
pub struct NormalizedImage {
    pub(crate) pixels: RgbImage,
}

impl NormalizedImage {
    pub fn pixels(&self) -> &RgbImage {
        &self.pixels
    }

    pub fn dimensions(&self) -> (u32, u32) {
        self.pixels.dimensions()
    }

    pub fn into_pixels(self) -> RgbImage {
        self.pixels
    }
}

/// 单通道亮度图，仅用于相似度计算。
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GrayscaleMap(pub(crate) GrayImage);

impl GrayscaleMap {
    pub fn as_image(&self) -> &GrayImage {
        &self.0
    }

    pub fn dimensions(&self) -> (u32, u32) {
        self.0.dimensions()
    }
}

/// 相似度计算结果。
#[derive(Debug, Clone)]
pub struct SimilarityResult {
    /// 全图 SSIM 均值，理论范围 [-1, 1]，1.0 表示完全一致。
    pub score: f64,
    /// 逐像素差异图（0–255），亮度越低差异越大。
    pub difference: GrayImage,
}

impl SimilarityResult {
    /// 百分比得分，保留两位小数。
    pub fn percentage(&self) -> f64 {
        (self.score * 10_000.0).round() / 100.0
    }
}

/// 差异区域的外接矩形。
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Region {
    pub x: u32,
    pub y: u32,
    pub width: u32,
    pub height: u32,
}

/// 差异区域集合，顺序即轮廓发现顺序。
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct RegionSet(pub(crate) Vec<Region>);

impl RegionSet {
    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Region> {
        self.0.iter()
    }

    pub fn as_slice(&self) -> &[Region] {
        &self.0
    }
}

impl<'a> IntoIterator for &'a RegionSet {
    type Item = &'a Region;
    type IntoIter = std::slice::Iter<'a, Region>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.iter()
    }
}

/// 二值化阶段输出：Otsu 阈值、阈值图与区域集合。
#[derive(Debug, Clone)]
pub struct RegionExtraction {
    pub level: u8,
    pub threshold_map: GrayImage,
    pub regions: RegionSet,
}

/// 单次比对的完整产物，交给结果接收方输出。
#[derive(Debug, Clone)]
pub struct ComparisonReport {
    pub similarity: SimilarityResult,
    pub extraction: RegionExtraction,
    /// 标注后的参考图。
    pub annotated_reference: RgbImage,
    /// 标注后的上传图。
    pub annotated_candidate: RgbImage,
    /// 未标注的归一化上传图（用于回显）。
    pub normalized_candidate: RgbImage,
}

impl ComparisonReport {
    pub fn percentage(&self) -> f64 {
        self.similarity.percentage()
    }

    /// 面向用户的结论文案，例如 `"97.43% correct"`。
    pub fn label(&self) -> String {
        super::annotate::format_label(self.similarity.score)
    }

    pub fn regions(&self) -> &RegionSet {
        &self.extraction.regions
    }
}
