//! # 差异区域提取模块
//!
//! ## 设计思路
//!
//! 无状态工具：输入一张差异图，输出 Otsu 阈值、二值图与外轮廓外接矩形。
//!
//! ## 实现思路
//!
//! 1. `imageproc` 计算 Otsu 全局阈值
//! 2. 反相二值化：`<= level` 记为前景（255），其余为背景（0）
//! 3. 二值图四周补一圈背景后做边界跟踪，只保留无父轮廓的外边界
//! 4. 每条外轮廓求轴对齐外接矩形，再减去补边偏移
//!
//! `find_contours` 只在左邻像素为背景时开始一条外边界，贴着第 0 列的前景
//! 因此得不到外轮廓。补边后图像外侧一律视为背景，贴边区域照常上报。
//!
//! 不做最小面积过滤：单像素噪点同样会产出矩形。

use image::{GrayImage, ImageBuffer, Luma, imageops};
use imageproc::contours::{BorderType, Contour, find_contours};
use imageproc::contrast::otsu_level;

use super::source::{Region, RegionExtraction, RegionSet};

const FOREGROUND: u8 = 255;
const BACKGROUND: u8 = 0;
/// 边界跟踪前四周补背景的宽度。
const FRAME_PADDING: u32 = 1;

/// 对差异图做 Otsu 反相二值化并提取外轮廓矩形。
pub fn extract_regions(difference: &GrayImage) -> RegionExtraction {
    let level = otsu_level(difference);
    // 全图同值时 Otsu 返回 0：全 255 的差异图没有前景，全 0 的差异图整图为前景。
    let threshold_map = binarize_inverted(difference, level);
    let regions = external_bounding_boxes(&threshold_map);

    log::debug!(
        "🔎 差异区域提取完成 - otsu={} 区域数={}",
        level,
        regions.len()
    );

    RegionExtraction {
        level,
        threshold_map,
        regions,
    }
}

/// 反相二值化：差异越大（像素越暗）越属于前景。
pub fn binarize_inverted(image: &GrayImage, level: u8) -> GrayImage {
    ImageBuffer::from_fn(image.width(), image.height(), |x, y| {
        if image.get_pixel(x, y).0[0] > level {
            Luma([BACKGROUND])
        } else {
            Luma([FOREGROUND])
        }
    })
}

/// 只取外边界（无父轮廓）的外接矩形。
pub fn external_bounding_boxes(binary: &GrayImage) -> RegionSet {
    let framed = pad_with_background(binary);
    let contours: Vec<Contour<u32>> = find_contours(&framed);

    let regions = contours
        .iter()
        .filter(|contour| contour.border_type == BorderType::Outer && contour.parent.is_none())
        .filter_map(bounding_rect)
        .collect();

    RegionSet(regions)
}

fn pad_with_background(binary: &GrayImage) -> GrayImage {
    let mut framed = GrayImage::from_pixel(
        binary.width() + 2 * FRAME_PADDING,
        binary.height() + 2 * FRAME_PADDING,
        Luma([BACKGROUND]),
    );
    imageops::replace(&mut framed, binary, FRAME_PADDING as i64, FRAME_PADDING as i64);
    framed
}

/// 外接矩形，坐标换算回未补边的图像。
fn bounding_rect(contour: &Contour<u32>) -> Option<Region> {
    let first = contour.points.first()?;
    let (mut min_x, mut min_y, mut max_x, mut max_y) = (first.x, first.y, first.x, first.y);

    for point in &contour.points {
        min_x = min_x.min(point.x);
        min_y = min_y.min(point.y);
        max_x = max_x.max(point.x);
        max_y = max_y.max(point.y);
    }

    Some(Region {
        x: min_x - FRAME_PADDING,
        y: min_y - FRAME_PADDING,
        width: max_x - min_x + 1,
        height: max_y - min_y + 1,
    })
}
