//! # 标注与结论模块
//!
//! 在两张归一化图像上为每个差异区域绘制 2px 红框，并生成结论文案。
//! 纯渲染步骤，除遍历区域外不含分支逻辑。

use image::{DynamicImage, GrayImage, Rgb, RgbImage, imageops};
use imageproc::drawing::draw_hollow_rect_mut;
use imageproc::rect::Rect;

use super::source::{Region, RegionSet};

/// 标注框颜色（红）。
pub const HIGHLIGHT_COLOR: Rgb<u8> = Rgb([255, 0, 0]);
/// 标注框线宽（像素）。
pub const BORDER_WIDTH: u32 = 2;

/// 在图像副本上绘制所有区域的标注框。
pub fn annotate(image: &RgbImage, regions: &RegionSet) -> RgbImage {
    let mut canvas = image.clone();
    for region in regions {
        draw_region(&mut canvas, region);
    }
    canvas
}

/// 绘制单个标注框：覆盖 `(x, y)` 到 `(x + width, y + height)`，向外加粗。
fn draw_region(canvas: &mut RgbImage, region: &Region) {
    for inset in 0..BORDER_WIDTH {
        let offset = inset as i32;
        let rect = Rect::at(region.x as i32 - offset, region.y as i32 - offset)
            .of_size(region.width + 1 + 2 * inset, region.height + 1 + 2 * inset);
        draw_hollow_rect_mut(canvas, rect, HIGHLIGHT_COLOR);
    }
}

/// 结论文案：SSIM 得分转百分比并保留两位小数，例如 `"97.43% correct"`。
pub fn format_label(score: f64) -> String {
    let percentage = (score * 10_000.0).round() / 100.0;
    format!("{:.2}% correct", percentage)
}

/// 2×2 拼接图：上排参考图 | 上传图，下排差异图 | 阈值图。
pub fn montage(
    annotated_reference: &RgbImage,
    annotated_candidate: &RgbImage,
    difference: &GrayImage,
    threshold_map: &GrayImage,
) -> RgbImage {
    let (width, height) = annotated_reference.dimensions();
    let mut canvas = RgbImage::new(width * 2, height * 2);

    let difference_rgb = DynamicImage::ImageLuma8(difference.clone()).to_rgb8();
    let threshold_rgb = DynamicImage::ImageLuma8(threshold_map.clone()).to_rgb8();

    imageops::replace(&mut canvas, annotated_reference, 0, 0);
    imageops::replace(&mut canvas, annotated_candidate, width as i64, 0);
    imageops::replace(&mut canvas, &difference_rgb, 0, height as i64);
    imageops::replace(&mut canvas, &threshold_rgb, width as i64, height as i64);

    canvas
}
