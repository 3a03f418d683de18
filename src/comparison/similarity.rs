//! # 结构相似度模块
//!
//! ## 设计思路
//!
//! 纯函数：输入两张同尺寸归一化图像，输出 SSIM 均值与逐像素差异图，无副作用。
//!
//! ## 实现思路
//!
//! - 亮度转换采用 BT.601 权重（0.299 / 0.587 / 0.114），14 位定点并四舍五入。
//! - SSIM 使用 7×7 均值窗口、样本协方差（N/(N-1)）、K1=0.01、K2=0.03、数据范围 255。
//! - 窗口均值用可分离的一维盒式滤波实现，边界按半像素对称镜像（`d c b a | a b c d`）。
//! - 全图得分为去掉四周 3 像素边界后的 SSIM 均值。
//! - 差异图像素 = `round(clamp(ssim, 0, 1) * 255)`，越暗差异越大。

use image::{GrayImage, ImageBuffer, Luma};

use super::CompareError;
use super::source::{GrayscaleMap, NormalizedImage, SimilarityResult};

const WINDOW_SIZE: usize = 7;
const K1: f64 = 0.01;
const K2: f64 = 0.03;
const DATA_RANGE: f64 = 255.0;

const LUMA_SHIFT: u32 = 14;
const LUMA_R: u32 = 4899;
const LUMA_G: u32 = 9617;
const LUMA_B: u32 = 1868;

/// 将归一化 RGB 图像转换为亮度图。
pub fn to_grayscale(image: &NormalizedImage) -> GrayscaleMap {
    let rgb = image.pixels();
    let gray = ImageBuffer::from_fn(rgb.width(), rgb.height(), |x, y| {
        let [r, g, b] = rgb.get_pixel(x, y).0;
        let luma = (r as u32 * LUMA_R + g as u32 * LUMA_G + b as u32 * LUMA_B
            + (1 << (LUMA_SHIFT - 1)))
            >> LUMA_SHIFT;
        Luma([luma.min(255) as u8])
    });

    GrayscaleMap(gray)
}

/// 比对两张归一化图像。
pub fn compare(
    reference: &NormalizedImage,
    candidate: &NormalizedImage,
) -> Result<SimilarityResult, CompareError> {
    if reference.dimensions() != candidate.dimensions() {
        return Err(CompareError::ShapeMismatch {
            reference: reference.dimensions(),
            candidate: candidate.dimensions(),
        });
    }

    structural_similarity(&to_grayscale(reference), &to_grayscale(candidate))
}

/// 计算两张亮度图的 SSIM 得分与差异图。
pub fn structural_similarity(
    reference: &GrayscaleMap,
    candidate: &GrayscaleMap,
) -> Result<SimilarityResult, CompareError> {
    if reference.dimensions() != candidate.dimensions() {
        return Err(CompareError::ShapeMismatch {
            reference: reference.dimensions(),
            candidate: candidate.dimensions(),
        });
    }

    let (width, height) = reference.dimensions();
    let (w, h) = (width as usize, height as usize);
    if w < WINDOW_SIZE || h < WINDOW_SIZE {
        return Err(CompareError::ResourceLimit(format!(
            "图片尺寸 {}x{} 小于 SSIM 窗口 {}x{}",
            width, height, WINDOW_SIZE, WINDOW_SIZE
        )));
    }

    let x: Vec<f64> = reference.as_image().as_raw().iter().map(|&v| v as f64).collect();
    let y: Vec<f64> = candidate.as_image().as_raw().iter().map(|&v| v as f64).collect();
    let xx: Vec<f64> = x.iter().map(|v| v * v).collect();
    let yy: Vec<f64> = y.iter().map(|v| v * v).collect();
    let xy: Vec<f64> = x.iter().zip(&y).map(|(a, b)| a * b).collect();

    let ux = uniform_filter(&x, w, h);
    let uy = uniform_filter(&y, w, h);
    let uxx = uniform_filter(&xx, w, h);
    let uyy = uniform_filter(&yy, w, h);
    let uxy = uniform_filter(&xy, w, h);

    let samples = (WINDOW_SIZE * WINDOW_SIZE) as f64;
    let cov_norm = samples / (samples - 1.0);
    let c1 = (K1 * DATA_RANGE).powi(2);
    let c2 = (K2 * DATA_RANGE).powi(2);

    let ssim_map: Vec<f64> = (0..w * h)
        .map(|i| {
            let vx = cov_norm * (uxx[i] - ux[i] * ux[i]);
            let vy = cov_norm * (uyy[i] - uy[i] * uy[i]);
            let vxy = cov_norm * (uxy[i] - ux[i] * uy[i]);

            let a1 = 2.0 * ux[i] * uy[i] + c1;
            let a2 = 2.0 * vxy + c2;
            let b1 = ux[i] * ux[i] + uy[i] * uy[i] + c1;
            let b2 = vx + vy + c2;

            (a1 * a2) / (b1 * b2)
        })
        .collect();

    let pad = (WINDOW_SIZE - 1) / 2;
    let mut total = 0.0;
    let mut count = 0usize;
    for row in pad..h - pad {
        for col in pad..w - pad {
            total += ssim_map[row * w + col];
            count += 1;
        }
    }
    let score = total / count as f64;

    let difference: GrayImage = ImageBuffer::from_fn(width, height, |col, row| {
        let value = ssim_map[row as usize * w + col as usize];
        Luma([(value.clamp(0.0, 1.0) * 255.0).round() as u8])
    });

    Ok(SimilarityResult { score, difference })
}

/// 7×7 均值滤波（先横向后纵向），边界半像素对称镜像。
fn uniform_filter(data: &[f64], width: usize, height: usize) -> Vec<f64> {
    let radius = (WINDOW_SIZE / 2) as isize;
    let scale = 1.0 / WINDOW_SIZE as f64;

    let mut horizontal = vec![0.0; data.len()];
    for row in 0..height {
        let line = &data[row * width..(row + 1) * width];
        for col in 0..width {
            let sum: f64 = (-radius..=radius)
                .map(|offset| line[reflect_index(col as isize + offset, width)])
                .sum();
            horizontal[row * width + col] = sum * scale;
        }
    }

    let mut output = vec![0.0; data.len()];
    for row in 0..height {
        for col in 0..width {
            let sum: f64 = (-radius..=radius)
                .map(|offset| horizontal[reflect_index(row as isize + offset, height) * width + col])
                .sum();
            output[row * width + col] = sum * scale;
        }
    }

    output
}

/// 半像素对称镜像下标：`-1 -> 0`，`n -> n - 1`。
fn reflect_index(index: isize, len: usize) -> usize {
    let period = 2 * len as isize;
    let folded = index.rem_euclid(period);
    if folded < len as isize {
        folded as usize
    } else {
        (period - 1 - folded) as usize
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::comparison::source::{NORMALIZED_HEIGHT, NORMALIZED_WIDTH};
    use image::{Rgb, RgbImage};

    fn normalized(pixels: RgbImage) -> NormalizedImage {
        NormalizedImage { pixels }
    }

    fn textured() -> RgbImage {
        RgbImage::from_fn(NORMALIZED_WIDTH, NORMALIZED_HEIGHT, |x, y| {
            Rgb([((x * 7 + y * 3) % 256) as u8, ((x * y) % 256) as u8, ((x + 2 * y) % 256) as u8])
        })
    }

    #[test]
    fn bt601_weights_on_primaries() {
        let pixels = RgbImage::from_fn(4, 1, |x, _| match x {
            0 => Rgb([255, 0, 0]),
            1 => Rgb([0, 255, 0]),
            2 => Rgb([0, 0, 255]),
            _ => Rgb([255, 255, 255]),
        });

        let gray = to_grayscale(&normalized(pixels));
        let values: Vec<u8> = gray.as_image().as_raw().clone();

        assert_eq!(values, vec![76, 150, 29, 255]);
    }

    #[test]
    fn identical_images_score_exactly_one() {
        let image = normalized(textured());
        let copy = normalized(textured());

        let result = compare(&image, &copy).expect("compare");

        assert_eq!(result.score, 1.0);
        assert!(result.difference.pixels().all(|p| p.0[0] == 255));
    }

    #[test]
    fn altered_patch_lowers_score_and_darkens_difference() {
        let reference = normalized(textured());
        let mut altered = textured();
        for y in 60..80 {
            for x in 100..120 {
                altered.put_pixel(x, y, Rgb([0, 0, 0]));
            }
        }
        let candidate = normalized(altered);

        let result = compare(&reference, &candidate).expect("compare");

        assert!(result.score < 1.0);
        assert!(result.difference.get_pixel(110, 70).0[0] < 128);
        assert_eq!(result.difference.get_pixel(10, 10).0[0], 255);
    }

    #[test]
    fn ranks_tampering_like_block_mssim() {
        use image_compare::Algorithm;

        let blackout = |size: u32| {
            let mut image = textured();
            for y in 40..40 + size {
                for x in 60..60 + size {
                    image.put_pixel(x, y, Rgb([0, 0, 0]));
                }
            }
            normalized(image)
        };
        let reference = normalized(textured());
        let light = blackout(12);
        let heavy = blackout(90);

        let ours = |candidate: &NormalizedImage| compare(&reference, candidate).expect("compare").score;
        let block = |candidate: &NormalizedImage| {
            image_compare::gray_similarity_structure(
                &Algorithm::MSSIMSimple,
                to_grayscale(&reference).as_image(),
                to_grayscale(candidate).as_image(),
            )
            .expect("block mssim")
            .score
        };

        assert!(block(&reference) > 0.9999);
        assert_eq!(ours(&reference), 1.0);
        assert!(block(&light) > block(&heavy));
        assert!(ours(&light) > ours(&heavy));
        assert!(ours(&heavy) < 1.0 && block(&heavy) < 1.0);
    }

    #[test]
    fn shape_mismatch_is_rejected() {
        let reference = normalized(RgbImage::new(250, 160));
        let candidate = normalized(RgbImage::new(160, 250));

        assert!(matches!(
            compare(&reference, &candidate),
            Err(CompareError::ShapeMismatch { reference: (250, 160), candidate: (160, 250) })
        ));
    }

    #[test]
    fn image_smaller_than_window_is_rejected() {
        let tiny = GrayscaleMap(GrayImage::new(5, 5));

        assert!(matches!(
            structural_similarity(&tiny, &tiny),
            Err(CompareError::ResourceLimit(_))
        ));
    }

    #[test]
    fn reflect_index_mirrors_half_sample() {
        assert_eq!(reflect_index(-1, 5), 0);
        assert_eq!(reflect_index(-3, 5), 2);
        assert_eq!(reflect_index(5, 5), 4);
        assert_eq!(reflect_index(7, 5), 2);
        assert_eq!(reflect_index(2, 5), 2);
    }

    #[test]
    fn uniform_filter_keeps_constant_signal() {
        let data = vec![42.0; 20 * 10];
        let filtered = uniform_filter(&data, 20, 10);

        assert!(filtered.iter().all(|v| (v - 42.0).abs() < 1e-9));
    }
}
