//! # 归一化流水线模块
//!
//! ## 设计思路
//!
//! 将“字节 → 图像 → RGB → 固定尺寸”的过程集中管理，保证同一像素内容
//! 无论来源编码为何，都得到确定的归一化结果，避免容器格式本身影响相似度。
//!
//! ## 实现思路
//!
//! 1. 字节体积限制
//! 2. 按策略链解码
//! 3. 像素上限校验
//! 4. 透明通道合成到白底；灰度图广播为三通道
//! 5. Lanczos3 缩放到 250×160（`fast_image_resize` 失败时回退 `image::imageops`）

use fast_image_resize as fr;
use image::imageops::FilterType;
use image::{DynamicImage, ImageBuffer, Rgb, RgbImage, RgbaImage};

use super::source::{NORMALIZED_HEIGHT, NORMALIZED_WIDTH, NormalizedImage, RawImage};
use super::{CompareConfig, CompareError, ComparisonHandler};

impl ComparisonHandler {
    /// 将原始字节解码并归一化为 250×160 RGB 图像。
    pub fn normalize(&self, raw: &RawImage) -> Result<NormalizedImage, CompareError> {
        Self::validate_file_size(&self.config, raw)?;

        let decoded = self.decoders.decode(raw)?;
        let (raw_width, raw_height) = (decoded.width(), decoded.height());
        Self::validate_pixel_limits(&self.config, raw_width, raw_height)?;

        let rgb = flatten_to_rgb(decoded);
        let pixels = resize_lanczos(&rgb, NORMALIZED_WIDTH, NORMALIZED_HEIGHT)?;

        log::debug!(
            "✅ {}图片归一化完成 - 原始尺寸: {}x{} 输出尺寸: {}x{}",
            raw.role,
            raw_width,
            raw_height,
            pixels.width(),
            pixels.height()
        );

        Ok(NormalizedImage { pixels })
    }

    fn validate_file_size(config: &CompareConfig, raw: &RawImage) -> Result<(), CompareError> {
        if raw.bytes.len() as u64 > config.max_file_size {
            return Err(CompareError::ResourceLimit(format!(
                "{}图片过大：{:.2} MB（限制：{:.2} MB）",
                raw.role,
                raw.bytes.len() as f64 / 1024.0 / 1024.0,
                config.max_file_size as f64 / 1024.0 / 1024.0
            )));
        }

        Ok(())
    }

    /// 校验像素数量是否超过配置上限。
    fn validate_pixel_limits(
        config: &CompareConfig,
        width: u32,
        height: u32,
    ) -> Result<(), CompareError> {
        let pixels = (width as u64)
            .checked_mul(height as u64)
            .ok_or_else(|| CompareError::ResourceLimit("图片像素数溢出".to_string()))?;

        if pixels == 0 {
            return Err(CompareError::ResourceLimit("图片尺寸为空".to_string()));
        }

        if pixels > config.max_decoded_pixels {
            return Err(CompareError::ResourceLimit(format!(
                "图片像素过大：{} 像素（限制：{} 像素）",
                pixels, config.max_decoded_pixels
            )));
        }

        Ok(())
    }
}

/// 统一转换为 8 位三通道：带透明通道的合成到白底，灰度图广播为三通道。
pub(crate) fn flatten_to_rgb(image: DynamicImage) -> RgbImage {
    if image.color().has_alpha() {
        composite_over_white(&image.to_rgba8())
    } else {
        image.to_rgb8()
    }
}

/// 将 RGBA 合成到白色背景：`out = fg * alpha + 255 * (1 - alpha)`。
pub(crate) fn composite_over_white(rgba: &RgbaImage) -> RgbImage {
    ImageBuffer::from_fn(rgba.width(), rgba.height(), |x, y| {
        let [r, g, b, a] = rgba.get_pixel(x, y).0;
        let alpha = a as f32 / 255.0;
        let blend = |channel: u8| -> u8 {
            (channel as f32 * alpha + 255.0 * (1.0 - alpha))
                .round()
                .clamp(0.0, 255.0) as u8
        };
        Rgb([blend(r), blend(g), blend(b)])
    })
}

/// Lanczos3 缩放到目标尺寸。
pub(crate) fn resize_lanczos(
    image: &RgbImage,
    target_width: u32,
    target_height: u32,
) -> Result<RgbImage, CompareError> {
    if image.dimensions() == (target_width, target_height) {
        return Ok(image.clone());
    }

    match resize_with_fast_image_resize(image, target_width, target_height) {
        Ok(resized) => Ok(resized),
        Err(err) => {
            log::warn!("⚠️ fast_image_resize 缩放失败，回退 image::imageops::resize：{}", err);
            Ok(image::imageops::resize(
                image,
                target_width,
                target_height,
                FilterType::Lanczos3,
            ))
        }
    }
}

fn resize_with_fast_image_resize(
    image: &RgbImage,
    target_width: u32,
    target_height: u32,
) -> Result<RgbImage, CompareError> {
    // `image` 特性下 DynamicImage 直接实现 IntoImageView / IntoImageViewMut
    let src_image = DynamicImage::ImageRgb8(image.clone());
    let mut dst_image = DynamicImage::new_rgb8(target_width, target_height);

    let mut resizer = fr::Resizer::new();
    let options = fr::ResizeOptions::new()
        .resize_alg(fr::ResizeAlg::Convolution(fr::FilterType::Lanczos3));

    resizer
        .resize(&src_image, &mut dst_image, Some(&options))
        .map_err(|e| CompareError::Encode(format!("fast_image_resize 执行失败：{}", e)))?;

    Ok(dst_image.into_rgb8())
}
