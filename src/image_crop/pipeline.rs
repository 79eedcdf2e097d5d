//! # 裁剪 → 降采样 → 编码
//!
//! ## 实现思路
//!
//! 1. 按原始像素矩形裁出画布（不做额外插值）
//! 2. 宽度严格大于上限时单次等比降采样，优先 `fast_image_resize`，失败回退 `resize_exact`
//! 3. 透明像素按 alpha 合成到黑色背景（与浏览器 canvas 导出 JPEG 一致）
//! 4. 编码为 JPEG；空画布或编码器报错都视为 `Encode` 失败

use fast_image_resize as fr;
use image::codecs::jpeg::JpegEncoder;
use image::imageops::FilterType;
use image::{DynamicImage, ExtendedColorType, GenericImageView, ImageBuffer, Rgb, RgbImage, Rgba};

use super::geometry;
use super::source::{EncodedImage, ImageSource, NativeRect, OutputFormat, ResizeConstraint};
use super::{CropConfig, CropError, CropHandler};

impl CropHandler {
    /// 按原始像素矩形提取裁剪画布。
    pub(super) fn extract(source: &ImageSource, rect: NativeRect) -> Result<DynamicImage, CropError> {
        if rect.width == 0 || rect.height == 0 {
            return Err(CropError::Extraction("裁剪区域为空".to_string()));
        }

        let within_x = rect.x.checked_add(rect.width).is_some_and(|r| r <= source.natural_width());
        let within_y = rect.y.checked_add(rect.height).is_some_and(|b| b <= source.natural_height());
        if !within_x || !within_y {
            return Err(CropError::Extraction(format!(
                "裁剪区域超出原始尺寸：{:?} / {}x{}",
                rect,
                source.natural_width(),
                source.natural_height()
            )));
        }

        Ok(source.image().crop_imm(rect.x, rect.y, rect.width, rect.height))
    }

    /// 宽度超过上限时等比降采样，否则原样返回（永不放大）。
    pub(super) fn maybe_downscale(
        surface: DynamicImage,
        constraint: ResizeConstraint,
        config: &CropConfig,
    ) -> DynamicImage {
        let (width, height) = surface.dimensions();
        let Some((target_width, target_height)) = geometry::downscale_target(width, height, constraint) else {
            return surface;
        };

        log::info!(
            "🧩 降采样：{}x{} -> {}x{}（filter={:?}）",
            width,
            height,
            target_width,
            target_height,
            config.resize_filter
        );

        match Self::resize_with_fast_image_resize(&surface, target_width, target_height, config.resize_filter) {
            Ok(resized) => resized,
            Err(err) => {
                log::warn!("⚠️ fast_image_resize 降采样失败，回退 image::resize_exact：{}", err);
                surface.resize_exact(target_width, target_height, config.resize_filter)
            }
        }
    }

    fn resize_with_fast_image_resize(
        image: &DynamicImage,
        target_width: u32,
        target_height: u32,
        filter: FilterType,
    ) -> Result<DynamicImage, CropError> {
        let src = image.to_rgba8();
        let (src_width, src_height) = src.dimensions();

        let src_image = fr::images::Image::from_vec_u8(src_width, src_height, src.into_raw(), fr::PixelType::U8x4)
            .map_err(|e| CropError::Extraction(format!("构建源图像缓冲失败：{}", e)))?;

        let mut dst_image = fr::images::Image::new(target_width, target_height, fr::PixelType::U8x4);

        let mut resizer = fr::Resizer::new();
        let options = fr::ResizeOptions::new().resize_alg(Self::to_fast_alg(filter));

        resizer
            .resize(&src_image, &mut dst_image, Some(&options))
            .map_err(|e| CropError::Extraction(format!("fast_image_resize 执行失败：{}", e)))?;

        let rgba = ImageBuffer::<Rgba<u8>, Vec<u8>>::from_raw(target_width, target_height, dst_image.into_vec())
            .ok_or_else(|| CropError::Extraction("fast_image_resize 输出缓冲长度异常".to_string()))?;

        Ok(DynamicImage::ImageRgba8(rgba))
    }

    fn to_fast_alg(filter: FilterType) -> fr::ResizeAlg {
        match filter {
            FilterType::Nearest => fr::ResizeAlg::Convolution(fr::FilterType::Box),
            FilterType::Triangle => fr::ResizeAlg::Convolution(fr::FilterType::Bilinear),
            FilterType::CatmullRom => fr::ResizeAlg::Convolution(fr::FilterType::CatmullRom),
            FilterType::Gaussian => fr::ResizeAlg::Convolution(fr::FilterType::Mitchell),
            FilterType::Lanczos3 => fr::ResizeAlg::Convolution(fr::FilterType::Lanczos3),
        }
    }

    /// JPEG 没有透明通道：按 alpha 合成到黑色背景，不保留透明像素下的原始颜色。
    fn flatten_on_black(surface: &DynamicImage) -> RgbImage {
        if !surface.color().has_alpha() {
            return surface.to_rgb8();
        }

        let rgba = surface.to_rgba8();
        let premultiply = |c: u8, a: u8| ((c as u16 * a as u16 + 127) / 255) as u8;
        ImageBuffer::from_fn(rgba.width(), rgba.height(), |x, y| {
            let [r, g, b, a] = rgba.get_pixel(x, y).0;
            Rgb([premultiply(r, a), premultiply(g, a), premultiply(b, a)])
        })
    }

    /// 将最终画布编码为 JPEG。
    pub(super) fn encode(surface: &DynamicImage, quality: u8) -> Result<EncodedImage, CropError> {
        let (width, height) = surface.dimensions();
        if width == 0 || height == 0 {
            return Err(CropError::Encode(format!("画布为空：{}x{}", width, height)));
        }

        let rgb = Self::flatten_on_black(surface);
        let mut buf = Vec::new();
        JpegEncoder::new_with_quality(&mut buf, quality.clamp(1, 100))
            .encode(rgb.as_raw(), width, height, ExtendedColorType::Rgb8)
            .map_err(|e| CropError::Encode(format!("JPEG 编码失败：{}", e)))?;

        if buf.is_empty() {
            return Err(CropError::Encode("编码输出为空".to_string()));
        }

        Ok(EncodedImage::new(buf, width, height, OutputFormat::Jpeg))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::RgbaImage;

    fn gradient_source(width: u32, height: u32) -> ImageSource {
        let img = ImageBuffer::from_fn(width, height, |x, y| Rgba([(x % 256) as u8, (y % 256) as u8, 128, 255]));
        ImageSource::at_natural_size(DynamicImage::ImageRgba8(img)).expect("valid source")
    }

    fn constraint(max_width: u32) -> ResizeConstraint {
        ResizeConstraint::new(max_width).expect("valid constraint")
    }

    #[test]
    fn extract_copies_native_pixels() {
        let source = gradient_source(64, 64);
        let rect = NativeRect {
            x: 10,
            y: 20,
            width: 8,
            height: 4,
        };

        let surface = CropHandler::extract(&source, rect).expect("rect inside bounds");

        assert_eq!(surface.dimensions(), (8, 4));
        let pixel = surface.to_rgba8().get_pixel(0, 0).0;
        assert_eq!(pixel, [10, 20, 128, 255]);
    }

    #[test]
    fn extract_rejects_rect_outside_source() {
        let source = gradient_source(16, 16);
        let rect = NativeRect {
            x: 10,
            y: 0,
            width: 10,
            height: 4,
        };

        assert!(matches!(CropHandler::extract(&source, rect), Err(CropError::Extraction(_))));
    }

    #[test]
    fn downscale_is_skipped_when_width_fits() {
        let surface = DynamicImage::ImageRgba8(RgbaImage::new(300, 100));
        let out = CropHandler::maybe_downscale(surface, constraint(800), &CropConfig::default());

        assert_eq!(out.dimensions(), (300, 100));
    }

    #[test]
    fn downscale_keeps_aspect_ratio_for_every_filter() {
        for filter in [
            FilterType::Nearest,
            FilterType::Triangle,
            FilterType::CatmullRom,
            FilterType::Gaussian,
            FilterType::Lanczos3,
        ] {
            let config = CropConfig {
                resize_filter: filter,
                ..CropConfig::default()
            };
            let surface = DynamicImage::ImageRgba8(RgbaImage::new(400, 200));

            let out = CropHandler::maybe_downscale(surface, constraint(200), &config);

            assert_eq!(out.dimensions(), (200, 100), "filter {:?}", filter);
        }
    }

    #[test]
    fn nearest_filter_downscale_averages_checkerboard() {
        let config = CropConfig {
            resize_filter: FilterType::Nearest,
            ..CropConfig::default()
        };
        let checker = ImageBuffer::from_fn(64, 64, |x, y| {
            let v = if (x + y) % 2 == 0 { 0 } else { 255 };
            Rgba([v, v, v, 255])
        });

        let out = CropHandler::maybe_downscale(DynamicImage::ImageRgba8(checker), constraint(32), &config);

        assert_eq!(out.dimensions(), (32, 32));
        for pixel in out.to_rgba8().pixels() {
            let v = pixel.0[0];
            assert!((96..=160).contains(&v), "expected averaged grey, got {}", v);
        }
    }

    #[test]
    fn transparent_pixels_are_flattened_to_black() {
        let mut img = RgbaImage::new(2, 1);
        img.put_pixel(0, 0, Rgba([255, 0, 0, 0]));
        img.put_pixel(1, 0, Rgba([200, 100, 50, 255]));

        let flat = CropHandler::flatten_on_black(&DynamicImage::ImageRgba8(img));

        assert_eq!(flat.get_pixel(0, 0).0, [0, 0, 0]);
        assert_eq!(flat.get_pixel(1, 0).0, [200, 100, 50]);
    }

    #[test]
    fn fully_transparent_surface_encodes_as_black() {
        let img = ImageBuffer::from_pixel(16, 16, Rgba([255, 255, 255, 0]));
        let encoded = CropHandler::encode(&DynamicImage::ImageRgba8(img), 90).expect("encode should succeed");

        let decoded = image::load_from_memory(encoded.bytes()).expect("output decodes").to_rgb8();
        assert!(decoded.pixels().all(|p| p.0.iter().all(|&c| c < 16)));
    }

    #[test]
    fn encode_produces_jpeg_bytes() {
        let surface = DynamicImage::ImageRgba8(RgbaImage::new(20, 10));
        let encoded = CropHandler::encode(&surface, 85).expect("encode should succeed");

        assert_eq!((encoded.width(), encoded.height()), (20, 10));
        assert_eq!(&encoded.bytes()[..2], &[0xFF, 0xD8]);
        assert_eq!(encoded.mime_type(), "image/jpeg");
    }

    #[test]
    fn encode_rejects_empty_surface() {
        let surface = DynamicImage::ImageRgba8(RgbaImage::new(0, 0));

        assert!(matches!(CropHandler::encode(&surface, 85), Err(CropError::Encode(_))));
    }
}
