//! # 坐标换算
//!
//! 显示坐标 → 原始像素坐标的换算与降采样目标尺寸计算，均为纯函数。
//!
//! 取整规则：所有换算后的坐标与尺寸统一使用 `f64::round`（四舍五入，.5 远离 0），
//! 宽高再按 `natural - origin` 截断，吸收取整造成的 1px 越界。

use super::source::{CropRegion, ImageSource, NativeRect, ResizeConstraint};
use super::CropError;

/// 浮点误差容忍度（相对显示尺寸）。
const BOUNDS_EPSILON: f64 = 1e-6;

/// 将显示坐标下的裁剪区域换算为原始像素矩形。
///
/// 校验在任何画布分配之前完成：退化或越界的区域直接返回 `Extraction`。
pub fn map_to_native(source: &ImageSource, crop: &CropRegion) -> Result<NativeRect, CropError> {
    validate_display_crop(source, crop)?;

    let scale_x = source.scale_x();
    let scale_y = source.scale_y();
    let natural_width = source.natural_width();
    let natural_height = source.natural_height();

    let x = to_pixel(crop.x * scale_x).min(natural_width);
    let y = to_pixel(crop.y * scale_y).min(natural_height);
    let width = to_pixel(crop.width * scale_x).min(natural_width - x);
    let height = to_pixel(crop.height * scale_y).min(natural_height - y);

    if width == 0 || height == 0 {
        return Err(CropError::Extraction(format!(
            "换算后裁剪区域为空：{}x{}（缩放 {:.4}x{:.4}）",
            width, height, scale_x, scale_y
        )));
    }

    Ok(NativeRect { x, y, width, height })
}

fn validate_display_crop(source: &ImageSource, crop: &CropRegion) -> Result<(), CropError> {
    let fields = [crop.x, crop.y, crop.width, crop.height];
    if fields.iter().any(|v| !v.is_finite()) {
        return Err(CropError::Extraction(format!("裁剪区域包含非法数值：{:?}", crop)));
    }

    if crop.width <= 0.0 || crop.height <= 0.0 {
        return Err(CropError::Extraction(format!(
            "裁剪区域面积必须大于 0：{}x{}",
            crop.width, crop.height
        )));
    }

    let slack_x = source.display_width() * BOUNDS_EPSILON;
    let slack_y = source.display_height() * BOUNDS_EPSILON;

    if crop.x < 0.0
        || crop.y < 0.0
        || crop.x + crop.width > source.display_width() + slack_x
        || crop.y + crop.height > source.display_height() + slack_y
    {
        return Err(CropError::Extraction(format!(
            "裁剪区域超出图片范围：({}, {}, {}x{}) 显示尺寸 {}x{}",
            crop.x,
            crop.y,
            crop.width,
            crop.height,
            source.display_width(),
            source.display_height()
        )));
    }

    Ok(())
}

fn to_pixel(value: f64) -> u32 {
    let rounded = value.round();
    if rounded <= 0.0 {
        0
    } else if rounded >= u32::MAX as f64 {
        u32::MAX
    } else {
        rounded as u32
    }
}

/// 计算降采样目标尺寸。
///
/// 仅当 `width > max_width`（严格大于）时返回 `Some`，永不放大。
pub fn downscale_target(width: u32, height: u32, constraint: ResizeConstraint) -> Option<(u32, u32)> {
    let max_width = constraint.max_width();
    if width <= max_width {
        return None;
    }

    let resize_ratio = max_width as f64 / width as f64;
    let new_height = to_pixel(height as f64 * resize_ratio).max(1);

    Some((max_width, new_height))
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{DynamicImage, RgbImage};
    use proptest::prelude::*;

    fn source(natural: (u32, u32), display: (f64, f64)) -> ImageSource {
        let image = DynamicImage::ImageRgb8(RgbImage::new(natural.0, natural.1));
        ImageSource::new(image, display.0, display.1).expect("valid source")
    }

    fn constraint(max_width: u32) -> ResizeConstraint {
        ResizeConstraint::new(max_width).expect("valid constraint")
    }

    #[test]
    fn maps_display_crop_with_uniform_scale() {
        let src = source((2000, 1000), (500.0, 250.0));
        let native = map_to_native(&src, &CropRegion::new(50.0, 25.0, 100.0, 50.0))
            .expect("crop inside bounds");

        assert_eq!(
            native,
            NativeRect {
                x: 200,
                y: 100,
                width: 400,
                height: 200
            }
        );
    }

    #[test]
    fn unit_scale_is_identity() {
        let src = source((640, 480), (640.0, 480.0));
        let native = map_to_native(&src, &CropRegion::new(10.0, 20.0, 300.0, 200.0))
            .expect("crop inside bounds");

        assert_eq!(
            native,
            NativeRect {
                x: 10,
                y: 20,
                width: 300,
                height: 200
            }
        );
    }

    #[test]
    fn zero_area_crop_fails_fast() {
        let src = source((100, 100), (100.0, 100.0));

        assert!(matches!(
            map_to_native(&src, &CropRegion::new(0.0, 0.0, 0.0, 10.0)),
            Err(CropError::Extraction(_))
        ));
        assert!(matches!(
            map_to_native(&src, &CropRegion::new(0.0, 0.0, 10.0, 0.0)),
            Err(CropError::Extraction(_))
        ));
    }

    #[test]
    fn out_of_bounds_crop_is_rejected() {
        let src = source((100, 100), (50.0, 50.0));

        assert!(matches!(
            map_to_native(&src, &CropRegion::new(30.0, 0.0, 30.0, 10.0)),
            Err(CropError::Extraction(_))
        ));
        assert!(matches!(
            map_to_native(&src, &CropRegion::new(-1.0, 0.0, 10.0, 10.0)),
            Err(CropError::Extraction(_))
        ));
    }

    #[test]
    fn sub_pixel_crop_that_rounds_to_zero_is_rejected() {
        let src = source((10, 10), (1000.0, 1000.0));

        assert!(matches!(
            map_to_native(&src, &CropRegion::new(0.0, 0.0, 2.0, 500.0)),
            Err(CropError::Extraction(_))
        ));
    }

    #[test]
    fn rounding_overshoot_is_clamped_to_natural_bounds() {
        // 缩放 2.5：x=2.5→3，width=7.5→8，合计 11 超出 10px 原始宽度
        let src = source((10, 10), (4.0, 4.0));
        let native = map_to_native(&src, &CropRegion::new(1.0, 1.0, 3.0, 3.0))
            .expect("crop touching the edge");

        assert_eq!(native.x, 3);
        assert_eq!(native.width, 7);
        assert_eq!(native.x + native.width, 10);
        assert_eq!(native.y + native.height, 10);
    }

    #[test]
    fn equal_width_skips_resize() {
        assert_eq!(downscale_target(800, 600, constraint(800)), None);
    }

    #[test]
    fn never_upscales() {
        assert_eq!(downscale_target(300, 200, constraint(800)), None);
    }

    #[test]
    fn downscale_halves_example_crop() {
        assert_eq!(downscale_target(400, 200, constraint(200)), Some((200, 100)));
    }

    #[test]
    fn very_flat_crop_keeps_at_least_one_row() {
        assert_eq!(downscale_target(10_000, 1, constraint(100)), Some((100, 1)));
    }

    proptest! {
        #[test]
        fn output_width_never_exceeds_max(w in 1u32..20_000, h in 1u32..20_000, max in 1u32..5_000) {
            let (out_w, _) = downscale_target(w, h, constraint(max)).unwrap_or((w, h));
            prop_assert!(out_w <= max);
            if w <= max {
                prop_assert_eq!(out_w, w);
            }
        }

        #[test]
        fn downscale_preserves_aspect_ratio(w in 2u32..20_000, h in 1u32..20_000, max in 1u32..5_000) {
            prop_assume!(w > max);
            let (out_w, out_h) = downscale_target(w, h, constraint(max)).expect("downscale expected");
            let expected = h as f64 * out_w as f64 / w as f64;
            // 取整误差不超过 0.5px，另有最小 1px 的下限
            prop_assert!((out_h as f64 - expected).abs() <= 0.5 || (out_h == 1 && expected < 1.0));
        }

        #[test]
        fn integral_crop_at_unit_scale_maps_exactly(
            x in 0u32..200, y in 0u32..200, w in 1u32..200, h in 1u32..200
        ) {
            let src = source((400, 400), (400.0, 400.0));
            let crop = CropRegion::new(x as f64, y as f64, w as f64, h as f64);
            let native = map_to_native(&src, &crop).expect("crop inside bounds");
            prop_assert_eq!(native, NativeRect { x, y, width: w, height: h });
        }

        #[test]
        fn mapped_rect_stays_inside_natural_bounds(
            nw in 1u32..3_000, nh in 1u32..3_000,
            dw in 1.0f64..1_500.0, dh in 1.0f64..1_500.0,
            fx in 0.0f64..1.0, fy in 0.0f64..1.0, fw in 0.0f64..1.0, fh in 0.0f64..1.0,
        ) {
            let src = source((nw, nh), (dw, dh));
            let x = fx * dw;
            let y = fy * dh;
            let crop = CropRegion::new(x, y, fw * (dw - x), fh * (dh - y));
            if let Ok(native) = map_to_native(&src, &crop) {
                prop_assert!(native.width > 0 && native.height > 0);
                prop_assert!(native.x + native.width <= nw);
                prop_assert!(native.y + native.height <= nh);
            }
        }
    }
}
