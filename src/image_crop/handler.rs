//! # 核心编排模块
//!
//! ## 设计思路
//!
//! `CropHandler` 只负责流程编排与配置管理。单次调用的处理链路固定为：
//! 1. 读取配置快照
//! 2. 显示坐标 → 原始坐标换算（越界/退化区域在分配画布前失败）
//! 3. 按原始分辨率提取裁剪画布
//! 4. 宽度超过上限时等比降采样
//! 5. 在阻塞线程池中编码为 JPEG
//!
//! ## 实现思路
//!
//! - 配置通过 `Arc<RwLock<CropConfig>>` 支持运行时切换编码档位。
//! - 单次请求内使用“同一配置快照”，并发调用之间没有共享可变状态。
//! - 记录 `extract/resize/encode/total` 阶段耗时，便于性能诊断。
//! - 中间画布随作用域释放，失败路径同样如此。

use std::sync::{Arc, RwLock};
use std::time::Instant;

use super::geometry;
use super::source::{CropRegion, EncodedImage, ImageSource, ResizeConstraint};
use super::{CropConfig, CropError, EncodeProfile};

/// 裁剪处理器。
#[derive(Clone)]
pub struct CropHandler {
    config: Arc<RwLock<CropConfig>>,
}

impl Default for CropHandler {
    fn default() -> Self {
        Self::new(CropConfig::default())
    }
}

impl CropHandler {
    pub fn new(config: CropConfig) -> Self {
        Self {
            config: Arc::new(RwLock::new(config)),
        }
    }

    /// 获取配置快照，保证单次请求链路使用一致参数。
    pub fn config_snapshot(&self) -> Result<CropConfig, CropError> {
        self.config
            .read()
            .map(|cfg| cfg.clone())
            .map_err(|_| CropError::ConfigUnavailable("配置读取锁已中毒".to_string()))
    }

    /// 设置编码档位。
    ///
    /// # 示例
    /// ```rust
    /// use fragment_client::image_crop::{CropHandler, EncodeProfile};
    ///
    /// let handler = CropHandler::default();
    /// handler.set_profile(EncodeProfile::Speed)?;
    /// assert_eq!(handler.profile()?, EncodeProfile::Speed);
    /// # Ok::<(), fragment_client::image_crop::CropError>(())
    /// ```
    pub fn set_profile(&self, profile: EncodeProfile) -> Result<(), CropError> {
        let mut config = self
            .config
            .write()
            .map_err(|_| CropError::ConfigUnavailable("配置写入锁已中毒".to_string()))?;
        config.apply_encode_profile(profile);

        log::info!(
            "⚙️ 已切换编码档位：{}（quality={}, filter={:?}）",
            profile.as_str(),
            config.jpeg_quality,
            config.resize_filter
        );

        Ok(())
    }

    /// 获取当前生效档位。
    pub fn profile(&self) -> Result<EncodeProfile, CropError> {
        let config = self
            .config
            .read()
            .map_err(|_| CropError::ConfigUnavailable("配置读取锁已中毒".to_string()))?;
        Ok(config.infer_encode_profile())
    }

    /// 裁剪主入口：换算 → 提取 → 降采样 → 编码。
    ///
    /// 编码是第二个挂起点，在 `spawn_blocking` 中执行。调用一旦开始就会执行到
    /// 成功或失败为止，不支持中途取消，也不产生部分结果。
    ///
    /// # 示例
    /// ```rust
    /// use fragment_client::image_crop::{CropHandler, CropRegion, ImageSource, ResizeConstraint};
    /// use image::{DynamicImage, RgbImage};
    ///
    /// # async fn demo() -> Result<(), fragment_client::image_crop::CropError> {
    /// let image = DynamicImage::ImageRgb8(RgbImage::new(2000, 1000));
    /// let source = ImageSource::new(image, 500.0, 250.0)?;
    /// let crop = CropRegion::new(50.0, 25.0, 100.0, 50.0);
    ///
    /// let encoded = CropHandler::default()
    ///     .produce_cropped_image(&source, &crop, ResizeConstraint::new(200)?)
    ///     .await?;
    /// assert_eq!((encoded.width(), encoded.height()), (200, 100));
    /// # Ok(())
    /// # }
    /// ```
    pub async fn produce_cropped_image(
        &self,
        source: &ImageSource,
        crop: &CropRegion,
        constraint: ResizeConstraint,
    ) -> Result<EncodedImage, CropError> {
        let config = self.config_snapshot()?;
        let total_start = Instant::now();

        let native = geometry::map_to_native(source, crop)?;
        log::debug!(
            "📐 裁剪换算：display=({:.1}, {:.1}, {:.1}x{:.1}) -> native={:?}",
            crop.x,
            crop.y,
            crop.width,
            crop.height,
            native
        );

        let extract_start = Instant::now();
        let surface = Self::extract(source, native)?;
        let extract_elapsed = extract_start.elapsed();

        let resize_start = Instant::now();
        let surface = Self::maybe_downscale(surface, constraint, &config);
        let resize_elapsed = resize_start.elapsed();

        let encode_start = Instant::now();
        let quality = config.jpeg_quality;
        let encoded = tokio::task::spawn_blocking(move || Self::encode(&surface, quality))
            .await
            .map_err(|e| CropError::Encode(format!("编码线程执行失败：{}", e)))??;
        let encode_elapsed = encode_start.elapsed();

        log::info!(
            "✅ 裁剪完成 - 输出 {}x{} {}KB extract={}ms resize={}ms encode={}ms total={}ms",
            encoded.width(),
            encoded.height(),
            encoded.len() / 1024,
            extract_elapsed.as_millis(),
            resize_elapsed.as_millis(),
            encode_elapsed.as_millis(),
            total_start.elapsed().as_millis()
        );

        Ok(encoded)
    }
}
