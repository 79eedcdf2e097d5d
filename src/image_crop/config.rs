//! # 配置模块
//!
//! ## 设计思路
//!
//! 将裁剪链路中所有“可调策略”集中到 `CropConfig`：加载体积上限、解码像素上限、
//! 降采样滤镜与 JPEG 质量。编码档位（quality / balanced / speed）作为高层语义，
//! 映射到底层的滤镜与质量组合。
//!
//! ## 实现思路
//!
//! - `Default` 提供生产可用的平衡配置。
//! - `EncodeProfile` 负责档位字符串解析与反向输出。
//! - `apply_encode_profile` 将档位转换为具体参数。
//! - `infer_encode_profile` 从当前配置反推档位（给设置页展示状态）。

use image::imageops::FilterType;
use serde::{Deserialize, Serialize};

use super::CropError;

/// 裁剪与编码配置。
#[derive(Debug, Clone)]
pub struct CropConfig {
    /// 读取原始字节时允许的最大文件体积（字节）。
    pub max_file_size: u64,
    /// 解码后的像素上限（`width * height`）。
    pub max_decoded_pixels: u64,
    /// 解码阶段允许的预计内存上限（按 RGBA 估算，字节）。
    pub max_decoded_bytes: u64,
    /// 降采样滤镜策略。
    pub resize_filter: FilterType,
    /// JPEG 编码质量（1~100）。
    pub jpeg_quality: u8,
}

impl Default for CropConfig {
    fn default() -> Self {
        Self {
            max_file_size: 10 * 1024 * 1024,
            max_decoded_pixels: 40_000_000,
            max_decoded_bytes: 160 * 1024 * 1024,
            resize_filter: FilterType::Triangle,
            jpeg_quality: 85,
        }
    }
}

/// 编码档位。
///
/// - `Quality`：尽量保真
/// - `Balanced`：体积与画质平衡
/// - `Speed`：优先编码速度与上传体积
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EncodeProfile {
    Quality,
    Balanced,
    Speed,
}

impl EncodeProfile {
    /// 从外部字符串解析档位。
    ///
    /// # 示例
    /// ```rust
    /// use fragment_client::image_crop::EncodeProfile;
    ///
    /// let p = EncodeProfile::from_str("Balanced")?;
    /// assert_eq!(p.as_str(), "balanced");
    /// # Ok::<(), fragment_client::image_crop::CropError>(())
    /// ```
    #[allow(clippy::should_implement_trait)]
    pub fn from_str(profile: &str) -> Result<Self, CropError> {
        match profile.trim().to_lowercase().as_str() {
            "quality" => Ok(Self::Quality),
            "balanced" => Ok(Self::Balanced),
            "speed" => Ok(Self::Speed),
            other => Err(CropError::InvalidArgument(format!(
                "未知编码档位：{}（可选：quality / balanced / speed）",
                other
            ))),
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Quality => "quality",
            Self::Balanced => "balanced",
            Self::Speed => "speed",
        }
    }
}

impl CropConfig {
    /// 基于当前参数反推编码档位。
    pub fn infer_encode_profile(&self) -> EncodeProfile {
        if self.jpeg_quality >= 90 {
            return EncodeProfile::Quality;
        }

        if self.jpeg_quality <= 75 || self.resize_filter == FilterType::Nearest {
            return EncodeProfile::Speed;
        }

        EncodeProfile::Balanced
    }

    /// 应用指定编码档位到实际参数。
    pub fn apply_encode_profile(&mut self, profile: EncodeProfile) {
        match profile {
            EncodeProfile::Quality => {
                self.jpeg_quality = 92;
                self.resize_filter = FilterType::CatmullRom;
            }
            EncodeProfile::Balanced => {
                self.jpeg_quality = 85;
                self.resize_filter = FilterType::Triangle;
            }
            EncodeProfile::Speed => {
                self.jpeg_quality = 72;
                self.resize_filter = FilterType::Nearest;
            }
        }
    }

    /// 创建时已应用指定档位的配置。
    pub fn with_profile(profile: EncodeProfile) -> Self {
        let mut config = Self::default();
        config.apply_encode_profile(profile);
        config
    }
}
