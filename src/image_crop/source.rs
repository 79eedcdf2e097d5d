//! # 数据源与中间模型
//!
//! ## 设计思路
//!
//! 将“外部输入类型”和“流水线中间结果”解耦：
//! - `SourceInput` 表示外部来源语义（文件 / 内存字节 / Base64）
//! - `RawImageData` 表示已加载但未解码的字节
//! - `ImageSource` 表示已解码图片及其两套坐标系（原始尺寸 / 显示尺寸）
//! - `CropRegion` / `NativeRect` 分别是显示坐标与原始坐标下的裁剪矩形
//! - `EncodedImage` 表示最终的有损编码结果
//!
//! 所有值都只在单次调用内存活，不跨调用共享。

use base64::{Engine as _, engine::general_purpose};
use bytes::Bytes;
use image::{DynamicImage, GenericImageView};

use super::CropError;

/// 图片输入来源。
pub enum SourceInput {
    /// 本地文件路径来源。
    FilePath(String),
    /// 已在内存中的原始文件字节（例如上传组件读取的文件句柄内容）。
    Bytes(Vec<u8>),
    /// Base64（支持 Data URL 与纯 Base64 字符串）。
    Base64(String),
}

/// 加载阶段输出：原始字节与来源标识。
pub(crate) struct RawImageData {
    pub(crate) bytes: Vec<u8>,
    /// 来源提示（用于日志与诊断）。
    pub(crate) source_hint: &'static str,
}

/// 已解码的图片来源。
///
/// 同时记录原始像素尺寸（natural）与用户裁剪时的显示尺寸（display），
/// 两者之比即坐标换算的缩放系数。
#[derive(Debug, Clone)]
pub struct ImageSource {
    image: DynamicImage,
    display_width: f64,
    display_height: f64,
}

impl ImageSource {
    /// 以指定显示尺寸包装已解码图片。
    ///
    /// 显示尺寸必须为正的有限值，原始尺寸不能为 0。
    pub fn new(image: DynamicImage, display_width: f64, display_height: f64) -> Result<Self, CropError> {
        let (natural_width, natural_height) = image.dimensions();
        if natural_width == 0 || natural_height == 0 {
            return Err(CropError::InvalidArgument(format!(
                "图片原始尺寸无效：{}x{}",
                natural_width, natural_height
            )));
        }

        let valid = |v: f64| v.is_finite() && v > 0.0;
        if !valid(display_width) || !valid(display_height) {
            return Err(CropError::InvalidArgument(format!(
                "显示尺寸必须为正数：{}x{}",
                display_width, display_height
            )));
        }

        Ok(Self {
            image,
            display_width,
            display_height,
        })
    }

    /// 显示尺寸等于原始尺寸（缩放系数为 1）。
    pub fn at_natural_size(image: DynamicImage) -> Result<Self, CropError> {
        let (w, h) = image.dimensions();
        Self::new(image, w as f64, h as f64)
    }

    /// 以新的显示尺寸重新包装，复用已解码像素。
    pub fn with_display_size(self, display_width: f64, display_height: f64) -> Result<Self, CropError> {
        Self::new(self.image, display_width, display_height)
    }

    pub fn natural_width(&self) -> u32 {
        self.image.width()
    }

    pub fn natural_height(&self) -> u32 {
        self.image.height()
    }

    pub fn display_width(&self) -> f64 {
        self.display_width
    }

    pub fn display_height(&self) -> f64 {
        self.display_height
    }

    pub fn scale_x(&self) -> f64 {
        self.natural_width() as f64 / self.display_width
    }

    pub fn scale_y(&self) -> f64 {
        self.natural_height() as f64 / self.display_height
    }

    pub(crate) fn image(&self) -> &DynamicImage {
        &self.image
    }
}

/// 显示坐标下的裁剪矩形（由交互式裁剪 UI 产生）。
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CropRegion {
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
}

impl CropRegion {
    pub fn new(x: f64, y: f64, width: f64, height: f64) -> Self {
        Self { x, y, width, height }
    }
}

/// 原始像素坐标下的裁剪矩形。
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct NativeRect {
    pub x: u32,
    pub y: u32,
    pub width: u32,
    pub height: u32,
}

/// 输出最大宽度约束。
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ResizeConstraint {
    max_width: u32,
}

impl ResizeConstraint {
    pub fn new(max_width: u32) -> Result<Self, CropError> {
        if max_width == 0 {
            return Err(CropError::InvalidArgument("maxWidth 必须大于 0".to_string()));
        }
        Ok(Self { max_width })
    }

    pub fn max_width(self) -> u32 {
        self.max_width
    }
}

/// 输出编码格式。
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputFormat {
    Jpeg,
}

impl OutputFormat {
    pub fn mime_type(self) -> &'static str {
        match self {
            Self::Jpeg => "image/jpeg",
        }
    }
}

/// 最终编码结果。
///
/// 内部持有 `Bytes`，克隆只增加引用计数，创建后不再变更。
#[derive(Debug, Clone)]
pub struct EncodedImage {
    bytes: Bytes,
    width: u32,
    height: u32,
    format: OutputFormat,
}

impl EncodedImage {
    pub(crate) fn new(bytes: Vec<u8>, width: u32, height: u32, format: OutputFormat) -> Self {
        Self {
            bytes: Bytes::from(bytes),
            width,
            height,
            format,
        }
    }

    pub fn bytes(&self) -> &Bytes {
        &self.bytes
    }

    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    pub fn format(&self) -> OutputFormat {
        self.format
    }

    pub fn mime_type(&self) -> &'static str {
        self.format.mime_type()
    }

    pub fn to_base64(&self) -> String {
        general_purpose::STANDARD.encode(&self.bytes)
    }

    /// 生成 `data:image/jpeg;base64,...` 形式的传输文本。
    pub fn to_data_url(&self) -> String {
        format!("data:{};base64,{}", self.mime_type(), self.to_base64())
    }
}
