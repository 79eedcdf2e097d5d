//! # 图片裁剪模块（image_crop）
//!
//! ## 设计思路
//!
//! 头像/横幅上传前的客户端裁剪链路，按职责拆分为多个子模块：
//!
//! - `loader`：文件/字节/Base64 加载、签名校验与解码（挂起点 1）
//! - `geometry`：显示坐标 → 原始坐标换算、降采样尺寸计算（纯函数）
//! - `pipeline`：提取、降采样、JPEG 编码
//! - `handler`：编排整条链路并记录阶段耗时（编码为挂起点 2）
//! - `config/error/source`：配置、错误、数据模型
//!
//! ## 新同事快速上手
//!
//! ```text
//! SourceInput
//!    ↓ loader.rs（体积/签名/像素上限 + 解码）
//! ImageSource（natural + display 尺寸）
//!    ↓ geometry.rs（CropRegion → NativeRect）
//!    ↓ pipeline.rs（extract → maybe_downscale → encode）
//! EncodedImage（JPEG 字节 + data URL）
//! ```

mod config;
mod error;
pub mod geometry;
mod handler;
mod loader;
mod pipeline;
mod source;

pub use config::{CropConfig, EncodeProfile};
pub use error::CropError;
pub use handler::CropHandler;
pub use source::{
    CropRegion, EncodedImage, ImageSource, NativeRect, OutputFormat, ResizeConstraint, SourceInput,
};
