//! 统一错误类型模块
//!
//! # 设计思路
//!
//! 定义应用级 `AppError`，聚合各模块的错误枚举；调用方（CLI 或 UI 边界）统一返回
//! `Result<T, AppError>`。
//!
//! # 实现思路
//!
//! - 使用 `thiserror` 派生可读错误消息，`#[from]` 省去手动 map。
//! - 实现 `Serialize`，将错误序列化为字符串，便于跨 UI 边界传递。

use serde::Serialize;

use crate::api::ApiError;
use crate::image_crop::CropError;
use crate::settings::SettingsError;
use crate::uploader::UploadError;
use crate::wallet::WalletError;

#[derive(Debug, thiserror::Error)]
pub enum AppError {
    /// 裁剪流水线错误（加载 / 提取 / 编码）
    #[error("{0}")]
    Crop(#[from] CropError),

    /// 上传链路错误
    #[error("{0}")]
    Upload(#[from] UploadError),

    /// 远端接口错误
    #[error("{0}")]
    Api(#[from] ApiError),

    #[error("{0}")]
    Wallet(#[from] WalletError),

    #[error("{0}")]
    Settings(#[from] SettingsError),

    /// 文件系统 I/O 错误
    #[error("文件系统错误: {0}")]
    Io(#[from] std::io::Error),
}

impl Serialize for AppError {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        serializer.serialize_str(&self.to_string())
    }
}
