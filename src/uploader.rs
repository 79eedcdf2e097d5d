//! # 资料图片上传
//!
//! ## 设计思路
//!
//! 串起整条上传链路：文件校验 → 解码 → 裁剪/降采样/编码 → data URL → 远端接口。
//! 钱包账户通过 `WalletContext` 显式传入；失败不做内部重试。
//!
//! ## 实现思路
//!
//! - 只接受 PNG / JPEG（按文件签名判断，不信任扩展名）。
//! - 体积上限按图片类型区分（头像 2MB，横幅 3MB）。
//! - 裁剪在上传之前完成，接口只看到最终的 JPEG data URL。

use std::time::Instant;

use crate::api::{ApiClient, ApiError, ImageKind};
use crate::image_crop::{CropError, CropHandler, CropRegion, EncodedImage, ResizeConstraint, SourceInput};
use crate::wallet::{WalletContext, WalletError};

#[derive(Debug, thiserror::Error)]
pub enum UploadError {
    #[error("不支持的图片类型：{0}（仅支持 PNG / JPEG）")]
    UnsupportedType(String),

    #[error("图片过大：{size} 字节（限制：{limit} 字节）")]
    TooLarge { size: u64, limit: u64 },

    #[error(transparent)]
    Wallet(#[from] WalletError),

    #[error(transparent)]
    Crop(#[from] CropError),

    #[error(transparent)]
    Api(#[from] ApiError),
}

/// 上传请求：原始文件字节 + 显示尺寸 + 用户选择的裁剪区域。
#[derive(Debug, Clone)]
pub struct UploadRequest {
    pub kind: ImageKind,
    pub file_bytes: Vec<u8>,
    pub display_width: f64,
    pub display_height: f64,
    pub crop: CropRegion,
    /// 为 `None` 时使用该图片类型的默认宽度。
    pub max_width: Option<u32>,
}

pub struct ProfileUploader {
    cropper: CropHandler,
    api: ApiClient,
}

impl ProfileUploader {
    pub fn new(cropper: CropHandler, api: ApiClient) -> Self {
        Self { cropper, api }
    }

    /// 校验文件类型与体积，返回识别出的 MIME。
    pub fn validate_file(kind: ImageKind, bytes: &[u8]) -> Result<&'static str, UploadError> {
        let mime = infer::get(bytes)
            .map(|t| t.mime_type())
            .ok_or_else(|| UploadError::UnsupportedType("unknown".to_string()))?;

        if !matches!(mime, "image/png" | "image/jpeg") {
            return Err(UploadError::UnsupportedType(mime.to_string()));
        }

        let size = bytes.len() as u64;
        let limit = kind.max_file_size();
        if size > limit {
            return Err(UploadError::TooLarge { size, limit });
        }

        Ok(mime)
    }

    /// 校验并裁剪，不发起网络请求。
    pub async fn prepare(&self, request: &UploadRequest) -> Result<EncodedImage, UploadError> {
        let mime = Self::validate_file(request.kind, &request.file_bytes)?;
        log::debug!("🖼️ {} 文件校验通过 - {} {} 字节", request.kind.field_name(), mime, request.file_bytes.len());

        let constraint = ResizeConstraint::new(request.max_width.unwrap_or(request.kind.default_max_width()))?;

        let source = self
            .cropper
            .load_source(SourceInput::Bytes(request.file_bytes.clone()))
            .await?
            .with_display_size(request.display_width, request.display_height)?;

        Ok(self
            .cropper
            .produce_cropped_image(&source, &request.crop, constraint)
            .await?)
    }

    /// 完整上传流程，返回服务端图片地址。
    pub async fn upload(&self, wallet: &WalletContext, request: &UploadRequest) -> Result<String, UploadError> {
        let account = wallet.require_account()?;
        let start = Instant::now();

        let encoded = self.prepare(request).await?;
        let url = self
            .api
            .upload_profile_image(request.kind, &encoded.to_data_url(), account)
            .await?;

        log::info!(
            "✅ {} 上传完成 - {}x{} total={}ms",
            request.kind.field_name(),
            encoded.width(),
            encoded.height(),
            start.elapsed().as_millis()
        );

        Ok(url)
    }
}
