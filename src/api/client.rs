//! # 远端接口客户端
//!
//! ## 设计思路
//!
//! 远端服务（声望、奖励、NFT 结算等）对客户端是黑盒，这里只封装客户端实际调用的
//! 资料图片上传接口。客户端只发送请求并解析响应，不做任何重试，重试策略归调用方。
//!
//! ## 实现思路
//!
//! - 复用同一个 `reqwest::Client`（连接超时 + 请求总超时）。
//! - reqwest 错误统一映射为 `ApiError`，日志中的 URL 去除 query/fragment。
//! - `success == false` 或缺少图片地址都视为服务端拒绝。

use std::time::Duration;

use super::types::{ImageKind, ProfileImageRequest, ProfileImageResponse};
use super::ApiError;
use crate::settings::ApiSettings;
use crate::wallet::WalletAddress;

const USER_AGENT: &str = concat!("fragment-client/", env!("CARGO_PKG_VERSION"));

pub struct ApiClient {
    http: reqwest::Client,
    base_url: reqwest::Url,
    request_timeout_secs: u64,
}

impl ApiClient {
    pub fn new(settings: &ApiSettings) -> Result<Self, ApiError> {
        let base_url = reqwest::Url::parse(settings.base_url.trim())
            .map_err(|e| ApiError::InvalidUrl(format!("{}：{}", settings.base_url, e)))?;

        if !matches!(base_url.scheme(), "http" | "https") {
            return Err(ApiError::InvalidUrl("仅支持 HTTP/HTTPS".to_string()));
        }

        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(settings.request_timeout_secs))
            .connect_timeout(Duration::from_secs(settings.connect_timeout_secs))
            .user_agent(USER_AGENT)
            .build()
            .map_err(|e| ApiError::Network(format!("无法创建 HTTP 客户端：{}", e)))?;

        Ok(Self {
            http,
            base_url,
            request_timeout_secs: settings.request_timeout_secs,
        })
    }

    /// `{base}/api/profile/{avatar|banner}`
    pub fn endpoint_for(&self, kind: ImageKind) -> Result<reqwest::Url, ApiError> {
        let mut url = self.base_url.clone();
        url.path_segments_mut()
            .map_err(|_| ApiError::InvalidUrl(format!("无法拼接路径：{}", self.base_url)))?
            .pop_if_empty()
            .extend(["api", "profile", kind.field_name()]);
        Ok(url)
    }

    /// 上传资料图片，返回服务端给出的图片地址。
    pub async fn upload_profile_image(
        &self,
        kind: ImageKind,
        data_url: &str,
        wallet_address: &WalletAddress,
    ) -> Result<String, ApiError> {
        let url = self.endpoint_for(kind)?;
        let redacted = Self::redact_url_for_log(url.as_str());
        let body = ProfileImageRequest {
            kind,
            data_url,
            wallet_address,
        }
        .to_json();

        log::info!(
            "📤 上传{} - URL: {} 载荷: {}KB",
            kind.field_name(),
            redacted,
            data_url.len() / 1024
        );

        let response = self
            .http
            .post(url)
            .json(&body)
            .send()
            .await
            .map_err(|e| self.map_reqwest_error(e))?;

        let status = response.status();
        if !status.is_success() {
            return Err(ApiError::Status {
                code: status.as_u16(),
                message: Self::status_message(status.as_u16()).to_string(),
            });
        }

        let parsed: ProfileImageResponse = response
            .json()
            .await
            .map_err(|e| ApiError::InvalidResponse(format!("无法解析响应：{}", e)))?;

        if !parsed.success {
            let reason = parsed.error.clone().unwrap_or_else(|| "success=false".to_string());
            log::warn!("❌ 服务端拒绝上传{}：{}", kind.field_name(), reason);
            return Err(ApiError::Rejected(reason));
        }

        let image_url = parsed
            .url_for(kind)
            .ok_or_else(|| ApiError::Rejected(format!("响应缺少 {} 字段", kind.url_field())))?
            .to_string();

        log::info!("✅ 上传{}成功 - {}", kind.field_name(), Self::redact_url_for_log(&image_url));

        Ok(image_url)
    }

    fn map_reqwest_error(&self, e: reqwest::Error) -> ApiError {
        let err_msg = match e.url() {
            Some(url) => e
                .to_string()
                .replace(url.as_str(), &Self::redact_url_for_log(url.as_str())),
            None => e.to_string(),
        };

        if e.is_timeout() {
            ApiError::Timeout(format!("请求超时（{}秒）", self.request_timeout_secs))
        } else if e.is_connect() {
            ApiError::Network(format!("无法连接：{}", err_msg))
        } else {
            ApiError::Network(format!("请求失败：{}", err_msg))
        }
    }

    fn status_message(code: u16) -> &'static str {
        match code {
            400 => "请求参数错误",
            401 | 403 => "访问被拒绝",
            404 => "未找到",
            413 => "图片过大",
            500..=599 => "服务器错误",
            _ => "请求失败",
        }
    }

    pub(crate) fn redact_url_for_log(url: &str) -> String {
        let Ok(parsed) = reqwest::Url::parse(url) else {
            return "<invalid-url>".to_string();
        };

        let host = parsed.host_str().unwrap_or("<unknown-host>");
        let port = parsed.port().map(|p| format!(":{}", p)).unwrap_or_default();

        format!("{}://{}{}{}", parsed.scheme(), host, port, parsed.path())
    }
}
