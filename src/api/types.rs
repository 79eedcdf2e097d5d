//! 远端资料接口的请求/响应结构。
//!
//! 服务端实现不可见，这里只描述客户端观察到的 JSON 约定：
//! 请求 `{avatar|banner: <data url>, walletAddress}`，
//! 响应 `{success, avatarUrl|bannerUrl?}`。

use serde::{Deserialize, Serialize};

use crate::wallet::WalletAddress;

/// 资料图片类型。
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ImageKind {
    Avatar,
    Banner,
}

impl ImageKind {
    /// 请求体中承载图片的字段名，同时也是接口路径的最后一段。
    pub fn field_name(self) -> &'static str {
        match self {
            Self::Avatar => "avatar",
            Self::Banner => "banner",
        }
    }

    /// 响应体中返回图片地址的字段名。
    pub fn url_field(self) -> &'static str {
        match self {
            Self::Avatar => "avatarUrl",
            Self::Banner => "bannerUrl",
        }
    }

    /// 上传前允许的原始文件体积上限。
    pub fn max_file_size(self) -> u64 {
        match self {
            Self::Avatar => 2 * 1024 * 1024,
            Self::Banner => 3 * 1024 * 1024,
        }
    }

    /// 默认输出最大宽度。
    pub fn default_max_width(self) -> u32 {
        match self {
            Self::Avatar => 512,
            Self::Banner => 1500,
        }
    }
}

/// 上传请求体。
///
/// 字段名随 `ImageKind` 变化，因此手动序列化为 JSON 对象。
#[derive(Debug, Clone)]
pub struct ProfileImageRequest<'a> {
    pub kind: ImageKind,
    pub data_url: &'a str,
    pub wallet_address: &'a WalletAddress,
}

impl ProfileImageRequest<'_> {
    pub fn to_json(&self) -> serde_json::Value {
        let mut body = serde_json::Map::new();
        body.insert(
            self.kind.field_name().to_string(),
            serde_json::Value::String(self.data_url.to_string()),
        );
        body.insert(
            "walletAddress".to_string(),
            serde_json::Value::String(self.wallet_address.to_string()),
        );
        serde_json::Value::Object(body)
    }
}

/// 上传响应体。
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProfileImageResponse {
    pub success: bool,
    #[serde(default)]
    pub avatar_url: Option<String>,
    #[serde(default)]
    pub banner_url: Option<String>,
    #[serde(default)]
    pub error: Option<String>,
}

impl ProfileImageResponse {
    pub fn url_for(&self, kind: ImageKind) -> Option<&str> {
        match kind {
            ImageKind::Avatar => self.avatar_url.as_deref(),
            ImageKind::Banner => self.banner_url.as_deref(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn request_uses_kind_specific_field() {
        let wallet = WalletAddress::parse("0x00000000000000000000000000000000000000aa").expect("valid address");
        let request = ProfileImageRequest {
            kind: ImageKind::Banner,
            data_url: "data:image/jpeg;base64,AAAA",
            wallet_address: &wallet,
        };

        let json = request.to_json();
        assert_eq!(json["banner"], "data:image/jpeg;base64,AAAA");
        assert_eq!(json["walletAddress"], "0x00000000000000000000000000000000000000aa");
        assert!(json.get("avatar").is_none());
    }

    #[test]
    fn response_tolerates_missing_optional_fields() {
        let response: ProfileImageResponse =
            serde_json::from_str(r#"{"success":true,"avatarUrl":"https://cdn/a.jpg"}"#).expect("parse");

        assert_eq!(response.url_for(ImageKind::Avatar), Some("https://cdn/a.jpg"));
        assert_eq!(response.url_for(ImageKind::Banner), None);
    }
}
