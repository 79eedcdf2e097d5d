//! # 客户端设置
//!
//! 从 JSON 文件读取；缺失字段使用默认值，文件不存在时整体回退默认配置。

use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::api::ImageKind;
use crate::image_crop::EncodeProfile;

#[derive(Debug, thiserror::Error)]
pub enum SettingsError {
    #[error("读取设置文件失败: {0}")]
    Io(#[from] std::io::Error),

    #[error("解析设置文件失败: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("设置项无效: {0}")]
    Invalid(String),
}

/// 远端接口设置。
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ApiSettings {
    pub base_url: String,
    /// 建立连接超时时间（秒）。
    pub connect_timeout_secs: u64,
    /// 单次请求总超时时间（秒）。
    pub request_timeout_secs: u64,
}

impl Default for ApiSettings {
    fn default() -> Self {
        Self {
            base_url: "http://localhost:3001".to_string(),
            connect_timeout_secs: 8,
            request_timeout_secs: 30,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ClientSettings {
    pub api: ApiSettings,
    pub encode_profile: EncodeProfile,
    pub avatar_max_width: u32,
    pub banner_max_width: u32,
}

impl Default for ClientSettings {
    fn default() -> Self {
        Self {
            api: ApiSettings::default(),
            encode_profile: EncodeProfile::Balanced,
            avatar_max_width: ImageKind::Avatar.default_max_width(),
            banner_max_width: ImageKind::Banner.default_max_width(),
        }
    }
}

impl ClientSettings {
    /// 读取设置文件；文件不存在时返回默认设置。
    pub fn load(path: &Path) -> Result<Self, SettingsError> {
        if !path.exists() {
            log::info!("设置文件不存在，使用默认设置: {}", path.display());
            return Ok(Self::default());
        }

        let content = fs::read_to_string(path)?;
        let settings: Self = serde_json::from_str(&content)?;
        settings.validate()?;
        Ok(settings)
    }

    pub fn save(&self, path: &Path) -> Result<(), SettingsError> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        let content = serde_json::to_string_pretty(self)?;
        fs::write(path, content)?;
        Ok(())
    }

    pub fn validate(&self) -> Result<(), SettingsError> {
        if self.avatar_max_width == 0 || self.banner_max_width == 0 {
            return Err(SettingsError::Invalid("最大宽度必须大于 0".to_string()));
        }
        if !(1..=120).contains(&self.api.connect_timeout_secs) {
            return Err(SettingsError::Invalid("connect_timeout_secs 必须在 1~120 秒之间".to_string()));
        }
        if !(1..=600).contains(&self.api.request_timeout_secs) {
            return Err(SettingsError::Invalid("request_timeout_secs 必须在 1~600 秒之间".to_string()));
        }
        Ok(())
    }

    pub fn max_width_for(&self, kind: ImageKind) -> u32 {
        match kind {
            ImageKind::Avatar => self.avatar_max_width,
            ImageKind::Banner => self.banner_max_width,
        }
    }
}
