//! # 错误模型模块
//!
//! ## 设计思路
//!
//! 裁剪链路中的每一类失败都必须能被调用方区分：
//! - `Decode`：来源无法解释为图片（提示用户“无效图片”）
//! - `Extraction`：换算后的裁剪区域退化或越界，发生在任何画布分配之前
//! - `Encode`：最终画布无法序列化，绝不静默返回空输出
//!
//! 其余分支（格式、资源上限、文件系统、参数）属于加载前的输入校验。

/// 裁剪流水线统一错误类型。
#[derive(Debug, thiserror::Error)]
pub enum CropError {
    #[error("解码错误：{0}")]
    Decode(String),

    #[error("裁剪区域错误：{0}")]
    Extraction(String),

    #[error("编码错误：{0}")]
    Encode(String),

    #[error("格式错误：{0}")]
    InvalidFormat(String),

    #[error("资源限制：{0}")]
    ResourceLimit(String),

    #[error("文件错误：{0}")]
    FileSystem(String),

    #[error("参数错误：{0}")]
    InvalidArgument(String),

    #[error("配置不可用：{0}")]
    ConfigUnavailable(String),
}

impl CropError {
    /// 稳定的错误码，供前端按分支展示文案。
    pub fn code(&self) -> &'static str {
        match self {
            Self::Decode(_) => "decode_failed",
            Self::Extraction(_) => "extraction_failed",
            Self::Encode(_) => "encode_failed",
            Self::InvalidFormat(_) => "invalid_format",
            Self::ResourceLimit(_) => "resource_limit",
            Self::FileSystem(_) => "file_system",
            Self::InvalidArgument(_) => "invalid_argument",
            Self::ConfigUnavailable(_) => "config_unavailable",
        }
    }

    /// 出错的流水线阶段。
    pub fn stage(&self) -> &'static str {
        match self {
            Self::Decode(_)
            | Self::InvalidFormat(_)
            | Self::ResourceLimit(_)
            | Self::FileSystem(_) => "load",
            Self::Extraction(_) | Self::InvalidArgument(_) => "extract",
            Self::Encode(_) => "encode",
            Self::ConfigUnavailable(_) => "config",
        }
    }
}

impl From<CropError> for String {
    fn from(error: CropError) -> Self {
        error.to_string()
    }
}
