/// 远端接口错误。
#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    #[error("接口地址错误：{0}")]
    InvalidUrl(String),

    #[error("网络错误：{0}")]
    Network(String),

    #[error("请求超时：{0}")]
    Timeout(String),

    #[error("HTTP {code}: {message}")]
    Status { code: u16, message: String },

    #[error("响应格式错误：{0}")]
    InvalidResponse(String),

    #[error("服务端拒绝：{0}")]
    Rejected(String),
}
