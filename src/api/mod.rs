//! # 远端接口（api）
//!
//! - `client`：HTTP 客户端与错误映射
//! - `types`：请求/响应 JSON 结构与图片类型
//! - `error`：`ApiError`

mod client;
mod error;
mod types;

pub use client::ApiClient;
pub use error::ApiError;
pub use types::{ImageKind, ProfileImageRequest, ProfileImageResponse};

#[cfg(test)]
pub(crate) use client::test_server;
