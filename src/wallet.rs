//! # 钱包上下文
//!
//! 当前连接的账户以显式值的方式传入需要它的组件，而不是全局状态。
//! 签名完全委托给外部钱包提供方（`MessageSigner`），本 crate 不做任何密码学校验。

use std::fmt;
use std::future::Future;

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum WalletError {
    #[error("钱包未连接")]
    NotConnected,

    #[error("钱包地址无效：{0}")]
    InvalidAddress(String),

    #[error("签名失败：{0}")]
    Signing(String),
}

/// EVM 风格钱包地址（`0x` + 40 位十六进制），统一存为小写。
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct WalletAddress(String);

impl WalletAddress {
    pub fn parse(raw: &str) -> Result<Self, WalletError> {
        let trimmed = raw.trim();
        let hex = trimmed
            .strip_prefix("0x")
            .or_else(|| trimmed.strip_prefix("0X"))
            .ok_or_else(|| WalletError::InvalidAddress(trimmed.to_string()))?;

        if hex.len() != 40 || !hex.chars().all(|c| c.is_ascii_hexdigit()) {
            return Err(WalletError::InvalidAddress(trimmed.to_string()));
        }

        Ok(Self(format!("0x{}", hex.to_ascii_lowercase())))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for WalletAddress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl TryFrom<String> for WalletAddress {
    type Error = WalletError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::parse(&value)
    }
}

impl From<WalletAddress> for String {
    fn from(address: WalletAddress) -> Self {
        address.0
    }
}

/// 当前钱包连接状态。
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct WalletContext {
    account: Option<WalletAddress>,
}

impl WalletContext {
    pub fn disconnected() -> Self {
        Self { account: None }
    }

    pub fn connected(account: WalletAddress) -> Self {
        Self {
            account: Some(account),
        }
    }

    pub fn active_account(&self) -> Option<&WalletAddress> {
        self.account.as_ref()
    }

    pub fn require_account(&self) -> Result<&WalletAddress, WalletError> {
        self.account.as_ref().ok_or(WalletError::NotConnected)
    }
}

/// 外部钱包签名提供方。
pub trait MessageSigner: Send + Sync {
    /// 请求钱包对消息签名，返回提供方给出的签名文本。
    fn sign_message(
        &self,
        account: &WalletAddress,
        message: &str,
    ) -> impl Future<Output = Result<String, WalletError>> + Send;
}
