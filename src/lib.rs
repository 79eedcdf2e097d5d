//! # fragment-client — 库入口
//!
//! ## 架构总览
//!
//! ```text
//! ┌──────────────────────────────────────────────────────────┐
//! │           调用方（上传组件 / CLI）                         │
//! │   WalletContext ── 显式传入当前连接账户                    │
//! └───────┬──────────────────────────────────────────────────┘
//!         ↓ Result<T, AppError>
//! ┌───────┼──────────────────────────────────────────────────┐
//! │  ┌─ uploader ──── 文件校验 → 裁剪 → data URL → 上传        │
//! │  │                                                       │
//! │  ├─ image_crop    加载·坐标换算·提取·降采样·JPEG 编码      │
//! │  ├─ api           远端资料接口（黑盒，仅请求/响应约定）    │
//! │  ├─ wallet        钱包地址 / 连接上下文 / 签名委托         │
//! │  ├─ settings      JSON 设置文件                           │
//! │  └─ error         AppError (统一错误类型)                 │
//! └──────────────────────────────────────────────────────────┘
//! ```
//!
//! ## 模块职责
//!
//! | 模块 | 职责 |
//! |------|------|
//! | [`error`] | 统一错误类型 `AppError` |
//! | [`image_crop`] | 客户端裁剪与缩放流水线 |
//! | [`uploader`] | 头像/横幅上传编排 |
//! | [`api`] | 远端 HTTP 接口客户端 |
//! | [`wallet`] | 钱包上下文 |
//! | [`settings`] | 客户端设置读写 |

pub mod api;
pub mod error;
pub mod image_crop;
pub mod settings;
pub mod uploader;
pub mod wallet;
