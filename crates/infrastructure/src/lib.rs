//! 基础设施层实现。
//!
//! 提供推送网关的 HTTP 适配器，实现应用层定义的 `PushGateway` 接口。

pub mod jpush_client;

pub use jpush_client::{basic_authorization, send_number, JPushClient};
