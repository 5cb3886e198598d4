//! 推送领域模型
//!
//! 包含推送平台、受众、请求与响应模型，以及网关报文编码规则。

pub mod audience;
pub mod encoding;
pub mod errors;
pub mod legacy;
pub mod platform;
pub mod request;
pub mod response;
pub mod tracking;

// 重新导出常用类型
pub use audience::*;
pub use encoding::*;
pub use errors::*;
pub use legacy::*;
pub use platform::*;
pub use request::*;
pub use response::*;
pub use tracking::*;
