//! 应用层实现。
//!
//! 这里提供推送发送与送达状态追踪的用例，对推送网关、时钟等外部依赖只依赖抽象。

pub mod clock;
pub mod error;
pub mod gateway;
pub mod handler;
pub mod hooks;
pub mod tracker;

pub use clock::{Clock, SystemClock};
pub use error::{HookKind, TrackerError};
#[cfg(any(test, feature = "testing"))]
pub use gateway::MockPushGateway;
pub use gateway::PushGateway;
pub use handler::PushHandler;
pub use hooks::{ErrorHook, InitializeHook, SendHook, StatusUpdateHook, TrackingHooks};
pub use tracker::{DeliveryTracker, PollSummary};
