//! 推送错误定义
//!
//! 网关失败时携带 HTTP 状态码和网关定义的响应码。

use thiserror::Error;

use crate::response::ResponseCode;

/// 网关对"找不到推送目标"的固定描述
pub const NO_DESTINATION_MESSAGE: &str = "cannot find user by this audience";

/// 推送错误类型
#[derive(Error, Debug, Clone, PartialEq)]
pub enum PushError {
    /// 网关返回了错误
    #[error("推送网关错误 (HTTP {status}): [{code}] {message}")]
    Gateway {
        status: u16,
        code: ResponseCode,
        message: String,
        message_id: Option<String>,
    },

    /// 受众中没有可达的设备
    #[error("推送目标不存在 (HTTP {status}): {message}")]
    NoDestinationReached {
        status: u16,
        message: String,
        message_id: Option<String>,
    },

    /// 网络传输失败
    #[error("网络传输失败: {0}")]
    Transport(String),

    /// 响应格式错误
    #[error("响应格式错误: {0}")]
    MalformedResponse(String),

    /// 请求不合法
    #[error("请求不合法: {0}")]
    InvalidRequest(String),
}

impl PushError {
    /// 根据网关错误节点构造错误
    ///
    /// 响应码 1011 且描述为固定文本时归类为 `NoDestinationReached`。
    pub fn from_gateway(
        status: u16,
        code: ResponseCode,
        message: impl Into<String>,
        message_id: Option<String>,
    ) -> Self {
        let message = message.into();
        if code == ResponseCode::NoDestinationReached
            && message.eq_ignore_ascii_case(NO_DESTINATION_MESSAGE)
        {
            Self::NoDestinationReached {
                status,
                message,
                message_id,
            }
        } else {
            Self::Gateway {
                status,
                code,
                message,
                message_id,
            }
        }
    }

    pub fn transport(message: impl Into<String>) -> Self {
        Self::Transport(message.into())
    }

    pub fn malformed(message: impl Into<String>) -> Self {
        Self::MalformedResponse(message.into())
    }

    pub fn invalid_request(message: impl Into<String>) -> Self {
        Self::InvalidRequest(message.into())
    }

    /// HTTP 状态码（仅网关错误有）
    pub fn http_status(&self) -> Option<u16> {
        match self {
            Self::Gateway { status, .. } | Self::NoDestinationReached { status, .. } => {
                Some(*status)
            }
            _ => None,
        }
    }

    /// 网关响应码（仅网关错误有）
    pub fn code(&self) -> Option<ResponseCode> {
        match self {
            Self::Gateway { code, .. } => Some(*code),
            Self::NoDestinationReached { .. } => Some(ResponseCode::NoDestinationReached),
            _ => None,
        }
    }

    /// 网关分配的消息ID（部分错误响应也会携带）
    pub fn message_id(&self) -> Option<&str> {
        match self {
            Self::Gateway { message_id, .. } | Self::NoDestinationReached { message_id, .. } => {
                message_id.as_deref()
            }
            _ => None,
        }
    }
}
