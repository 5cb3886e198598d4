//! 推送网关响应模型

use std::fmt;

use serde::de::{self, Deserializer};
use serde::{Deserialize, Serialize, Serializer};

/// 单次状态查询允许的最大消息ID数量（网关限制）
pub const MAX_STATUS_QUERY_BATCH: usize = 100;

/// 网关响应码
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ResponseCode {
    Succeed,
    ServiceError,
    PostOnly,
    MissingRequiredParameter,
    InvalidParameter,
    FailedVerificationCode,
    BodyTooLarge,
    InvalidUserOrPassword,
    InvalidReceiverValue,
    InvalidAppKey,
    NoDestinationReached,
    HttpIsNotAllowed,
    /// 未收录的响应码
    Other(i64),
}

impl ResponseCode {
    pub fn from_code(code: i64) -> Self {
        match code {
            0 => Self::Succeed,
            10 => Self::ServiceError,
            1001 => Self::PostOnly,
            1002 => Self::MissingRequiredParameter,
            1003 => Self::InvalidParameter,
            1004 => Self::FailedVerificationCode,
            1005 => Self::BodyTooLarge,
            1006 => Self::InvalidUserOrPassword,
            1007 => Self::InvalidReceiverValue,
            1008 => Self::InvalidAppKey,
            1011 => Self::NoDestinationReached,
            1020 => Self::HttpIsNotAllowed,
            other => Self::Other(other),
        }
    }

    pub fn code(self) -> i64 {
        match self {
            Self::Succeed => 0,
            Self::ServiceError => 10,
            Self::PostOnly => 1001,
            Self::MissingRequiredParameter => 1002,
            Self::InvalidParameter => 1003,
            Self::FailedVerificationCode => 1004,
            Self::BodyTooLarge => 1005,
            Self::InvalidUserOrPassword => 1006,
            Self::InvalidReceiverValue => 1007,
            Self::InvalidAppKey => 1008,
            Self::NoDestinationReached => 1011,
            Self::HttpIsNotAllowed => 1020,
            Self::Other(code) => code,
        }
    }
}

impl fmt::Display for ResponseCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.code())
    }
}

impl Serialize for ResponseCode {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_i64(self.code())
    }
}

impl<'de> Deserialize<'de> for ResponseCode {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        i64::deserialize(deserializer).map(Self::from_code)
    }
}

/// 发送推送后的网关响应
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PushResponse {
    /// 请求时携带的发送编号
    pub send_no: Option<String>,
    /// 网关分配的消息ID
    pub message_id: String,
    pub code: ResponseCode,
    pub message: Option<String>,
}

impl PushResponse {
    pub fn is_success(&self) -> bool {
        self.code == ResponseCode::Succeed
    }

    /// 是否带有可追踪的消息ID
    pub fn has_message_id(&self) -> bool {
        !self.message_id.trim().is_empty()
    }
}

/// 消息送达状态
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MessageStatus {
    #[serde(rename = "msg_id", deserialize_with = "deserialize_message_id")]
    pub message_id: String,
    /// Android 送达数
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub android_received: Option<i64>,
    /// iOS 推送至 APNs 数
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ios_apns_sent: Option<i64>,
    /// iOS 自定义消息送达数
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ios_msg_received: Option<i64>,
    /// WinPhone 推送至 MPNs 数
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub wp_mpns_sent: Option<i64>,
}

impl MessageStatus {
    pub fn new(message_id: impl Into<String>) -> Self {
        Self {
            message_id: message_id.into(),
            android_received: None,
            ios_apns_sent: None,
            ios_msg_received: None,
            wp_mpns_sent: None,
        }
    }
}

/// 网关的 `msg_id` 既可能是数字也可能是字符串
fn deserialize_message_id<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    match serde_json::Value::deserialize(deserializer)? {
        serde_json::Value::String(id) => Ok(id),
        serde_json::Value::Number(id) => Ok(id.to_string()),
        other => Err(de::Error::custom(format!("unexpected msg_id: {other}"))),
    }
}
