//! 推送请求模型
//!
//! 负责把请求组装为网关 `push` 接口的报文。

use std::collections::HashMap;

use serde::{Deserialize, Serialize};
use serde_json::{json, Map, Value};

use crate::audience::Audience;
use crate::encoding::{encode_optional_audience, encode_platform};
use crate::errors::PushError;
use crate::platform::Platform;

/// Android 通知参数
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AndroidNotification {
    pub alert: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub builder_id: Option<i32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub extras: Option<HashMap<String, String>>,
}

/// iOS 通知参数
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct IosNotification {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub alert: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sound: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub badge: Option<i32>,
    /// 静默推送
    #[serde(rename = "content-available", skip_serializing_if = "Option::is_none")]
    pub content_available: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub extras: Option<HashMap<String, Value>>,
}

/// Windows Phone 通知参数
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct WinPhoneNotification {
    pub alert: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(rename = "_open_page", skip_serializing_if = "Option::is_none")]
    pub open_page: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub extras: Option<HashMap<String, String>>,
}

/// 通知栏消息
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Notification {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub android: Option<AndroidNotification>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ios: Option<IosNotification>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub winphone: Option<WinPhoneNotification>,
}

/// 应用内自定义消息
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AppMessage {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub msg_content: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub content_type: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub extras: Option<HashMap<String, Value>>,
}

/// 推送请求
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PushRequest {
    pub platform: Platform,
    pub audience: Option<Audience>,
    pub notification: Option<Notification>,
    pub message: Option<AppMessage>,
    /// 离线消息保留时长（秒）
    pub time_to_live: Option<u32>,
    /// 要覆盖的旧消息ID
    pub override_message_id: Option<String>,
    /// 为空时使用客户端的默认环境
    pub is_test_environment: Option<bool>,
}

impl PushRequest {
    pub fn new(platform: Platform, audience: Audience) -> Self {
        Self {
            platform,
            audience: Some(audience),
            ..Default::default()
        }
    }

    pub fn with_notification(mut self, notification: Notification) -> Self {
        self.notification = Some(notification);
        self
    }

    pub fn with_message(mut self, message: AppMessage) -> Self {
        self.message = Some(message);
        self
    }

    pub fn with_time_to_live(mut self, seconds: u32) -> Self {
        self.time_to_live = Some(seconds);
        self
    }

    /// 组装 `push` 接口报文
    ///
    /// 通知和自定义消息至少需要一个。
    pub fn to_payload(
        &self,
        send_no: i64,
        default_test_environment: Option<bool>,
    ) -> Result<Value, PushError> {
        if self.notification.is_none() && self.message.is_none() {
            return Err(PushError::invalid_request(
                "notification and message are both empty",
            ));
        }

        let mut payload = Map::new();
        payload.insert("platform".to_string(), encode_platform(&self.platform));
        if let Some(audience) = encode_optional_audience(self.audience.as_ref()) {
            payload.insert("audience".to_string(), audience);
        }
        if let Some(notification) = &self.notification {
            payload.insert("notification".to_string(), to_value(notification)?);
        }
        if let Some(message) = &self.message {
            payload.insert("message".to_string(), to_value(message)?);
        }
        payload.insert(
            "options".to_string(),
            self.options(send_no, default_test_environment),
        );

        Ok(Value::Object(payload))
    }

    fn options(&self, send_no: i64, default_test_environment: Option<bool>) -> Value {
        let is_test = self
            .is_test_environment
            .or(default_test_environment)
            .unwrap_or(false);

        let mut options = json!({
            "sendno": send_no,
            "apns_production": !is_test,
        });
        if let Some(ttl) = self.time_to_live {
            options["time_to_live"] = json!(ttl);
        }
        if let Some(id) = self
            .override_message_id
            .as_deref()
            .filter(|id| !id.trim().is_empty())
        {
            options["override_msg_id"] = json!(id);
        }
        options
    }
}

fn to_value<T: Serialize>(value: &T) -> Result<Value, PushError> {
    serde_json::to_value(value).map_err(|e| PushError::invalid_request(e.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::platform::PlatformSet;

    fn android_request() -> PushRequest {
        PushRequest::new(
            Platform::Specific(PlatformSet::ANDROID | PlatformSet::IOS),
            Audience::ByAlias(vec!["alice".to_string()]),
        )
        .with_notification(Notification {
            android: Some(AndroidNotification {
                alert: "hello".to_string(),
                title: Some("greeting".to_string()),
                ..Default::default()
            }),
            ..Default::default()
        })
    }

    #[test]
    fn test_payload_shape() {
        let payload = android_request().to_payload(7, None).unwrap();

        assert_eq!(payload["platform"], json!(["android", "ios"]));
        assert_eq!(payload["audience"], json!({"alias": ["alice"]}));
        assert_eq!(
            payload["notification"],
            json!({"android": {"alert": "hello", "title": "greeting"}})
        );
        assert!(payload.get("message").is_none());
        assert_eq!(payload["options"], json!({"sendno": 7, "apns_production": true}));
    }

    #[test]
    fn test_payload_options() {
        let mut request = android_request().with_time_to_live(3600);
        request.override_message_id = Some("  ".to_string());
        let payload = request.to_payload(1, Some(true)).unwrap();
        assert_eq!(payload["options"]["time_to_live"], json!(3600));
        assert!(payload["options"].get("override_msg_id").is_none());
        assert_eq!(payload["options"]["apns_production"], json!(false));

        request.override_message_id = Some("99".to_string());
        request.is_test_environment = Some(false);
        let payload = request.to_payload(1, Some(true)).unwrap();
        assert_eq!(payload["options"]["override_msg_id"], json!("99"));
        assert_eq!(payload["options"]["apns_production"], json!(true));
    }

    #[test]
    fn test_missing_audience_is_omitted() {
        let mut request = android_request();
        request.audience = None;
        let payload = request.to_payload(1, None).unwrap();
        assert!(payload.get("audience").is_none());
    }

    #[test]
    fn test_empty_request_is_rejected() {
        let request = PushRequest::new(Platform::All, Audience::Broadcast);
        let result = request.to_payload(1, None);
        assert!(matches!(result, Err(PushError::InvalidRequest(_))));
    }

    #[test]
    fn test_ios_silent_flag_wire_name() {
        let request = PushRequest::new(Platform::All, Audience::Broadcast).with_notification(
            Notification {
                ios: Some(IosNotification {
                    content_available: Some(true),
                    ..Default::default()
                }),
                ..Default::default()
            },
        );
        let payload = request.to_payload(1, None).unwrap();
        assert_eq!(payload["notification"]["ios"], json!({"content-available": true}));
        assert_eq!(payload["audience"], json!("all"));
    }
}
