//! 旧版（v2）推送请求
//!
//! 旧版请求用一个分隔字符串描述接收方，发送前统一转换为 [`PushRequest`]。

use std::collections::HashMap;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::audience::Audience;
use crate::platform::{Platform, PlatformFlag};
use crate::request::{AndroidNotification, AppMessage, IosNotification, Notification, PushRequest};

const RECEIVER_SEPARATORS: [char; 3] = [',', ';', ' '];

/// 旧版推送方式
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum LegacyPushType {
    #[default]
    Unknown,
    ByTag,
    ByAlias,
    Broadcast,
    ByRegistrationId,
}

/// 旧版消息内容
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct LegacyMessage {
    pub content: String,
    pub push_title: Option<String>,
    pub builder_id: Option<i32>,
    pub sound: Option<String>,
    pub badge: Option<i32>,
    pub customized_values: Option<HashMap<String, String>>,
}

/// 旧版推送请求
#[derive(Debug, Clone, Default, PartialEq)]
pub struct LegacyPushRequest {
    pub message: LegacyMessage,
    pub push_type: LegacyPushType,
    pub platform: Platform,
    /// 以逗号、分号或空格分隔的接收方
    pub receiver_value: String,
    /// 离线保留时长（秒），0 表示只推送给在线设备
    pub life_time: u32,
    pub override_message_id: Option<String>,
    pub is_test_environment: bool,
}

impl LegacyPushRequest {
    /// 拆分接收方，忽略空项
    pub fn receivers(&self) -> Vec<String> {
        self.receiver_value
            .split(&RECEIVER_SEPARATORS[..])
            .filter(|item| !item.is_empty())
            .map(str::to_string)
            .collect()
    }

    fn audience(&self) -> Option<Audience> {
        match self.push_type {
            LegacyPushType::Broadcast => Some(Audience::Broadcast),
            LegacyPushType::ByAlias => Some(Audience::ByAlias(self.receivers())),
            LegacyPushType::ByRegistrationId => Some(Audience::ByRegistrationId(self.receivers())),
            LegacyPushType::ByTag => Some(Audience::ByTagOr(self.receivers())),
            LegacyPushType::Unknown => None,
        }
    }
}

impl From<LegacyPushRequest> for PushRequest {
    fn from(request: LegacyPushRequest) -> Self {
        let audience = request.audience();
        let LegacyPushRequest {
            message,
            platform,
            life_time,
            override_message_id,
            is_test_environment,
            ..
        } = request;

        let android = platform
            .includes(PlatformFlag::Android)
            .then(|| AndroidNotification {
                alert: message.content.clone(),
                title: message.push_title.clone(),
                builder_id: message.builder_id,
                extras: message.customized_values.clone(),
            });
        let ios = platform
            .includes(PlatformFlag::Ios)
            .then(|| IosNotification {
                alert: Some(message.content.clone()),
                sound: message.sound.clone(),
                badge: message.badge,
                content_available: None,
                extras: message.customized_values.as_ref().map(to_json_extras),
            });

        let app_message = AppMessage {
            msg_content: Some(message.content),
            title: message.push_title,
            content_type: None,
            extras: message.customized_values.as_ref().map(to_json_extras),
        };

        PushRequest {
            platform,
            audience,
            notification: Some(Notification {
                android,
                ios,
                winphone: None,
            }),
            message: Some(app_message),
            time_to_live: Some(life_time),
            override_message_id,
            is_test_environment: Some(is_test_environment),
        }
    }
}

fn to_json_extras(values: &HashMap<String, String>) -> HashMap<String, Value> {
    values
        .iter()
        .map(|(key, value)| (key.clone(), Value::String(value.clone())))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::platform::PlatformSet;

    fn legacy(push_type: LegacyPushType, receivers: &str) -> LegacyPushRequest {
        LegacyPushRequest {
            message: LegacyMessage {
                content: "hello".to_string(),
                push_title: Some("title".to_string()),
                sound: Some("default".to_string()),
                ..Default::default()
            },
            push_type,
            platform: Platform::Specific(PlatformSet::ANDROID),
            receiver_value: receivers.to_string(),
            ..Default::default()
        }
    }

    #[test]
    fn test_receivers_are_split_on_all_separators() {
        let request = legacy(LegacyPushType::ByAlias, "a,b;;c  d,");
        assert_eq!(request.receivers(), vec!["a", "b", "c", "d"]);
    }

    #[test]
    fn test_push_type_maps_to_audience() {
        let converted: PushRequest = legacy(LegacyPushType::ByTag, "t1,t2").into();
        assert_eq!(
            converted.audience,
            Some(Audience::ByTagOr(vec!["t1".to_string(), "t2".to_string()]))
        );

        let converted: PushRequest = legacy(LegacyPushType::Broadcast, "ignored").into();
        assert_eq!(converted.audience, Some(Audience::Broadcast));

        let converted: PushRequest = legacy(LegacyPushType::ByRegistrationId, "r1").into();
        assert_eq!(
            converted.audience,
            Some(Audience::ByRegistrationId(vec!["r1".to_string()]))
        );

        let converted: PushRequest = legacy(LegacyPushType::Unknown, "x").into();
        assert_eq!(converted.audience, None);
    }

    #[test]
    fn test_notifications_follow_platform() {
        let converted: PushRequest = legacy(LegacyPushType::ByAlias, "a").into();
        let notification = converted.notification.unwrap();
        assert_eq!(notification.android.unwrap().alert, "hello");
        assert!(notification.ios.is_none());

        let mut request = legacy(LegacyPushType::ByAlias, "a");
        request.platform = Platform::All;
        let converted: PushRequest = request.into();
        let notification = converted.notification.unwrap();
        assert!(notification.android.is_some());
        assert_eq!(notification.ios.unwrap().sound.as_deref(), Some("default"));
    }

    #[test]
    fn test_life_time_and_message() {
        let mut request = legacy(LegacyPushType::ByAlias, "a");
        request.life_time = 60;
        let converted: PushRequest = request.into();
        assert_eq!(converted.time_to_live, Some(60));
        assert_eq!(
            converted.message.unwrap().msg_content.as_deref(),
            Some("hello")
        );

        let converted: PushRequest = legacy(LegacyPushType::ByAlias, "a").into();
        assert_eq!(converted.time_to_live, Some(0));
        let payload = converted.to_payload(1, None).unwrap();
        assert_eq!(payload["options"]["time_to_live"], serde_json::json!(0));
        assert_eq!(converted.is_test_environment, Some(false));
    }
}
