//! 推送受众
//!
//! 每个受众只有一种选择方式，广播与定向推送互斥。

use serde::{Deserialize, Serialize};

/// 推送受众
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum Audience {
    /// 广播给所有设备
    Broadcast,
    /// 按别名推送
    ByAlias(Vec<String>),
    /// 按注册ID推送
    ByRegistrationId(Vec<String>),
    /// 按标签推送，设备需同时具备所有标签
    ByTagAnd(Vec<String>),
    /// 按标签推送，设备具备任一标签即可
    ByTagOr(Vec<String>),
}

impl Audience {
    pub fn is_broadcast(&self) -> bool {
        matches!(self, Audience::Broadcast)
    }

    /// 定向推送的目标列表，广播时为空
    pub fn targets(&self) -> &[String] {
        match self {
            Audience::Broadcast => &[],
            Audience::ByAlias(targets)
            | Audience::ByRegistrationId(targets)
            | Audience::ByTagAnd(targets)
            | Audience::ByTagOr(targets) => targets,
        }
    }

    /// 定向推送在网关报文中的字段名
    pub fn wire_key(&self) -> Option<&'static str> {
        match self {
            Audience::Broadcast => None,
            Audience::ByAlias(_) => Some("alias"),
            Audience::ByRegistrationId(_) => Some("registration_id"),
            Audience::ByTagAnd(_) => Some("tag_and"),
            Audience::ByTagOr(_) => Some("tag"),
        }
    }
}
