use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

/// 网关保留消息状态的时长，超过后不再查询
pub const TRACKING_RETENTION_DAYS: i64 = 10;

pub fn tracking_retention() -> Duration {
    Duration::days(TRACKING_RETENTION_DAYS)
}

/// 等待查询送达状态的消息
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TrackedMessage {
    pub message_id: String,
    pub created_at: DateTime<Utc>,
}

impl TrackedMessage {
    pub fn new(message_id: impl Into<String>, created_at: DateTime<Utc>) -> Self {
        Self {
            message_id: message_id.into(),
            created_at,
        }
    }

    /// 超出保留期后过期
    pub fn is_expired(&self, now: DateTime<Utc>) -> bool {
        now - self.created_at > tracking_retention()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_expiry_boundary() {
        let now = Utc::now();
        let fresh = TrackedMessage::new("1", now - Duration::days(9));
        let edge = TrackedMessage::new("2", now - tracking_retention());
        let stale = TrackedMessage::new("3", now - Duration::days(10) - Duration::seconds(1));

        assert!(!fresh.is_expired(now));
        assert!(!edge.is_expired(now));
        assert!(stale.is_expired(now));
    }
}
