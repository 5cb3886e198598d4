use async_trait::async_trait;
use domain::{MessageStatus, PushError, PushRequest, PushResponse};

/// 推送网关 - 发送推送并查询送达状态
#[cfg_attr(any(test, feature = "testing"), mockall::automock)]
#[async_trait]
pub trait PushGateway: Send + Sync {
    /// 发送推送，成功时返回网关分配的消息ID
    async fn send(&self, request: &PushRequest) -> Result<PushResponse, PushError>;

    /// 查询消息送达状态
    ///
    /// 调用方保证单次不超过 [`domain::MAX_STATUS_QUERY_BATCH`] 个ID。
    async fn query_status(&self, message_ids: &[String]) -> Result<Vec<MessageStatus>, PushError>;
}
