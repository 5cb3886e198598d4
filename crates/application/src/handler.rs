//! 推送处理器
//!
//! 在推送网关之上加入送达状态追踪：发送成功后触发发送回调，并把网关分配的消息ID加入追踪。
//! 建议作为单例使用，每个实例拥有一个后台追踪任务。

use std::sync::Arc;

use domain::{LegacyPushRequest, PushError, PushRequest, PushResponse};
use tracing::{debug, info};

use crate::error::TrackerError;
use crate::gateway::PushGateway;
use crate::hooks::TrackingHooks;
use crate::tracker::DeliveryTracker;

pub struct PushHandler {
    gateway: Arc<dyn PushGateway>,
    tracker: DeliveryTracker,
}

impl PushHandler {
    pub fn new(gateway: Arc<dyn PushGateway>, hooks: TrackingHooks, poll_interval_secs: i64) -> Self {
        let tracker = DeliveryTracker::new(gateway.clone(), hooks, poll_interval_secs);
        Self { gateway, tracker }
    }

    /// 使用已构造好的追踪器（例如自定义时钟）
    pub fn with_tracker(gateway: Arc<dyn PushGateway>, tracker: DeliveryTracker) -> Self {
        Self { gateway, tracker }
    }

    pub fn tracker(&self) -> &DeliveryTracker {
        &self.tracker
    }

    /// 启动后台追踪
    pub fn start(&self) -> bool {
        self.tracker.start()
    }

    /// 停止后台追踪
    pub async fn stop(&self) {
        self.tracker.stop().await;
    }

    /// 发送推送并追踪送达状态
    ///
    /// 发送失败时错误会同时上报给错误回调并返回给调用方，不会产生追踪记录。
    pub async fn send(&self, request: PushRequest) -> Result<PushResponse, PushError> {
        let hooks = self.tracker.hooks();

        let response = match self.gateway.send(&request).await {
            Ok(response) => response,
            Err(err) => {
                hooks.report(TrackerError::Send(err.clone()));
                return Err(err);
            }
        };

        hooks.sent(&request, &response);

        if response.has_message_id() {
            if self.tracker.track(response.message_id.as_str()) {
                debug!(message_id = %response.message_id, "Push message tracked");
            }
        } else {
            info!(code = %response.code, "Push response carries no message id, not tracked");
        }

        Ok(response)
    }

    /// 发送旧版请求，先转换为当前请求模型
    pub async fn send_legacy(&self, request: LegacyPushRequest) -> Result<PushResponse, PushError> {
        self.send(request.into()).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::gateway::MockPushGateway;
    use domain::{
        Audience, LegacyMessage, LegacyPushType, Notification, Platform, ResponseCode,
        AndroidNotification,
    };
    use std::sync::Mutex;

    fn request() -> PushRequest {
        PushRequest::new(Platform::All, Audience::Broadcast).with_notification(Notification {
            android: Some(AndroidNotification {
                alert: "hi".to_string(),
                ..Default::default()
            }),
            ..Default::default()
        })
    }

    fn response(message_id: &str) -> PushResponse {
        PushResponse {
            send_no: Some("1".to_string()),
            message_id: message_id.to_string(),
            code: ResponseCode::Succeed,
            message: None,
        }
    }

    #[tokio::test]
    async fn test_send_tracks_message_and_fires_hook() {
        let mut gateway = MockPushGateway::new();
        gateway
            .expect_send()
            .times(1)
            .returning(|_| Ok(response("1001")));

        let sent = Arc::new(Mutex::new(Vec::new()));
        let sent_hook = sent.clone();
        let hooks = TrackingHooks::new().on_send(move |_request, response| {
            sent_hook.lock().unwrap().push(response.message_id.clone());
            Ok(())
        });

        let handler = PushHandler::new(Arc::new(gateway), hooks, 60);
        let result = handler.send(request()).await.unwrap();

        assert_eq!(result.message_id, "1001");
        assert_eq!(*sent.lock().unwrap(), vec!["1001".to_string()]);
        assert_eq!(handler.tracker().snapshot(), vec!["1001".to_string()]);
    }

    #[tokio::test]
    async fn test_send_without_message_id_is_not_tracked() {
        let mut gateway = MockPushGateway::new();
        gateway.expect_send().returning(|_| Ok(response("")));

        let handler = PushHandler::new(Arc::new(gateway), TrackingHooks::new(), 60);
        handler.send(request()).await.unwrap();

        assert!(handler.tracker().is_empty());
    }

    #[tokio::test]
    async fn test_send_failure_reports_error_and_skips_tracking() {
        let mut gateway = MockPushGateway::new();
        gateway
            .expect_send()
            .returning(|_| Err(PushError::transport("connection refused")));

        let errors = Arc::new(Mutex::new(Vec::new()));
        let errors_hook = errors.clone();
        let hooks = TrackingHooks::new()
            .on_send(|_, _| panic!("send hook must not run on failure"))
            .on_error(move |error| errors_hook.lock().unwrap().push(error.to_string()));

        let handler = PushHandler::new(Arc::new(gateway), hooks, 60);
        let result = handler.send(request()).await;

        assert!(matches!(result, Err(PushError::Transport(_))));
        assert!(handler.tracker().is_empty());
        let errors = errors.lock().unwrap();
        assert_eq!(errors.len(), 1);
        assert!(errors[0].contains("connection refused"));
    }

    #[tokio::test]
    async fn test_failing_send_hook_does_not_fail_send() {
        let mut gateway = MockPushGateway::new();
        gateway.expect_send().returning(|_| Ok(response("7")));

        let errors = Arc::new(Mutex::new(0usize));
        let errors_hook = errors.clone();
        let hooks = TrackingHooks::new()
            .on_send(|_, _| Err(anyhow::anyhow!("log store unavailable")))
            .on_error(move |_| *errors_hook.lock().unwrap() += 1);

        let handler = PushHandler::new(Arc::new(gateway), hooks, 60);
        let result = handler.send(request()).await;

        assert!(result.is_ok());
        assert_eq!(*errors.lock().unwrap(), 1);
        assert_eq!(handler.tracker().len(), 1);
    }

    #[tokio::test]
    async fn test_send_legacy_converts_request() {
        let mut gateway = MockPushGateway::new();
        gateway
            .expect_send()
            .withf(|request| {
                request.audience == Some(Audience::ByAlias(vec!["a".to_string(), "b".to_string()]))
            })
            .times(1)
            .returning(|_| Ok(response("55")));

        let handler = PushHandler::new(Arc::new(gateway), TrackingHooks::new(), 60);
        let legacy = LegacyPushRequest {
            message: LegacyMessage {
                content: "hello".to_string(),
                ..Default::default()
            },
            push_type: LegacyPushType::ByAlias,
            receiver_value: "a;b".to_string(),
            ..Default::default()
        };

        let result = handler.send_legacy(legacy).await.unwrap();
        assert_eq!(result.message_id, "55");
        assert!(handler.tracker().snapshot().contains(&"55".to_string()));
    }
}
