//! 追踪回调
//!
//! 四个可选回调：初始化、发送、状态更新、错误上报。回调在调用处捕获错误和 panic，
//! 不会影响后台轮询。

use std::any::Any;
use std::fmt;
use std::panic::{catch_unwind, AssertUnwindSafe};
use std::sync::Arc;

use domain::{MessageStatus, PushRequest, PushResponse};

use crate::error::{HookKind, TrackerError};

/// 启动时加载需要继续追踪的消息ID
pub type InitializeHook = Arc<dyn Fn() -> anyhow::Result<Vec<String>> + Send + Sync>;
/// 每次发送完成后调用
pub type SendHook = Arc<dyn Fn(&PushRequest, &PushResponse) -> anyhow::Result<()> + Send + Sync>;
/// 每轮轮询结束后调用，结果可能为空
pub type StatusUpdateHook = Arc<dyn Fn(Vec<MessageStatus>) -> anyhow::Result<()> + Send + Sync>;
/// 错误上报
pub type ErrorHook = Arc<dyn Fn(&TrackerError) + Send + Sync>;

#[derive(Clone, Default)]
pub struct TrackingHooks {
    pub on_initialize: Option<InitializeHook>,
    pub on_send: Option<SendHook>,
    pub on_status_update: Option<StatusUpdateHook>,
    pub on_error: Option<ErrorHook>,
}

impl TrackingHooks {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn on_initialize<F>(mut self, hook: F) -> Self
    where
        F: Fn() -> anyhow::Result<Vec<String>> + Send + Sync + 'static,
    {
        self.on_initialize = Some(Arc::new(hook));
        self
    }

    pub fn on_send<F>(mut self, hook: F) -> Self
    where
        F: Fn(&PushRequest, &PushResponse) -> anyhow::Result<()> + Send + Sync + 'static,
    {
        self.on_send = Some(Arc::new(hook));
        self
    }

    pub fn on_status_update<F>(mut self, hook: F) -> Self
    where
        F: Fn(Vec<MessageStatus>) -> anyhow::Result<()> + Send + Sync + 'static,
    {
        self.on_status_update = Some(Arc::new(hook));
        self
    }

    pub fn on_error<F>(mut self, hook: F) -> Self
    where
        F: Fn(&TrackerError) + Send + Sync + 'static,
    {
        self.on_error = Some(Arc::new(hook));
        self
    }

    /// 上报错误；错误回调自身 panic 时只记录日志，不再上报
    pub(crate) fn report(&self, error: TrackerError) {
        match &error {
            TrackerError::Callback { .. } => tracing::error!(error = %error, "push tracking hook failed"),
            _ => tracing::warn!(error = %error, "push tracking error"),
        }

        let Some(hook) = &self.on_error else {
            return;
        };
        if let Err(panic) = catch_unwind(AssertUnwindSafe(|| hook(&error))) {
            tracing::error!(
                reason = %panic_message(panic.as_ref()),
                "error hook panicked"
            );
        }
    }

    /// 调用初始化回调；未配置时返回 `None`
    pub(crate) fn initialize(&self) -> Option<Vec<String>> {
        let hook = self.on_initialize.as_ref()?;
        match catch_unwind(AssertUnwindSafe(|| hook())) {
            Ok(Ok(ids)) => Some(ids),
            Ok(Err(err)) => {
                self.report(TrackerError::Initialization(err));
                None
            }
            Err(panic) => {
                self.report(TrackerError::callback(
                    HookKind::Initialize,
                    panic_message(panic.as_ref()),
                ));
                None
            }
        }
    }

    pub(crate) fn sent(&self, request: &PushRequest, response: &PushResponse) {
        if let Some(hook) = &self.on_send {
            self.guard(HookKind::Send, || hook(request, response));
        }
    }

    pub(crate) fn status_updated(&self, statuses: Vec<MessageStatus>) {
        if let Some(hook) = &self.on_status_update {
            self.guard(HookKind::StatusUpdate, || hook(statuses));
        }
    }

    fn guard<F>(&self, kind: HookKind, call: F)
    where
        F: FnOnce() -> anyhow::Result<()>,
    {
        match catch_unwind(AssertUnwindSafe(call)) {
            Ok(Ok(())) => {}
            Ok(Err(err)) => self.report(TrackerError::callback(kind, format!("{err:#}"))),
            Err(panic) => self.report(TrackerError::callback(kind, panic_message(panic.as_ref()))),
        }
    }
}

impl fmt::Debug for TrackingHooks {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TrackingHooks")
            .field("on_initialize", &self.on_initialize.is_some())
            .field("on_send", &self.on_send.is_some())
            .field("on_status_update", &self.on_status_update.is_some())
            .field("on_error", &self.on_error.is_some())
            .finish()
    }
}

pub(crate) fn panic_message(panic: &(dyn Any + Send)) -> String {
    if let Some(message) = panic.downcast_ref::<&str>() {
        (*message).to_string()
    } else if let Some(message) = panic.downcast_ref::<String>() {
        message.clone()
    } else {
        "unknown panic".to_string()
    }
}
