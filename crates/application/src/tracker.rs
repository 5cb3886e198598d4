//! 推送送达状态追踪器
//!
//! 维护等待查询状态的消息集合，后台任务定期分批向网关查询送达状态并通过回调上报。
//!
//! 设计要点：
//! 1. 集合只由一把锁保护，锁内只做遍历和增删，网络调用和回调都在锁外
//! 2. 过期清理与本轮查询批次在同一次加锁中完成
//! 3. 单个分批查询失败只上报错误，不影响其他分批
//! 4. 生命周期显式：创建后需要 `start`，通过 `stop` 取消后台任务

use std::collections::HashMap;
use std::panic::AssertUnwindSafe;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use domain::{PushError, TrackedMessage, MAX_STATUS_QUERY_BATCH};
use futures::FutureExt;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};

use crate::clock::{Clock, SystemClock};
use crate::error::TrackerError;
use crate::gateway::PushGateway;
use crate::hooks::{panic_message, TrackingHooks};

/// 单轮轮询的统计信息
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PollSummary {
    /// 本轮查询的消息数量
    pub queried: usize,
    /// 本轮清理的过期消息数量
    pub expired: usize,
    /// 发起的网关调用次数
    pub chunks: usize,
    /// 失败的网关调用次数
    pub failed_chunks: usize,
    /// 上报的状态数量
    pub statuses: usize,
}

enum Lifecycle {
    Created,
    /// 正在执行初始化回调
    Starting,
    Running(JoinHandle<()>),
    Stopped,
}

/// 送达状态追踪器
///
/// 克隆后共享同一份追踪集合和后台任务。
#[derive(Clone)]
pub struct DeliveryTracker {
    inner: Arc<TrackerInner>,
}

struct TrackerInner {
    gateway: Arc<dyn PushGateway>,
    hooks: TrackingHooks,
    clock: Arc<dyn Clock>,
    poll_interval: Duration,
    messages: Mutex<HashMap<String, TrackedMessage>>,
    lifecycle: Mutex<Lifecycle>,
    shutdown: CancellationToken,
}

impl DeliveryTracker {
    /// 创建追踪器，不会启动后台任务
    ///
    /// 轮询间隔小于 1 秒时使用默认的 60 秒。
    pub fn new(gateway: Arc<dyn PushGateway>, hooks: TrackingHooks, poll_interval_secs: i64) -> Self {
        Self::with_clock(gateway, hooks, poll_interval_secs, Arc::new(SystemClock))
    }

    pub fn with_clock(
        gateway: Arc<dyn PushGateway>,
        hooks: TrackingHooks,
        poll_interval_secs: i64,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self {
            inner: Arc::new(TrackerInner {
                gateway,
                hooks,
                clock,
                poll_interval: config::normalize_poll_interval(poll_interval_secs),
                messages: Mutex::new(HashMap::new()),
                lifecycle: Mutex::new(Lifecycle::Created),
                shutdown: CancellationToken::new(),
            }),
        }
    }

    pub fn poll_interval(&self) -> Duration {
        self.inner.poll_interval
    }

    pub fn hooks(&self) -> &TrackingHooks {
        &self.inner.hooks
    }

    /// 加入追踪集合
    ///
    /// 消息ID为空或已在追踪中时忽略，返回是否新加入。
    pub fn insert(&self, message: TrackedMessage) -> bool {
        self.inner.insert(message)
    }

    /// 以当前时间追踪一个消息ID
    pub fn track(&self, message_id: impl Into<String>) -> bool {
        let message = TrackedMessage::new(message_id, self.inner.clock.now());
        self.inner.insert(message)
    }

    /// 移除追踪，返回是否存在
    pub fn remove(&self, message_id: &str) -> bool {
        self.inner.lock_messages().remove(message_id).is_some()
    }

    /// 当前追踪中的消息ID副本
    pub fn snapshot(&self) -> Vec<String> {
        self.inner.lock_messages().keys().cloned().collect()
    }

    pub fn len(&self) -> usize {
        self.inner.lock_messages().len()
    }

    pub fn is_empty(&self) -> bool {
        self.inner.lock_messages().is_empty()
    }

    pub fn is_running(&self) -> bool {
        matches!(*self.inner.lock_lifecycle(), Lifecycle::Running(_))
    }

    /// 启动后台轮询任务
    ///
    /// 只有第一次调用会生效：同步执行初始化回调，再启动后台任务。初始化失败只上报错误，
    /// 后台任务照常启动。已启动或已停止时返回 `false`。
    ///
    /// 初始化回调在锁外执行，回调中可以访问同一个追踪器。初始化期间被 `stop` 时不再启动后台任务。
    ///
    /// 必须在 tokio 运行时中调用。
    pub fn start(&self) -> bool {
        {
            let mut lifecycle = self.inner.lock_lifecycle();
            if !matches!(*lifecycle, Lifecycle::Created) {
                return false;
            }
            *lifecycle = Lifecycle::Starting;
        }

        if let Some(ids) = self.inner.hooks.initialize() {
            let now = self.inner.clock.now();
            let seeded = ids
                .into_iter()
                .filter(|id| self.inner.insert(TrackedMessage::new(id.as_str(), now)))
                .count();
            info!(seeded, "Message tracking list initialized");
        }

        let mut lifecycle = self.inner.lock_lifecycle();
        if !matches!(*lifecycle, Lifecycle::Starting) {
            info!("Delivery tracker stopped during initialization");
            return false;
        }
        let inner = Arc::clone(&self.inner);
        *lifecycle = Lifecycle::Running(tokio::spawn(inner.run()));
        true
    }

    /// 停止后台任务并等待其退出
    ///
    /// 停止后不能再次启动。
    pub async fn stop(&self) {
        let previous = {
            let mut lifecycle = self.inner.lock_lifecycle();
            std::mem::replace(&mut *lifecycle, Lifecycle::Stopped)
        };
        self.inner.shutdown.cancel();

        if let Lifecycle::Running(handle) = previous {
            if let Err(err) = handle.await {
                error!(error = %err, "Delivery tracker task ended abnormally");
            }
        }
    }

    /// 执行一轮轮询：清理过期消息、分批查询状态、上报结果
    pub async fn poll_once(&self) -> PollSummary {
        self.inner.poll_once().await
    }
}

impl TrackerInner {
    fn lock_messages(&self) -> MutexGuard<'_, HashMap<String, TrackedMessage>> {
        self.messages.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn lock_lifecycle(&self) -> MutexGuard<'_, Lifecycle> {
        self.lifecycle.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn insert(&self, message: TrackedMessage) -> bool {
        if message.message_id.trim().is_empty() {
            return false;
        }

        let mut messages = self.lock_messages();
        if messages.contains_key(&message.message_id) {
            return false;
        }
        messages.insert(message.message_id.clone(), message);
        true
    }

    /// 在一次加锁中移除过期消息并收集本轮要查询的ID
    fn collect_batch(&self) -> (Vec<String>, usize) {
        let now = self.clock.now();
        let mut batch = Vec::new();
        let mut messages = self.lock_messages();
        let before = messages.len();

        messages.retain(|id, message| {
            if message.is_expired(now) {
                false
            } else {
                batch.push(id.clone());
                true
            }
        });

        (batch, before - messages.len())
    }

    async fn run(self: Arc<Self>) {
        info!(
            interval_secs = self.poll_interval.as_secs(),
            "Delivery tracker started"
        );

        loop {
            if self.shutdown.is_cancelled() {
                break;
            }

            self.poll_once().await;

            tokio::select! {
                () = self.shutdown.cancelled() => break,
                () = tokio::time::sleep(self.poll_interval) => {}
            }
        }

        info!("Delivery tracker stopped");
    }

    async fn poll_once(&self) -> PollSummary {
        let (batch, expired) = self.collect_batch();
        if expired > 0 {
            warn!(expired, "Dropped expired tracked messages");
        }

        let mut summary = PollSummary {
            queried: batch.len(),
            expired,
            ..Default::default()
        };
        let mut statuses = Vec::new();

        for (index, chunk) in batch.chunks(MAX_STATUS_QUERY_BATCH).enumerate() {
            if self.shutdown.is_cancelled() {
                debug!(chunk = index, "Status query interrupted by shutdown");
                break;
            }

            summary.chunks += 1;
            let outcome = tokio::select! {
                () = self.shutdown.cancelled() => break,
                outcome = AssertUnwindSafe(self.gateway.query_status(chunk)).catch_unwind() => outcome,
            };

            let failure = match outcome {
                Ok(Ok(mut found)) => {
                    statuses.append(&mut found);
                    continue;
                }
                Ok(Err(err)) => err,
                Err(panic) => PushError::transport(format!(
                    "status query panicked: {}",
                    panic_message(panic.as_ref())
                )),
            };

            summary.failed_chunks += 1;
            self.hooks.report(TrackerError::StatusQuery {
                chunk: index,
                size: chunk.len(),
                source: failure,
            });
        }

        summary.statuses = statuses.len();
        debug!(
            queried = summary.queried,
            chunks = summary.chunks,
            failed_chunks = summary.failed_chunks,
            statuses = summary.statuses,
            "Delivery status poll finished"
        );

        self.hooks.status_updated(statuses);
        summary
    }
}
