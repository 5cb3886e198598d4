use domain::PushError;
use thiserror::Error;

/// 追踪过程中捕获的错误，只通过错误回调上报
#[derive(Debug, Error)]
pub enum TrackerError {
    #[error("failed to initialize message tracking list: {0}")]
    Initialization(#[source] anyhow::Error),
    #[error("failed to send push message: {0}")]
    Send(#[from] PushError),
    #[error("failed to query status for chunk {chunk} ({size} ids): {source}")]
    StatusQuery {
        chunk: usize,
        size: usize,
        #[source]
        source: PushError,
    },
    #[error("{hook} hook failed: {reason}")]
    Callback { hook: HookKind, reason: String },
}

impl TrackerError {
    pub fn callback(hook: HookKind, reason: impl Into<String>) -> Self {
        Self::Callback {
            hook,
            reason: reason.into(),
        }
    }
}

/// 回调类型
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HookKind {
    Initialize,
    Send,
    StatusUpdate,
}

impl std::fmt::Display for HookKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            HookKind::Initialize => write!(f, "initialize"),
            HookKind::Send => write!(f, "send"),
            HookKind::StatusUpdate => write!(f, "status update"),
        }
    }
}
