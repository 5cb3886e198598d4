//! 统一配置中心
//!
//! 提供推送客户端的全局配置管理，包括：
//! - 网关凭据与地址
//! - 送达状态追踪
//!
//! 加载顺序：默认值 < YAML 配置文件 < `JPUSH_` 前缀的环境变量。

use std::path::{Path, PathBuf};
use std::time::Duration;

use figment::providers::{Env, Format, Serialized, Yaml};
use figment::Figment;
use serde::{Deserialize, Serialize};

/// 默认配置文件
pub const DEFAULT_CONFIG_FILE: &str = "jpush.yaml";
/// 指定配置文件路径的环境变量
pub const CONFIG_PATH_ENV: &str = "JPUSH_CONFIG";
/// 环境变量前缀，嵌套字段用 `__` 分隔，例如 `JPUSH_TRACKING__POLL_INTERVAL_SECS`
pub const ENV_PREFIX: &str = "JPUSH_";

/// 默认轮询间隔（秒）
pub const DEFAULT_POLL_INTERVAL_SECS: i64 = 60;

/// 全局推送配置
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PushConfig {
    /// 网关配置
    #[serde(default)]
    pub jpush: JPushConfig,
    /// 状态追踪配置
    #[serde(default)]
    pub tracking: TrackingConfig,
}

/// 网关配置
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JPushConfig {
    pub app_key: String,
    pub master_secret: String,
    /// 为空时按生产环境推送
    pub is_test_environment: Option<bool>,
    pub api_base_url: String,
    pub report_base_url: String,
    pub request_timeout_secs: u64,
}

impl Default for JPushConfig {
    fn default() -> Self {
        Self {
            app_key: String::new(),
            master_secret: String::new(),
            is_test_environment: None,
            api_base_url: "https://api.jpush.cn/v3/".to_string(),
            report_base_url: "https://report.jpush.cn/v2/".to_string(),
            request_timeout_secs: 30,
        }
    }
}

impl JPushConfig {
    pub fn new(app_key: impl Into<String>, master_secret: impl Into<String>) -> Self {
        Self {
            app_key: app_key.into(),
            master_secret: master_secret.into(),
            ..Default::default()
        }
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }
}

/// 状态追踪配置
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TrackingConfig {
    /// 轮询间隔（秒），小于 1 时使用默认值
    pub poll_interval_secs: i64,
    /// 是否启动后台追踪
    pub enabled: bool,
    /// 启动时需要继续追踪的消息ID
    #[serde(default)]
    pub message_ids: Vec<String>,
}

impl Default for TrackingConfig {
    fn default() -> Self {
        Self {
            poll_interval_secs: DEFAULT_POLL_INTERVAL_SECS,
            enabled: true,
            message_ids: Vec::new(),
        }
    }
}

impl TrackingConfig {
    pub fn poll_interval(&self) -> Duration {
        normalize_poll_interval(self.poll_interval_secs)
    }
}

/// 小于 1 秒的间隔回退到默认值
pub fn normalize_poll_interval(secs: i64) -> Duration {
    let secs = if secs < 1 {
        DEFAULT_POLL_INTERVAL_SECS
    } else {
        secs
    };
    Duration::from_secs(secs.unsigned_abs())
}

impl PushConfig {
    /// 从默认配置文件和环境变量加载
    pub fn load() -> Result<Self, ConfigError> {
        let path = std::env::var(CONFIG_PATH_ENV)
            .map(PathBuf::from)
            .unwrap_or_else(|_| PathBuf::from(DEFAULT_CONFIG_FILE));
        Self::load_from(path)
    }

    /// 从指定文件和环境变量加载；文件不存在时忽略
    pub fn load_from(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        Self::figment(path.as_ref())
            .extract()
            .map_err(|e| ConfigError::Load(Box::new(e)))
    }

    fn figment(path: &Path) -> Figment {
        Figment::from(Serialized::defaults(PushConfig::default()))
            .merge(Yaml::file(path))
            .merge(Env::prefixed(ENV_PREFIX).split("__"))
    }

    /// 验证配置有效性
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.jpush.app_key.trim().is_empty() {
            return Err(ConfigError::MissingCredential("app_key"));
        }
        if self.jpush.master_secret.trim().is_empty() {
            return Err(ConfigError::MissingCredential("master_secret"));
        }
        if self.jpush.request_timeout_secs == 0 {
            return Err(ConfigError::Invalid(
                "request timeout must be greater than 0".to_string(),
            ));
        }
        Ok(())
    }
}

/// 配置错误类型
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Failed to load configuration: {0}")]
    Load(Box<figment::Error>),
    #[error("Missing credential: {0}")]
    MissingCredential(&'static str),
    #[error("Invalid configuration: {0}")]
    Invalid(String),
}

#[cfg(test)]
mod tests {
    use super::*;
    use figment::Jail;

    #[test]
    fn test_defaults() {
        let config = PushConfig::default();
        assert_eq!(config.jpush.api_base_url, "https://api.jpush.cn/v3/");
        assert_eq!(config.jpush.report_base_url, "https://report.jpush.cn/v2/");
        assert_eq!(config.tracking.poll_interval(), Duration::from_secs(60));
        assert!(config.tracking.enabled);
    }

    #[test]
    fn test_poll_interval_coercion() {
        assert_eq!(normalize_poll_interval(0), Duration::from_secs(60));
        assert_eq!(normalize_poll_interval(-5), Duration::from_secs(60));
        assert_eq!(normalize_poll_interval(1), Duration::from_secs(1));
        assert_eq!(normalize_poll_interval(15), Duration::from_secs(15));
    }

    #[test]
    fn test_validation() {
        let mut config = PushConfig::default();
        assert!(matches!(
            config.validate(),
            Err(ConfigError::MissingCredential("app_key"))
        ));

        config.jpush = JPushConfig::new("app", "  ");
        assert!(matches!(
            config.validate(),
            Err(ConfigError::MissingCredential("master_secret"))
        ));

        config.jpush = JPushConfig::new("app", "secret");
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_load_from_file_and_env() {
        Jail::expect_with(|jail| {
            jail.create_file(
                "push.yaml",
                r#"
jpush:
  app_key: file-key
  master_secret: file-secret
tracking:
  poll_interval_secs: 30
  message_ids:
    - "1001"
    - "1002"
"#,
            )?;
            jail.set_env("JPUSH_JPUSH__APP_KEY", "env-key");
            jail.set_env("JPUSH_TRACKING__ENABLED", "false");

            let config = PushConfig::load_from("push.yaml").expect("config should load");
            assert_eq!(config.jpush.app_key, "env-key");
            assert_eq!(config.jpush.master_secret, "file-secret");
            assert_eq!(config.jpush.request_timeout_secs, 30);
            assert_eq!(config.tracking.poll_interval_secs, 30);
            assert!(!config.tracking.enabled);
            assert_eq!(config.tracking.message_ids, vec!["1001", "1002"]);
            Ok(())
        });
    }

    #[test]
    fn test_missing_file_uses_defaults() {
        Jail::expect_with(|_jail| {
            let config = PushConfig::load_from("absent.yaml").expect("config should load");
            assert_eq!(config.tracking.poll_interval_secs, DEFAULT_POLL_INTERVAL_SECS);
            assert!(config.jpush.app_key.is_empty());
            assert!(config.tracking.message_ids.is_empty());
            Ok(())
        });
    }
}
