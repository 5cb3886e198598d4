//! 主应用程序入口
//!
//! 加载推送配置，启动送达状态追踪，直到收到 Ctrl-C。

use std::sync::Arc;

use application::{PushGateway, PushHandler, TrackingHooks};
use config::PushConfig;
use domain::MessageStatus;
use infrastructure::JPushClient;
use tracing_subscriber::EnvFilter;

/// 以配置中的消息ID作为初始追踪集合，其余回调只记录日志
fn logging_hooks(seed_ids: Vec<String>) -> TrackingHooks {
    TrackingHooks::new()
        .on_initialize(move || Ok(seed_ids.clone()))
        .on_send(|request, response| {
            tracing::info!(
                message_id = %response.message_id,
                platform = ?request.platform,
                "推送已发送"
            );
            Ok(())
        })
        .on_status_update(|statuses: Vec<MessageStatus>| {
            for status in &statuses {
                tracing::info!(
                    message_id = %status.message_id,
                    android_received = ?status.android_received,
                    ios_apns_sent = ?status.ios_apns_sent,
                    ios_msg_received = ?status.ios_msg_received,
                    wp_mpns_sent = ?status.wp_mpns_sent,
                    "送达状态"
                );
            }
            Ok(())
        })
        .on_error(|error| tracing::error!(error = %error, "推送追踪出错"))
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // 初始化日志
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    let config = PushConfig::load()?;
    config.validate()?;

    tracing::info!(
        api = %config.jpush.api_base_url,
        report = %config.jpush.report_base_url,
        "推送网关配置已加载"
    );

    let gateway: Arc<dyn PushGateway> = Arc::new(JPushClient::new(&config.jpush)?);
    let hooks = logging_hooks(config.tracking.message_ids.clone());
    let handler = PushHandler::new(gateway, hooks, config.tracking.poll_interval_secs);

    if config.tracking.enabled {
        handler.start();
        tracing::info!(
            interval_secs = handler.tracker().poll_interval().as_secs(),
            tracked = handler.tracker().len(),
            "送达状态追踪已启动"
        );
    } else {
        tracing::warn!("送达状态追踪已禁用");
    }

    tokio::signal::ctrl_c().await?;
    tracing::info!("收到退出信号，正在停止");

    handler.stop().await;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_hooks_seed_configured_ids() {
        let hooks = logging_hooks(vec!["1001".to_string(), "1002".to_string()]);
        let initialize = hooks.on_initialize.expect("initialize hook configured");

        assert_eq!(initialize().unwrap(), vec!["1001", "1002"]);
        assert!(hooks.on_status_update.is_some());
        assert!(hooks.on_error.is_some());
    }
}
