//! 推送网关 HTTP 客户端
//!
//! 实现应用层的 [`PushGateway`]：`push` 接口发送推送，`received` 报表接口查询送达状态。

use application::PushGateway;
use async_trait::async_trait;
use chrono::{DateTime, TimeZone, Utc};
use config::JPushConfig;
use data_encoding::BASE64;
use domain::{
    MessageStatus, PushError, PushRequest, PushResponse, ResponseCode, MAX_STATUS_QUERY_BATCH,
};
use reqwest::header::AUTHORIZATION;
use reqwest::StatusCode;
use serde::Deserialize;
use serde_json::Value;
use tracing::{debug, warn};

/// 错误响应正文在日志和错误中保留的最大长度
const MAX_ERROR_BODY_LEN: usize = 256;

#[derive(Debug, Deserialize)]
struct RawErrorNode {
    code: i64,
    #[serde(default)]
    message: Option<String>,
}

#[derive(Debug, Deserialize)]
struct RawPushResponse {
    #[serde(default)]
    sendno: Option<Value>,
    #[serde(default)]
    msg_id: Option<Value>,
    #[serde(default)]
    error: Option<RawErrorNode>,
}

/// 推送网关客户端
#[derive(Debug, Clone)]
pub struct JPushClient {
    http: reqwest::Client,
    authorization: String,
    push_url: String,
    report_url: String,
    is_test_environment: Option<bool>,
}

impl JPushClient {
    pub fn new(config: &JPushConfig) -> Result<Self, PushError> {
        let http = reqwest::Client::builder()
            .timeout(config.request_timeout())
            .build()
            .map_err(|e| PushError::transport(e.to_string()))?;

        Ok(Self {
            http,
            authorization: basic_authorization(&config.app_key, &config.master_secret),
            push_url: endpoint(&config.api_base_url, "push"),
            report_url: endpoint(&config.report_base_url, "received"),
            is_test_environment: config.is_test_environment,
        })
    }

    async fn read_body(response: reqwest::Response) -> Result<(StatusCode, String), PushError> {
        let status = response.status();
        let body = response
            .text()
            .await
            .map_err(|e| PushError::transport(e.to_string()))?;
        Ok((status, body))
    }
}

#[async_trait]
impl PushGateway for JPushClient {
    async fn send(&self, request: &PushRequest) -> Result<PushResponse, PushError> {
        let send_no = send_number(Utc::now());
        let payload = request.to_payload(send_no, self.is_test_environment)?;

        let response = self
            .http
            .post(&self.push_url)
            .header(AUTHORIZATION, &self.authorization)
            .json(&payload)
            .send()
            .await
            .map_err(|e| PushError::transport(e.to_string()))?;
        let (status, body) = Self::read_body(response).await?;

        if !status.is_success() {
            let error = gateway_error(status.as_u16(), &body);
            warn!(status = status.as_u16(), error = %error, "Push request rejected");
            return Err(error);
        }

        let response = parse_push_response(&body)?;
        debug!(
            message_id = %response.message_id,
            send_no,
            code = %response.code,
            "Push request accepted"
        );
        Ok(response)
    }

    async fn query_status(&self, message_ids: &[String]) -> Result<Vec<MessageStatus>, PushError> {
        if message_ids.is_empty() {
            return Ok(Vec::new());
        }
        if message_ids.len() > MAX_STATUS_QUERY_BATCH {
            return Err(PushError::invalid_request(format!(
                "at most {MAX_STATUS_QUERY_BATCH} message ids per status query, got {}",
                message_ids.len()
            )));
        }

        let response = self
            .http
            .get(&self.report_url)
            .header(AUTHORIZATION, &self.authorization)
            .query(&[("msg_ids", message_ids.join(","))])
            .send()
            .await
            .map_err(|e| PushError::transport(e.to_string()))?;
        let (status, body) = Self::read_body(response).await?;

        if !status.is_success() {
            return Err(gateway_error(status.as_u16(), &body));
        }

        let statuses: Vec<MessageStatus> = serde_json::from_str(&body)
            .map_err(|e| PushError::malformed(format!("status report: {e}")))?;
        debug!(
            requested = message_ids.len(),
            received = statuses.len(),
            "Status report fetched"
        );
        Ok(statuses)
    }
}

/// `Basic base64(app_key:master_secret)`
pub fn basic_authorization(app_key: &str, master_secret: &str) -> String {
    let token = BASE64.encode(format!("{app_key}:{master_secret}").as_bytes());
    format!("Basic {token}")
}

/// 发送编号：自 2014-01-01 起的毫秒数对 `i32::MAX` 取模
pub fn send_number(now: DateTime<Utc>) -> i64 {
    let epoch = Utc
        .with_ymd_and_hms(2014, 1, 1, 0, 0, 0)
        .single()
        .unwrap_or_default();
    (now - epoch).num_milliseconds().rem_euclid(i64::from(i32::MAX))
}

fn endpoint(base: &str, path: &str) -> String {
    format!("{}/{path}", base.trim_end_matches('/'))
}

fn value_to_string(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

fn parse_push_response(body: &str) -> Result<PushResponse, PushError> {
    let raw: RawPushResponse = serde_json::from_str(body)
        .map_err(|e| PushError::malformed(format!("push response: {e}")))?;

    let message_id = raw
        .msg_id
        .as_ref()
        .and_then(value_to_string)
        .unwrap_or_default();
    let send_no = raw.sendno.as_ref().and_then(value_to_string);

    Ok(match raw.error {
        None => PushResponse {
            send_no,
            message_id,
            code: ResponseCode::Succeed,
            message: None,
        },
        Some(error) => PushResponse {
            send_no,
            message_id,
            code: ResponseCode::from_code(error.code),
            message: error.message,
        },
    })
}

fn gateway_error(status: u16, body: &str) -> PushError {
    match serde_json::from_str::<RawPushResponse>(body) {
        Ok(RawPushResponse {
            error: Some(error),
            msg_id,
            ..
        }) => PushError::from_gateway(
            status,
            ResponseCode::from_code(error.code),
            error.message.unwrap_or_default(),
            msg_id.as_ref().and_then(value_to_string),
        ),
        _ => PushError::Gateway {
            status,
            code: ResponseCode::ServiceError,
            message: truncate(body, MAX_ERROR_BODY_LEN),
            message_id: None,
        },
    }
}

fn truncate(text: &str, max: usize) -> String {
    match text.char_indices().nth(max) {
        Some((index, _)) => text[..index].to_string(),
        None => text.to_string(),
    }
}
