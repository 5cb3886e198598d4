//! 平台与受众的网关报文编码
//!
//! 纯函数，不产生错误：无法编码的输入得到空结果。

use serde_json::{Map, Value};

use crate::audience::Audience;
use crate::platform::Platform;

/// 表示"全部"的报文取值
pub const ALL_TOKEN: &str = "all";

/// 编码推送平台
///
/// `All` 编码为 `"all"`，否则按 Android、iOS、WindowsPhone 的顺序输出小写平台名数组。
pub fn encode_platform(platform: &Platform) -> Value {
    match platform {
        Platform::All => Value::String(ALL_TOKEN.to_string()),
        Platform::Specific(set) => Value::Array(
            set.iter()
                .map(|flag| Value::String(flag.wire_name().to_string()))
                .collect(),
        ),
    }
}

/// 编码推送受众
///
/// 广播编码为 `"all"`，定向推送编码为 `{key: [targets]}`。
pub fn encode_audience(audience: &Audience) -> Value {
    match audience.wire_key() {
        None => Value::String(ALL_TOKEN.to_string()),
        Some(key) => {
            let targets = audience
                .targets()
                .iter()
                .cloned()
                .map(Value::String)
                .collect();
            let mut object = Map::new();
            object.insert(key.to_string(), Value::Array(targets));
            Value::Object(object)
        }
    }
}

/// 受众缺省时不输出该字段
pub fn encode_optional_audience(audience: Option<&Audience>) -> Option<Value> {
    audience.map(encode_audience)
}
