/// JSON-RPC 2.0 消息定义

use super::RpcError;
use serde::{de, Deserialize, Deserializer, Serialize};
use serde_json::Value;
use std::fmt;

/// 协议版本
pub const JSONRPC_VERSION: &str = "2.0";

/// 请求 ID（数字或字符串）
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Id {
    Num(i64),
    Str(String),
}

impl fmt::Display for Id {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Num(n) => write!(f, "{}", n),
            Self::Str(s) => write!(f, "{:?}", s),
        }
    }
}

impl From<i64> for Id {
    fn from(n: i64) -> Self {
        Self::Num(n)
    }
}

impl From<i32> for Id {
    fn from(n: i32) -> Self {
        Self::Num(n.into())
    }
}

impl From<&str> for Id {
    fn from(s: &str) -> Self {
        Self::Str(s.to_string())
    }
}

/// 请求消息（期望响应）
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Request {
    pub jsonrpc: String,
    pub id: Id,
    pub method: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub params: Option<serde_json::Value>,
}

/// 通知消息（不需要响应）
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Notification {
    pub jsonrpc: String,
    pub method: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub params: Option<serde_json::Value>,
}

/// 响应消息
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Response {
    pub jsonrpc: String,
    /// 无法确定请求 ID 时为 null
    pub id: Option<Id>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub result: Option<serde_json::Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<ErrorObject>,
}

/// 响应中的错误对象
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ErrorObject {
    pub code: i64,
    pub message: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data: Option<serde_json::Value>,
}

/// 任意一条 JSON-RPC 消息
///
/// 解码按字段是否存在区分：有 `method` 和 `id` 的是请求，只有 `method` 的是通知，
/// 恰有 `result` 或 `error` 之一的是响应。
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum Message {
    Request(Request),
    Notification(Notification),
    Response(Response),
}

impl Request {
    pub fn new(id: impl Into<Id>, method: impl Into<String>, params: Option<serde_json::Value>) -> Self {
        Self {
            jsonrpc: JSONRPC_VERSION.to_string(),
            id: id.into(),
            method: method.into(),
            params,
        }
    }
}

impl Notification {
    pub fn new(method: impl Into<String>, params: Option<serde_json::Value>) -> Self {
        Self {
            jsonrpc: JSONRPC_VERSION.to_string(),
            method: method.into(),
            params,
        }
    }
}

impl Response {
    /// 创建成功响应
    pub fn success(id: Id, result: serde_json::Value) -> Self {
        Self {
            jsonrpc: JSONRPC_VERSION.to_string(),
            id: Some(id),
            result: Some(result),
            error: None,
        }
    }

    /// 创建错误响应
    pub fn error(id: Option<Id>, err: RpcError) -> Self {
        Self {
            jsonrpc: JSONRPC_VERSION.to_string(),
            id,
            result: None,
            error: Some(err.into()),
        }
    }

    /// 判断是否是成功响应
    pub fn is_success(&self) -> bool {
        self.error.is_none()
    }

    /// 判断是否是错误响应
    pub fn is_error(&self) -> bool {
        self.error.is_some()
    }

    /// 转换为结果值或 RPC 错误
    pub fn into_result(self) -> Result<serde_json::Value, RpcError> {
        match self.error {
            Some(err) => Err(err.into()),
            None => Ok(self.result.unwrap_or(serde_json::Value::Null)),
        }
    }
}

impl Message {
    /// 从 JSON 值解码，不合法时返回 InvalidRequest
    pub fn from_value(value: Value) -> Result<Self, RpcError> {
        let obj = value
            .as_object()
            .ok_or_else(|| RpcError::invalid_request("消息必须是 JSON 对象"))?;
        if obj.get("jsonrpc").and_then(Value::as_str) != Some(JSONRPC_VERSION) {
            return Err(RpcError::invalid_request("jsonrpc 必须为 \"2.0\""));
        }

        let has_method = obj.contains_key("method");
        let has_id = obj.contains_key("id");
        let has_result = obj.contains_key("result");
        let has_error = obj.contains_key("error");

        let decoded = match (has_method, has_id) {
            (true, true) => serde_json::from_value(value).map(Self::Request),
            (true, false) => serde_json::from_value(value).map(Self::Notification),
            _ if has_result != has_error => serde_json::from_value(value).map(Self::Response),
            _ => return Err(RpcError::invalid_request("无法识别的消息")),
        };
        decoded.map_err(|err| RpcError::invalid_request(err.to_string()))
    }

    /// 尽力从原始 JSON 中读出请求 ID
    pub fn peek_id(value: &Value) -> Option<Id> {
        value
            .get("id")
            .and_then(|id| Id::deserialize(id).ok())
    }

    /// 消息的方法名（仅请求和通知）
    pub fn method(&self) -> Option<&str> {
        match self {
            Self::Request(r) => Some(&r.method),
            Self::Notification(n) => Some(&n.method),
            Self::Response(_) => None,
        }
    }
}

impl<'de> Deserialize<'de> for Message {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let value = Value::deserialize(deserializer)?;
        Self::from_value(value).map_err(|err| de::Error::custom(err.message))
    }
}

impl From<Request> for Message {
    fn from(r: Request) -> Self {
        Self::Request(r)
    }
}

impl From<Notification> for Message {
    fn from(n: Notification) -> Self {
        Self::Notification(n)
    }
}

impl From<Response> for Message {
    fn from(r: Response) -> Self {
        Self::Response(r)
    }
}
