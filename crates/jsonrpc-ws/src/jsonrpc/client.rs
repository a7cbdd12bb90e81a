/// 阻塞式 JSON-RPC 客户端

use super::{Id, Message, Notification, Request, Response};
use crate::connection::FrameConnection;
use crate::errors::{Error, Result};
use crate::stream::ObjectStream;
use serde::{de::DeserializeOwned, Serialize};
use tracing::debug;

/// 基于对象流的 RPC 客户端
///
/// 一次只有一个进行中的调用；等待响应期间收到的通知与不匹配的响应会被丢弃，
/// id 为 null 的错误响应视为本次调用失败。
pub struct RpcClient<C> {
    stream: ObjectStream<C>,
    next_id: i64,
}

impl<C: FrameConnection> RpcClient<C> {
    pub fn new(conn: C) -> Self {
        Self::from_stream(ObjectStream::new(conn))
    }

    pub fn from_stream(stream: ObjectStream<C>) -> Self {
        Self { stream, next_id: 1 }
    }

    /// 发送请求并等待响应
    pub fn call<P, R>(&mut self, method: &str, params: Option<P>) -> Result<R>
    where
        P: Serialize,
        R: DeserializeOwned,
    {
        let params = params
            .map(serde_json::to_value)
            .transpose()
            .map_err(Error::Serialization)?;

        let id = Id::Num(self.next_id);
        self.next_id += 1;

        let request = Request::new(id.clone(), method, params);
        self.stream.write_object(&request)?;
        debug!("已发送请求: method={}, id={}", method, id);

        loop {
            match self.stream.read_object::<Message>()? {
                Message::Response(resp) if resp.id.as_ref() == Some(&id) => {
                    let result = resp.into_result()?;
                    return serde_json::from_value(result).map_err(Error::Deserialization);
                }
                // 对端无法解析请求时以 null id 回错
                Message::Response(Response { id: None, error: Some(err), .. }) => {
                    return Err(Error::Rpc(err.into()));
                }
                Message::Response(resp) => {
                    debug!("收到未预期的响应消息: id={:?}", resp.id);
                }
                other => {
                    debug!("等待响应时忽略消息: method={:?}", other.method());
                }
            }
        }
    }

    /// 发送通知（不等待响应）
    pub fn notify<P: Serialize>(&mut self, method: &str, params: Option<P>) -> Result<()> {
        let params = params
            .map(serde_json::to_value)
            .transpose()
            .map_err(Error::Serialization)?;
        self.stream.write_object(&Notification::new(method, params))
    }

    /// 关闭连接
    pub fn close(&mut self) -> Result<()> {
        self.stream.close()
    }

    pub fn into_stream(self) -> ObjectStream<C> {
        self.stream
    }
}
