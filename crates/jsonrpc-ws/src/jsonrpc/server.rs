/// JSON-RPC 服务端辅助工具

use super::{Message, Notification, Request, Response, RpcError};
use crate::async_stream::AsyncObjectStream;
use crate::errors::{Error, Result};
use futures_util::{Sink, Stream};
use std::collections::HashMap;
use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;
use tokio::sync::RwLock;
use tokio_tungstenite::tungstenite::{Error as WsError, Message as WsMessage};
use tracing::debug;

/// RPC 方法处理器类型
pub type RpcHandler = Arc<
    dyn Fn(serde_json::Value) -> std::result::Result<serde_json::Value, RpcError> + Send + Sync
>;

/// 异步 RPC 方法处理器类型
pub type AsyncRpcHandler = Arc<
    dyn Fn(serde_json::Value) -> Pin<Box<dyn Future<Output = std::result::Result<serde_json::Value, RpcError>> + Send>> + Send + Sync
>;

/// RPC 方法路由器
pub struct RpcRouter {
    /// 同步方法处理器
    handlers: Arc<RwLock<HashMap<String, RpcHandler>>>,

    /// 异步方法处理器
    async_handlers: Arc<RwLock<HashMap<String, AsyncRpcHandler>>>,
}

impl RpcRouter {
    /// 创建新的路由器
    pub fn new() -> Self {
        Self {
            handlers: Arc::new(RwLock::new(HashMap::new())),
            async_handlers: Arc::new(RwLock::new(HashMap::new())),
        }
    }

    /// 注册同步方法处理器
    pub async fn register<F>(&self, method: impl Into<String>, handler: F)
    where
        F: Fn(serde_json::Value) -> std::result::Result<serde_json::Value, RpcError> + Send + Sync + 'static,
    {
        let mut handlers = self.handlers.write().await;
        handlers.insert(method.into(), Arc::new(handler));
    }

    /// 注册异步方法处理器
    pub async fn register_async<F, Fut>(&self, method: impl Into<String>, handler: F)
    where
        F: Fn(serde_json::Value) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = std::result::Result<serde_json::Value, RpcError>> + Send + 'static,
    {
        let mut handlers = self.async_handlers.write().await;
        let handler = Arc::new(move |params: serde_json::Value| {
            Box::pin(handler(params))
                as Pin<Box<dyn Future<Output = std::result::Result<serde_json::Value, RpcError>> + Send>>
        });
        handlers.insert(method.into(), handler);
    }

    /// 调用方法，方法不存在时返回 None
    async fn dispatch(
        &self,
        method: &str,
        params: serde_json::Value,
    ) -> Option<std::result::Result<serde_json::Value, RpcError>> {
        // 先尝试异步处理器
        let handler = self.async_handlers.read().await.get(method).cloned();
        if let Some(handler) = handler {
            return Some(handler(params).await);
        }

        // 再尝试同步处理器
        let handler = self.handlers.read().await.get(method).cloned();
        handler.map(|handler| handler(params))
    }

    /// 处理 RPC 请求
    pub async fn handle_request(&self, req: Request) -> Response {
        debug!("📨 [收到RPC请求] method={}, id={}", req.method, req.id);
        let params = req.params.unwrap_or(serde_json::Value::Null);

        let outcome = self.dispatch(&req.method, params).await;
        match outcome {
            Some(Ok(result)) => {
                debug!("✅ [RPC处理成功] method={}, id={}", req.method, req.id);
                Response::success(req.id, result)
            }
            Some(Err(err)) => {
                debug!(
                    "❌ [RPC处理失败] method={}, id={}, code={}, error={}",
                    req.method, req.id, err.code, err.message
                );
                Response::error(Some(req.id), err)
            }
            None => Response::error(Some(req.id), RpcError::method_not_found(req.method)),
        }
    }

    /// 处理通知（不产生响应）
    pub async fn handle_notification(&self, notification: Notification) {
        debug!("📨 [收到通知] method={}", notification.method);
        let params = notification.params.unwrap_or(serde_json::Value::Null);

        match self.dispatch(&notification.method, params).await {
            Some(Ok(_)) => {}
            Some(Err(err)) => debug!("通知处理失败: method={}, error={}", notification.method, err),
            None => debug!("通知方法未注册: {}", notification.method),
        }
    }

    /// 获取已注册的方法列表
    pub async fn list_methods(&self) -> Vec<String> {
        let mut methods = Vec::new();

        let handlers = self.handlers.read().await;
        methods.extend(handlers.keys().cloned());

        let async_handlers = self.async_handlers.read().await;
        methods.extend(async_handlers.keys().cloned());

        methods.sort();
        methods.dedup();
        methods
    }
}

impl Default for RpcRouter {
    fn default() -> Self {
        Self::new()
    }
}

impl Clone for RpcRouter {
    fn clone(&self) -> Self {
        Self {
            handlers: self.handlers.clone(),
            async_handlers: self.async_handlers.clone(),
        }
    }
}

/// 在一条对象流上提供 RPC 服务，直到对端结束连接
///
/// 请求按到达顺序逐个处理，响应按同样顺序写回。
pub async fn serve<S>(stream: &mut AsyncObjectStream<S>, router: &RpcRouter) -> Result<()>
where
    S: Stream<Item = std::result::Result<WsMessage, WsError>> + Sink<WsMessage, Error = WsError> + Unpin,
{
    loop {
        let value: serde_json::Value = match stream.read_object().await {
            Ok(value) => value,
            Err(err) if err.is_end_of_stream() => {
                debug!("对端已结束连接: {}", err);
                return Ok(());
            }
            Err(Error::Deserialization(err)) => {
                let resp = Response::error(None, RpcError::parse_error(err.to_string()));
                stream.write_object(&resp).await?;
                continue;
            }
            Err(err) => return Err(err),
        };

        let id = Message::peek_id(&value);
        let msg = match Message::from_value(value) {
            Ok(msg) => msg,
            Err(err) => {
                debug!("无效的 RPC 消息: id={:?}, error={}", id, err);
                stream.write_object(&Response::error(id, err)).await?;
                continue;
            }
        };

        match msg {
            Message::Request(req) => {
                let resp = router.handle_request(req).await;
                stream.write_object(&resp).await?;
            }
            Message::Notification(notification) => router.handle_notification(notification).await,
            Message::Response(resp) => debug!("忽略未预期的响应消息: id={:?}", resp.id),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::header;
    use crate::jsonrpc::{Id, RpcErrorCode};
    use futures_util::SinkExt;
    use serde_json::json;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use tokio_tungstenite::tungstenite::protocol::Role;
    use tokio_tungstenite::WebSocketStream;

    #[tokio::test]
    async fn test_sync_handler() {
        let router = RpcRouter::new();

        router.register("test", |params| {
            Ok(json!({"echo": params}))
        }).await;

        let req = Request::new(1, "test", Some(json!({"hello": "world"})));
        let resp = router.handle_request(req).await;

        assert!(resp.is_success());
        assert_eq!(resp.id, Some(Id::Num(1)));
        assert_eq!(resp.result.unwrap()["echo"]["hello"], "world");
    }

    #[tokio::test]
    async fn test_async_handler() {
        let router = RpcRouter::new();

        router.register_async("async_test", |params| async move {
            tokio::time::sleep(std::time::Duration::from_millis(10)).await;
            Ok(json!({"processed": params}))
        }).await;

        let req = Request::new("abc", "async_test", Some(json!({"data": 123})));
        let resp = router.handle_request(req).await;

        assert!(resp.is_success());
        assert_eq!(resp.result.unwrap()["processed"]["data"], 123);
    }

    #[tokio::test]
    async fn test_handler_error() {
        let router = RpcRouter::new();
        router.register("fail", |_| Err(RpcError::invalid_params("缺少参数"))).await;

        let resp = router.handle_request(Request::new(5, "fail", None)).await;
        let err = resp.into_result().unwrap_err();
        assert_eq!(err.code, RpcErrorCode::InvalidParams);
        assert_eq!(err.message, "缺少参数");
    }

    #[tokio::test]
    async fn test_method_not_found() {
        let router = RpcRouter::new();
        let resp = router.handle_request(Request::new(1, "unknown", None)).await;

        assert!(resp.is_error());
        assert_eq!(resp.error.unwrap().code, RpcErrorCode::MethodNotFound.code());
    }

    #[tokio::test]
    async fn test_notification_runs_handler() {
        let router = RpcRouter::new();
        let count = Arc::new(AtomicUsize::new(0));
        let counter = count.clone();
        router.register("tick", move |_| {
            counter.fetch_add(1, Ordering::SeqCst);
            Ok(serde_json::Value::Null)
        }).await;

        router.handle_notification(Notification::new("tick", None)).await;
        router.handle_notification(Notification::new("missing", None)).await;
        assert_eq!(count.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_list_methods() {
        let router = RpcRouter::new();
        router.register("b", |_| Ok(json!(null))).await;
        router.register_async("a", |_| async { Ok(json!(null)) }).await;
        assert_eq!(router.list_methods().await, vec!["a".to_string(), "b".to_string()]);
    }

    #[tokio::test]
    async fn test_serve_connection() {
        let (a, b) = tokio::io::duplex(64 * 1024);
        let client = WebSocketStream::from_raw_socket(a, Role::Client, None).await;
        let server = WebSocketStream::from_raw_socket(b, Role::Server, None).await;

        let router = RpcRouter::new();
        router.register("ping", |_| Ok(json!("pong"))).await;

        let task = tokio::spawn(async move {
            let mut server = AsyncObjectStream::new(server);
            serve(&mut server, &router).await
        });

        let mut client = AsyncObjectStream::new(client);

        client.write_object(&Request::new(1, "ping", None)).await.unwrap();
        let resp: Response = client.read_object().await.unwrap();
        assert_eq!(resp.id, Some(Id::Num(1)));
        assert_eq!(resp.into_result().unwrap(), json!("pong"));

        // 通知没有响应
        client.write_object(&Notification::new("ping", None)).await.unwrap();

        // 不是 JSON-RPC 消息
        client.write_object(&json!({"foo": 1})).await.unwrap();
        let resp: Response = client.read_object().await.unwrap();
        assert_eq!(resp.id, None);
        assert_eq!(resp.error.unwrap().code, RpcErrorCode::InvalidRequest.code());

        // 数据帧不是 JSON
        let raw = client.get_mut();
        raw.send(WsMessage::Text(header::encode(5))).await.unwrap();
        raw.send(WsMessage::Text("{oops".to_string())).await.unwrap();
        let resp: Response = client.read_object().await.unwrap();
        assert_eq!(resp.error.unwrap().code, RpcErrorCode::ParseError.code());

        // method 类型错误：能读出 id 时原样带回
        client
            .write_object(&json!({"jsonrpc": "2.0", "id": 1, "method": 5}))
            .await
            .unwrap();
        let resp: Response = client.read_object().await.unwrap();
        assert_eq!(resp.id, Some(Id::Num(1)));
        assert_eq!(resp.error.unwrap().code, RpcErrorCode::InvalidRequest.code());

        // 非整数 id 不能当作通知静默处理
        client
            .write_object(&json!({"jsonrpc": "2.0", "id": 1.5, "method": "ping"}))
            .await
            .unwrap();
        let resp: Response = client.read_object().await.unwrap();
        assert_eq!(resp.id, None);
        assert_eq!(resp.error.unwrap().code, RpcErrorCode::InvalidRequest.code());

        client.write_object(&Request::new(2, "missing", None)).await.unwrap();
        let resp: Response = client.read_object().await.unwrap();
        assert_eq!(resp.id, Some(Id::Num(2)));
        assert_eq!(resp.error.unwrap().code, RpcErrorCode::MethodNotFound.code());

        drop(client);
        task.await.unwrap().unwrap();
    }
}
