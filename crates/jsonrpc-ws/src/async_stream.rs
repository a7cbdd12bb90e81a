/// 异步对象流
///
/// 与 `ObjectStream` 的帧格式和错误翻译完全一致，
/// 底层是任意 WebSocket 消息的 Sink + Stream（通常是 `tokio_tungstenite::WebSocketStream`）。

use crate::connection::{frame_from_message, message_from_frame, ConnectionError, Frame};
use crate::errors::{Error, Result};
use crate::header;
use futures_util::{Sink, SinkExt, Stream, StreamExt};
use serde::{de::DeserializeOwned, Serialize};
use tokio_tungstenite::tungstenite::{Error as WsError, Message};
use tracing::trace;

/// 基于 WebSocket 消息流的 JSON 对象流
pub struct AsyncObjectStream<S> {
    inner: S,
}

impl<S> AsyncObjectStream<S>
where
    S: Stream<Item = std::result::Result<Message, WsError>> + Sink<Message, Error = WsError> + Unpin,
{
    pub fn new(inner: S) -> Self {
        Self { inner }
    }

    /// 序列化并发送一个对象（头帧 + 数据帧）
    pub async fn write_object<T: Serialize + ?Sized>(&mut self, value: &T) -> Result<()> {
        let payload = serde_json::to_string(value).map_err(Error::Serialization)?;
        trace!(len = payload.len(), "写入对象");

        // 头帧只入队，数据帧发送时一并 flush
        self.inner
            .feed(message_from_frame(Frame::Text(header::encode(payload.len()))))
            .await
            .map_err(ConnectionError::from)?;
        self.inner
            .send(message_from_frame(Frame::Text(payload)))
            .await
            .map_err(ConnectionError::from)?;
        Ok(())
    }

    /// 读取并反序列化一个对象
    pub async fn read_object<T: DeserializeOwned>(&mut self) -> Result<T> {
        let head = self.receive_frame().await.map_err(Error::from_read)?;
        if !header::is_header(head.as_bytes()) {
            trace!(len = head.len(), "首帧缺少 Content-Length 头");
            return Err(Error::Protocol("invalid state".to_string()));
        }

        let payload = self.receive_frame().await.map_err(Error::from_read)?;
        if header::content_length(head.as_bytes()) != Some(payload.len()) {
            trace!(len = payload.len(), "Content-Length 与数据帧长度不一致");
        }

        serde_json::from_slice(payload.as_bytes()).map_err(Error::Deserialization)
    }

    /// 关闭底层连接
    pub async fn close(&mut self) -> Result<()> {
        SinkExt::close(&mut self.inner)
            .await
            .map_err(ConnectionError::from)?;
        Ok(())
    }

    pub fn get_ref(&self) -> &S {
        &self.inner
    }

    pub fn get_mut(&mut self) -> &mut S {
        &mut self.inner
    }

    pub fn into_inner(self) -> S {
        self.inner
    }

    async fn receive_frame(&mut self) -> std::result::Result<Frame, ConnectionError> {
        loop {
            match self.inner.next().await {
                Some(Ok(msg)) => {
                    if let Some(frame) = frame_from_message(msg)? {
                        trace!(frame_type = ?frame.frame_type(), len = frame.len(), "收到帧");
                        return Ok(frame);
                    }
                }
                Some(Err(err)) => return Err(err.into()),
                None => return Err(ConnectionError::Closed),
            }
        }
    }
}
