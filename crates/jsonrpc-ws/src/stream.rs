/// 阻塞式对象流
///
/// 在调用线程上同步完成读写，不创建线程、不缓冲、不加锁。
/// 多个写者并发时需要调用方自行串行化 `write_object`，
/// 以保证头帧与数据帧成对、按序发送。

use crate::connection::{Frame, FrameConnection};
use crate::errors::{Error, Result};
use crate::header;
use serde::{de::DeserializeOwned, Serialize};
use tracing::trace;

/// 基于帧连接的 JSON 对象流
pub struct ObjectStream<C> {
    conn: C,
}

impl<C: FrameConnection> ObjectStream<C> {
    /// 包装一条已建立的连接
    pub fn new(conn: C) -> Self {
        Self { conn }
    }

    /// 序列化并发送一个对象（头帧 + 数据帧）
    pub fn write_object<T: Serialize + ?Sized>(&mut self, value: &T) -> Result<()> {
        let payload = serde_json::to_string(value).map_err(Error::Serialization)?;
        trace!(len = payload.len(), "写入对象");

        self.conn.send_frame(Frame::Text(header::encode(payload.len())))?;
        self.conn.send_frame(Frame::Text(payload))?;
        Ok(())
    }

    /// 读取并反序列化一个对象
    pub fn read_object<T: DeserializeOwned>(&mut self) -> Result<T> {
        let head = self.conn.receive_frame().map_err(Error::from_read)?;
        if !header::is_header(head.as_bytes()) {
            trace!(len = head.len(), "首帧缺少 Content-Length 头");
            return Err(Error::Protocol("invalid state".to_string()));
        }

        let payload = self.conn.receive_frame().map_err(Error::from_read)?;
        if header::content_length(head.as_bytes()) != Some(payload.len()) {
            trace!(len = payload.len(), "Content-Length 与数据帧长度不一致");
        }

        serde_json::from_slice(payload.as_bytes()).map_err(Error::Deserialization)
    }

    /// 关闭底层连接
    pub fn close(&mut self) -> Result<()> {
        self.conn.close()?;
        Ok(())
    }

    pub fn get_ref(&self) -> &C {
        &self.conn
    }

    pub fn get_mut(&mut self) -> &mut C {
        &mut self.conn
    }

    pub fn into_inner(self) -> C {
        self.conn
    }
}
