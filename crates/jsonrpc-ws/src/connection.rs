/// 底层帧连接抽象
///
/// 对象流只依赖这里定义的三个操作：发送一帧、接收一帧、关闭。
/// 连接本身（握手、ping/pong、压缩、TLS）由实现方负责。

use std::io::{self, Read, Write};
use thiserror::Error;
use tokio_tungstenite::tungstenite::{
    self,
    error::ProtocolError,
    protocol::{frame::coding::CloseCode, CloseFrame},
    Message, WebSocket,
};
use tracing::trace;

/// 异常关闭码（RFC 6455 1006）
pub const CLOSE_ABNORMAL: u16 = 1006;

/// 对端发送了不带状态码的关闭帧时使用的关闭码（RFC 6455 1005）
pub const CLOSE_NO_STATUS: u16 = 1005;

/// 异常关闭时附带的标准文本
pub const UNEXPECTED_EOF_TEXT: &str = "unexpected EOF";

/// 帧类型
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FrameType {
    Text,
    Binary,
}

/// 一个数据帧
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Frame {
    Text(String),
    Binary(Vec<u8>),
}

impl Frame {
    pub fn frame_type(&self) -> FrameType {
        match self {
            Self::Text(_) => FrameType::Text,
            Self::Binary(_) => FrameType::Binary,
        }
    }

    pub fn as_bytes(&self) -> &[u8] {
        match self {
            Self::Text(text) => text.as_bytes(),
            Self::Binary(data) => data,
        }
    }

    pub fn len(&self) -> usize {
        self.as_bytes().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// 连接错误
#[derive(Error, Debug)]
pub enum ConnectionError {
    /// 关闭条件：对端的关闭帧，或传输层检测到的异常断开
    #[error("websocket: close {code}: {text}")]
    Close { code: u16, text: String },

    /// 连接已经关闭
    #[error("连接已关闭")]
    Closed,

    #[error("IO 错误: {0}")]
    Io(#[from] io::Error),

    #[error("WebSocket 错误: {0}")]
    WebSocket(tungstenite::Error),
}

impl ConnectionError {
    /// 构造异常关闭（1006 + "unexpected EOF"）
    pub fn abnormal_eof() -> Self {
        Self::Close {
            code: CLOSE_ABNORMAL,
            text: UNEXPECTED_EOF_TEXT.to_string(),
        }
    }

    /// 是否是“连接意外结束”这一特定的异常关闭
    pub fn is_unexpected_eof(&self) -> bool {
        matches!(
            self,
            Self::Close { code, text } if *code == CLOSE_ABNORMAL && text == UNEXPECTED_EOF_TEXT
        )
    }

    /// 关闭码（仅 Close 变体）
    pub fn close_code(&self) -> Option<u16> {
        match self {
            Self::Close { code, .. } => Some(*code),
            _ => None,
        }
    }
}

impl From<tungstenite::Error> for ConnectionError {
    fn from(err: tungstenite::Error) -> Self {
        match err {
            tungstenite::Error::ConnectionClosed | tungstenite::Error::AlreadyClosed => {
                Self::Closed
            }
            tungstenite::Error::Protocol(ProtocolError::ResetWithoutClosingHandshake) => {
                Self::abnormal_eof()
            }
            tungstenite::Error::Io(e) if e.kind() == io::ErrorKind::UnexpectedEof => {
                Self::abnormal_eof()
            }
            tungstenite::Error::Io(e) => Self::Io(e),
            other => Self::WebSocket(other),
        }
    }
}

/// 把一条 WebSocket 消息转换成数据帧
///
/// 控制帧返回 `Ok(None)`，由调用方继续读取；关闭帧转换成 `ConnectionError::Close`。
pub fn frame_from_message(msg: Message) -> Result<Option<Frame>, ConnectionError> {
    match msg {
        Message::Text(text) => Ok(Some(Frame::Text(text))),
        Message::Binary(data) => Ok(Some(Frame::Binary(data))),
        Message::Close(frame) => Err(close_error(frame)),
        Message::Ping(_) | Message::Pong(_) | Message::Frame(_) => Ok(None),
    }
}

/// 把数据帧转换成 WebSocket 消息
pub fn message_from_frame(frame: Frame) -> Message {
    match frame {
        Frame::Text(text) => Message::Text(text),
        Frame::Binary(data) => Message::Binary(data),
    }
}

fn close_error(frame: Option<CloseFrame<'_>>) -> ConnectionError {
    match frame {
        Some(frame) => ConnectionError::Close {
            code: u16::from(frame.code),
            text: frame.reason.into_owned(),
        },
        None => ConnectionError::Close {
            code: u16::from(CloseCode::Status),
            text: String::new(),
        },
    }
}

/// 全双工帧连接
///
/// 实现方需要保证一个读者与一个写者可以交替使用同一连接。
/// 多个写者之间的互斥由调用方负责。
pub trait FrameConnection {
    /// 发送一帧（只保证被连接接受，不保证对端收到）
    fn send_frame(&mut self, frame: Frame) -> Result<(), ConnectionError>;

    /// 接收下一个数据帧
    fn receive_frame(&mut self) -> Result<Frame, ConnectionError>;

    /// 关闭连接
    fn close(&mut self) -> Result<(), ConnectionError>;
}

impl<C: FrameConnection + ?Sized> FrameConnection for &mut C {
    fn send_frame(&mut self, frame: Frame) -> Result<(), ConnectionError> {
        (**self).send_frame(frame)
    }

    fn receive_frame(&mut self) -> Result<Frame, ConnectionError> {
        (**self).receive_frame()
    }

    fn close(&mut self) -> Result<(), ConnectionError> {
        (**self).close()
    }
}

impl<S: Read + Write> FrameConnection for WebSocket<S> {
    fn send_frame(&mut self, frame: Frame) -> Result<(), ConnectionError> {
        trace!(frame_type = ?frame.frame_type(), len = frame.len(), "发送帧");
        self.send(message_from_frame(frame))?;
        Ok(())
    }

    fn receive_frame(&mut self) -> Result<Frame, ConnectionError> {
        loop {
            let msg = self.read()?;
            if let Some(frame) = frame_from_message(msg)? {
                trace!(frame_type = ?frame.frame_type(), len = frame.len(), "收到帧");
                return Ok(frame);
            }
        }
    }

    fn close(&mut self) -> Result<(), ConnectionError> {
        WebSocket::close(self, None)?;
        Ok(())
    }
}
