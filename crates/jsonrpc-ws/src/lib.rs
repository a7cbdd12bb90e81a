/// JSON-RPC over WebSocket - 传输适配库
///
/// 把一条已建立的 WebSocket 连接适配成 JSON-RPC 层使用的对象流：
/// 写对象、读对象、关闭，以及把传输层错误翻译成稳定的错误词汇。

pub mod async_stream;
pub mod connection;
pub mod errors;
pub mod header;
pub mod jsonrpc;
pub mod stream;

// 重新导出常用类型
pub use async_stream::AsyncObjectStream;
pub use connection::{ConnectionError, Frame, FrameConnection, FrameType};
pub use errors::{Error, Result};
pub use jsonrpc::{Message, Request, Response, Notification, RpcError, RpcErrorCode};
pub use stream::ObjectStream;
