/// JSON-RPC 2.0 模块
///
/// 消费对象流的 RPC 层：消息定义、方法路由、阻塞式客户端

pub mod message;
pub mod error;
pub mod server;
pub mod client;

pub use message::{ErrorObject, Id, Message, Notification, Request, Response, JSONRPC_VERSION};
pub use error::{RpcError, RpcErrorCode};
pub use server::{serve, RpcRouter};
pub use client::RpcClient;
