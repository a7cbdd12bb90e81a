use crate::connection::{ConnectionError, CLOSE_NO_STATUS};
use crate::jsonrpc::RpcError;
use thiserror::Error;

/// 统一错误类型
#[derive(Error, Debug)]
pub enum Error {
    #[error("序列化错误: {0}")]
    Serialization(#[source] serde_json::Error),

    #[error("反序列化错误: {0}")]
    Deserialization(#[source] serde_json::Error),

    /// 帧序列不符合信封格式
    #[error("{0}")]
    Protocol(String),

    #[error("传输错误: {0}")]
    Transport(#[from] ConnectionError),

    /// 流正常结束（对端未经关闭握手断开）
    #[error("unexpected EOF")]
    UnexpectedEof,

    /// 对端返回的 JSON-RPC 错误响应，仅由客户端产生
    #[error("RPC 错误: {0}")]
    Rpc(#[from] RpcError),
}

impl Error {
    /// 读取失败的错误翻译
    ///
    /// 只有“异常关闭 + unexpected EOF”会被改写为 `UnexpectedEof`，
    /// 其余连接错误原样作为 `Transport` 返回。
    pub fn from_read(err: ConnectionError) -> Self {
        if err.is_unexpected_eof() {
            Self::UnexpectedEof
        } else {
            Self::Transport(err)
        }
    }

    /// 是否表示对端已经结束了流
    pub fn is_end_of_stream(&self) -> bool {
        match self {
            Self::UnexpectedEof => true,
            Self::Transport(ConnectionError::Closed) => true,
            Self::Transport(ConnectionError::Close { code, .. }) => {
                matches!(*code, 1000 | 1001 | CLOSE_NO_STATUS)
            }
            _ => false,
        }
    }
}

/// 统一结果类型
pub type Result<T> = std::result::Result<T, Error>;

#[cfg(test)]
mod tests {
    use super::*;
    use crate::connection::CLOSE_ABNORMAL;

    #[test]
    fn test_from_read_translates_unexpected_eof() {
        let err = Error::from_read(ConnectionError::abnormal_eof());
        assert!(matches!(err, Error::UnexpectedEof));
        assert_eq!(err.to_string(), "unexpected EOF");
    }

    #[test]
    fn test_from_read_keeps_other_close_errors() {
        let err = Error::from_read(ConnectionError::Close {
            code: CLOSE_ABNORMAL,
            text: "read: connection reset by peer".to_string(),
        });
        match err {
            Error::Transport(ConnectionError::Close { code, text }) => {
                assert_eq!(code, CLOSE_ABNORMAL);
                assert_eq!(text, "read: connection reset by peer");
            }
            other => panic!("unexpected error: {:?}", other),
        }

        let err = Error::from_read(ConnectionError::Close {
            code: 1011,
            text: "unexpected EOF".to_string(),
        });
        assert!(matches!(
            err,
            Error::Transport(ConnectionError::Close { code: 1011, .. })
        ));
    }

    #[test]
    fn test_end_of_stream() {
        assert!(Error::UnexpectedEof.is_end_of_stream());
        assert!(Error::Transport(ConnectionError::Closed).is_end_of_stream());
        assert!(Error::Transport(ConnectionError::Close {
            code: 1000,
            text: String::new(),
        })
        .is_end_of_stream());
        assert!(!Error::Transport(ConnectionError::Close {
            code: 1011,
            text: "internal".to_string(),
        })
        .is_end_of_stream());
        assert!(!Error::Protocol("invalid state".to_string()).is_end_of_stream());
    }
}
