/// Content-Length 消息头
///
/// 每条逻辑消息占两帧：先是 `Content-Length: N\r\n\r\n` 头帧，再是 N 字节的 JSON 帧。
/// WebSocket 本身已经划分了帧边界，长度头在信息上是多余的，
/// 沿用它只是为了与现有对端保持线上兼容。

/// 头帧必须以此前缀开头
pub const CONTENT_LENGTH_PREFIX: &str = "Content-Length:";

/// 生成头帧内容
pub fn encode(len: usize) -> String {
    format!("{} {}\r\n\r\n", CONTENT_LENGTH_PREFIX, len)
}

/// 判断帧内容是否是头帧
pub fn is_header(frame: &[u8]) -> bool {
    frame.starts_with(CONTENT_LENGTH_PREFIX.as_bytes())
}

/// 解析头帧中的长度，无法解析时返回 None
pub fn content_length(frame: &[u8]) -> Option<usize> {
    let rest = frame.strip_prefix(CONTENT_LENGTH_PREFIX.as_bytes())?;
    std::str::from_utf8(rest).ok()?.trim().parse().ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_encode() {
        assert_eq!(encode(42), "Content-Length: 42\r\n\r\n");
        assert_eq!(encode(0), "Content-Length: 0\r\n\r\n");
    }

    #[test]
    fn test_is_header() {
        assert!(is_header(b"Content-Length: 10\r\n\r\n"));
        assert!(is_header(b"Content-Length:10"));
        assert!(!is_header(b"content-length: 10\r\n\r\n"));
        assert!(!is_header(b"{\"jsonrpc\":\"2.0\"}"));
        assert!(!is_header(b""));
    }

    #[test]
    fn test_content_length() {
        assert_eq!(content_length(encode(1234).as_bytes()), Some(1234));
        assert_eq!(content_length(b"Content-Length:7"), Some(7));
        assert_eq!(content_length(b"Content-Length: abc\r\n\r\n"), None);
        assert_eq!(content_length(b"Length: 7"), None);
    }
}
