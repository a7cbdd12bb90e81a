/// 配置管理

#[derive(Debug, Clone)]
pub struct Config {
    pub server_ws_url: String,
    pub log_level: String,
}

impl Config {
    /// 从环境变量加载配置
    pub fn from_env() -> anyhow::Result<Self> {
        let server_ws_url = std::env::var("SERVER_WS_URL")
            .unwrap_or_else(|_| "ws://localhost:3000".to_string());

        let log_level = std::env::var("LOG_LEVEL")
            .unwrap_or_else(|_| "debug".to_string());

        Ok(Self {
            server_ws_url,
            log_level,
        })
    }
}
