/// JSON-RPC WebSocket - Client
///
/// 阻塞式客户端：连接 Server，依次调用内置方法后关闭连接

mod config;

use jsonrpc_ws::jsonrpc::RpcClient;
use serde_json::{json, Value};
use tokio_tungstenite::tungstenite;
use tracing::info;

fn main() -> anyhow::Result<()> {
    // 加载配置
    dotenvy::dotenv().ok();
    let cfg = config::Config::from_env()?;

    // 初始化日志，RUST_LOG 优先于 LOG_LEVEL
    tracing_subscriber::fmt()
        .with_target(false)
        .with_thread_ids(true)
        .with_line_number(true)
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(&cfg.log_level))
        )
        .init();

    info!("🎯 连接到 Server: {}", cfg.server_ws_url);
    let (ws, _) = tungstenite::connect(cfg.server_ws_url.as_str())?;
    info!("✅ WebSocket 连接成功");

    let mut client = RpcClient::new(ws);

    let pong: String = client.call::<Value, _>("ping", None)?;
    info!("ping -> {}", pong);

    let echoed: Value = client.call("echo", Some(json!({"hello": "world"})))?;
    info!("echo -> {}", echoed);

    let sum: f64 = client.call("add", Some(vec![1.0, 2.0, 3.5]))?;
    info!("add -> {}", sum);

    let slept: Value = client.call("sleep", Some(json!({"millis": 50})))?;
    info!("sleep -> {}", slept);

    client.notify::<Value>("ping", None)?;

    client.close()?;
    info!("连接已关闭");

    Ok(())
}
