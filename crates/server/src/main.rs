/// JSON-RPC WebSocket - Server
///
/// 接受 WebSocket 连接，在每条连接上通过对象流提供 JSON-RPC 服务

mod config;
mod methods;

use jsonrpc_ws::jsonrpc::{serve, RpcRouter};
use jsonrpc_ws::AsyncObjectStream;
use std::net::SocketAddr;
use tokio::net::{TcpListener, TcpStream};
use tracing::{debug, info, warn};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
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

    info!("🚀 启动 JSON-RPC WebSocket Server...");

    let router = RpcRouter::new();
    methods::register(&router).await;
    info!("✅ 已注册方法: {:?}", router.list_methods().await);

    let addr = cfg.listen_addr();
    let listener = TcpListener::bind(&addr).await?;
    info!("🎯 服务器监听在 ws://{}", addr);

    loop {
        tokio::select! {
            accepted = listener.accept() => {
                let (stream, peer) = accepted?;
                let router = router.clone();
                tokio::spawn(async move {
                    if let Err(e) = handle_connection(stream, peer, router).await {
                        warn!("连接 {} 异常结束: {}", peer, e);
                    }
                });
            }
            _ = tokio::signal::ctrl_c() => {
                info!("收到退出信号，停止监听");
                break;
            }
        }
    }

    Ok(())
}

/// 处理单条连接：完成握手后在对象流上提供服务，直到对端断开
async fn handle_connection(
    stream: TcpStream,
    peer: SocketAddr,
    router: RpcRouter,
) -> anyhow::Result<()> {
    let ws_stream = tokio_tungstenite::accept_async(stream).await?;
    info!("✅ 新连接: {}", peer);

    let mut objects = AsyncObjectStream::new(ws_stream);
    serve(&mut objects, &router).await?;

    if let Err(e) = objects.close().await {
        debug!("关闭连接 {} 时出错: {}", peer, e);
    }
    info!("连接已关闭: {}", peer);

    Ok(())
}
