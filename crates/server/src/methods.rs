/// 内置 RPC 方法

use jsonrpc_ws::jsonrpc::RpcRouter;
use jsonrpc_ws::RpcError;
use serde_json::{json, Value};
use std::time::Duration;

/// 注册全部内置方法
pub async fn register(router: &RpcRouter) {
    router.register("ping", |_| Ok(json!("pong"))).await;

    router.register("echo", |params| Ok(params)).await;

    router.register("add", |params| {
        let numbers: Vec<f64> = serde_json::from_value(params)?;
        Ok(json!(numbers.iter().sum::<f64>()))
    }).await;

    router.register_async("sleep", |params| async move {
        let millis = params
            .get("millis")
            .and_then(Value::as_u64)
            .ok_or_else(|| RpcError::invalid_params("缺少参数: millis"))?;
        tokio::time::sleep(Duration::from_millis(millis)).await;
        Ok::<_, RpcError>(json!({"slept": millis}))
    }).await;
}
