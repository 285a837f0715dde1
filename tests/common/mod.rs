//! Shared utilities for integration testing.

use std::future::Future;
use std::path::Path;
use std::time::{Duration, Instant};

/// Write a `dyte.config.toml` serving on `port`, plus any extra TOML.
pub fn write_config(dir: &Path, port: u16, extra: &str) {
    let content = format!("{extra}\n[server]\nport = {port}\n");
    std::fs::write(dir.join("dyte.config.toml"), content).unwrap();
}

/// Fetch the status document of the instance on `port`, if one answers.
pub async fn status(port: u16) -> Option<serde_json::Value> {
    let client = reqwest::Client::builder()
        .pool_max_idle_per_host(0)
        .no_proxy()
        .build()
        .unwrap();

    let res = client
        .get(format!("http://127.0.0.1:{port}/__dyte/status"))
        .send()
        .await
        .ok()?;
    res.json().await.ok()
}

pub async fn refused(port: u16) -> bool {
    tokio::net::TcpStream::connect(("127.0.0.1", port)).await.is_err()
}

/// Poll `check` until it returns true or `timeout` passes.
pub async fn wait_until<F, Fut>(timeout: Duration, mut check: F) -> bool
where
    F: FnMut() -> Fut,
    Fut: Future<Output = bool>,
{
    let deadline = Instant::now() + timeout;
    while Instant::now() < deadline {
        if check().await {
            return true;
        }
        tokio::time::sleep(Duration::from_millis(50)).await;
    }
    false
}
