//! 服务进程
//!
//! 负责组装存储、档案服务与 HTTP 路由，并处理优雅关闭

use crate::api;
use crate::config::Config;
use crate::registry::Registry;
use crate::storage::RecordStore;
use anyhow::{anyhow, Result};
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::net::TcpListener;

pub struct Server {
    /// 档案服务
    registry: Arc<Registry>,
    /// 监听地址
    addr: SocketAddr,
}

impl Server {
    pub fn new(config: &Config) -> Result<Self> {
        tracing::info!("正在初始化档案存储...");
        let store = RecordStore::open(&config.store.path)?.with_pretty(config.store.pretty);
        let registry = Arc::new(Registry::new(store));

        let addr: SocketAddr = format!("{}:{}", config.server.host, config.server.port)
            .parse()
            .map_err(|e| anyhow!("无效的监听地址: {}", e))?;

        tracing::info!("档案服务初始化完成，共 {} 条档案", registry.len());
        Ok(Self { registry, addr })
    }

    pub async fn run(self) -> Result<()> {
        let listener = TcpListener::bind(self.addr)
            .await
            .map_err(|e| anyhow!("无法绑定 {}: {}", self.addr, e))?;
        tracing::info!("HTTP 服务监听于 http://{}", listener.local_addr()?);

        let app = api::routes(self.registry.clone());
        axum::serve(listener, app)
            .with_graceful_shutdown(Self::shutdown_signal())
            .await?;

        tracing::info!("服务已关闭");
        Ok(())
    }

    /// 等待 Ctrl+C 或 TERM 信号
    async fn shutdown_signal() {
        tokio::select! {
            _ = tokio::signal::ctrl_c() => {
                tracing::info!("收到 Ctrl+C 信号，正在关闭...");
            }
            _ = Self::wait_for_term_signal() => {
                tracing::info!("收到 TERM 信号，正在关闭...");
            }
        }
    }

    async fn wait_for_term_signal() {
        #[cfg(unix)]
        {
            use tokio::signal::unix::{signal, SignalKind};
            match signal(SignalKind::terminate()) {
                Ok(mut term) => {
                    term.recv().await;
                }
                Err(e) => {
                    tracing::warn!("无法监听 TERM 信号: {}", e);
                    std::future::pending::<()>().await;
                }
            }
        }

        #[cfg(not(unix))]
        {
            // Windows 不支持 SIGTERM，使用 Ctrl+C 替代
            let _ = tokio::signal::ctrl_c().await;
        }
    }
}
