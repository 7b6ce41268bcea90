//! HTTP server wrapper around the per-node router.

use super::routes::create_router;
use benor_consensus::EngineHandle;
use std::net::SocketAddr;
use thiserror::Error;
use tokio::task::JoinHandle;
use tracing::{error, info};

/// Errors from the control server.
#[derive(Debug, Error)]
pub enum RpcServerError {
    #[error("failed to bind listen address: {0}")]
    Bind(#[from] std::io::Error),
}

/// Configuration for one node's control server.
#[derive(Debug, Clone)]
pub struct RpcServerConfig {
    /// Address to listen on. Port 0 picks a free port; read it back
    /// from [`RpcServerHandle::local_addr`].
    pub listen_addr: SocketAddr,
}

impl Default for RpcServerConfig {
    fn default() -> Self {
        Self {
            listen_addr: SocketAddr::from(([127, 0, 0, 1], 8080)),
        }
    }
}

/// Handle for a running control server.
pub struct RpcServerHandle {
    task: JoinHandle<()>,
    local_addr: SocketAddr,
}

impl RpcServerHandle {
    /// The address the server actually bound.
    pub fn local_addr(&self) -> SocketAddr {
        self.local_addr
    }

    /// Abort the server task.
    pub fn abort(&self) {
        self.task.abort();
    }

    /// Wait for the server to finish.
    pub async fn join(self) -> Result<(), tokio::task::JoinError> {
        self.task.await
    }
}

/// Control server for one node.
pub struct RpcServer {
    config: RpcServerConfig,
    handle: EngineHandle,
}

impl RpcServer {
    pub fn new(config: RpcServerConfig, handle: EngineHandle) -> Self {
        Self { config, handle }
    }

    /// Bind and start serving, returning a handle for control.
    pub async fn start(self) -> Result<RpcServerHandle, RpcServerError> {
        let router = create_router(self.handle.clone());
        let listener = tokio::net::TcpListener::bind(self.config.listen_addr).await?;
        let local_addr = listener.local_addr()?;
        info!(node = %self.handle.id(), addr = %local_addr, "control server listening");

        let task = tokio::spawn(async move {
            if let Err(e) = axum::serve(listener, router).await {
                error!(error = ?e, "control server error");
            }
        });

        Ok(RpcServerHandle { task, local_addr })
    }

    /// Start and serve until shutdown.
    pub async fn serve(self) -> Result<(), RpcServerError> {
        let handle = self.start().await?;
        let _ = handle.join().await;
        Ok(())
    }
}

/// Start one control server per handle, on consecutive ports.
///
/// Node i listens on `base_addr` with port `base_addr.port() + i`,
/// faulty nodes included (their server answers, the node refuses).
pub async fn serve_handles(
    handles: &[EngineHandle],
    base_addr: SocketAddr,
) -> Result<Vec<RpcServerHandle>, RpcServerError> {
    let mut servers = Vec::with_capacity(handles.len());
    for (i, handle) in handles.iter().enumerate() {
        let mut listen_addr = base_addr;
        listen_addr.set_port(base_addr.port() + i as u16);
        let server = RpcServer::new(RpcServerConfig { listen_addr }, handle.clone());
        servers.push(server.start().await?);
    }
    Ok(servers)
}

#[cfg(test)]
mod tests {
    use super::*;
    use benor_types::NodeId;

    #[tokio::test]
    async fn binds_an_ephemeral_port() {
        let config = RpcServerConfig {
            listen_addr: SocketAddr::from(([127, 0, 0, 1], 0)),
        };
        let server = RpcServer::new(config, EngineHandle::inert(NodeId(0)));
        let handle = server.start().await.expect("bind should succeed");
        assert_ne!(handle.local_addr().port(), 0);
        handle.abort();
    }

    #[tokio::test]
    async fn serves_one_node_per_consecutive_port() {
        // Grab a free port to use as the base, then serve from it.
        let base_port = std::net::TcpListener::bind("127.0.0.1:0")
            .and_then(|l| l.local_addr())
            .expect("probe port")
            .port();
        let handles = vec![EngineHandle::inert(NodeId(0)), EngineHandle::inert(NodeId(1))];
        let servers = serve_handles(&handles, SocketAddr::from(([127, 0, 0, 1], base_port)))
            .await
            .expect("bind should succeed");
        assert_eq!(servers.len(), 2);
        assert_eq!(servers[0].local_addr().port(), base_port);
        assert_eq!(servers[1].local_addr().port(), base_port + 1);
        for server in &servers {
            server.abort();
        }
    }
}
