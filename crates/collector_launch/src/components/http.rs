//! HTTP listener lifecycle shared by the built-in components

use crate::component::{ComponentError, ComponentId, Host};
use axum::Router;
use std::net::SocketAddr;
use tokio::sync::watch;
use tokio::task::JoinHandle;

/// Check that an endpoint is `host:port` without resolving or binding it
pub fn validate_endpoint(endpoint: &str) -> Result<(), ComponentError> {
    let (host, port) = endpoint.rsplit_once(':').ok_or_else(|| {
        ComponentError::InvalidConfig(format!(
            "endpoint '{}' must be in the form host:port",
            endpoint
        ))
    })?;

    if host.trim().is_empty() {
        return Err(ComponentError::InvalidConfig(format!(
            "endpoint '{}' is missing a host",
            endpoint
        )));
    }

    port.parse::<u16>().map_err(|_| {
        ComponentError::InvalidConfig(format!(
            "endpoint '{}' has an invalid port '{}'",
            endpoint, port
        ))
    })?;

    Ok(())
}

/// A running axum server bound to one endpoint
pub struct HttpServer {
    local_addr: SocketAddr,
    shutdown_tx: watch::Sender<()>,
    task: Option<JoinHandle<()>>,
}

impl HttpServer {
    /// Bind the endpoint and serve `router` until [`stop`](Self::stop)
    ///
    /// A server error after startup is reported to the host as fatal.
    pub async fn start(
        id: &ComponentId,
        endpoint: &str,
        router: Router,
        host: &Host,
    ) -> Result<Self, ComponentError> {
        let listener = tokio::net::TcpListener::bind(endpoint).await?;
        let local_addr = listener.local_addr()?;
        log::info!("[{}] Listening on http://{}", id, local_addr);

        let (shutdown_tx, mut shutdown_rx) = watch::channel(());
        let id = id.clone();
        let host = host.clone();

        let task = tokio::spawn(async move {
            let result = axum::serve(listener, router)
                .with_graceful_shutdown(async move {
                    shutdown_rx.changed().await.ok();
                })
                .await;

            if let Err(e) = result {
                host.report_fatal(&id, ComponentError::Io(e));
            }
        });

        Ok(Self {
            local_addr,
            shutdown_tx,
            task: Some(task),
        })
    }

    /// The address actually bound (useful when the endpoint asked for port 0)
    pub fn local_addr(&self) -> SocketAddr {
        self.local_addr
    }

    /// Stop accepting, let in-flight requests finish, and join the server task
    pub async fn stop(&mut self) -> Result<(), ComponentError> {
        let _ = self.shutdown_tx.send(());

        if let Some(task) = self.task.take() {
            task.await
                .map_err(|e| ComponentError::Runtime(format!("server task failed: {}", e)))?;
        }

        Ok(())
    }
}
