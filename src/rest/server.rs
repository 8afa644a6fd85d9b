//! REST API server lifecycle management.
//!
//! Lets the dashboard start and stop the API while the TUI keeps running.

use std::net::SocketAddr;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use tokio::sync::oneshot;
use tokio::task::JoinHandle;

use crate::rest::{build_router, ApiState};

/// Status of the REST API server
#[derive(Debug, Clone, PartialEq)]
pub enum RestApiStatus {
    Stopped,
    Starting,
    Stopping,
    Running { port: u16 },
    Error(String),
}

impl RestApiStatus {
    /// Returns true if the server is running
    pub fn is_running(&self) -> bool {
        matches!(self, RestApiStatus::Running { .. })
    }

    /// Short text for the status bar
    pub fn label(&self) -> String {
        match self {
            RestApiStatus::Stopped => "API off".to_string(),
            RestApiStatus::Starting => "API starting".to_string(),
            RestApiStatus::Stopping => "API stopping".to_string(),
            RestApiStatus::Running { port } => format!("API :{}", port),
            RestApiStatus::Error(e) => format!("API error: {}", e),
        }
    }
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

/// REST API server handle for lifecycle management
pub struct RestApiServer {
    state: ApiState,
    port: u16,
    status: Arc<Mutex<RestApiStatus>>,
    shutdown_tx: Mutex<Option<oneshot::Sender<()>>>,
    task_handle: Mutex<Option<JoinHandle<()>>>,
}

impl RestApiServer {
    /// Create a new server handle
    pub fn new(state: ApiState, port: u16) -> Self {
        Self {
            state,
            port,
            status: Arc::new(Mutex::new(RestApiStatus::Stopped)),
            shutdown_tx: Mutex::new(None),
            task_handle: Mutex::new(None),
        }
    }

    /// Get current server status
    pub fn status(&self) -> RestApiStatus {
        lock(&self.status).clone()
    }

    /// Check if server is running
    pub fn is_running(&self) -> bool {
        self.status().is_running()
    }

    pub fn port(&self) -> u16 {
        self.port
    }

    /// Start the REST API server on the tokio runtime of the caller
    pub fn start(&self) -> Result<(), String> {
        if matches!(
            self.status(),
            RestApiStatus::Running { .. } | RestApiStatus::Starting
        ) {
            return Err(format!("REST API already running on port {}", self.port));
        }

        let (shutdown_tx, shutdown_rx) = oneshot::channel();
        *lock(&self.shutdown_tx) = Some(shutdown_tx);

        let router = build_router(self.state.clone());
        let port = self.port;
        let status = self.status.clone();

        *lock(&status) = RestApiStatus::Starting;

        let handle = tokio::spawn(async move {
            let addr = SocketAddr::from(([0, 0, 0, 0], port));

            match tokio::net::TcpListener::bind(addr).await {
                Ok(listener) => {
                    *lock(&status) = RestApiStatus::Running { port };
                    tracing::info!("REST API listening on http://{}", addr);

                    if let Err(e) = axum::serve(listener, router)
                        .with_graceful_shutdown(async {
                            let _ = shutdown_rx.await;
                        })
                        .await
                    {
                        tracing::warn!(error = %e, "REST API server exited with an error");
                    }
                    *lock(&status) = RestApiStatus::Stopped;
                }
                Err(e) => {
                    tracing::error!("Failed to start REST API: {}", e);
                    *lock(&status) = RestApiStatus::Error(e.to_string());
                }
            }
        });

        *lock(&self.task_handle) = Some(handle);
        Ok(())
    }

    /// Stop the REST API server
    pub fn stop(&self) {
        *lock(&self.status) = RestApiStatus::Stopping;

        if let Some(tx) = lock(&self.shutdown_tx).take() {
            let _ = tx.send(());
        }
        // Graceful shutdown finishes in the background
        lock(&self.task_handle).take();

        *lock(&self.status) = RestApiStatus::Stopped;
        tracing::info!("REST API server stopped");
    }

    /// Toggle server state (start if stopped, stop if running)
    pub fn toggle(&self) -> Result<(), String> {
        if self.is_running() {
            self.stop();
            Ok(())
        } else {
            self.start()
        }
    }
}

impl Drop for RestApiServer {
    fn drop(&mut self) {
        if self.is_running() {
            self.stop();
        }
    }
}
