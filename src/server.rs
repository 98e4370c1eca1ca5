//! HTTP server lifecycle.
//!
//! The provider is created by the caller, shared by every request through
//! [`AppState`], and closed once the listener has drained.

use std::future::Future;
use std::net::SocketAddr;
use std::sync::Arc;

use tokio::net::TcpListener;

use crate::api::{router, AppState};
use crate::engine::ConnectionProvider;
use crate::error::{DeskError, Result};

/// Bind `0.0.0.0:port` and serve until Ctrl-C or SIGTERM
pub async fn serve<P: ConnectionProvider>(provider: P, port: u16) -> Result<()> {
    let addr = SocketAddr::from(([0, 0, 0, 0], port));
    let listener = TcpListener::bind(addr)
        .await
        .map_err(|e| DeskError::config_error(format!("Failed to bind port {port}: {e}")))?;

    serve_on(listener, provider, shutdown_signal()).await
}

/// Serve on an already bound listener until `shutdown` resolves, then close the provider
pub async fn serve_on<P, F>(listener: TcpListener, provider: P, shutdown: F) -> Result<()>
where
    P: ConnectionProvider,
    F: Future<Output = ()> + Send + 'static,
{
    let provider = Arc::new(provider);
    let app = router(AppState::from_shared(Arc::clone(&provider)));

    if let Ok(addr) = listener.local_addr() {
        tracing::info!(%addr, engine = %provider.engine(), "agentdesk listening");
    }

    let served = axum::serve(listener, app).with_graceful_shutdown(shutdown).await;

    provider.close().await;
    tracing::info!("server stopped");

    served.map_err(|e| DeskError::engine_error("http", e.to_string()))
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::warn!(error = %e, "failed to listen for Ctrl-C");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                tracing::warn!(error = %e, "failed to listen for SIGTERM");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => {},
        () = terminate => {},
    }

    tracing::info!("shutdown signal received");
}

#[cfg(all(test, feature = "sqlite"))]
mod tests {
    use super::*;
    use crate::engine::sqlite::SqliteProvider;
    use crate::engine::ConnectionConfig;
    use crate::pool::PoolConfig;
    use tokio::io::{AsyncReadExt, AsyncWriteExt};
    use tokio::net::TcpStream;

    #[tokio::test]
    async fn test_serves_until_shutdown() {
        let path = std::env::temp_dir().join(format!("agentdesk_server_{}.db", std::process::id()));
        let _ = std::fs::remove_file(&path);

        let provider =
            SqliteProvider::new(&ConnectionConfig::sqlite(path.clone()), PoolConfig::default()).unwrap();
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let (stop, stopped) = tokio::sync::oneshot::channel::<()>();

        let server = tokio::spawn(serve_on(listener, provider, async {
            let _ = stopped.await;
        }));

        let mut stream = TcpStream::connect(addr).await.unwrap();
        stream
            .write_all(b"GET /health HTTP/1.1\r\nHost: localhost\r\nConnection: close\r\n\r\n")
            .await
            .unwrap();
        let mut response = String::new();
        stream.read_to_string(&mut response).await.unwrap();

        assert!(response.starts_with("HTTP/1.1 200"), "{response}");
        assert!(response.contains(r#""engine":"sqlite""#));

        stop.send(()).unwrap();
        server.await.unwrap().unwrap();

        let _ = std::fs::remove_file(&path);
    }
}
