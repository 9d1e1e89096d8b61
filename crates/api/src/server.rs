//! HTTP server lifecycle: serve until a shutdown signal, then drain.

use std::future::Future;
use std::net::SocketAddr;
use std::time::Duration;

use axum::Router;
use tokio::net::TcpListener;
use tokio::sync::oneshot;

/// Serve `app` on `listener` until `signal` resolves.
///
/// After the signal the listener stops accepting connections and in-flight
/// requests get up to `drain_timeout` to finish; whatever is still running
/// after that is abandoned.
pub async fn serve<F>(
    listener: TcpListener,
    app: Router,
    signal: F,
    drain_timeout: Duration,
) -> anyhow::Result<()>
where
    F: Future<Output = ()> + Send,
{
    let (stop_tx, stop_rx) = oneshot::channel::<()>();

    let mut server = tokio::spawn(async move {
        axum::serve(
            listener,
            app.into_make_service_with_connect_info::<SocketAddr>(),
        )
        .with_graceful_shutdown(async move {
            let _ = stop_rx.await;
        })
        .await
    });

    tokio::select! {
        result = &mut server => {
            // The server stopped on its own, before any signal.
            result??;
            return Ok(());
        }
        _ = signal => {
            tracing::info!("Shutdown signal received");
        }
    }

    let _ = stop_tx.send(());

    match tokio::time::timeout(drain_timeout, &mut server).await {
        Ok(result) => {
            result??;
            tracing::info!("Server shutdown complete");
        }
        Err(_) => {
            server.abort();
            tracing::warn!(
                timeout_secs = drain_timeout.as_secs(),
                "In-flight requests did not finish in time, abandoning them"
            );
        }
    }

    Ok(())
}

/// Resolves on Ctrl+C or SIGTERM.
pub async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!(error = %e, "Failed to listen for Ctrl+C");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut stream) => {
                stream.recv().await;
            }
            Err(e) => {
                tracing::error!(error = %e, "Failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
}

#[cfg(test)]
mod tests {
    use axum::routing::get;

    use super::*;

    #[tokio::test]
    async fn test_serve_returns_after_signal() {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let app = Router::new().route("/", get(|| async { "ok" }));

        let result = tokio::time::timeout(
            Duration::from_secs(5),
            serve(listener, app, async {}, Duration::from_secs(1)),
        )
        .await
        .expect("server did not stop");

        assert!(result.is_ok());
    }

    #[tokio::test]
    async fn test_slow_request_is_abandoned_after_drain_timeout() {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let app = Router::new().route(
            "/slow",
            get(|| async {
                tokio::time::sleep(Duration::from_secs(30)).await;
                "done"
            }),
        );

        let (signal_tx, signal_rx) = oneshot::channel::<()>();
        let server = tokio::spawn(serve(
            listener,
            app,
            async move {
                let _ = signal_rx.await;
            },
            Duration::from_millis(200),
        ));

        // Start a request that will still be running at shutdown.
        let mut stream = tokio::net::TcpStream::connect(addr).await.unwrap();
        tokio::io::AsyncWriteExt::write_all(
            &mut stream,
            b"GET /slow HTTP/1.1\r\nHost: localhost\r\n\r\n",
        )
        .await
        .unwrap();
        tokio::time::sleep(Duration::from_millis(100)).await;

        signal_tx.send(()).unwrap();
        let result = tokio::time::timeout(Duration::from_secs(5), server)
            .await
            .expect("drain timeout was not enforced")
            .unwrap();
        assert!(result.is_ok());
    }
}
