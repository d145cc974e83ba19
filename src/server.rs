use crate::{config::Config, provider::ModelProvider, routes::api_routes, storage::UploadStore};
use axum::{extract::DefaultBodyLimit, Router};
use std::sync::Arc;
use tokio::{net::TcpListener, signal};

#[derive(Clone)]
pub struct SharedState {
    pub model_provider: Arc<ModelProvider>,
    pub uploads: Arc<UploadStore>,
}

pub struct HttpServer {
    router: Router,
    listener: TcpListener,
}

impl HttpServer {
    pub async fn new(model_provider: Arc<ModelProvider>, config: &Config) -> anyhow::Result<Self> {
        let addr = config.server.get_address();

        let uploads = Arc::new(UploadStore::new(&config.upload).await?);
        let app_state = SharedState {
            model_provider,
            uploads,
        };

        // A little headroom over the store's limit for multipart framing.
        let body_limit = config.upload.max_bytes() + 64 * 1024;

        let router = Router::new()
            .merge(api_routes())
            .with_state(app_state)
            .layer(DefaultBodyLimit::max(body_limit));

        let listener = TcpListener::bind(addr).await?;

        Ok(Self { router, listener })
    }

    pub async fn run(self) -> anyhow::Result<()> {
        tracing::info!("Listening on {}", self.listener.local_addr()?);

        let shutdown = async {
            shutdown_signal().await;
            tracing::info!("Shutdown signal received, starting graceful shutdown");
        };

        axum::serve(self.listener, self.router)
            .with_graceful_shutdown(shutdown)
            .await?;

        Ok(())
    }
}

async fn shutdown_signal() {
    let ctrl_c = async {
        signal::ctrl_c()
            .await
            .expect("failed to install Ctrl+C handler");
    };

    let terminate = async {
        signal::unix::signal(signal::unix::SignalKind::terminate())
            .expect("failed to install signal handler")
            .recv()
            .await;
    };

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
}
