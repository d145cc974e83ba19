use crate::{config::Config, provider::ModelProvider, server::HttpServer};
use std::{error::Error, sync::Arc};

pub async fn start_app(config: Config) -> Result<(), Box<dyn Error>> {
    let model_provider = Arc::new(ModelProvider::new(config.model.source()));

    if config.model.preload {
        // Pay the load and warm-up cost at startup instead of on the first
        // request. A missing artifact still falls back to the substitute.
        if let Err(e) = model_provider.get().await {
            tracing::error!("Failed to load model: {e}");
            return Err(Box::new(e));
        }
    }

    let server = HttpServer::new(model_provider, &config).await?;
    server.run().await?;

    Ok(())
}
