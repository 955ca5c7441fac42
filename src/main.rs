use std::sync::Arc;

use harbor_api::auth::oauth::OAuthClient;
use harbor_api::auth::GoogleVerifier;
use harbor_api::config::AppConfig;
use harbor_api::datastore::MemoryStore;
use harbor_api::state::AppState;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "harbor_api=info,tower_http=info".into()),
        )
        .init();

    let config = AppConfig::from_env();
    let port = config.port;

    let state = AppState {
        store: Arc::new(MemoryStore::new()),
        verifier: Arc::new(GoogleVerifier::new(&config)?),
        oauth: Arc::new(OAuthClient::new(&config)?),
        config: Arc::new(config),
    };

    let app = harbor_api::app(state);

    let listener = tokio::net::TcpListener::bind(("0.0.0.0", port)).await?;
    tracing::info!("listening on {}", listener.local_addr()?);
    axum::serve(listener, app).await?;

    Ok(())
}
