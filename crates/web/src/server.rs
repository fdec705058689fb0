//! Web server implementation

use crate::routes;
use axum::{
    routing::{get, post},
    Router,
};
use countdown_common::{Config, Database, WalletService};
use std::net::SocketAddr;
use std::path::Path;
use std::sync::Arc;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing::info;

/// Shared handler state
pub struct AppState {
    pub wallets: WalletService,
    pub config: Config,
}

/// Web server
#[derive(Clone)]
pub struct WebServer {
    state: Arc<AppState>,
}

pub async fn serve(addr: SocketAddr, config: Config, db_path: &Path) -> anyhow::Result<()> {
    let server = WebServer::open(config, db_path)?;
    server.serve(addr).await
}

impl WebServer {
    /// Open the database at `db_path` and build the wallet service
    pub fn open(config: Config, db_path: &Path) -> anyhow::Result<Self> {
        let db = Database::open(db_path)?;
        Ok(Self::with_database(db, config)?)
    }

    pub fn with_database(db: Database, config: Config) -> countdown_common::Result<Self> {
        let wallets = WalletService::new(db, config.identity.clone())?;
        Ok(Self {
            state: Arc::new(AppState { wallets, config }),
        })
    }

    /// Create router
    pub fn router(&self) -> Router {
        Router::new()
            .route("/api/health", get(routes::health_handler))
            .route("/api/generate/mnemonic", get(routes::generate_mnemonic_handler))
            .route("/api/wallets", post(routes::create_wallet_handler))
            .route("/api/wallets/import", post(routes::import_wallet_handler))
            .route("/api/wallets/:wallet_id", get(routes::get_wallet_handler))
            .route(
                "/api/wallets/:wallet_id/countdowns",
                post(routes::create_wallet_countdown_handler),
            )
            .route("/api/countdowns", post(routes::create_countdown_handler))
            .route("/api/countdowns/:token", get(routes::get_countdown_handler))
            .fallback(routes::not_found_handler)
            .layer(
                CorsLayer::new()
                    .allow_origin(Any)
                    .allow_methods(Any)
                    .allow_headers(Any),
            )
            .layer(TraceLayer::new_for_http())
            .with_state(self.state.clone())
    }

    /// Start the web server
    pub async fn serve(self, addr: SocketAddr) -> anyhow::Result<()> {
        info!("Countdown API listening on http://{}", addr);

        let listener = tokio::net::TcpListener::bind(addr).await?;
        axum::serve(listener, self.router()).await?;

        Ok(())
    }
}
