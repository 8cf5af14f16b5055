use std::sync::Arc;

use ballot_core::{Argon2Hasher, Ballot};
use ballot_store::JsonFileStore;
use tokio::net::TcpListener;

use crate::auth::SessionStore;
use crate::config::ServerConfig;
use crate::error::{ServerError, ServerResult};
use crate::handler::AppState;
use crate::router::build_router;

/// Ballot HTTP server.
pub struct BallotServer {
    config: ServerConfig,
}

impl BallotServer {
    pub fn new(config: ServerConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &ServerConfig {
        &self.config
    }

    /// Open the data directory, seed the sample poll if configured, and
    /// build the shared handler state.
    pub fn open_state(&self) -> ServerResult<AppState> {
        let store = JsonFileStore::open(&self.config.data_dir)
            .map_err(|e| ServerError::Ballot(e.into()))?;
        let ballot = Ballot::open(Arc::new(store), Arc::new(Argon2Hasher::new()))?;
        if self.config.seed_sample_poll {
            ballot.polls().seed_sample()?;
        }
        let sessions = SessionStore::new(self.config.session_ttl());
        Ok(AppState::new(Arc::new(ballot), Arc::new(sessions)))
    }

    /// Start serving requests until Ctrl-C.
    pub async fn serve(self) -> ServerResult<()> {
        let data_dir = self.config.data_dir.clone();
        let (server, state) = tokio::task::spawn_blocking(move || {
            let state = self.open_state()?;
            Ok::<_, ServerError>((self, state))
        })
        .await
        .map_err(|e| ServerError::Internal(e.to_string()))??;

        let app = build_router(state);
        let listener = TcpListener::bind(server.config.bind_addr).await?;
        tracing::info!(
            addr = %server.config.bind_addr,
            data_dir = %data_dir.display(),
            "ballot server listening"
        );
        axum::serve(listener, app)
            .with_graceful_shutdown(shutdown_signal())
            .await
            .map_err(|e| ServerError::Internal(e.to_string()))
    }
}

async fn shutdown_signal() {
    if tokio::signal::ctrl_c().await.is_ok() {
        tracing::info!("shutdown signal received");
    }
}
