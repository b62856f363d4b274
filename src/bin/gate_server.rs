// src/bin/gate_server.rs

use campus_pass::infra::algorand::{
    AlgodClient, IndexerClient, IndexerService, LedgerService, SimulatedLedger,
};
use campus_pass::infra::config::{CampusPassConfig, LedgerMode};
use campus_pass::{transport, CampusPass};
use std::sync::Arc;
use tower_http::cors::{Any, CorsLayer};
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let config = CampusPassConfig::from_env()?;
    for (feature, id) in config.feature_summary() {
        match id {
            Some(id) => info!(feature, id, "feature enabled"),
            None => info!(feature, "feature disabled"),
        }
    }

    type Backends = (Arc<dyn LedgerService>, Arc<dyn IndexerService>);
    let (ledger, indexer): Backends = match config.ledger_mode {
        LedgerMode::Algod => (
            Arc::new(AlgodClient::new(&config.algod_server, &config.algod_token)),
            Arc::new(IndexerClient::new(&config.indexer_server, &config.indexer_token)),
        ),
        LedgerMode::Simulated => {
            warn!("LEDGER_MODE=simulated: decisions come from an empty in-memory ledger");
            let sim = SimulatedLedger::new();
            (Arc::new(sim.clone()), Arc::new(sim))
        }
    };

    let listen_addr = config.gate_listen_addr;
    let app_state = transport::http::AppState {
        pass: Arc::new(CampusPass::new(config, ledger, indexer)),
    };

    let cors = CorsLayer::new().allow_origin(Any).allow_methods(Any);
    let app = transport::http::create_router(app_state)
        .merge(
            SwaggerUi::new("/swagger-ui")
                .url("/api-docs/openapi.json", transport::http::ApiDoc::openapi()),
        )
        .layer(cors);
    let listener = tokio::net::TcpListener::bind(listen_addr).await?;
    info!(addr = %listen_addr, "gate server listening");
    info!("Swagger UI available at http://{}/swagger-ui", listen_addr);

    tokio::select! {
        result = axum::serve(listener, app) => {
            result?;
        }
        _ = tokio::signal::ctrl_c() => {
            info!("shutdown signal received");
        }
    }

    Ok(())
}
