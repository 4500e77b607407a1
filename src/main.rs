use std::sync::Arc;

use anyhow::Result;
use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

use betcontract_gateway::config::{Config, LedgerBackend};
use betcontract_gateway::eth::{client::bet_contract, contract::BetContractLedger};
use betcontract_gateway::journal::Journal;
use betcontract_gateway::ledger::{Ledger, MemoryLedger};
use betcontract_gateway::state::AppState;
use betcontract_gateway::{app, worker};

#[tokio::main]
async fn main() -> Result<()> {
    // Load env
    dotenvy::dotenv().ok();

    tracing_subscriber::registry()
        .with(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("info,betcontract_gateway=debug")),
        )
        .with(tracing_subscriber::fmt::layer().with_target(true))
        .init();

    let config = Config::from_env()?;

    let ledger = match &config.backend {
        LedgerBackend::Memory { accounts } => {
            tracing::info!("Using in-process ledger with {} funded accounts", accounts.len());
            Ledger::Memory(MemoryLedger::with_accounts(accounts))
        }
        LedgerBackend::Contract(settings) => {
            let (contract, signer) = bet_contract(settings)?;
            tracing::info!(
                "Using BetContract at {:?} on chain {} as {:?}",
                settings.contract_address,
                settings.chain_id,
                signer
            );
            Ledger::Contract(Arc::new(BetContractLedger::new(contract, signer)))
        }
    };

    let journal = Journal::connect(&config.database_url).await?;
    let state = AppState::new(ledger, journal.clone());

    let refresher_state = state.clone();
    let every = config.refresh_interval;
    let session_idle = config.session_idle;

    tokio::spawn(async move {
        worker::run_refresher(refresher_state, every, session_idle).await;
    });

    let listener = tokio::net::TcpListener::bind(config.bind_addr).await?;

    tracing::info!("Server running on {}", config.bind_addr);

    axum::serve(listener, app(state))
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    journal.close().await;
    tracing::info!("Server stopped");

    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!("Failed to listen for shutdown signal: {}", e);
    }
}
