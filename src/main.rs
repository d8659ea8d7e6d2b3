#![forbid(unsafe_code)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![warn(clippy::nursery)]
#![warn(clippy::unwrap_used)]
#![warn(clippy::todo)]
#![warn(clippy::panic)]
#![warn(clippy::dbg_macro)]
#![warn(clippy::print_stdout)]
#![warn(clippy::print_stderr)]
#![warn(clippy::clone_on_ref_ptr)]
#![warn(unreachable_pub)]
#![warn(missing_debug_implementations)]
#![warn(unused_qualifications)]
#![deny(unused_must_use)]

use anyhow::Context;
use nearlink_chat::adapters::database::{self, pg_store::PgChatStore};
use nearlink_chat::adapters::memory::MemoryChatStore;
use nearlink_chat::config::{Config, StoreBackend};
use nearlink_chat::services::chat_store::ChatStore;
use nearlink_chat::{App, api, telemetry};
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::sync::watch;
use tracing::Instrument;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config = Config::load();
    let telemetry_guard = telemetry::init_telemetry(&config.telemetry)?;

    let boot_span = tracing::info_span!("boot_server");
    let (api_listener, mgmt_listener, app) = async {
        let store: Arc<dyn ChatStore> = match config.store {
            StoreBackend::Postgres => {
                let url = config.database.url.as_deref().context("--database-url is required for the postgres store")?;
                let pool = database::init_pool(&config.database, url).await?;
                database::run_migrations(&pool).await?;
                Arc::new(PgChatStore::new(pool, config.conversations.read_rule))
            }
            StoreBackend::Memory => {
                tracing::warn!("Using the in-memory store; data is lost on restart");
                Arc::new(MemoryChatStore::new(config.conversations.read_rule))
            }
        };

        let app = App::new(&config, store);

        let api_addr: SocketAddr = format!("{}:{}", config.server.host, config.server.port).parse()?;
        let mgmt_addr: SocketAddr = format!("{}:{}", config.server.host, config.server.mgmt_port).parse()?;

        tracing::info!(address = %api_addr, "listening");
        tracing::info!(address = %mgmt_addr, "management server listening");

        let api_listener = tokio::net::TcpListener::bind(api_addr).await?;
        let mgmt_listener = tokio::net::TcpListener::bind(mgmt_addr).await?;

        Ok::<_, anyhow::Error>((api_listener, mgmt_listener, app))
    }
    .instrument(boot_span)
    .await?;

    let (shutdown_tx, shutdown_rx) = watch::channel(false);
    nearlink_chat::spawn_signal_handler(shutdown_tx);

    let app_router = api::app_router(app.app_state(config.clone()));
    let mgmt_router = api::mgmt_router(app.mgmt_state());

    let mut api_rx = shutdown_rx.clone();
    let api_server = axum::serve(api_listener, app_router).with_graceful_shutdown(async move {
        let _ = api_rx.wait_for(|&s| s).await;
    });

    let mut mgmt_rx = shutdown_rx.clone();
    let mgmt_server = axum::serve(mgmt_listener, mgmt_router).with_graceful_shutdown(async move {
        let _ = mgmt_rx.wait_for(|&s| s).await;
    });

    let servers = async { tokio::try_join!(api_server.into_future(), mgmt_server.into_future()) };
    let mut drain_rx = shutdown_rx;
    let drain_deadline = async move {
        let _ = drain_rx.wait_for(|&s| s).await;
        tokio::time::sleep(std::time::Duration::from_secs(config.server.shutdown_timeout_secs)).await;
    };

    tokio::select! {
        result = servers => {
            if let Err(e) = result {
                tracing::error!(error = %e, "Server error");
            }
        }
        () = drain_deadline => {
            tracing::warn!("Timeout waiting for in-flight requests to finish");
        }
    }

    telemetry_guard.shutdown();
    Ok(())
}
