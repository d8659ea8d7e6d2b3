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

pub mod adapters;
pub mod api;
pub mod config;
pub mod domain;
pub mod error;
pub mod services;
pub mod telemetry;

use crate::api::{AppState, MgmtState};
use crate::config::Config;
use crate::services::chat_store::ChatStore;
use crate::services::conversation_service::ConversationService;
use crate::services::health_service::HealthService;
use crate::services::message_service::MessageService;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::watch;

/// Wired services sharing one store handle.
#[derive(Debug, Clone)]
pub struct App {
    pub conversation_service: ConversationService,
    pub message_service: MessageService,
    pub health_service: HealthService,
}

impl App {
    #[must_use]
    pub fn new(config: &Config, store: Arc<dyn ChatStore>) -> Self {
        Self {
            conversation_service: ConversationService::new(Arc::clone(&store), config.conversations),
            message_service: MessageService::new(Arc::clone(&store), config.conversations.read_rule),
            health_service: HealthService::new(
                store,
                Duration::from_secs(config.database.acquire_timeout_secs.max(1)),
            ),
        }
    }

    #[must_use]
    pub fn app_state(&self, config: Config) -> AppState {
        AppState {
            config,
            conversation_service: self.conversation_service.clone(),
            message_service: self.message_service.clone(),
        }
    }

    #[must_use]
    pub fn mgmt_state(&self) -> MgmtState {
        MgmtState { health_service: self.health_service.clone() }
    }
}

/// Flips the shutdown channel on SIGINT or SIGTERM.
pub fn spawn_signal_handler(shutdown_tx: watch::Sender<bool>) {
    tokio::spawn(async move {
        let ctrl_c = async {
            if let Err(e) = tokio::signal::ctrl_c().await {
                tracing::error!(error = %e, "Failed to listen for Ctrl+C");
            }
        };

        #[cfg(unix)]
        let terminate = async {
            match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
                Ok(mut signal) => {
                    signal.recv().await;
                }
                Err(e) => tracing::error!(error = %e, "Failed to listen for SIGTERM"),
            }
        };

        #[cfg(not(unix))]
        let terminate = std::future::pending::<()>();

        tokio::select! {
            () = ctrl_c => {},
            () = terminate => {},
        }

        tracing::info!("Shutdown signal received");
        let _ = shutdown_tx.send(true);
    });
}
