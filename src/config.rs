use crate::domain::conversation::ParticipantOrder;
use crate::domain::policy::ReadRule;
use clap::{Args, Parser, ValueEnum};

#[derive(Clone, Debug, Parser)]
#[command(version, about, long_about = None)]
pub struct Config {
    /// Which store backs conversations and messages
    #[arg(long, env = "NEARLINK_STORE", value_enum, default_value_t = StoreBackend::Postgres)]
    pub store: StoreBackend,

    #[command(flatten)]
    pub database: DatabaseConfig,

    #[command(flatten)]
    pub server: ServerConfig,

    #[command(flatten)]
    pub auth: AuthConfig,

    #[command(flatten)]
    pub conversations: ConversationConfig,

    #[command(flatten)]
    pub messaging: MessagingConfig,

    #[command(flatten)]
    pub telemetry: TelemetryConfig,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
pub enum StoreBackend {
    Postgres,
    /// Process-local store, intended for development and tests
    Memory,
}

#[derive(Clone, Debug, Args)]
pub struct DatabaseConfig {
    /// Database connection URL (required for the postgres store)
    #[arg(long = "database-url", env = "NEARLINK_DATABASE_URL")]
    pub url: Option<String>,

    /// Maximum number of pooled connections
    #[arg(long = "db-max-connections", env = "NEARLINK_DB_MAX_CONNECTIONS", default_value_t = 20)]
    pub max_connections: u32,

    /// Minimum number of idle connections kept open
    #[arg(long = "db-min-connections", env = "NEARLINK_DB_MIN_CONNECTIONS", default_value_t = 2)]
    pub min_connections: u32,

    /// Seconds to wait for a free connection before failing
    #[arg(long = "db-acquire-timeout-secs", env = "NEARLINK_DB_ACQUIRE_TIMEOUT_SECS", default_value_t = 5)]
    pub acquire_timeout_secs: u64,
}

#[derive(Clone, Debug, Args)]
pub struct ServerConfig {
    /// Host to listen on
    #[arg(long, env = "NEARLINK_HOST", default_value = "0.0.0.0")]
    pub host: String,

    /// Port for the public API
    #[arg(long, env = "NEARLINK_PORT", default_value_t = 3000)]
    pub port: u16,

    /// Port for health probes
    #[arg(long, env = "NEARLINK_MGMT_PORT", default_value_t = 9090)]
    pub mgmt_port: u16,

    /// Seconds to wait for in-flight requests during shutdown
    #[arg(long, env = "NEARLINK_SHUTDOWN_TIMEOUT_SECS", default_value_t = 10)]
    pub shutdown_timeout_secs: u64,
}

#[derive(Clone, Debug, Args)]
pub struct AuthConfig {
    /// Secret used by the identity platform to sign access tokens
    #[arg(long, env = "NEARLINK_JWT_SECRET")]
    pub jwt_secret: String,
}

#[derive(Clone, Copy, Debug, Args)]
pub struct ConversationConfig {
    /// How participant ids are ordered before conversation lookup and insert
    #[arg(long, env = "NEARLINK_PARTICIPANT_ORDER", value_enum, default_value_t = ParticipantOrder::AsGiven)]
    pub participant_order: ParticipantOrder,

    /// Which participant may mark a message as read
    #[arg(long, env = "NEARLINK_READ_RULE", value_enum, default_value_t = ReadRule::SecondParticipant)]
    pub read_rule: ReadRule,
}

#[derive(Clone, Copy, Debug, Args)]
pub struct MessagingConfig {
    /// Maximum message length in characters, checked by the HTTP layer
    #[arg(long, env = "NEARLINK_MAX_CONTENT_LENGTH", default_value_t = 4000)]
    pub max_content_length: usize,
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, ValueEnum)]
pub enum LogFormat {
    #[default]
    Text,
    Json,
}

#[derive(Clone, Debug, Args)]
pub struct TelemetryConfig {
    /// Log output format
    #[arg(long, env = "NEARLINK_LOG_FORMAT", value_enum, default_value_t = LogFormat::Text)]
    pub log_format: LogFormat,

    /// Default log filter when RUST_LOG is unset
    #[arg(long, env = "NEARLINK_LOG_LEVEL", default_value = "info")]
    pub log_level: String,

    /// OTLP collector endpoint; traces and metrics are exported only when set
    #[arg(long, env = "NEARLINK_OTLP_ENDPOINT")]
    pub otlp_endpoint: Option<String>,
}

impl Config {
    #[must_use]
    pub fn load() -> Self {
        Self::parse()
    }
}
