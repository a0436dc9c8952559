//! CLI argument definitions for the currex binary.

use std::path::PathBuf;

use clap::{Parser, Subcommand, ValueEnum};

/// Storage backend type
#[derive(Debug, Clone, Copy, ValueEnum)]
pub enum Backend {
    /// SQLite database (default, production-ready)
    Sqlite,
    /// PostgreSQL database
    Postgres,
    /// In-memory with JSON persistence (for development and ephemeral deployments)
    Inmemory,
}

/// Output format for commands that print data
#[derive(Debug, Clone, Copy, Default, ValueEnum)]
pub enum Format {
    #[default]
    Human,
    Json,
}

/// Currency converter behind a login
#[derive(Parser, Debug)]
#[command(name = "currex")]
#[command(about = "currex: account-gated currency converter")]
#[command(version)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Option<Commands>,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Run the web server
    Serve(ServeArgs),
    /// Check health of a running currex server
    Health(HealthArgs),
    /// Show backend and user count
    Info(InfoArgs),
    /// Inspect registered users
    #[command(subcommand)]
    Users(UsersCommand),
}

#[derive(Subcommand, Debug)]
pub enum UsersCommand {
    /// List registered users
    List(UsersListArgs),
}

/// Where credentials are stored
#[derive(clap::Args, Debug, Clone)]
pub struct BackendConfig {
    /// Storage backend to use
    #[arg(short, long, default_value = "sqlite", env = "CURREX_BACKEND")]
    pub backend: Backend,

    /// Data directory for storage files.
    /// For SQLite: stores users.db
    /// For InMemory: stores users.json
    #[arg(short = 'D', long, env = "CURREX_DATA_DIR")]
    pub data_dir: Option<PathBuf>,

    /// PostgreSQL connection URL (required when backend=postgres)
    #[arg(long, env = "CURREX_POSTGRES_URL")]
    pub postgres_url: Option<String>,
}

/// Arguments for the serve command
#[derive(clap::Args, Debug)]
pub struct ServeArgs {
    /// Port to listen on
    #[arg(short, long, default_value_t = 3000, env = "CURREX_PORT")]
    pub port: u16,

    /// Bind address
    #[arg(long, default_value = "0.0.0.0", env = "CURREX_HOST")]
    pub host: String,

    #[command(flatten)]
    pub backend_config: BackendConfig,

    /// Secret used to sign session cookies
    #[arg(long, env = "CURREX_SECRET_KEY", hide_env_values = true)]
    pub secret_key: Option<String>,

    /// Session lifetime in seconds
    #[arg(long, default_value_t = 86_400, env = "CURREX_SESSION_TTL_SECS")]
    pub session_ttl_secs: u64,

    /// Mark cookies Secure (serve behind HTTPS)
    #[arg(long, env = "CURREX_SECURE_COOKIES")]
    pub secure_cookies: bool,
}

/// Arguments for the health command
#[derive(clap::Args, Debug)]
pub struct HealthArgs {
    /// Base URL of the server to check
    #[arg(long, default_value = "http://127.0.0.1:3000", env = "CURREX_URL")]
    pub url: String,

    /// Timeout in seconds
    #[arg(short, long, default_value_t = 5)]
    pub timeout: u64,

    #[arg(long, value_enum, default_value_t)]
    pub format: Format,
}

/// Arguments for the info command
#[derive(clap::Args, Debug)]
pub struct InfoArgs {
    #[command(flatten)]
    pub backend_config: BackendConfig,

    #[arg(long, value_enum, default_value_t)]
    pub format: Format,
}

/// Arguments for `users list`
#[derive(clap::Args, Debug)]
pub struct UsersListArgs {
    #[command(flatten)]
    pub backend_config: BackendConfig,

    #[arg(long, value_enum, default_value_t)]
    pub format: Format,
}
