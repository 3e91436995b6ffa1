//! Runtime configuration from command-line flags and environment variables.

use clap::Parser;
use std::net::{IpAddr, SocketAddr};
use std::path::PathBuf;

/// Server configuration. Every flag can also be set through the environment.
#[derive(Debug, Clone, Parser)]
#[command(name = "pr-reviewer", version, about = "Pull request reviewer assignment service")]
pub struct Config {
    /// Path to the SQLite database file.
    #[arg(long, env = "DB_PATH", default_value = "pr-reviewer.db")]
    pub database_path: PathBuf,

    /// Maximum number of pooled database connections.
    #[arg(
        long,
        env = "DB_MAX_CONNECTIONS",
        default_value_t = 5,
        value_parser = clap::value_parser!(u32).range(1..)
    )]
    pub db_max_connections: u32,

    /// Interface to bind the HTTP server to.
    #[arg(long, env = "SERVER_HOST", default_value = "0.0.0.0")]
    pub host: IpAddr,

    /// TCP port for the HTTP server (0 picks a free port).
    #[arg(long, env = "SERVER_PORT", default_value_t = 8080)]
    pub port: u16,

    /// Log filter used when RUST_LOG is unset (e.g. "info", "pr_reviewer=debug").
    #[arg(long, env = "LOG_LEVEL", default_value = "info")]
    pub log_level: String,
}

impl Config {
    /// Socket address the server listens on.
    pub fn bind_addr(&self) -> SocketAddr {
        SocketAddr::new(self.host, self.port)
    }
}
