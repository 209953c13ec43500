use anyhow::Context;
use std::{net::SocketAddr, time::Duration};

pub struct Config {
    pub listen_addr: SocketAddr,
    pub db_path: String,
    pub cors_allow: Vec<String>,
    pub request_timeout: Duration,
    /// JSON topology list replacing the built-in mother tabs.
    pub topology_file: Option<String>,
}

impl Config {
    pub fn from_env() -> anyhow::Result<Self> {
        dotenvy::dotenv().ok();
        let listen_addr: SocketAddr = std::env::var("GL_LISTEN_ADDR")
            .unwrap_or_else(|_| "127.0.0.1:8088".to_string())
            .parse()
            .context("Invalid GL_LISTEN_ADDR")?;
        let db_path = std::env::var("GL_DB_PATH").unwrap_or_else(|_| "./db/app.db".into());
        let cors_allow = std::env::var("GL_CORS_ALLOW_ORIGINS")
            .unwrap_or_else(|_| "*".into())
            .split(',')
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
            .collect();
        let timeout_ms: u64 = std::env::var("GL_REQUEST_TIMEOUT_MS")
            .unwrap_or_else(|_| "30000".into())
            .parse()
            .unwrap_or(30000);
        let topology_file = std::env::var("GL_TOPOLOGY_FILE")
            .ok()
            .filter(|s| !s.trim().is_empty());
        Ok(Self {
            listen_addr,
            db_path,
            cors_allow,
            request_timeout: Duration::from_millis(timeout_ms),
            topology_file,
        })
    }
}
