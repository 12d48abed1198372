use std::env;
use std::net::SocketAddr;

use anyhow::Context;

const DEV_SECRET: &str = "dev-secret-change-me-at-least-32-characters";

/// Runtime settings, read once at startup after `.env` was loaded.
#[derive(Debug, Clone)]
pub struct Config {
    pub database_url: String,
    pub secret_key: String,
    pub bind_addr: SocketAddr,
}

impl Config {
    pub fn from_env() -> anyhow::Result<Self> {
        let database_url =
            env::var("DATABASE_URL").unwrap_or_else(|_| "sqlite://planner.db".to_string());

        let secret_key = match env::var("SECRET_KEY") {
            Ok(secret) if !secret.is_empty() => secret,
            _ => {
                tracing::warn!("SECRET_KEY not set, using the development secret");
                DEV_SECRET.to_string()
            }
        };

        let bind_addr = env::var("BIND_ADDR")
            .unwrap_or_else(|_| "0.0.0.0:8000".to_string())
            .parse()
            .context("BIND_ADDR must be a socket address such as 0.0.0.0:8000")?;

        Ok(Self {
            database_url,
            secret_key,
            bind_addr,
        })
    }
}
