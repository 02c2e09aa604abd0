use anyhow::{anyhow, Context, Result};
use dotenvy::dotenv;
use std::net::SocketAddr;

const BYTES_PER_MB: usize = 1024 * 1024;

fn default_bind_addr() -> SocketAddr {
    SocketAddr::from(([127, 0, 0, 1], 3000))
}

fn default_max_upload_size() -> usize {
    // 25 MB in bytes
    25 * BYTES_PER_MB
}

#[derive(Debug, Clone)]
pub struct Config {
    pub bind_addr: SocketAddr,
    pub max_upload_size: usize,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            bind_addr: default_bind_addr(),
            max_upload_size: default_max_upload_size(),
        }
    }
}

/// Parses a `CATALOG_MAX_UPLOAD_MB` value into a byte count.
fn upload_limit_bytes(mb: &str) -> Result<usize> {
    let parsed: usize = mb
        .trim()
        .parse()
        .with_context(|| format!("Invalid CATALOG_MAX_UPLOAD_MB: {}", mb))?;
    parsed
        .checked_mul(BYTES_PER_MB)
        .ok_or_else(|| anyhow!("CATALOG_MAX_UPLOAD_MB is too large: {}", mb))
}

impl Config {
    pub fn new() -> Result<Self> {
        // Load .env file first
        dotenv().ok();

        let mut config = Config::default();

        if let Ok(addr) = std::env::var("CATALOG_BIND_ADDR") {
            config.bind_addr = addr
                .parse()
                .with_context(|| format!("Invalid CATALOG_BIND_ADDR: {}", addr))?;
        }

        if let Ok(mb) = std::env::var("CATALOG_MAX_UPLOAD_MB") {
            config.max_upload_size = upload_limit_bytes(&mb)?;
        }

        Ok(config)
    }
}

pub fn load_config() -> Result<Config> {
    let config = Config::new()?;
    tracing::info!(
        "Loaded config: bind_addr={}, max_upload_size={} bytes",
        config.bind_addr,
        config.max_upload_size
    );
    Ok(config)
}
