//! Environment-driven configuration.
//!
//! Values are read from the process environment, with `.env` files loaded
//! via dotenvy when present. `DATABASE_URL` is required; everything else
//! has a default.

use std::path::PathBuf;

use quillbox_core::{defaults, Error, Result};

use crate::pool::PoolConfig;

/// Runtime configuration for the database layer.
#[derive(Debug, Clone)]
pub struct Config {
    /// PostgreSQL connection URL (`DATABASE_URL`).
    pub database_url: String,
    /// Base directory for stored file content (`QUILLBOX_STORAGE_PATH`).
    pub storage_path: PathBuf,
    /// Connection pool sizing (`QUILLBOX_POOL_MAX`).
    pub pool: PoolConfig,
    /// Update bus buffer capacity (`QUILLBOX_BUS_CAPACITY`).
    pub bus_capacity: usize,
}

impl Config {
    /// Load configuration from the environment.
    ///
    /// # Errors
    ///
    /// Returns `Error::Config` when `DATABASE_URL` is missing or a numeric
    /// variable fails to parse.
    pub fn from_env() -> Result<Self> {
        dotenvy::dotenv().ok();

        let database_url = std::env::var("DATABASE_URL")
            .map_err(|_| Error::Config("DATABASE_URL is not set".to_string()))?;

        let storage_path = std::env::var("QUILLBOX_STORAGE_PATH")
            .unwrap_or_else(|_| defaults::STORAGE_PATH.to_string())
            .into();

        let mut pool = PoolConfig::default();
        if let Ok(raw) = std::env::var("QUILLBOX_POOL_MAX") {
            let max = raw
                .parse::<u32>()
                .map_err(|_| Error::Config(format!("QUILLBOX_POOL_MAX is not a number: {raw}")))?;
            pool = pool.max_connections(max);
        }

        let bus_capacity = match std::env::var("QUILLBOX_BUS_CAPACITY") {
            Ok(raw) => raw.parse::<usize>().map_err(|_| {
                Error::Config(format!("QUILLBOX_BUS_CAPACITY is not a number: {raw}"))
            })?,
            Err(_) => defaults::BUS_CAPACITY,
        };

        Ok(Self {
            database_url,
            storage_path,
            pool,
            bus_capacity,
        })
    }
}
