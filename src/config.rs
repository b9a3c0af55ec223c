//! EWS connection configuration

use crate::error::{Error, Result};
use std::env;

/// Connection settings for the source Exchange server
#[derive(Debug, Clone)]
pub struct ExchangeConfig {
    pub host: String,
    pub port: u16,
    pub username: String,
    pub password: String,
}

impl ExchangeConfig {
    /// Load the configuration from environment variables
    ///
    /// Reads from `.env` file if present. Required variables:
    /// - `EWS_HOST`
    /// - `EWS_USERNAME`
    /// - `EWS_PASSWORD`
    ///
    /// Optional (with defaults):
    /// - `EWS_PORT` (default: `443`, only used by the TLS probe)
    ///
    /// # Errors
    ///
    /// Returns [`Error::Config`] if a required variable is missing or
    /// the port is not a number.
    pub fn from_env() -> Result<Self> {
        dotenvy::dotenv().ok();

        Ok(Self {
            host: env::var("EWS_HOST").map_err(|_| Error::Config("EWS_HOST not set".into()))?,
            port: parse_port(env::var("EWS_PORT").ok().as_deref())?,
            username: env::var("EWS_USERNAME")
                .map_err(|_| Error::Config("EWS_USERNAME not set".into()))?,
            password: env::var("EWS_PASSWORD")
                .map_err(|_| Error::Config("EWS_PASSWORD not set".into()))?,
        })
    }
}

fn parse_port(raw: Option<&str>) -> Result<u16> {
    raw.unwrap_or("443")
        .parse()
        .map_err(|e| Error::Config(format!("Invalid EWS_PORT: {e}")))
}
