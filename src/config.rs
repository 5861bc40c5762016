use std::{env, fmt::Display, str::FromStr};

use log::{info, warn};
use thiserror::Error;

use crate::services::pricing_service::PricingPolicy;

const HOST: &str = "0.0.0.0";
const PORT: &str = "5002";
const DATABASE: &str = "EventBooking";
const TOKEN_TTL_HOURS: &str = "168";
const ADMIN_EMAIL: &str = "admin@event.com";
const CORS_ORIGIN: &str = "http://localhost:3000";

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("{0} must be set")]
    Missing(&'static str),

    #[error("Invalid {key} value: {reason}")]
    Invalid { key: &'static str, reason: String },
}

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub host: String,
    pub port: u16,
    pub mongo_uri: String,
    pub database: String,
    pub jwt_secret: String,
    pub token_ttl_hours: i64,
    pub admin_email: String,
    /// Seeds the administrator account at startup when present.
    pub admin_password: Option<String>,
    pub cors_origin: String,
    pub pricing_policy: PricingPolicy,
}

impl AppConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        Ok(Self {
            host: try_load("HOST", HOST)?,
            port: try_load("PORT", PORT)?,
            mongo_uri: require("MONGODB_URI")?,
            database: try_load("MONGODB_DATABASE", DATABASE)?,
            jwt_secret: require("JWT_SECRET")?,
            token_ttl_hours: try_load("TOKEN_TTL_HOURS", TOKEN_TTL_HOURS)?,
            admin_email: try_load("ADMIN_EMAIL", ADMIN_EMAIL)?,
            admin_password: var("ADMIN_PASSWORD").filter(|p| !p.is_empty()),
            cors_origin: try_load("CORS_ORIGIN", CORS_ORIGIN)?,
            pricing_policy: try_load("PRICING_POLICY", "selection")?,
        })
    }
}

fn var(key: &str) -> Option<String> {
    env::var(key).ok()
}

fn require(key: &'static str) -> Result<String, ConfigError> {
    var(key)
        .filter(|value| !value.is_empty())
        .ok_or(ConfigError::Missing(key))
}

fn try_load<T: FromStr>(key: &'static str, default: &str) -> Result<T, ConfigError>
where
    T::Err: Display,
{
    let raw = var(key).unwrap_or_else(|| {
        info!("{key} not set, using default: {default}");
        default.to_string()
    });

    raw.parse().map_err(|e: T::Err| {
        warn!("Invalid {key} value: {e}");
        ConfigError::Invalid {
            key,
            reason: e.to_string(),
        }
    })
}
