//! Process settings, read from the environment once `.env` has been loaded.

use crate::error::SettingsError;
use std::fmt::Display;
use std::net::{IpAddr, Ipv4Addr, SocketAddr};
use std::str::FromStr;
use std::time::Duration;

#[derive(Clone, Debug)]
pub struct Settings {
    pub database_url: String,
    /// PostgreSQL schema holding the tables (`DB_SCHEMA`, default `public`).
    pub db_schema: String,
    pub bind_addr: IpAddr,
    pub port: u16,
    pub db_max_connections: u32,
    pub db_acquire_timeout: Duration,
    pub request_timeout: Duration,
    pub max_in_flight_requests: usize,
    pub body_limit_bytes: usize,
}

impl Settings {
    pub fn from_env() -> Result<Self, SettingsError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build settings from any key lookup (the environment in production, a map in tests).
    pub fn from_lookup<F>(lookup: F) -> Result<Self, SettingsError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let database_url = lookup("DATABASE_URL")
            .or_else(|| lookup("DB_URL"))
            .filter(|s| !s.trim().is_empty())
            .ok_or(SettingsError::Missing("DATABASE_URL"))?;

        Ok(Settings {
            database_url,
            db_schema: lookup("DB_SCHEMA").unwrap_or_else(|| "public".into()),
            bind_addr: parse_or(&lookup, "BIND_ADDR", IpAddr::V4(Ipv4Addr::UNSPECIFIED))?,
            port: parse_or(&lookup, "PORT", 3000)?,
            db_max_connections: positive(parse_or(&lookup, "DB_MAX_CONNECTIONS", 10)?, "DB_MAX_CONNECTIONS")?,
            db_acquire_timeout: Duration::from_secs(parse_or(&lookup, "DB_ACQUIRE_TIMEOUT_SECS", 5)?),
            request_timeout: Duration::from_secs(parse_or(&lookup, "REQUEST_TIMEOUT_SECS", 30)?),
            max_in_flight_requests: positive(
                parse_or(&lookup, "MAX_IN_FLIGHT_REQUESTS", 256)?,
                "MAX_IN_FLIGHT_REQUESTS",
            )?,
            body_limit_bytes: parse_or(&lookup, "BODY_LIMIT_BYTES", 1024 * 1024)?,
        })
    }

    pub fn socket_addr(&self) -> SocketAddr {
        SocketAddr::new(self.bind_addr, self.port)
    }
}

fn parse_or<F, T>(lookup: &F, key: &'static str, default: T) -> Result<T, SettingsError>
where
    F: Fn(&str) -> Option<String>,
    T: FromStr + Display,
    T::Err: Display,
{
    match lookup(key) {
        Some(raw) => raw.trim().parse().map_err(|e: T::Err| SettingsError::Invalid {
            key,
            message: e.to_string(),
        }),
        None => {
            tracing::debug!("{key} not set, using default: {default}");
            Ok(default)
        }
    }
}

fn positive<T: PartialEq + Default>(value: T, key: &'static str) -> Result<T, SettingsError> {
    if value == T::default() {
        return Err(SettingsError::Invalid {
            key,
            message: "must be greater than zero".into(),
        });
    }
    Ok(value)
}
