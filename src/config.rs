use anyhow::{Context, Result};
use std::env;
use std::str::FromStr;

const DEFAULT_LOCATIONS: &str = "Mitte,Spandau,Steglitz,Neukölln,Charlottenburg";

#[derive(Clone, Debug)]
pub struct Config {
    pub database_url: String,
    pub jwt_secret: String,
    pub server_addr: String,
    pub access_token_ttl: usize,

    // Pool
    pub db_max_connections: u32,
    pub db_connect_timeout_secs: u64,

    // Rate limiting
    pub rate_login_per_min: u32,
    pub rate_signup_per_min: u32,
    pub rate_checkin_per_min: u32,

    /// Locations offered on the dashboard. Check-in itself accepts free text.
    pub locations: Vec<String>,

    pub log_level: String,
    pub log_dir: String,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        Ok(Self {
            database_url: required("DATABASE_URL")?,
            jwt_secret: required("JWT_SECRET")?,
            server_addr: env::var("SERVER_ADDR").unwrap_or_else(|_| "0.0.0.0:5000".to_string()),
            access_token_ttl: parsed("ACCESS_TOKEN_TTL", 43_200)?, // 12h, one working day

            db_max_connections: parsed("DB_MAX_CONNECTIONS", 10)?,
            db_connect_timeout_secs: parsed("DB_CONNECT_TIMEOUT", 20)?,

            rate_login_per_min: parsed("RATE_LOGIN_PER_MIN", 60)?,
            rate_signup_per_min: parsed("RATE_SIGNUP_PER_MIN", 30)?,
            rate_checkin_per_min: parsed("RATE_CHECKIN_PER_MIN", 120)?,

            locations: split_locations(
                &env::var("LOCATIONS").unwrap_or_else(|_| DEFAULT_LOCATIONS.to_string()),
            ),

            log_level: env::var("LOG_LEVEL").unwrap_or_else(|_| "debug".to_string()),
            log_dir: env::var("LOG_DIR").unwrap_or_else(|_| "logs".to_string()),
        })
    }

    pub fn tracing_level(&self) -> tracing::Level {
        self.log_level.parse().unwrap_or(tracing::Level::DEBUG)
    }
}

fn required(key: &str) -> Result<String> {
    env::var(key).with_context(|| format!("{key} must be set"))
}

fn parsed<T>(key: &str, default: T) -> Result<T>
where
    T: FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    match env::var(key) {
        Ok(raw) => parse_value(key, &raw),
        Err(_) => Ok(default),
    }
}

fn parse_value<T>(key: &str, raw: &str) -> Result<T>
where
    T: FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    raw.trim()
        .parse()
        .with_context(|| format!("{key} has an invalid value: {raw:?}"))
}

fn split_locations(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(str::trim)
        .filter(|l| !l.is_empty())
        .map(String::from)
        .collect()
}

#[cfg(test)]
impl Config {
    pub fn for_tests() -> Self {
        Self {
            database_url: "mysql://unused".to_string(),
            jwt_secret: "test-secret".to_string(),
            server_addr: "127.0.0.1:0".to_string(),
            access_token_ttl: 3600,
            db_max_connections: 1,
            db_connect_timeout_secs: 1,
            rate_login_per_min: 1000,
            rate_signup_per_min: 1000,
            rate_checkin_per_min: 1000,
            locations: split_locations(DEFAULT_LOCATIONS),
            log_level: "debug".to_string(),
            log_dir: "logs".to_string(),
        }
    }
}
