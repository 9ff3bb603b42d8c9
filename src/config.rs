use std::env;
use std::fmt;
use std::str::FromStr;

pub const DEFAULT_SESSION_TTL_HOURS: i64 = 24;

/// Server and authentication settings read from the environment.
#[derive(Debug, Clone)]
pub struct Config {
    pub database_url: Option<String>,
    pub server_port: u16,
    pub server_host: String,
    /// Expiry window for sessions, in hours.
    pub session_ttl_hours: i64,
    session_ttl: chrono::Duration,
    /// bcrypt work factor.
    pub bcrypt_cost: u32,
    /// Interval for the background purge of expired sessions. `0` disables it.
    pub session_sweep_secs: u64,
    pub cors_allowed_origin: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConfigError {
    pub key: &'static str,
    pub reason: String,
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "invalid {}: {}", self.key, self.reason)
    }
}

impl std::error::Error for ConfigError {}

impl From<ConfigError> for std::io::Error {
    fn from(error: ConfigError) -> Self {
        std::io::Error::new(std::io::ErrorKind::InvalidInput, error)
    }
}

fn parse_var<T: FromStr>(key: &'static str, default: T) -> Result<T, ConfigError> {
    match env::var(key) {
        Ok(raw) => raw.trim().parse().map_err(|_| ConfigError {
            key,
            reason: format!("cannot parse {:?}", raw),
        }),
        Err(_) => Ok(default),
    }
}

fn optional_var(key: &str) -> Option<String> {
    env::var(key).ok().filter(|value| !value.trim().is_empty())
}

impl Config {
    pub fn from_env() -> Result<Self, ConfigError> {
        let session_ttl_hours = parse_var("SESSION_TTL_HOURS", DEFAULT_SESSION_TTL_HOURS)?;
        if session_ttl_hours <= 0 {
            return Err(ConfigError {
                key: "SESSION_TTL_HOURS",
                reason: "must be greater than zero".into(),
            });
        }

        let session_ttl = chrono::Duration::try_hours(session_ttl_hours).ok_or(ConfigError {
            key: "SESSION_TTL_HOURS",
            reason: "too large".into(),
        })?;

        let bcrypt_cost = parse_var("BCRYPT_COST", bcrypt::DEFAULT_COST)?;
        if !(4..=31).contains(&bcrypt_cost) {
            return Err(ConfigError {
                key: "BCRYPT_COST",
                reason: "must be between 4 and 31".into(),
            });
        }

        Ok(Self {
            database_url: optional_var("DATABASE_URL"),
            server_port: parse_var("SERVER_PORT", 8080)?,
            server_host: optional_var("SERVER_HOST").unwrap_or_else(|| "127.0.0.1".to_string()),
            session_ttl_hours,
            session_ttl,
            bcrypt_cost,
            session_sweep_secs: parse_var("SESSION_SWEEP_SECS", 0)?,
            cors_allowed_origin: optional_var("CORS_ALLOWED_ORIGIN"),
        })
    }

    pub fn server_url(&self) -> String {
        format!("http://{}:{}", self.server_host, self.server_port)
    }

    pub fn session_ttl(&self) -> chrono::Duration {
        self.session_ttl
    }
}
