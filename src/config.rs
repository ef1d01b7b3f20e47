use std::env;
use std::fmt;

/// Default session token lifetime, in days.
const DEFAULT_TOKEN_TTL_DAYS: i64 = 7;

/// Default bcrypt work factor. Tunable via `BCRYPT_COST`; raising it trades
/// login latency for offline brute-force resistance.
const DEFAULT_BCRYPT_COST: u32 = 12;

/// Process-wide configuration, loaded once at startup and injected into the
/// components that need it. The signing secret is required: startup is refused
/// when it is absent rather than falling back to a weak default.
pub struct Config {
    pub database_url: String,
    pub jwt_secret: String,
    pub server_port: u16,
    pub server_host: String,
    pub token_ttl_days: i64,
    pub bcrypt_cost: u32,
}

/// Startup configuration failure. Carries the variable name, never its value.
#[derive(Debug, PartialEq, Eq)]
pub enum ConfigError {
    Missing(&'static str),
    Invalid(&'static str),
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            ConfigError::Missing(var) => write!(f, "required environment variable {} is not set", var),
            ConfigError::Invalid(var) => write!(f, "environment variable {} has an invalid value", var),
        }
    }
}

impl std::error::Error for ConfigError {}

impl Config {
    pub fn from_env() -> Result<Self, ConfigError> {
        let database_url =
            env::var("DATABASE_URL").map_err(|_| ConfigError::Missing("DATABASE_URL"))?;
        let jwt_secret = env::var("JWT_SECRET").map_err(|_| ConfigError::Missing("JWT_SECRET"))?;
        if jwt_secret.trim().is_empty() {
            return Err(ConfigError::Invalid("JWT_SECRET"));
        }

        let server_port = env::var("SERVER_PORT")
            .unwrap_or_else(|_| "8080".to_string())
            .parse()
            .map_err(|_| ConfigError::Invalid("SERVER_PORT"))?;
        let server_host = env::var("SERVER_HOST").unwrap_or_else(|_| "127.0.0.1".to_string());

        let token_ttl_days = env::var("TOKEN_TTL_DAYS")
            .unwrap_or_else(|_| DEFAULT_TOKEN_TTL_DAYS.to_string())
            .parse::<i64>()
            .map_err(|_| ConfigError::Invalid("TOKEN_TTL_DAYS"))?;
        if token_ttl_days <= 0 {
            return Err(ConfigError::Invalid("TOKEN_TTL_DAYS"));
        }

        // bcrypt only accepts costs in 4..=31
        let bcrypt_cost = env::var("BCRYPT_COST")
            .unwrap_or_else(|_| DEFAULT_BCRYPT_COST.to_string())
            .parse::<u32>()
            .map_err(|_| ConfigError::Invalid("BCRYPT_COST"))?;
        if !(4..=31).contains(&bcrypt_cost) {
            return Err(ConfigError::Invalid("BCRYPT_COST"));
        }

        Ok(Self {
            database_url,
            jwt_secret,
            server_port,
            server_host,
            token_ttl_days,
            bcrypt_cost,
        })
    }

    pub fn server_url(&self) -> String {
        format!("http://{}:{}", self.server_host, self.server_port)
    }
}
