/// Configuration management for the API server
///
/// Configuration comes from environment variables (a `.env` file is loaded
/// first when present).
///
/// # Environment Variables
///
/// - `API_HOST`: Host to bind to (default: 0.0.0.0)
/// - `API_PORT`: Port to bind to (default: 10000)
/// - `API_PRODUCTION`: Enables HSTS and strict CORS (default: false)
/// - `CORS_ORIGINS`: Comma-separated origins, `*` for any (default: `*`)
/// - `DATABASE_URL`: PostgreSQL connection string (required)
/// - `DATABASE_MAX_CONNECTIONS`: Pool size (default: 10)
/// - `JWT_SECRET`: Secret key for JWT signing, at least 32 characters (required)
/// - `ADMIN_EMAILS`: Comma-separated emails that register as administrators
/// - `ACCRUAL_RATE_PER_HOUR`: Balance units per hour of use (default: 1.0)
/// - `ACCRUAL_INTERVAL_SECS`: Seconds between credits (default: 2)
/// - `ACCRUAL_MAX_TICKS`: Credits per session at most (default: 30)
/// - `RUST_LOG`: Log filter
///
/// # Example
///
/// ```no_run
/// use gymtrack_api::config::Config;
///
/// # fn example() -> anyhow::Result<()> {
/// let config = Config::from_env()?;
/// println!("Server will listen on {}", config.bind_address());
/// # Ok(())
/// # }
/// ```

use gymtrack_shared::models::user::normalize_email;
use gymtrack_worker::accrual::AccrualPolicy;
use serde::{Deserialize, Serialize};
use std::env;
use std::str::FromStr;
use std::time::Duration;

/// Complete application configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    pub api: ApiConfig,
    pub database: DatabaseConfig,
    pub jwt: JwtConfig,
    pub admin: AdminConfig,
    pub accrual: AccrualConfig,
}

/// API server configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiConfig {
    pub host: String,
    pub port: u16,

    /// Production mode: HSTS header, no permissive CORS fallback
    pub production: bool,

    /// Allowed CORS origins, `*` allows any
    pub cors_origins: Vec<String>,
}

/// Database configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DatabaseConfig {
    pub url: String,
    pub max_connections: u32,
}

/// JWT configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JwtConfig {
    /// Signing secret. Generate with: `openssl rand -hex 32`
    pub secret: String,
}

/// Who becomes an administrator
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AdminConfig {
    /// Normalized (lowercased, trimmed) emails
    pub emails: Vec<String>,
}

impl AdminConfig {
    pub fn is_admin_email(&self, email: &str) -> bool {
        let email = normalize_email(email);
        self.emails.iter().any(|e| *e == email)
    }
}

/// Balance accrual settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AccrualConfig {
    pub rate_per_hour: f64,
    pub interval_secs: u64,
    pub max_ticks: u32,
}

impl AccrualConfig {
    pub fn policy(&self) -> AccrualPolicy {
        AccrualPolicy {
            rate_per_hour: self.rate_per_hour,
            interval: Duration::from_secs(self.interval_secs),
            max_ticks: self.max_ticks,
        }
    }
}

fn parse_or<T>(lookup: &impl Fn(&str) -> Option<String>, key: &str, default: T) -> anyhow::Result<T>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    match lookup(key) {
        Some(raw) => raw
            .trim()
            .parse::<T>()
            .map_err(|e| anyhow::anyhow!("{} has an invalid value {:?}: {}", key, raw, e)),
        None => Ok(default),
    }
}

fn split_list(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(String::from)
        .collect()
}

impl Config {
    /// Loads configuration from the process environment
    ///
    /// # Errors
    ///
    /// Returns an error if a required variable is missing or a value does not
    /// parse.
    pub fn from_env() -> anyhow::Result<Self> {
        dotenvy::dotenv().ok();

        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Loads configuration through an arbitrary key lookup
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> anyhow::Result<Self> {
        let host = lookup("API_HOST").unwrap_or_else(|| "0.0.0.0".to_string());
        let port = parse_or(&lookup, "API_PORT", 10000_u16)?;
        let production = parse_or(&lookup, "API_PRODUCTION", false)?;
        let cors_origins = split_list(&lookup("CORS_ORIGINS").unwrap_or_else(|| "*".to_string()));

        let database_url = lookup("DATABASE_URL")
            .ok_or_else(|| anyhow::anyhow!("DATABASE_URL environment variable is required"))?;
        let max_connections = parse_or(&lookup, "DATABASE_MAX_CONNECTIONS", 10_u32)?;

        let jwt_secret = lookup("JWT_SECRET")
            .ok_or_else(|| anyhow::anyhow!("JWT_SECRET environment variable is required"))?;
        if jwt_secret.len() < 32 {
            anyhow::bail!("JWT_SECRET must be at least 32 characters long");
        }

        let admin_emails = split_list(&lookup("ADMIN_EMAILS").unwrap_or_default())
            .iter()
            .map(|e| normalize_email(e))
            .collect();

        let accrual = AccrualConfig {
            rate_per_hour: parse_or(&lookup, "ACCRUAL_RATE_PER_HOUR", 1.0_f64)?,
            interval_secs: parse_or(&lookup, "ACCRUAL_INTERVAL_SECS", 2_u64)?,
            max_ticks: parse_or(&lookup, "ACCRUAL_MAX_TICKS", 30_u32)?,
        };
        if !(accrual.rate_per_hour.is_finite() && accrual.rate_per_hour >= 0.0) {
            anyhow::bail!("ACCRUAL_RATE_PER_HOUR must be a non-negative number");
        }
        if accrual.interval_secs == 0 {
            anyhow::bail!("ACCRUAL_INTERVAL_SECS must be at least 1");
        }

        Ok(Self {
            api: ApiConfig {
                host,
                port,
                production,
                cors_origins,
            },
            database: DatabaseConfig {
                url: database_url,
                max_connections,
            },
            jwt: JwtConfig { secret: jwt_secret },
            admin: AdminConfig {
                emails: admin_emails,
            },
            accrual,
        })
    }

    /// Returns the server bind address
    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.api.host, self.api.port)
    }
}
