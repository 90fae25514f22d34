/*
 * Responsibility
 * - Load settings from the environment (.env via dotenvy): DATABASE_URL, CORS, token secret, throttle
 * - Validate them once at startup (missing/invalid values abort the process)
 * - A missing or well-known token secret is a warning in development and an error in production
 */
use std::fmt;
use std::net::SocketAddr;
use std::str::FromStr;

/// Placeholder secret shipped in sample `.env` files. Never acceptable in production.
pub const DEFAULT_JWT_SECRET: &str = "default-secret-key-change-in-production";

/// Ten years.
pub const MAX_JWT_TTL_SECONDS: u64 = 10 * 365 * 86_400;
/// One week.
pub const MAX_LOGIN_WINDOW_SECONDS: u64 = 7 * 86_400;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AppEnv {
    Development,
    Production,
}

impl AppEnv {
    fn parse(value: Option<&str>) -> Self {
        match value
            .unwrap_or("development")
            .to_ascii_lowercase()
            .as_str()
        {
            "production" | "prod" => Self::Production,
            _ => Self::Development,
        }
    }

    pub fn is_production(&self) -> bool {
        matches!(self, Self::Production)
    }
}

#[derive(Debug, PartialEq, Eq)]
pub enum ConfigError {
    Missing(&'static str),
    Invalid(&'static str),
    InsecureSecret,
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigError::Missing(key) => write!(f, "missing configuration: {}", key),
            ConfigError::Invalid(key) => write!(f, "invalid configuration: {}", key),
            ConfigError::InsecureSecret => {
                write!(f, "JWT_SECRET is not set or uses the default value")
            }
        }
    }
}

impl std::error::Error for ConfigError {}

pub struct Config {
    pub addr: SocketAddr,
    pub database_url: String,

    pub app_env: AppEnv,
    pub cors_allowed_origins: Vec<String>,

    pub sqids_min_length: usize,
    pub sqids_alphabet: String,

    pub jwt_secret: String,
    pub jwt_ttl_seconds: u64,

    pub valkey_url: Option<String>,
    pub login_max_attempts: u64,
    pub login_window_seconds: u64,
}

impl fmt::Debug for Config {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Config")
            .field("addr", &self.addr)
            .field("app_env", &self.app_env)
            .field("cors_allowed_origins", &self.cors_allowed_origins)
            .field("jwt_secret", &"<redacted>")
            .field("jwt_ttl_seconds", &self.jwt_ttl_seconds)
            .field("valkey", &self.valkey_url.is_some())
            .finish_non_exhaustive()
    }
}

fn parse_or<T: FromStr>(
    get: &impl Fn(&str) -> Option<String>,
    key: &'static str,
    default: T,
) -> Result<T, ConfigError> {
    match get(key) {
        Some(v) if !v.trim().is_empty() => {
            v.trim().parse::<T>().map_err(|_| ConfigError::Invalid(key))
        }
        _ => Ok(default),
    }
}

impl Config {
    pub fn from_env() -> Result<Self, ConfigError> {
        dotenvy::dotenv().ok();
        Self::from_source(|key| std::env::var(key).ok())
    }

    /// Builds the config from any key lookup (the process environment in `from_env`).
    pub fn from_source(get: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let port: u16 = parse_or(&get, "PORT", 3000)?;

        let addr: SocketAddr = SocketAddr::from_str(&format!("0.0.0.0:{}", port))
            .map_err(|_| ConfigError::Invalid("PORT"))?;

        let database_url = get("DATABASE_URL")
            .filter(|v| !v.trim().is_empty())
            .ok_or(ConfigError::Missing("DATABASE_URL"))?;

        let app_env = AppEnv::parse(get("APP_ENV").as_deref());

        let cors_allowed_origins = get("CORS_ALLOWED_ORIGINS")
            .unwrap_or_default()
            .split(',')
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
            .collect::<Vec<_>>();

        for origin in &cors_allowed_origins {
            let parsed =
                url::Url::parse(origin).map_err(|_| ConfigError::Invalid("CORS_ALLOWED_ORIGINS"))?;
            if !matches!(parsed.scheme(), "http" | "https") || parsed.host_str().is_none() {
                return Err(ConfigError::Invalid("CORS_ALLOWED_ORIGINS"));
            }
        }

        let sqids_min_length = parse_or(&get, "SQIDS_MIN_LENGTH", 10usize)?;

        let sqids_alphabet = get("SQIDS_ALPHABET").unwrap_or_else(|| {
            "abcdefghijklmnopqrstuvwxyzABCDEFGHIJKLMNOPQRSTUVWXYZ0123456789".to_string()
        });

        let jwt_secret = match get("JWT_SECRET").filter(|s| !s.is_empty()) {
            Some(s) if s != DEFAULT_JWT_SECRET => s,
            _ if app_env.is_production() => return Err(ConfigError::InsecureSecret),
            other => {
                tracing::warn!(
                    "JWT_SECRET is not set or uses the default value; tokens are forgeable outside development"
                );
                other.unwrap_or_else(|| DEFAULT_JWT_SECRET.to_string())
            }
        };

        let jwt_ttl_seconds = parse_or(&get, "JWT_TTL_SECONDS", 86_400u64)?;
        if jwt_ttl_seconds == 0 || jwt_ttl_seconds > MAX_JWT_TTL_SECONDS {
            return Err(ConfigError::Invalid("JWT_TTL_SECONDS"));
        }

        let valkey_url = get("VALKEY_URL").filter(|s| !s.trim().is_empty());

        let login_max_attempts = parse_or(&get, "LOGIN_MAX_ATTEMPTS", 5u64)?;
        let login_window_seconds = parse_or(&get, "LOGIN_WINDOW_SECONDS", 300u64)?;
        if login_max_attempts == 0 {
            return Err(ConfigError::Invalid("LOGIN_MAX_ATTEMPTS"));
        }
        if login_window_seconds == 0 || login_window_seconds > MAX_LOGIN_WINDOW_SECONDS {
            return Err(ConfigError::Invalid("LOGIN_WINDOW_SECONDS"));
        }

        Ok(Self {
            addr,
            database_url,
            app_env,
            cors_allowed_origins,
            sqids_min_length,
            sqids_alphabet,
            jwt_secret,
            jwt_ttl_seconds,
            valkey_url,
            login_max_attempts,
            login_window_seconds,
        })
    }
}
