/*
 * Responsibility
 * - 環境変数や設定の読み込み (PORT, 検証用シークレット, ストリームの期限など)
 * - 設定値のバリデーション (不足なら起動失敗)
 */
use std::fmt;
use std::net::SocketAddr;
use std::str::FromStr;
use std::time::Duration;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AppEnv {
    Development,
    Production,
}

impl AppEnv {
    pub fn from_env() -> Self {
        Self::parse(&std::env::var("APP_ENV").unwrap_or_else(|_| "development".to_string()))
    }

    fn parse(value: &str) -> Self {
        match value.to_ascii_lowercase().as_str() {
            "production" | "prod" => Self::Production,
            _ => Self::Development,
        }
    }

    pub fn is_production(&self) -> bool {
        matches!(self, Self::Production)
    }
}

#[derive(Debug)]
pub enum ConfigError {
    Missing(&'static str),
    Invalid(&'static str),
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigError::Missing(key) => write!(f, "missing configuration: {}", key),
            ConfigError::Invalid(key) => write!(f, "invalid configuration: {}", key),
        }
    }
}

impl std::error::Error for ConfigError {}

// No Debug: holds the verification secret.
pub struct Config {
    pub addr: SocketAddr,
    pub app_env: AppEnv,

    pub auth_hmac_secret: String,
    pub auth_leeway_seconds: u64,

    pub stream_timeout: Duration,
}

impl Config {
    pub fn from_env() -> Result<Self, ConfigError> {
        dotenvy::dotenv().ok();

        let port: u16 = std::env::var("PORT")
            .ok()
            .and_then(|s| s.parse().ok())
            .unwrap_or(3000);

        let addr: SocketAddr = SocketAddr::from_str(&format!("0.0.0.0:{}", port))
            .map_err(|_| ConfigError::Invalid("PORT"))?;

        let app_env = AppEnv::from_env();

        let auth_hmac_secret = std::env::var("AUTH_HMAC_SECRET")
            .map_err(|_| ConfigError::Missing("AUTH_HMAC_SECRET"))?;
        if auth_hmac_secret.is_empty() {
            return Err(ConfigError::Invalid("AUTH_HMAC_SECRET"));
        }

        let auth_leeway_seconds = std::env::var("AUTH_LEEWAY_SECONDS")
            .ok()
            .and_then(|v| v.parse::<u64>().ok())
            .unwrap_or(60);

        let stream_timeout_seconds = std::env::var("STREAM_TIMEOUT_SECONDS")
            .ok()
            .and_then(|v| v.parse::<u64>().ok())
            .unwrap_or(300);
        if stream_timeout_seconds == 0 {
            return Err(ConfigError::Invalid("STREAM_TIMEOUT_SECONDS"));
        }

        Ok(Self {
            addr,
            app_env,
            auth_hmac_secret,
            auth_leeway_seconds,
            stream_timeout: Duration::from_secs(stream_timeout_seconds),
        })
    }
}
