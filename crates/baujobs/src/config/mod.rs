use std::env;
use std::fmt;
use std::net::{IpAddr, SocketAddr};
use std::path::PathBuf;
use std::str::FromStr;

/// Distinguishes runtime behavior for different stages of the service.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AppEnvironment {
    Development,
    Test,
    Production,
}

impl AppEnvironment {
    fn from_str(value: &str) -> Self {
        match value.trim().to_ascii_lowercase().as_str() {
            "prod" | "production" => Self::Production,
            "test" | "ci" => Self::Test,
            _ => Self::Development,
        }
    }
}

const DEVELOPMENT_JWT_SECRET: &str = "baujobs-development-secret";

/// Top-level configuration for the application.
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub environment: AppEnvironment,
    pub server: ServerConfig,
    pub telemetry: TelemetryConfig,
    pub database: DatabaseConfig,
    pub auth: AuthConfig,
    pub payments: PaymentConfig,
    pub storage: StorageConfig,
    pub mail: MailConfig,
}

impl AppConfig {
    pub fn load() -> Result<Self, ConfigError> {
        dotenvy::dotenv().ok();

        let environment = AppEnvironment::from_str(
            &env::var("APP_ENV").unwrap_or_else(|_| "development".to_string()),
        );

        let host = env::var("APP_HOST").unwrap_or_else(|_| "127.0.0.1".to_string());
        let port = env::var("APP_PORT")
            .unwrap_or_else(|_| "10000".to_string())
            .parse::<u16>()
            .map_err(|_| ConfigError::InvalidPort)?;
        let cors_origins = env::var("CORS_ORIGINS")
            .map(|raw| split_list(&raw))
            .unwrap_or_else(|_| vec!["http://localhost:3000".to_string()]);

        let log_level = env::var("APP_LOG_LEVEL").unwrap_or_else(|_| "info".to_string());

        let database = DatabaseConfig {
            uri: optional("MONGODB_URI"),
            name: env::var("MONGODB_DATABASE").unwrap_or_else(|_| "baujobs".to_string()),
        };

        let jwt_secret = match optional("JWT_SECRET") {
            Some(secret) => secret,
            None if environment == AppEnvironment::Production => {
                return Err(ConfigError::MissingVar("JWT_SECRET"))
            }
            None => DEVELOPMENT_JWT_SECRET.to_string(),
        };
        let auth = AuthConfig {
            jwt_secret,
            session_ttl_hours: parse_or("SESSION_TTL_HOURS", 24)?,
        };

        let payments = PaymentConfig {
            stripe_secret_key: optional("STRIPE_SECRET_KEY"),
            webhook_secret: optional("STRIPE_WEBHOOK_SECRET"),
            api_base: env::var("STRIPE_API_BASE")
                .unwrap_or_else(|_| "https://api.stripe.com".to_string()),
            amount_cents: parse_or("PAYMENT_AMOUNT_CENTS", 1000)?,
            currency: env::var("PAYMENT_CURRENCY").unwrap_or_else(|_| "chf".to_string()),
        };

        let public_base_url = env::var("PUBLIC_BASE_URL")
            .unwrap_or_else(|_| format!("http://localhost:{port}"));
        let backend = match env::var("STORAGE_BACKEND")
            .unwrap_or_else(|_| "local".to_string())
            .trim()
            .to_ascii_lowercase()
            .as_str()
        {
            "local" => StorageBackend::Local {
                directory: PathBuf::from(
                    env::var("UPLOAD_DIR").unwrap_or_else(|_| "uploads".to_string()),
                ),
            },
            "s3" => StorageBackend::S3(S3Config {
                bucket: required("S3_BUCKET")?,
                region: env::var("S3_REGION").unwrap_or_else(|_| "eu-central-2".to_string()),
                endpoint: optional("S3_ENDPOINT"),
                access_key_id: required("S3_ACCESS_KEY_ID")?,
                secret_access_key: required("S3_SECRET_ACCESS_KEY")?,
                presign_ttl_secs: parse_or("S3_PRESIGN_TTL_SECS", 900)?,
            }),
            other => return Err(ConfigError::InvalidStorageBackend(other.to_string())),
        };
        let storage = StorageConfig {
            backend,
            public_base_url,
            max_upload_bytes: parse_or("MAX_UPLOAD_BYTES", 5 * 1024 * 1024)?,
        };

        let mail = MailConfig {
            smtp_host: optional("SMTP_HOST"),
            smtp_port: parse_or("SMTP_PORT", 587)?,
            smtp_user: optional("SMTP_USER"),
            smtp_pass: optional("SMTP_PASS"),
            from_address: env::var("SMTP_FROM")
                .unwrap_or_else(|_| "noreply@baujobs.ch".to_string()),
            frontend_url: env::var("FRONTEND_URL")
                .unwrap_or_else(|_| "http://localhost:3000".to_string()),
        };

        Ok(Self {
            environment,
            server: ServerConfig {
                host,
                port,
                cors_origins,
            },
            telemetry: TelemetryConfig { log_level },
            database,
            auth,
            payments,
            storage,
            mail,
        })
    }
}

fn optional(key: &str) -> Option<String> {
    env::var(key)
        .ok()
        .map(|value| value.trim().to_string())
        .filter(|value| !value.is_empty())
}

fn required(key: &'static str) -> Result<String, ConfigError> {
    optional(key).ok_or(ConfigError::MissingVar(key))
}

fn parse_or<T: FromStr>(key: &'static str, default: T) -> Result<T, ConfigError> {
    match optional(key) {
        Some(raw) => raw.parse().map_err(|_| ConfigError::InvalidNumber(key)),
        None => Ok(default),
    }
}

fn split_list(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(str::trim)
        .filter(|item| !item.is_empty())
        .map(str::to_string)
        .collect()
}

/// Settings controlling the HTTP server binding.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    pub cors_origins: Vec<String>,
}

impl ServerConfig {
    pub fn socket_addr(&self) -> Result<SocketAddr, ConfigError> {
        if self.host.eq_ignore_ascii_case("localhost") {
            return Ok(SocketAddr::new(IpAddr::from([127, 0, 0, 1]), self.port));
        }

        let ip: IpAddr = self
            .host
            .parse()
            .map_err(|source| ConfigError::InvalidHost { source })?;

        Ok(SocketAddr::new(ip, self.port))
    }
}

/// Tracing and metrics controls.
#[derive(Debug, Clone)]
pub struct TelemetryConfig {
    pub log_level: String,
}

/// Document store connection. Without a URI the service runs on in-memory stores.
#[derive(Debug, Clone)]
pub struct DatabaseConfig {
    pub uri: Option<String>,
    pub name: String,
}

#[derive(Debug, Clone)]
pub struct AuthConfig {
    pub jwt_secret: String,
    pub session_ttl_hours: i64,
}

#[derive(Debug, Clone)]
pub struct PaymentConfig {
    pub stripe_secret_key: Option<String>,
    pub webhook_secret: Option<String>,
    pub api_base: String,
    pub amount_cents: u64,
    pub currency: String,
}

#[derive(Debug, Clone)]
pub struct StorageConfig {
    pub backend: StorageBackend,
    /// Base URL under which locally stored files are reachable.
    pub public_base_url: String,
    pub max_upload_bytes: usize,
}

#[derive(Debug, Clone)]
pub enum StorageBackend {
    Local { directory: PathBuf },
    S3(S3Config),
}

#[derive(Debug, Clone)]
pub struct S3Config {
    pub bucket: String,
    pub region: String,
    pub endpoint: Option<String>,
    pub access_key_id: String,
    pub secret_access_key: String,
    pub presign_ttl_secs: u64,
}

#[derive(Debug, Clone)]
pub struct MailConfig {
    pub smtp_host: Option<String>,
    pub smtp_port: u16,
    pub smtp_user: Option<String>,
    pub smtp_pass: Option<String>,
    pub from_address: String,
    pub frontend_url: String,
}

#[derive(Debug)]
pub enum ConfigError {
    InvalidPort,
    InvalidHost { source: std::net::AddrParseError },
    MissingVar(&'static str),
    InvalidNumber(&'static str),
    InvalidStorageBackend(String),
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigError::InvalidPort => write!(f, "APP_PORT must be a valid u16"),
            ConfigError::InvalidHost { .. } => {
                write!(f, "APP_HOST must parse to an IPv4 or IPv6 address")
            }
            ConfigError::MissingVar(key) => write!(f, "{key} must be set"),
            ConfigError::InvalidNumber(key) => write!(f, "{key} must be a valid number"),
            ConfigError::InvalidStorageBackend(value) => {
                write!(f, "STORAGE_BACKEND must be 'local' or 's3', got '{value}'")
            }
        }
    }
}

impl std::error::Error for ConfigError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            ConfigError::InvalidHost { source } => Some(source),
            ConfigError::InvalidPort
            | ConfigError::MissingVar(_)
            | ConfigError::InvalidNumber(_)
            | ConfigError::InvalidStorageBackend(_) => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::env;
    use std::sync::{Mutex, OnceLock};

    fn env_guard() -> &'static Mutex<()> {
        static GUARD: OnceLock<Mutex<()>> = OnceLock::new();
        GUARD.get_or_init(|| Mutex::new(()))
    }

    fn reset_env() {
        for key in [
            "APP_ENV",
            "APP_HOST",
            "APP_PORT",
            "APP_LOG_LEVEL",
            "JWT_SECRET",
            "STORAGE_BACKEND",
            "S3_BUCKET",
            "PAYMENT_AMOUNT_CENTS",
            "CORS_ORIGINS",
            "MONGODB_URI",
        ] {
            env::remove_var(key);
        }
    }

    #[test]
    fn load_uses_defaults_when_env_missing() {
        let _lock = env_guard().lock().expect("env mutex poisoned");
        reset_env();
        let config = AppConfig::load().expect("config loads with defaults");
        assert_eq!(config.environment, AppEnvironment::Development);
        assert_eq!(config.server.host, "127.0.0.1");
        assert_eq!(config.server.port, 10000);
        assert_eq!(config.telemetry.log_level, "info");
        assert_eq!(config.payments.amount_cents, 1000);
        assert_eq!(config.payments.currency, "chf");
        assert_eq!(config.storage.max_upload_bytes, 5 * 1024 * 1024);
        assert!(config.database.uri.is_none());
        assert!(matches!(config.storage.backend, StorageBackend::Local { .. }));
    }

    #[test]
    fn accepts_localhost_host() {
        let _lock = env_guard().lock().expect("env mutex poisoned");
        reset_env();
        env::set_var("APP_HOST", "localhost");
        let config = AppConfig::load().expect("config loads");
        let addr = config.server.socket_addr().expect("localhost resolves");
        assert_eq!(addr, SocketAddr::new(IpAddr::from([127, 0, 0, 1]), 10000));
    }

    #[test]
    fn production_requires_jwt_secret() {
        let _lock = env_guard().lock().expect("env mutex poisoned");
        reset_env();
        env::set_var("APP_ENV", "production");
        let err = AppConfig::load().expect_err("missing secret rejected");
        assert!(matches!(err, ConfigError::MissingVar("JWT_SECRET")));
        env::remove_var("APP_ENV");
    }

    #[test]
    fn s3_backend_requires_bucket() {
        let _lock = env_guard().lock().expect("env mutex poisoned");
        reset_env();
        env::set_var("STORAGE_BACKEND", "s3");
        let err = AppConfig::load().expect_err("bucket required");
        assert!(matches!(err, ConfigError::MissingVar("S3_BUCKET")));
        env::remove_var("STORAGE_BACKEND");
    }

    #[test]
    fn rejects_garbage_amount_and_splits_origins() {
        let _lock = env_guard().lock().expect("env mutex poisoned");
        reset_env();
        env::set_var("CORS_ORIGINS", "https://www.baujobs.ch, http://localhost:3000,");
        let config = AppConfig::load().expect("config loads");
        assert_eq!(
            config.server.cors_origins,
            vec![
                "https://www.baujobs.ch".to_string(),
                "http://localhost:3000".to_string()
            ]
        );

        env::set_var("PAYMENT_AMOUNT_CENTS", "ten francs");
        let err = AppConfig::load().expect_err("amount must be numeric");
        assert!(matches!(err, ConfigError::InvalidNumber("PAYMENT_AMOUNT_CENTS")));
        reset_env();
    }
}
