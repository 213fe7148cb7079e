use anyhow::{Context, Result};
use serde::Deserialize;
use std::env;
use std::path::PathBuf;
use std::str::FromStr;

#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    pub server: ServerConfig,
    pub database: DatabaseConfig,
    pub storage: StorageConfig,
    pub auth: AuthConfig,
    pub processing: ProcessingConfig,
    pub logging: LoggingConfig,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    pub port: u16,
    pub host: String,
    pub cors_allowed_origins: Vec<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct DatabaseConfig {
    /// Without a URL the service keeps everything in memory.
    pub url: Option<String>,
    pub max_connections: u32,
    pub min_connections: u32,
    pub connect_retries: u32,
}

#[derive(Debug, Clone, Deserialize)]
pub struct StorageConfig {
    pub upload_dir: PathBuf,
    pub max_upload_size: u64,
}

#[derive(Clone, Deserialize)]
pub struct AuthConfig {
    pub secret: String,
    pub max_jwt_expiration: i64,
    pub password_hash_iterations: u32,
}

// Keep the signing secret out of startup logs.
impl std::fmt::Debug for AuthConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AuthConfig")
            .field("secret", &"<redacted>")
            .field("max_jwt_expiration", &self.max_jwt_expiration)
            .field("password_hash_iterations", &self.password_hash_iterations)
            .finish()
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct ProcessingConfig {
    pub concurrency: usize,
    pub recover_on_startup: bool,
}

#[derive(Debug, Clone, Deserialize)]
pub struct LoggingConfig {
    pub log_dir: Option<PathBuf>,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        dotenvy::dotenv().ok();

        Ok(Self {
            server: ServerConfig {
                port: parse_var("PORT", "3000")?,
                host: env::var("HOST").unwrap_or_else(|_| "0.0.0.0".to_string()),
                cors_allowed_origins: env::var("ALLOWED_ORIGINS")
                    .unwrap_or_else(|_| "http://localhost:3000,http://localhost:5173".to_string())
                    .split(',')
                    .map(|s| s.trim().to_string())
                    .filter(|s| !s.is_empty())
                    .collect(),
            },
            database: DatabaseConfig {
                url: env::var("DATABASE_URL").ok().filter(|url| !url.is_empty()),
                max_connections: parse_var("DB_MAX_CONNECTIONS", "10")?,
                min_connections: parse_var("DB_MIN_CONNECTIONS", "1")?,
                connect_retries: parse_var("DB_CONNECT_RETRIES", "5")?,
            },
            storage: StorageConfig {
                upload_dir: env::var("UPLOAD_DIR")
                    .map(PathBuf::from)
                    .unwrap_or_else(|_| PathBuf::from("uploads")),
                max_upload_size: parse_var("UPLOAD_MAX_SIZE", "10485760")?,
            },
            auth: AuthConfig {
                secret: env::var("JWT_SECRET").context("JWT_SECRET must be set")?,
                max_jwt_expiration: parse_var("MAX_JWT_EXPIRATION", "86400")?,
                password_hash_iterations: parse_var("PASSWORD_HASH_ITERATIONS", "600000")?,
            },
            processing: ProcessingConfig {
                concurrency: parse_var::<usize>("PROCESSING_CONCURRENCY", "4")?.max(1),
                recover_on_startup: parse_var("RECOVER_ON_STARTUP", "true")?,
            },
            logging: LoggingConfig {
                log_dir: env::var("LOG_DIR").ok().map(PathBuf::from),
            },
        })
    }
}

fn parse_var<T>(key: &str, default: &str) -> Result<T>
where
    T: FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    env::var(key)
        .unwrap_or_else(|_| default.to_string())
        .parse()
        .with_context(|| format!("invalid value for {key}"))
}

#[cfg(test)]
pub(crate) fn test_config(upload_dir: PathBuf) -> Config {
    Config {
        server: ServerConfig {
            port: 0,
            host: "127.0.0.1".to_string(),
            cors_allowed_origins: vec!["http://localhost:5173".to_string()],
        },
        database: DatabaseConfig {
            url: None,
            max_connections: 1,
            min_connections: 1,
            connect_retries: 0,
        },
        storage: StorageConfig {
            upload_dir,
            max_upload_size: 64 * 1024,
        },
        auth: AuthConfig {
            secret: "test-secret-with-enough-entropy-0123456789".to_string(),
            max_jwt_expiration: 3600,
            password_hash_iterations: 1_000,
        },
        processing: ProcessingConfig {
            concurrency: 2,
            recover_on_startup: false,
        },
        logging: LoggingConfig { log_dir: None },
    }
}
