use std::env;
use std::path::PathBuf;
use std::str::FromStr;
use thiserror::Error;

pub const DEFAULT_MAX_UPLOAD_BYTES: usize = 20 * 1024 * 1024;

#[derive(Debug, Error, PartialEq)]
pub enum ConfigError {
    #[error("{0} must be set")]
    Missing(&'static str),

    #[error("{key} has an invalid value '{value}'")]
    Invalid { key: &'static str, value: String },
}

#[derive(Debug, Clone, PartialEq)]
pub enum ImageStorage {
    S3 { bucket: String, region: Option<String> },
    Local { upload_dir: PathBuf },
}

#[derive(Debug, Clone)]
pub struct Config {
    pub bind_address: String,
    pub database_url: String,
    pub db_max_connections: u32,
    pub jwt_secret: String,
    pub jwt_expires_in: i64,
    pub openai_api_key: String,
    pub openai_model: String,
    pub remove_bg_api_key: String,
    pub email_user: String,
    pub email_pass: String,
    pub smtp_host: String,
    pub weather_api_key: String,
    pub image_storage: ImageStorage,
    pub public_base_url: String,
    pub frontend_url: String,
    pub scratch_dir: PathBuf,
    pub max_upload_bytes: usize,
}

impl Config {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Builds the configuration from any key lookup. Every required key must be
    /// present and non-empty.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());
        let required = |key: &'static str| get(key).ok_or(ConfigError::Missing(key));
        let or_default = |key: &str, default: &str| get(key).unwrap_or_else(|| default.to_string());

        let image_storage = match or_default("IMAGE_STORAGE", "s3").to_ascii_lowercase().as_str() {
            "s3" => ImageStorage::S3 {
                bucket: required("AWS_S3_BUCKET")?,
                region: get("AWS_REGION"),
            },
            "local" => ImageStorage::Local {
                upload_dir: PathBuf::from(or_default("UPLOAD_DIR", "uploads")),
            },
            other => {
                return Err(ConfigError::Invalid {
                    key: "IMAGE_STORAGE",
                    value: other.to_string(),
                })
            }
        };

        Ok(Config {
            bind_address: or_default("BIND_ADDRESS", "127.0.0.1:8080"),
            database_url: required("DATABASE_URL")?,
            db_max_connections: parse_or("DB_MAX_CONNECTIONS", get("DB_MAX_CONNECTIONS"), 10)?,
            jwt_secret: required("JWT_SECRET")?,
            jwt_expires_in: parse_or("JWT_EXPIRES_IN", get("JWT_EXPIRES_IN"), 3600)?,
            openai_api_key: required("OPENAI_API_KEY")?,
            openai_model: or_default("OPENAI_MODEL", "gpt-4o-mini"),
            remove_bg_api_key: required("REMOVE_BG_API_KEY")?,
            email_user: required("EMAIL_USER")?,
            email_pass: required("EMAIL_PASS")?,
            smtp_host: or_default("SMTP_HOST", "smtp.gmail.com"),
            weather_api_key: required("WEATHER_API_KEY")?,
            image_storage,
            public_base_url: or_default("PUBLIC_BASE_URL", "https://api.wardrobewizard.fashion")
                .trim_end_matches('/')
                .to_string(),
            frontend_url: or_default("FRONTEND_URL", "https://wardrobewizard.fashion"),
            scratch_dir: get("SCRATCH_DIR").map(PathBuf::from).unwrap_or_else(env::temp_dir),
            max_upload_bytes: parse_or("MAX_UPLOAD_BYTES", get("MAX_UPLOAD_BYTES"), DEFAULT_MAX_UPLOAD_BYTES)?,
        })
    }
}

fn parse_or<T: FromStr>(key: &'static str, raw: Option<String>, default: T) -> Result<T, ConfigError> {
    match raw {
        None => Ok(default),
        Some(value) => value
            .trim()
            .parse()
            .map_err(|_| ConfigError::Invalid { key, value }),
    }
}
