/// Configuration management for the CraftLink backend
use crate::error::{ApiError, ApiResult};
use serde::{Deserialize, Serialize};
use std::env;
use std::path::PathBuf;

/// Main server configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    pub service: ServiceConfig,
    pub storage: StorageConfig,
    pub authentication: AuthConfig,
    pub identity: IdentityConfig,
    pub logging: LoggingConfig,
}

/// Service-level configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServiceConfig {
    pub hostname: String,
    pub port: u16,
    pub version: String,
    /// Externally reachable base URL used to build image links
    pub public_url: String,
}

/// Storage configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StorageConfig {
    pub data_directory: PathBuf,
    pub database: PathBuf,
    pub image_directory: PathBuf,
    /// Maximum accepted image payload in bytes
    pub image_upload_limit: usize,
    /// Seconds to wait for an image-store call before failing upstream
    pub image_upload_timeout: u64,
}

/// Authentication configuration
///
/// Access and refresh tokens are signed with independent secrets so a leaked
/// access secret cannot mint refresh tokens, and vice versa.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuthConfig {
    pub access_token_secret: String,
    pub refresh_token_secret: String,
    pub access_token_lifetime_days: i64,
    pub refresh_token_lifetime_days: i64,
}

/// Federated identity configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IdentityConfig {
    /// OAuth client id the Google ID token audience must match
    pub google_client_id: String,
    pub google_tokeninfo_url: String,
}

/// Logging configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    pub level: String,
}

impl ServerConfig {
    /// Load configuration from environment variables
    pub fn from_env() -> ApiResult<Self> {
        dotenv::dotenv().ok();

        let hostname = env::var("CRAFTLINK_HOSTNAME").unwrap_or_else(|_| "localhost".to_string());
        let port = env::var("CRAFTLINK_PORT")
            .unwrap_or_else(|_| "8000".to_string())
            .parse()
            .map_err(|_| ApiError::Validation("Invalid port number".to_string()))?;
        let version = env::var("CRAFTLINK_VERSION").unwrap_or_else(|_| "0.1.0".to_string());
        let public_url = env::var("CRAFTLINK_PUBLIC_URL")
            .unwrap_or_else(|_| format!("http://{}:{}", hostname, port));

        let data_directory: PathBuf = env::var("CRAFTLINK_DATA_DIRECTORY")
            .unwrap_or_else(|_| "./data".to_string())
            .into();
        let database = env::var("CRAFTLINK_DB_LOCATION")
            .map(PathBuf::from)
            .unwrap_or_else(|_| data_directory.join("craftlink.sqlite"));
        let image_directory = env::var("CRAFTLINK_IMAGE_DIRECTORY")
            .map(PathBuf::from)
            .unwrap_or_else(|_| data_directory.join("images"));
        let image_upload_limit = env::var("CRAFTLINK_IMAGE_UPLOAD_LIMIT")
            .unwrap_or_else(|_| "10485760".to_string())
            .parse()
            .unwrap_or(10 * 1024 * 1024);
        let image_upload_timeout = env::var("CRAFTLINK_IMAGE_UPLOAD_TIMEOUT")
            .unwrap_or_else(|_| "15".to_string())
            .parse()
            .unwrap_or(15);

        let access_token_secret = env::var("ACCESS_TOKEN_SECRET")
            .map_err(|_| ApiError::Validation("Access token secret required".to_string()))?;
        let refresh_token_secret = env::var("REFRESH_TOKEN_SECRET")
            .map_err(|_| ApiError::Validation("Refresh token secret required".to_string()))?;
        let access_token_lifetime_days = env::var("ACCESS_TOKEN_LIFETIME_DAYS")
            .unwrap_or_else(|_| "10".to_string())
            .parse()
            .unwrap_or(10);
        let refresh_token_lifetime_days = env::var("REFRESH_TOKEN_LIFETIME_DAYS")
            .unwrap_or_else(|_| "10".to_string())
            .parse()
            .unwrap_or(10);

        let google_client_id = env::var("GOOGLE_CLIENT_ID").unwrap_or_default();
        let google_tokeninfo_url = env::var("GOOGLE_TOKENINFO_URL")
            .unwrap_or_else(|_| "https://oauth2.googleapis.com/tokeninfo".to_string());

        let log_level = env::var("RUST_LOG").unwrap_or_else(|_| "info".to_string());

        Ok(ServerConfig {
            service: ServiceConfig {
                hostname,
                port,
                version,
                public_url,
            },
            storage: StorageConfig {
                data_directory,
                database,
                image_directory,
                image_upload_limit,
                image_upload_timeout,
            },
            authentication: AuthConfig {
                access_token_secret,
                refresh_token_secret,
                access_token_lifetime_days,
                refresh_token_lifetime_days,
            },
            identity: IdentityConfig {
                google_client_id,
                google_tokeninfo_url,
            },
            logging: LoggingConfig { level: log_level },
        })
    }

    /// Validate configuration
    pub fn validate(&self) -> ApiResult<()> {
        if self.service.hostname.is_empty() {
            return Err(ApiError::Validation("Hostname cannot be empty".to_string()));
        }

        if self.authentication.access_token_secret.len() < 32 {
            return Err(ApiError::Validation(
                "Access token secret must be at least 32 characters".to_string(),
            ));
        }

        if self.authentication.refresh_token_secret.len() < 32 {
            return Err(ApiError::Validation(
                "Refresh token secret must be at least 32 characters".to_string(),
            ));
        }

        if self.authentication.access_token_secret == self.authentication.refresh_token_secret {
            return Err(ApiError::Validation(
                "Access and refresh token secrets must differ".to_string(),
            ));
        }

        Ok(())
    }
}

/// Fixed configuration for unit tests across the crate
#[cfg(test)]
pub fn test_config() -> ServerConfig {
    ServerConfig {
        service: ServiceConfig {
            hostname: "localhost".to_string(),
            port: 8000,
            version: "0.1.0".to_string(),
            public_url: "http://localhost:8000".to_string(),
        },
        storage: StorageConfig {
            data_directory: PathBuf::from("./data"),
            database: PathBuf::from(":memory:"),
            image_directory: PathBuf::from("./data/images"),
            image_upload_limit: 10 * 1024 * 1024,
            image_upload_timeout: 15,
        },
        authentication: AuthConfig {
            access_token_secret: "access-secret-for-testing-0123456789ab".to_string(),
            refresh_token_secret: "refresh-secret-for-testing-0123456789a".to_string(),
            access_token_lifetime_days: 10,
            refresh_token_lifetime_days: 10,
        },
        identity: IdentityConfig {
            google_client_id: "test-client".to_string(),
            google_tokeninfo_url: "https://oauth2.googleapis.com/tokeninfo".to_string(),
        },
        logging: LoggingConfig {
            level: "info".to_string(),
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validate_rejects_short_secrets() {
        let mut config = test_config();
        config.authentication.access_token_secret = "short".to_string();
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_validate_rejects_shared_secret() {
        let mut config = test_config();
        config.authentication.refresh_token_secret =
            config.authentication.access_token_secret.clone();
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_validate_accepts_test_config() {
        assert!(test_config().validate().is_ok());
    }
}
