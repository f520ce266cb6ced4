use once_cell::sync::Lazy;
use serde::{Deserialize, Serialize};
use std::env;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    pub environment: Environment,
    pub database: DatabaseConfig,
    pub api: ApiConfig,
    pub security: SecurityConfig,
    pub storage: StorageConfig,
    pub processing: ProcessingConfig,
    pub push: PushConfig,
    pub email: EmailConfig,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Environment {
    Development,
    Staging,
    Production,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DatabaseConfig {
    pub max_connections: u32,
    pub connection_timeout: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiConfig {
    pub enable_rate_limiting: bool,
    pub rate_limit_requests: u32,
    pub rate_limit_window_secs: u64,
    /// Base URL this deployment is reachable at; used to build email links.
    pub public_base_url: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SecurityConfig {
    pub cors_origins: Vec<String>,
    pub jwt_secret: String,
    pub jwt_expiry_hours: u64,
    pub login_link_expiry_minutes: u64,
    pub email_verification_expiry_hours: u64,
    pub video_processor_token: String,
    pub ebook_processor_token: String,
    pub google_client_ids: Vec<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StorageConfig {
    pub endpoint: String,
    pub region: String,
    pub access_key_id: String,
    pub secret_access_key: String,
    pub permanent_bucket: String,
    pub temp_bucket: String,
    pub signed_url_expiry_secs: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProcessingConfig {
    pub video_job_url: String,
    pub ebook_processing_url: String,
    pub ebook_update_url: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PushConfig {
    pub fcm_server_key: String,
    pub all_users_topic: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EmailConfig {
    pub endpoint: String,
    pub region: String,
    pub access_key_id: String,
    pub secret_access_key: String,
    pub from_address: String,
    pub reply_to_address: String,
    pub admin_address: String,
}

impl AppConfig {
    pub fn from_env() -> Self {
        let environment = match env::var("APP_ENV").as_deref() {
            Ok("production") | Ok("prod") => Environment::Production,
            Ok("staging") | Ok("stage") => Environment::Staging,
            _ => Environment::Development,
        };

        // Environment presets first, then specific env vars override fields
        match environment {
            Environment::Production => Self::production(),
            Environment::Staging => Self::staging(),
            Environment::Development => Self::development(),
        }
        .with_env_overrides()
    }

    fn with_env_overrides(mut self) -> Self {
        // Database overrides
        if let Ok(v) = env::var("DATABASE_MAX_CONNECTIONS") {
            self.database.max_connections = v.parse().unwrap_or(self.database.max_connections);
        }
        if let Ok(v) = env::var("DATABASE_CONNECTION_TIMEOUT") {
            self.database.connection_timeout = v.parse().unwrap_or(self.database.connection_timeout);
        }

        // API overrides
        if let Ok(v) = env::var("API_ENABLE_RATE_LIMITING") {
            self.api.enable_rate_limiting = v.parse().unwrap_or(self.api.enable_rate_limiting);
        }
        if let Ok(v) = env::var("API_RATE_LIMIT_REQUESTS") {
            self.api.rate_limit_requests = v.parse().unwrap_or(self.api.rate_limit_requests);
        }
        if let Ok(v) = env::var("API_RATE_LIMIT_WINDOW_SECS") {
            self.api.rate_limit_window_secs = v.parse().unwrap_or(self.api.rate_limit_window_secs);
        }
        if let Ok(v) = env::var("PUBLIC_BASE_URL") {
            self.api.public_base_url = v;
        }

        // Security overrides
        if let Ok(v) = env::var("SECURITY_CORS_ORIGINS") {
            self.security.cors_origins = v.split(',').map(|s| s.trim().to_string()).collect();
        }
        if let Ok(v) = env::var("JWT_SECRET") {
            self.security.jwt_secret = v;
        }
        if let Ok(v) = env::var("SECURITY_JWT_EXPIRY_HOURS") {
            self.security.jwt_expiry_hours = v.parse().unwrap_or(self.security.jwt_expiry_hours);
        }
        if let Ok(v) = env::var("SECURITY_LOGIN_LINK_EXPIRY_MINUTES") {
            self.security.login_link_expiry_minutes =
                v.parse().unwrap_or(self.security.login_link_expiry_minutes);
        }
        if let Ok(v) = env::var("SECURITY_EMAIL_VERIFICATION_EXPIRY_HOURS") {
            self.security.email_verification_expiry_hours =
                v.parse().unwrap_or(self.security.email_verification_expiry_hours);
        }
        if let Ok(v) = env::var("VIDEO_PROCESSOR_TOKEN") {
            self.security.video_processor_token = v;
        }
        if let Ok(v) = env::var("EBOOK_PROCESSOR_TOKEN") {
            self.security.ebook_processor_token = v;
        }
        if let Ok(v) = env::var("GOOGLE_CLIENT_IDS") {
            self.security.google_client_ids = v.split(',').map(|s| s.trim().to_string()).collect();
        }

        // Storage overrides
        if let Ok(v) = env::var("STORAGE_ENDPOINT") {
            self.storage.endpoint = v;
        }
        if let Ok(v) = env::var("STORAGE_REGION") {
            self.storage.region = v;
        }
        if let Ok(v) = env::var("STORAGE_ACCESS_KEY_ID") {
            self.storage.access_key_id = v;
        }
        if let Ok(v) = env::var("STORAGE_SECRET_ACCESS_KEY") {
            self.storage.secret_access_key = v;
        }
        if let Ok(v) = env::var("STORAGE_PERMANENT_BUCKET") {
            self.storage.permanent_bucket = v;
        }
        if let Ok(v) = env::var("STORAGE_TEMP_BUCKET") {
            self.storage.temp_bucket = v;
        }
        if let Ok(v) = env::var("STORAGE_SIGNED_URL_EXPIRY_SECS") {
            self.storage.signed_url_expiry_secs =
                v.parse().unwrap_or(self.storage.signed_url_expiry_secs);
        }

        // Processing overrides
        if let Ok(v) = env::var("PROCESSING_VIDEO_JOB_URL") {
            self.processing.video_job_url = v;
        }
        if let Ok(v) = env::var("PROCESSING_EBOOK_PROCESSING_URL") {
            self.processing.ebook_processing_url = v;
        }
        if let Ok(v) = env::var("PROCESSING_EBOOK_UPDATE_URL") {
            self.processing.ebook_update_url = v;
        }

        // Push overrides
        if let Ok(v) = env::var("FCM_SERVER_KEY") {
            self.push.fcm_server_key = v;
        }
        if let Ok(v) = env::var("PUSH_ALL_USERS_TOPIC") {
            self.push.all_users_topic = v;
        }

        // Email overrides
        if let Ok(v) = env::var("EMAIL_ENDPOINT") {
            self.email.endpoint = v;
        }
        if let Ok(v) = env::var("EMAIL_REGION") {
            self.email.region = v;
        }
        if let Ok(v) = env::var("EMAIL_ACCESS_KEY_ID") {
            self.email.access_key_id = v;
        }
        if let Ok(v) = env::var("EMAIL_SECRET_ACCESS_KEY") {
            self.email.secret_access_key = v;
        }
        if let Ok(v) = env::var("EMAIL_FROM_ADDRESS") {
            self.email.from_address = v;
        }
        if let Ok(v) = env::var("EMAIL_REPLY_TO_ADDRESS") {
            self.email.reply_to_address = v;
        }
        if let Ok(v) = env::var("EMAIL_ADMIN_ADDRESS") {
            self.email.admin_address = v;
        }

        self
    }

    fn development() -> Self {
        Self {
            environment: Environment::Development,
            database: DatabaseConfig {
                max_connections: 10,
                connection_timeout: 30,
            },
            api: ApiConfig {
                enable_rate_limiting: false,
                rate_limit_requests: 1000,
                rate_limit_window_secs: 60,
                public_base_url: "http://localhost:8080".to_string(),
            },
            security: SecurityConfig {
                cors_origins: vec!["*".to_string()],
                jwt_secret: "dev-only-secret".to_string(),
                jwt_expiry_hours: 24 * 30,
                login_link_expiry_minutes: 30,
                email_verification_expiry_hours: 24,
                video_processor_token: String::new(),
                ebook_processor_token: String::new(),
                google_client_ids: vec![],
            },
            storage: StorageConfig {
                endpoint: "http://localhost:9000".to_string(),
                region: "us-east-1".to_string(),
                access_key_id: String::new(),
                secret_access_key: String::new(),
                permanent_bucket: "wonderspaced-dev".to_string(),
                temp_bucket: "wonderspaced-dev-tmp".to_string(),
                signed_url_expiry_secs: 3600,
            },
            processing: ProcessingConfig {
                video_job_url: String::new(),
                ebook_processing_url: String::new(),
                ebook_update_url: String::new(),
            },
            push: PushConfig {
                fcm_server_key: String::new(),
                all_users_topic: "all_users".to_string(),
            },
            email: EmailConfig {
                endpoint: "https://email.us-east-1.amazonaws.com".to_string(),
                region: "us-east-1".to_string(),
                access_key_id: String::new(),
                secret_access_key: String::new(),
                from_address: "no-reply@wonderspaced.com".to_string(),
                reply_to_address: "wonderspacedapp@gmail.com".to_string(),
                admin_address: "wonderspacedapp@gmail.com".to_string(),
            },
        }
    }

    fn staging() -> Self {
        let mut config = Self::development();
        config.environment = Environment::Staging;
        config.database.max_connections = 20;
        config.database.connection_timeout = 10;
        config.api.enable_rate_limiting = true;
        config.api.rate_limit_requests = 100;
        config.security.jwt_secret = String::new();
        config.security.jwt_expiry_hours = 24 * 7;
        config.storage.permanent_bucket = "wonderspaced-staging".to_string();
        config.storage.temp_bucket = "wonderspaced-staging-tmp".to_string();
        config
    }

    fn production() -> Self {
        let mut config = Self::staging();
        config.environment = Environment::Production;
        config.database.max_connections = 50;
        config.database.connection_timeout = 5;
        config.api.rate_limit_requests = 60;
        config.storage.permanent_bucket = "wonderspaced-prod".to_string();
        config.storage.temp_bucket = "wonderspaced-prod-tmp".to_string();
        config
    }
}

// Global singleton config - initialized once at startup
pub static CONFIG: Lazy<AppConfig> = Lazy::new(AppConfig::from_env);

// Convenience function for accessing config
pub fn config() -> &'static AppConfig {
    &CONFIG
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn development_defaults_are_permissive() {
        let config = AppConfig::development();
        assert!(!config.api.enable_rate_limiting);
        assert_eq!(config.security.login_link_expiry_minutes, 30);
        assert_eq!(config.security.email_verification_expiry_hours, 24);
    }

    #[test]
    fn production_tightens_limits() {
        let config = AppConfig::production();
        assert!(config.api.enable_rate_limiting);
        assert_eq!(config.api.rate_limit_requests, 60);
        assert!(config.security.jwt_secret.is_empty());
    }
}
