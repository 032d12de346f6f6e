use std::time::Duration;

use patronage_domain::config::WorkflowConfig;
use serde::Deserialize;

#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
    pub app_env: String,
    pub port: u16,
    pub log_level: String,
    pub data_backend: String,
    pub surreal_endpoint: String,
    pub surreal_ns: String,
    pub surreal_db: String,
    pub surreal_user: String,
    pub surreal_pass: String,
    pub jwt_secret: String,
    pub assets_base_url: String,
    pub frontend_base_url: String,
    pub default_mail_from_address: String,
    pub blob_endpoint: String,
    pub blob_bucket: String,
    pub blob_access_key: String,
    pub blob_secret_key: String,
    pub cdn_api_url: String,
    pub cdn_zone_id: String,
    pub cdn_api_key: String,
    pub image_service_url: String,
    pub render_service_url: String,
    pub mail_api_url: String,
    pub mail_api_key: String,
    pub ops_webhook_url: String,
    pub http_client_timeout_ms: u64,
    pub http_client_retry_max_attempts: u32,
    pub http_client_retry_backoff_ms: u64,
}

impl AppConfig {
    pub fn load() -> Result<Self, config::ConfigError> {
        dotenvy::dotenv().ok();
        Self::from_builder(
            config::Config::builder().add_source(config::Environment::default().separator("__")),
        )
    }

    fn from_builder(
        builder: config::ConfigBuilder<config::builder::DefaultState>,
    ) -> Result<Self, config::ConfigError> {
        let cfg = builder
            .set_default("app_env", "development")?
            .set_default("port", 3000)?
            .set_default("log_level", "info")?
            .set_default("data_backend", "memory")?
            .set_default("surreal_endpoint", "ws://127.0.0.1:8000")?
            .set_default("surreal_ns", "patronage")?
            .set_default("surreal_db", "main")?
            .set_default("surreal_user", "root")?
            .set_default("surreal_pass", "root")?
            .set_default("jwt_secret", "dev-secret")?
            .set_default("assets_base_url", "http://127.0.0.1:9000/assets")?
            .set_default("frontend_base_url", "http://127.0.0.1:3005")?
            .set_default("default_mail_from_address", "noreply@example.org")?
            .set_default("blob_endpoint", "http://127.0.0.1:9000")?
            .set_default("blob_bucket", "patronage")?
            .set_default("blob_access_key", "minioadmin")?
            .set_default("blob_secret_key", "minioadmin")?
            .set_default("cdn_api_url", "https://api.keycdn.com")?
            .set_default("cdn_zone_id", "")?
            .set_default("cdn_api_key", "")?
            .set_default("image_service_url", "http://127.0.0.1:3010")?
            .set_default("render_service_url", "http://127.0.0.1:3020")?
            .set_default("mail_api_url", "https://mandrillapp.com/api/1.0")?
            .set_default("mail_api_key", "")?
            .set_default("ops_webhook_url", "")?
            .set_default("http_client_timeout_ms", 10_000)?
            .set_default("http_client_retry_max_attempts", 2)?
            .set_default("http_client_retry_backoff_ms", 200)?
            .build()?;
        cfg.try_deserialize()
    }

    pub fn is_production(&self) -> bool {
        self.app_env.eq_ignore_ascii_case("production")
    }

    pub fn uses_surreal(&self) -> bool {
        self.data_backend.eq_ignore_ascii_case("surreal")
    }

    pub fn http_timeout(&self) -> Duration {
        Duration::from_millis(self.http_client_timeout_ms.max(1))
    }

    pub fn workflow_config(&self) -> WorkflowConfig {
        WorkflowConfig {
            assets_base_url: self.assets_base_url.clone(),
            frontend_base_url: self.frontend_base_url.clone(),
            mail_from_address: self.default_mail_from_address.clone(),
            bucket: self.blob_bucket.clone(),
            ..WorkflowConfig::default()
        }
    }
}
