use std::time::Duration;

use surrealdb::Surreal;
use surrealdb::engine::remote::ws::{Client, Ws};
use surrealdb::opt::auth::Root;
use thiserror::Error;
use tokio::net::TcpStream;
use tokio::time::timeout;
use url::Url;

use crate::config::AppConfig;

#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum DbError {
    #[error("database unavailable: {0}")]
    Unavailable(String),
}

#[derive(Debug, Clone)]
pub struct DbConfig {
    pub endpoint: String,
    pub namespace: String,
    pub database: String,
    pub username: String,
    pub password: String,
}

impl DbConfig {
    pub fn from_app_config(config: &AppConfig) -> Self {
        Self {
            endpoint: config.surreal_endpoint.clone(),
            namespace: config.surreal_ns.clone(),
            database: config.surreal_db.clone(),
            username: config.surreal_user.clone(),
            password: config.surreal_pass.clone(),
        }
    }

    /// Opens an authenticated connection scoped to the configured namespace
    /// and database.
    pub async fn connect(&self) -> anyhow::Result<Surreal<Client>> {
        let db = Surreal::<Client>::init();
        db.connect::<Ws>(strip_scheme(&self.endpoint)).await?;
        db.signin(Root {
            username: self.username.clone(),
            password: self.password.clone(),
        })
        .await?;
        db.use_ns(&self.namespace).use_db(&self.database).await?;
        tracing::info!(
            endpoint = %self.endpoint,
            namespace = %self.namespace,
            database = %self.database,
            "connected to surrealdb"
        );
        Ok(db)
    }

    /// Cheap reachability probe used by the health endpoint.
    pub async fn health_check(&self) -> Result<(), DbError> {
        let address = parse_socket_address(&self.endpoint)?;
        let connect = timeout(Duration::from_secs(2), TcpStream::connect(&address))
            .await
            .map_err(|_| DbError::Unavailable("surreal endpoint connect timed out".to_string()))?;
        connect.map_err(|err| {
            DbError::Unavailable(format!("surreal endpoint connect failed: {err}"))
        })?;
        tracing::debug!(address = %address, "surreal health check succeeded");
        Ok(())
    }
}

fn strip_scheme(endpoint: &str) -> &str {
    endpoint
        .split_once("://")
        .map_or(endpoint, |(_, rest)| rest)
}

fn parse_socket_address(endpoint: &str) -> Result<String, DbError> {
    let normalized = if endpoint.contains("://") {
        endpoint.to_string()
    } else {
        format!("ws://{endpoint}")
    };
    let parsed = Url::parse(&normalized).map_err(|err| {
        DbError::Unavailable(format!("invalid surreal endpoint '{endpoint}': {err}"))
    })?;
    let host = parsed.host_str().ok_or_else(|| {
        DbError::Unavailable(format!("missing surreal host in endpoint '{endpoint}'"))
    })?;
    let port = match (parsed.port(), parsed.scheme()) {
        (Some(port), _) => port,
        (None, "wss" | "https") => 443,
        (None, _) => 8000,
    };
    Ok(format!("{host}:{port}"))
}
