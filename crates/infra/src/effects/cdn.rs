use patronage_domain::ports::BoxFuture;
use patronage_domain::ports::effects::{CdnPurger, EffectError, EffectResult};
use serde::Deserialize;
use serde_json::json;

use crate::config::AppConfig;
use crate::effects::http::{EffectHttp, endpoint_url};

const SERVICE: &str = "cdn";

#[derive(Debug, Deserialize)]
struct PurgeResponse {
    status: String,
    #[serde(default)]
    description: String,
}

/// Pull-zone CDN purge by URL path.
#[derive(Debug, Clone)]
pub struct CdnClient {
    http: EffectHttp,
    api_url: String,
    zone_id: String,
    api_key: String,
}

impl CdnClient {
    pub fn new(http: EffectHttp, api_url: &str, zone_id: &str, api_key: &str) -> Self {
        Self {
            http,
            api_url: api_url.to_string(),
            zone_id: zone_id.trim().to_string(),
            api_key: api_key.to_string(),
        }
    }

    pub fn from_config(http: EffectHttp, config: &AppConfig) -> Self {
        Self::new(http, &config.cdn_api_url, &config.cdn_zone_id, &config.cdn_api_key)
    }
}

impl CdnPurger for CdnClient {
    fn purge(&self, paths: Vec<String>) -> BoxFuture<'_, EffectResult<()>> {
        Box::pin(async move {
            if self.zone_id.is_empty() {
                tracing::debug!(?paths, "cdn zone not configured, purge skipped");
                return Ok(());
            }
            if paths.is_empty() {
                return Ok(());
            }
            let url = endpoint_url(&self.api_url, &format!("zones/purgeurl/{}.json", self.zone_id));
            let request = self
                .http
                .client()
                .delete(url)
                .basic_auth(&self.api_key, Some(""))
                .json(&json!({ "urls": paths }));
            let response = self.http.send(SERVICE, request).await?;
            let body = response
                .json::<PurgeResponse>()
                .await
                .map_err(|err| EffectError::InvalidResponse {
                    service: SERVICE,
                    message: err.to_string(),
                })?;
            if body.status != "success" {
                return Err(EffectError::Rejected {
                    service: SERVICE,
                    status: 200,
                    message: body.description,
                });
            }
            tracing::debug!(?paths, "cdn purge accepted");
            Ok(())
        })
    }
}
