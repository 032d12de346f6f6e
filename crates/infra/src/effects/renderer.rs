use patronage_domain::ports::BoxFuture;
use patronage_domain::ports::effects::{EffectResult, PageRenderer};

use crate::config::AppConfig;
use crate::effects::http::{EffectHttp, endpoint_url};

const SERVICE: &str = "renderer";

/// Headless page renderer returning a PNG screenshot of `url`.
#[derive(Debug, Clone)]
pub struct RendererClient {
    http: EffectHttp,
    base_url: String,
}

impl RendererClient {
    pub fn new(http: EffectHttp, base_url: &str) -> Self {
        Self {
            http,
            base_url: base_url.to_string(),
        }
    }

    pub fn from_config(http: EffectHttp, config: &AppConfig) -> Self {
        Self::new(http, &config.render_service_url)
    }
}

impl PageRenderer for RendererClient {
    fn render_page(
        &self,
        url: String,
        width: u32,
        height: u32,
    ) -> BoxFuture<'_, EffectResult<Vec<u8>>> {
        Box::pin(async move {
            let request = self
                .http
                .client()
                .get(endpoint_url(&self.base_url, "render"))
                .query(&[
                    ("url", url.clone()),
                    ("width", width.to_string()),
                    ("height", height.to_string()),
                ]);
            let png = self.http.send_for_bytes(SERVICE, request).await?;
            tracing::debug!(%url, size = png.len(), "page rendered");
            Ok(png)
        })
    }
}
