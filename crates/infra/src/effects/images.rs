use patronage_domain::ports::BoxFuture;
use patronage_domain::ports::effects::{EffectResult, ImageTransformer};
use reqwest::header::CONTENT_TYPE;

use crate::config::AppConfig;
use crate::effects::http::{EffectHttp, endpoint_url};

const SERVICE: &str = "image_service";

/// Image conversion service. Both renditions are returned as JPEG.
#[derive(Debug, Clone)]
pub struct ImageServiceClient {
    http: EffectHttp,
    base_url: String,
}

impl ImageServiceClient {
    pub fn new(http: EffectHttp, base_url: &str) -> Self {
        Self {
            http,
            base_url: base_url.to_string(),
        }
    }

    pub fn from_config(http: EffectHttp, config: &AppConfig) -> Self {
        Self::new(http, &config.image_service_url)
    }

    async fn convert(
        &self,
        path: &str,
        query: &[(&str, String)],
        bytes: Vec<u8>,
    ) -> EffectResult<Vec<u8>> {
        let request = self
            .http
            .client()
            .post(endpoint_url(&self.base_url, path))
            .query(query)
            .header(CONTENT_TYPE, "application/octet-stream")
            .body(bytes);
        self.http.send_for_bytes(SERVICE, request).await
    }
}

impl ImageTransformer for ImageServiceClient {
    fn to_normalized_jpeg(&self, bytes: Vec<u8>) -> BoxFuture<'_, EffectResult<Vec<u8>>> {
        Box::pin(async move { self.convert("convert/jpeg", &[], bytes).await })
    }

    fn to_small_monochrome(
        &self,
        bytes: Vec<u8>,
        edge: u32,
    ) -> BoxFuture<'_, EffectResult<Vec<u8>>> {
        Box::pin(async move {
            let query = [("width", edge.to_string()), ("height", edge.to_string())];
            self.convert("convert/monochrome", &query, bytes).await
        })
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;
    use std::time::Duration;

    use axum::Router;
    use axum::body::Bytes;
    use axum::extract::Query;
    use axum::routing::post;

    use super::*;
    use crate::effects::stub::serve;

    #[tokio::test]
    async fn monochrome_passes_edge_and_returns_body() {
        let base = serve(
            Router::new()
                .route(
                    "/convert/jpeg",
                    post(|body: Bytes| async move { [b"jpeg:".as_slice(), &body].concat() }),
                )
                .route(
                    "/convert/monochrome",
                    post(
                        |Query(query): Query<HashMap<String, String>>, body: Bytes| async move {
                            format!("{}x{}:{}", query["width"], query["height"], body.len())
                        },
                    ),
                ),
        )
        .await;
        let client = ImageServiceClient::new(
            EffectHttp::new(Duration::from_secs(2), 1, Duration::from_millis(1)),
            &base,
        );

        let jpeg = client.to_normalized_jpeg(b"raw".to_vec()).await.unwrap();
        assert_eq!(jpeg, b"jpeg:raw");
        let small = client
            .to_small_monochrome(b"raw".to_vec(), 256)
            .await
            .unwrap();
        assert_eq!(small, b"256x256:3");
    }
}
