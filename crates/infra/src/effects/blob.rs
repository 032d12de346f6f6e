use patronage_domain::ports::BoxFuture;
use patronage_domain::ports::effects::{BlobStorage, BlobUpload, EffectResult};
use reqwest::header::CONTENT_TYPE;

use crate::config::AppConfig;
use crate::effects::http::{EffectHttp, endpoint_url};

const SERVICE: &str = "blob_storage";

/// Object storage reachable with path-style `PUT {endpoint}/{bucket}{path}`.
#[derive(Debug, Clone)]
pub struct BlobStorageClient {
    http: EffectHttp,
    endpoint: String,
    access_key: String,
    secret_key: String,
}

impl BlobStorageClient {
    pub fn new(http: EffectHttp, endpoint: &str, access_key: &str, secret_key: &str) -> Self {
        Self {
            http,
            endpoint: endpoint.trim_end_matches('/').to_string(),
            access_key: access_key.to_string(),
            secret_key: secret_key.to_string(),
        }
    }

    pub fn from_config(http: EffectHttp, config: &AppConfig) -> Self {
        Self::new(
            http,
            &config.blob_endpoint,
            &config.blob_access_key,
            &config.blob_secret_key,
        )
    }

    fn object_url(&self, bucket: &str, path: &str) -> String {
        endpoint_url(&self.endpoint, &format!("{bucket}/{}", path.trim_start_matches('/')))
    }
}

impl BlobStorage for BlobStorageClient {
    fn upload(&self, upload: BlobUpload) -> BoxFuture<'_, EffectResult<()>> {
        Box::pin(async move {
            let url = self.object_url(&upload.bucket, &upload.path);
            let size = upload.bytes.len();
            let request = self
                .http
                .client()
                .put(&url)
                .basic_auth(&self.access_key, Some(&self.secret_key))
                .header(CONTENT_TYPE, upload.mime_type)
                .header("x-amz-acl", "public-read")
                .body(upload.bytes);
            self.http.send(SERVICE, request).await?;
            tracing::debug!(path = %upload.path, size, "blob uploaded");
            Ok(())
        })
    }
}
