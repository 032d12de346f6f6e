use std::time::Duration;

use patronage_domain::ports::effects::{EffectError, EffectResult};
use reqwest::{RequestBuilder, Response, StatusCode};
use tokio::time::sleep;

use crate::config::AppConfig;

/// Shared transport for the external effect clients: one timeout, bounded
/// retries on transport errors, 429 and 5xx, uniform error mapping.
#[derive(Debug, Clone)]
pub struct EffectHttp {
    client: reqwest::Client,
    retry_max_attempts: u32,
    retry_backoff_base: Duration,
}

impl EffectHttp {
    pub fn new(timeout: Duration, retry_max_attempts: u32, retry_backoff_base: Duration) -> Self {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .unwrap_or_else(|_| reqwest::Client::new());
        Self {
            client,
            retry_max_attempts: retry_max_attempts.max(1),
            retry_backoff_base,
        }
    }

    pub fn from_config(config: &AppConfig) -> Self {
        Self::new(
            config.http_timeout(),
            config.http_client_retry_max_attempts,
            Duration::from_millis(config.http_client_retry_backoff_ms),
        )
    }

    pub fn client(&self) -> &reqwest::Client {
        &self.client
    }

    /// Sends the request and returns the successful response. Requests with a
    /// streaming body cannot be cloned and are sent exactly once.
    pub async fn send(&self, service: &'static str, request: RequestBuilder) -> EffectResult<Response> {
        let attempts = self.retry_max_attempts;
        let mut pending = Some(request);

        for attempt in 0..attempts {
            let Some(current) = pending.take() else {
                break;
            };
            let retry = if attempt + 1 < attempts {
                current.try_clone()
            } else {
                None
            };

            let failure = match current.send().await {
                Ok(response) if response.status().is_success() => return Ok(response),
                Ok(response) => {
                    let status = response.status();
                    let message = response.text().await.unwrap_or_default();
                    if !is_transient(status) {
                        return Err(EffectError::Rejected {
                            service,
                            status: status.as_u16(),
                            message,
                        });
                    }
                    EffectError::Rejected {
                        service,
                        status: status.as_u16(),
                        message,
                    }
                }
                Err(err) => EffectError::Unavailable {
                    service,
                    message: err.to_string(),
                },
            };

            match retry {
                Some(next) => {
                    tracing::debug!(service, attempt, error = %failure, "retrying external call");
                    sleep(backoff_for_attempt(self.retry_backoff_base, attempt)).await;
                    pending = Some(next);
                }
                None => return Err(failure),
            }
        }

        Err(EffectError::Unavailable {
            service,
            message: "retry loop exited unexpectedly".to_string(),
        })
    }

    pub async fn send_for_bytes(
        &self,
        service: &'static str,
        request: RequestBuilder,
    ) -> EffectResult<Vec<u8>> {
        let response = self.send(service, request).await?;
        let bytes = response
            .bytes()
            .await
            .map_err(|err| EffectError::InvalidResponse {
                service,
                message: err.to_string(),
            })?;
        if bytes.is_empty() {
            return Err(EffectError::InvalidResponse {
                service,
                message: "empty body".to_string(),
            });
        }
        Ok(bytes.to_vec())
    }
}

fn is_transient(status: StatusCode) -> bool {
    status == StatusCode::TOO_MANY_REQUESTS || status.is_server_error()
}

pub(crate) fn endpoint_url(base_url: &str, path: &str) -> String {
    format!(
        "{}/{}",
        base_url.trim_end_matches('/'),
        path.trim_start_matches('/')
    )
}

fn backoff_for_attempt(base: Duration, attempt: u32) -> Duration {
    if base.is_zero() {
        return Duration::from_millis(1);
    }
    let multiplier = 1u32 << attempt.min(6);
    base.saturating_mul(multiplier)
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;
    use std::sync::atomic::{AtomicUsize, Ordering};

    use axum::Router;
    use axum::http::StatusCode as AxumStatus;
    use axum::routing::get;

    use super::*;
    use crate::effects::stub::serve;

    fn http(attempts: u32) -> EffectHttp {
        EffectHttp::new(Duration::from_secs(2), attempts, Duration::from_millis(1))
    }

    #[test]
    fn endpoint_url_joins_single_slash() {
        assert_eq!(endpoint_url("http://a/", "/b"), "http://a/b");
        assert_eq!(endpoint_url("http://a", "b"), "http://a/b");
    }

    #[tokio::test]
    async fn server_errors_are_retried_until_success() {
        let calls = Arc::new(AtomicUsize::new(0));
        let counter = calls.clone();
        let base = serve(Router::new().route(
            "/flaky",
            get(move || {
                let counter = counter.clone();
                async move {
                    if counter.fetch_add(1, Ordering::SeqCst) == 0 {
                        (AxumStatus::BAD_GATEWAY, "down")
                    } else {
                        (AxumStatus::OK, "up")
                    }
                }
            }),
        ))
        .await;

        let client = http(3);
        let body = client
            .send_for_bytes("stub", client.client().get(endpoint_url(&base, "/flaky")))
            .await
            .unwrap();
        assert_eq!(body, b"up");
        assert_eq!(calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn client_errors_are_not_retried() {
        let calls = Arc::new(AtomicUsize::new(0));
        let counter = calls.clone();
        let base = serve(Router::new().route(
            "/bad",
            get(move || {
                counter.fetch_add(1, Ordering::SeqCst);
                async { (AxumStatus::BAD_REQUEST, "nope") }
            }),
        ))
        .await;

        let client = http(3);
        let err = client
            .send("stub", client.client().get(endpoint_url(&base, "/bad")))
            .await
            .unwrap_err();
        assert_eq!(
            err,
            EffectError::Rejected {
                service: "stub",
                status: 400,
                message: "nope".into(),
            }
        );
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn unreachable_host_is_unavailable() {
        let client = http(1);
        let err = client
            .send("stub", client.client().get("http://127.0.0.1:1/"))
            .await
            .unwrap_err();
        assert!(matches!(err, EffectError::Unavailable { service: "stub", .. }));
    }
}
