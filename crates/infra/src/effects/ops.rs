use patronage_domain::ports::BoxFuture;
use patronage_domain::ports::effects::EffectResult;
use patronage_domain::ports::notify::{OpsNotice, OpsNotifier};

use crate::config::AppConfig;
use crate::effects::http::EffectHttp;

const SERVICE: &str = "ops_webhook";

/// Posts operational notices as JSON to a chat webhook. With no URL configured
/// notices only reach the log.
#[derive(Debug, Clone)]
pub struct OpsWebhookNotifier {
    http: EffectHttp,
    webhook_url: Option<String>,
}

impl OpsWebhookNotifier {
    pub fn new(http: EffectHttp, webhook_url: &str) -> Self {
        let webhook_url = webhook_url.trim();
        Self {
            http,
            webhook_url: (!webhook_url.is_empty()).then(|| webhook_url.to_string()),
        }
    }

    pub fn from_config(http: EffectHttp, config: &AppConfig) -> Self {
        Self::new(http, &config.ops_webhook_url)
    }
}

impl OpsNotifier for OpsWebhookNotifier {
    fn notify(&self, notice: OpsNotice) -> BoxFuture<'_, EffectResult<()>> {
        Box::pin(async move {
            let Some(url) = &self.webhook_url else {
                tracing::info!(
                    topic = notice.topic,
                    actor_id = %notice.actor_id,
                    text = %notice.text,
                    "ops notice (no webhook configured)"
                );
                return Ok(());
            };
            let request = self.http.client().post(url).json(&notice);
            self.http.send(SERVICE, request).await?;
            Ok(())
        })
    }
}

#[cfg(test)]
mod tests {
    use std::sync::{Arc, Mutex};
    use std::time::Duration;

    use axum::routing::post;
    use axum::{Json, Router};
    use serde_json::{Value, json};

    use super::*;
    use crate::effects::stub::serve;

    fn http() -> EffectHttp {
        EffectHttp::new(Duration::from_secs(2), 1, Duration::from_millis(1))
    }

    fn notice() -> OpsNotice {
        OpsNotice {
            topic: "comment_unpublished",
            actor_id: "u-1".into(),
            actor_email: "mod@example.org".into(),
            text: "comment c-1 unpublished".into(),
            detail: json!({ "comment_id": "c-1" }),
        }
    }

    #[tokio::test]
    async fn notice_is_posted_as_json() {
        let seen: Arc<Mutex<Vec<Value>>> = Arc::default();
        let recorder = seen.clone();
        let base = serve(Router::new().route(
            "/hook",
            post(move |Json(body): Json<Value>| {
                let recorder = recorder.clone();
                async move {
                    recorder.lock().unwrap().push(body);
                    "ok"
                }
            }),
        ))
        .await;

        OpsWebhookNotifier::new(http(), &format!("{base}/hook"))
            .notify(notice())
            .await
            .unwrap();

        let seen = seen.lock().unwrap();
        assert_eq!(seen.len(), 1);
        assert_eq!(seen[0]["topic"], "comment_unpublished");
        assert_eq!(seen[0]["detail"]["comment_id"], "c-1");
    }

    #[tokio::test]
    async fn missing_webhook_is_a_no_op() {
        OpsWebhookNotifier::new(http(), "  ")
            .notify(notice())
            .await
            .unwrap();
    }
}
