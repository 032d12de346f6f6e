use patronage_domain::ports::BoxFuture;
use patronage_domain::ports::effects::{
    EffectError, EffectResult, MailMessage, Mailer, MergeVar,
};
use serde::{Deserialize, Serialize};

use crate::config::AppConfig;
use crate::effects::http::{EffectHttp, endpoint_url};

const SERVICE: &str = "mail";

#[derive(Debug, Serialize)]
struct SendTemplateRequest<'a> {
    key: &'a str,
    template_name: &'a str,
    template_content: &'a [serde_json::Value],
    message: TemplateMessage<'a>,
}

#[derive(Debug, Serialize)]
struct TemplateMessage<'a> {
    to: [Recipient<'a>; 1],
    from_email: &'a str,
    subject: &'a str,
    global_merge_vars: &'a [MergeVar],
}

#[derive(Debug, Serialize)]
struct Recipient<'a> {
    email: &'a str,
}

#[derive(Debug, Deserialize)]
struct SendResult {
    status: String,
    #[serde(default)]
    reject_reason: Option<String>,
}

/// Transactional mail through a template-send API.
#[derive(Debug, Clone)]
pub struct TemplateMailClient {
    http: EffectHttp,
    api_url: String,
    api_key: String,
}

impl TemplateMailClient {
    pub fn new(http: EffectHttp, api_url: &str, api_key: &str) -> Self {
        Self {
            http,
            api_url: api_url.to_string(),
            api_key: api_key.to_string(),
        }
    }

    pub fn from_config(http: EffectHttp, config: &AppConfig) -> Self {
        Self::new(http, &config.mail_api_url, &config.mail_api_key)
    }
}

impl Mailer for TemplateMailClient {
    fn send(&self, message: MailMessage) -> BoxFuture<'_, EffectResult<()>> {
        Box::pin(async move {
            let payload = SendTemplateRequest {
                key: &self.api_key,
                template_name: &message.template_name,
                template_content: &[],
                message: TemplateMessage {
                    to: [Recipient { email: &message.to }],
                    from_email: &message.from_email,
                    subject: &message.subject,
                    global_merge_vars: &message.fields,
                },
            };
            let request = self
                .http
                .client()
                .post(endpoint_url(&self.api_url, "messages/send-template.json"))
                .json(&payload);
            let response = self.http.send(SERVICE, request).await?;
            let results = response
                .json::<Vec<SendResult>>()
                .await
                .map_err(|err| EffectError::InvalidResponse {
                    service: SERVICE,
                    message: err.to_string(),
                })?;

            if let Some(refused) = results
                .iter()
                .find(|result| matches!(result.status.as_str(), "rejected" | "invalid"))
            {
                return Err(EffectError::Rejected {
                    service: SERVICE,
                    status: 200,
                    message: refused
                        .reject_reason
                        .clone()
                        .unwrap_or_else(|| refused.status.clone()),
                });
            }
            tracing::debug!(template = %message.template_name, "mail queued");
            Ok(())
        })
    }
}
