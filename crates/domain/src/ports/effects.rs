use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::error::DomainError;
use crate::ports::BoxFuture;

#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum EffectError {
    #[error("{service} unavailable: {message}")]
    Unavailable {
        service: &'static str,
        message: String,
    },
    #[error("{service} rejected request with status {status}: {message}")]
    Rejected {
        service: &'static str,
        status: u16,
        message: String,
    },
    #[error("{service} returned an invalid response: {message}")]
    InvalidResponse {
        service: &'static str,
        message: String,
    },
}

impl From<EffectError> for DomainError {
    fn from(err: EffectError) -> Self {
        DomainError::ExternalEffect(err.to_string())
    }
}

pub type EffectResult<T> = Result<T, EffectError>;

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct BlobUpload {
    pub bytes: Vec<u8>,
    pub path: String,
    pub mime_type: &'static str,
    pub bucket: String,
}

pub trait BlobStorage: Send + Sync {
    fn upload(&self, upload: BlobUpload) -> BoxFuture<'_, EffectResult<()>>;
}

pub trait CdnPurger: Send + Sync {
    fn purge(&self, paths: Vec<String>) -> BoxFuture<'_, EffectResult<()>>;
}

pub trait ImageTransformer: Send + Sync {
    fn to_normalized_jpeg(&self, bytes: Vec<u8>) -> BoxFuture<'_, EffectResult<Vec<u8>>>;

    fn to_small_monochrome(
        &self,
        bytes: Vec<u8>,
        edge: u32,
    ) -> BoxFuture<'_, EffectResult<Vec<u8>>>;
}

pub trait PageRenderer: Send + Sync {
    fn render_page(
        &self,
        url: String,
        width: u32,
        height: u32,
    ) -> BoxFuture<'_, EffectResult<Vec<u8>>>;
}

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct MergeVar {
    pub name: String,
    pub content: serde_json::Value,
}

impl MergeVar {
    pub fn new(name: impl Into<String>, content: impl Into<serde_json::Value>) -> Self {
        Self {
            name: name.into(),
            content: content.into(),
        }
    }
}

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct MailMessage {
    pub to: String,
    pub from_email: String,
    pub subject: String,
    pub template_name: String,
    pub fields: Vec<MergeVar>,
}

impl MailMessage {
    pub fn field(&self, name: &str) -> Option<&serde_json::Value> {
        self.fields
            .iter()
            .find(|var| var.name == name)
            .map(|var| &var.content)
    }
}

pub trait Mailer: Send + Sync {
    fn send(&self, message: MailMessage) -> BoxFuture<'_, EffectResult<()>>;
}
