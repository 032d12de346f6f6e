use serde::{Deserialize, Serialize};

use crate::model::Comment;
use crate::ports::BoxFuture;
use crate::ports::effects::EffectResult;

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
#[serde(tag = "event_type", rename_all = "snake_case")]
pub enum CommentEvent {
    CommentRemoved { comment: Comment },
}

/// Fan-out to live subscribers. Delivery is fire-and-forget.
pub trait CommentEventPublisher: Send + Sync {
    fn publish(&self, event: CommentEvent) -> BoxFuture<'_, EffectResult<()>>;
}

#[derive(Clone, Debug, Serialize, PartialEq)]
pub struct OpsNotice {
    pub topic: &'static str,
    pub actor_id: String,
    pub actor_email: String,
    pub text: String,
    pub detail: serde_json::Value,
}

/// Operational side channel (moderation log, alerts).
pub trait OpsNotifier: Send + Sync {
    fn notify(&self, notice: OpsNotice) -> BoxFuture<'_, EffectResult<()>>;
}
