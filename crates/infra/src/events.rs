use patronage_domain::ports::BoxFuture;
use patronage_domain::ports::effects::EffectResult;
use patronage_domain::ports::notify::{CommentEvent, CommentEventPublisher};
use tokio::sync::broadcast;

const DEFAULT_CAPACITY: usize = 256;

/// In-process fan-out of comment events to live subscribers.
#[derive(Debug, Clone)]
pub struct BroadcastCommentEvents {
    sender: broadcast::Sender<CommentEvent>,
}

impl BroadcastCommentEvents {
    pub fn new(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity.max(1));
        Self { sender }
    }

    pub fn subscribe(&self) -> broadcast::Receiver<CommentEvent> {
        self.sender.subscribe()
    }
}

impl Default for BroadcastCommentEvents {
    fn default() -> Self {
        Self::new(DEFAULT_CAPACITY)
    }
}

impl CommentEventPublisher for BroadcastCommentEvents {
    fn publish(&self, event: CommentEvent) -> BoxFuture<'_, EffectResult<()>> {
        Box::pin(async move {
            match self.sender.send(event) {
                Ok(receivers) => tracing::debug!(receivers, "comment event published"),
                Err(_) => tracing::debug!("comment event dropped, no subscribers"),
            }
            Ok(())
        })
    }
}
