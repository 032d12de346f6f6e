use std::sync::Arc;

use crate::DomainResult;
use crate::error::DomainError;
use crate::guard::{ensure_owner, require_signed_in};
use crate::identity::ActorIdentity;
use crate::model::Comment;
use crate::ports::notify::{CommentEvent, CommentEventPublisher, OpsNotice, OpsNotifier};
use crate::ports::store::StoreScope;
use crate::post_commit::{EffectReport, PostCommit};
use crate::uow::{UnitOfWork, settle};

const OPERATION: &str = "unpublish_comment";

#[derive(Clone, Debug, PartialEq)]
pub struct UnpublishOutcome {
    pub unpublished: bool,
    pub effects: EffectReport,
}

#[derive(Clone)]
pub struct CommentService {
    uow: UnitOfWork,
    events: Arc<dyn CommentEventPublisher>,
    ops: Arc<dyn OpsNotifier>,
}

impl CommentService {
    pub fn new(
        uow: UnitOfWork,
        events: Arc<dyn CommentEventPublisher>,
        ops: Arc<dyn OpsNotifier>,
    ) -> Self {
        Self { uow, events, ops }
    }

    pub async fn unpublish(
        &self,
        actor: Option<&ActorIdentity>,
        comment_id: &str,
    ) -> DomainResult<UnpublishOutcome> {
        let actor = require_signed_in(actor)?;

        let mut scope = self.uow.begin().await?;
        let outcome = hide_comment(scope.as_mut(), actor, comment_id).await;
        let comment = settle(scope, OPERATION, outcome).await?;

        let mut post = PostCommit::new(OPERATION, &actor.user_id, comment_id);
        post.run("comment_removed_event", async {
            self.events
                .publish(CommentEvent::CommentRemoved {
                    comment: comment.clone(),
                })
                .await
                .map_err(DomainError::from)
        })
        .await;
        post.run("ops_notice", async {
            self.ops
                .notify(unpublish_notice(actor, &comment))
                .await
                .map_err(DomainError::from)
        })
        .await;

        Ok(UnpublishOutcome {
            unpublished: true,
            effects: post.finish(),
        })
    }
}

async fn hide_comment(
    scope: &mut dyn StoreScope,
    actor: &ActorIdentity,
    comment_id: &str,
) -> DomainResult<Comment> {
    let Some(mut comment) = scope.find_comment(comment_id).await? else {
        tracing::warn!(operation = OPERATION, actor_id = %actor.user_id, comment_id, "comment not found");
        return Err(DomainError::NotFound(format!("comment {comment_id}")));
    };
    ensure_owner(actor, &comment.user_id, "comment").inspect_err(|_| {
        tracing::warn!(operation = OPERATION, actor_id = %actor.user_id, comment_id, "comment does not belong to user");
    })?;

    scope.set_comment_published(&comment.id, false).await?;
    comment.published = false;
    Ok(comment)
}

fn unpublish_notice(actor: &ActorIdentity, comment: &Comment) -> OpsNotice {
    OpsNotice {
        topic: "comment_unpublished",
        actor_id: actor.user_id.clone(),
        actor_email: actor.email.clone(),
        text: format!("{} unpublished comment {}", actor.email, comment.id),
        detail: serde_json::json!({
            "comment_id": comment.id,
            "content": comment.content,
        }),
    }
}
