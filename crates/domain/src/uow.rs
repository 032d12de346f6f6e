use std::sync::Arc;

use crate::DomainResult;
use crate::error::DomainError;
use crate::ports::store::{Store, StoreScope};

/// Hands out store scopes to workflows and closes them according to the
/// workflow outcome.
#[derive(Clone)]
pub struct UnitOfWork {
    store: Arc<dyn Store>,
}

impl UnitOfWork {
    pub fn new(store: Arc<dyn Store>) -> Self {
        Self { store }
    }

    pub fn backend(&self) -> &'static str {
        self.store.name()
    }

    pub async fn begin(&self) -> DomainResult<Box<dyn StoreScope>> {
        self.store.begin().await.map_err(into_persistence)
    }
}

/// Commits the scope when `outcome` is `Ok`, otherwise rolls it back and
/// returns the original error unchanged.
pub async fn settle<T>(
    scope: Box<dyn StoreScope>,
    operation: &'static str,
    outcome: DomainResult<T>,
) -> DomainResult<T> {
    match outcome {
        Ok(value) => {
            scope.commit().await.map_err(|err| {
                tracing::error!(operation, error = %err, "transaction commit failed");
                into_persistence(err)
            })?;
            Ok(value)
        }
        Err(err) => {
            scope.rollback().await;
            tracing::info!(operation, error = %err, "transaction rollback");
            Err(err)
        }
    }
}

fn into_persistence(err: DomainError) -> DomainError {
    match err {
        DomainError::Persistence(_) => err,
        other => DomainError::Persistence(other.to_string()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::memory::InMemoryStore;
    use crate::model::Comment;

    fn seeded_store() -> InMemoryStore {
        let store = InMemoryStore::new();
        store.seed(|tables| {
            tables.comments.insert(
                "comment-1".to_string(),
                Comment {
                    id: "comment-1".to_string(),
                    user_id: "user-1".to_string(),
                    content: "hello".to_string(),
                    published: true,
                },
            );
        });
        store
    }

    #[tokio::test]
    async fn settle_commits_successful_outcome() {
        let store = seeded_store();
        let uow = UnitOfWork::new(Arc::new(store.clone()));
        let mut scope = uow.begin().await.expect("scope");
        let outcome = scope.set_comment_published("comment-1", false).await;
        settle(scope, "test", outcome).await.expect("commit");

        assert!(!store.snapshot().comments["comment-1"].published);
    }

    #[tokio::test]
    async fn settle_rolls_back_and_returns_original_error() {
        let store = seeded_store();
        let uow = UnitOfWork::new(Arc::new(store.clone()));
        let mut scope = uow.begin().await.expect("scope");
        scope
            .set_comment_published("comment-1", false)
            .await
            .expect("staged write");
        let outcome: DomainResult<()> = Err(DomainError::Conflict("late failure".to_string()));
        let err = settle(scope, "test", outcome).await.expect_err("rollback");

        assert_eq!(err, DomainError::Conflict("late failure".to_string()));
        assert!(store.snapshot().comments["comment-1"].published);
    }
}
