use std::future::Future;

use crate::DomainResult;
use crate::error::DomainError;

#[derive(Clone, Debug, PartialEq)]
pub struct EffectOutcome {
    pub task: &'static str,
    pub error: Option<DomainError>,
}

impl EffectOutcome {
    pub fn succeeded(&self) -> bool {
        self.error.is_none()
    }
}

/// Outcome of every best-effort task a workflow ran after its commit.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct EffectReport {
    pub outcomes: Vec<EffectOutcome>,
}

impl EffectReport {
    pub fn all_succeeded(&self) -> bool {
        self.outcomes.iter().all(EffectOutcome::succeeded)
    }

    pub fn failed_tasks(&self) -> Vec<&'static str> {
        self.outcomes
            .iter()
            .filter(|outcome| !outcome.succeeded())
            .map(|outcome| outcome.task)
            .collect()
    }

    pub fn outcome(&self, task: &str) -> Option<&EffectOutcome> {
        self.outcomes.iter().find(|outcome| outcome.task == task)
    }
}

/// Runs named tasks after a successful commit. A failing task is logged with
/// the operation context and recorded; it never becomes the caller's error.
pub struct PostCommit<'a> {
    operation: &'static str,
    actor_id: &'a str,
    subject: &'a str,
    report: EffectReport,
}

impl<'a> PostCommit<'a> {
    pub fn new(operation: &'static str, actor_id: &'a str, subject: &'a str) -> Self {
        Self {
            operation,
            actor_id,
            subject,
            report: EffectReport::default(),
        }
    }

    pub async fn run<T, F>(&mut self, task: &'static str, effect: F) -> Option<T>
    where
        F: Future<Output = DomainResult<T>>,
    {
        match effect.await {
            Ok(value) => {
                self.report.outcomes.push(EffectOutcome { task, error: None });
                Some(value)
            }
            Err(err) => {
                tracing::warn!(
                    operation = self.operation,
                    actor_id = self.actor_id,
                    subject = self.subject,
                    task,
                    error = %err,
                    "post-commit effect failed"
                );
                self.report.outcomes.push(EffectOutcome {
                    task,
                    error: Some(err),
                });
                None
            }
        }
    }

    pub fn finish(self) -> EffectReport {
        self.report
    }
}
