use crate::DomainResult;
use crate::error::DomainError;
use crate::identity::ActorIdentity;

pub fn require_signed_in(actor: Option<&ActorIdentity>) -> DomainResult<&ActorIdentity> {
    match actor {
        Some(actor) if !actor.user_id.trim().is_empty() => Ok(actor),
        _ => Err(DomainError::Unauthenticated),
    }
}

pub fn ensure_owner(actor: &ActorIdentity, owner_id: &str, resource: &str) -> DomainResult<()> {
    if actor.user_id == owner_id {
        return Ok(());
    }
    Err(DomainError::Forbidden(format!(
        "{resource} does not belong to the signed-in user"
    )))
}
