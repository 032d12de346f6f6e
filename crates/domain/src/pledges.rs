use crate::DomainResult;
use crate::confirmations::{ConfirmationSweep, SweepReport};
use crate::error::DomainError;
use crate::guard::require_signed_in;
use crate::identity::ActorIdentity;
use crate::model::{ProfilePatch, User};
use crate::ports::store::StoreScope;
use crate::post_commit::{EffectReport, PostCommit};
use crate::uow::{UnitOfWork, settle};

const OPERATION: &str = "reclaim_pledge";

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ReclaimResolution {
    /// The pledge already belongs to the caller; nothing was written.
    AlreadyOwned,
    Reassigned { previous_owner_id: String },
}

#[derive(Clone, Debug, PartialEq)]
pub struct ReclaimOutcome {
    pub resolution: ReclaimResolution,
    pub confirmations: Option<SweepReport>,
    pub effects: EffectReport,
}

#[derive(Clone)]
pub struct ReclaimService {
    uow: UnitOfWork,
    sweep: ConfirmationSweep,
}

impl ReclaimService {
    pub fn new(uow: UnitOfWork, sweep: ConfirmationSweep) -> Self {
        Self { uow, sweep }
    }

    pub async fn reclaim(
        &self,
        actor: Option<&ActorIdentity>,
        pledge_id: &str,
    ) -> DomainResult<ReclaimOutcome> {
        let actor = require_signed_in(actor)?;

        let mut scope = self.uow.begin().await?;
        let outcome = transfer_pledge(scope.as_mut(), actor, pledge_id).await;
        let resolution = settle(scope, OPERATION, outcome).await?;

        let mut post = PostCommit::new(OPERATION, &actor.user_id, pledge_id);
        let confirmations = match resolution {
            ReclaimResolution::AlreadyOwned => None,
            ReclaimResolution::Reassigned { .. } => {
                post.run("pending_confirmations", self.sweep.run(&actor.user_id))
                    .await
            }
        };

        Ok(ReclaimOutcome {
            resolution,
            confirmations,
            effects: post.finish(),
        })
    }
}

async fn transfer_pledge(
    scope: &mut dyn StoreScope,
    actor: &ActorIdentity,
    pledge_id: &str,
) -> DomainResult<ReclaimResolution> {
    let Some(pledge) = scope.find_pledge(pledge_id).await? else {
        tracing::warn!(operation = OPERATION, actor_id = %actor.user_id, pledge_id, "pledge not found");
        return Err(DomainError::NotFound(format!("pledge {pledge_id}")));
    };
    let owner = scope
        .find_user(&pledge.user_id)
        .await?
        .ok_or_else(|| DomainError::NotFound(format!("owner of pledge {pledge_id}")))?;

    if owner.id == actor.user_id || actor.same_email(&owner.email) {
        tracing::info!(operation = OPERATION, actor_id = %actor.user_id, pledge_id, "pledge already belongs to the claiming email");
        return Ok(ReclaimResolution::AlreadyOwned);
    }
    if owner.verified {
        tracing::warn!(operation = OPERATION, actor_id = %actor.user_id, pledge_id, "cannot reclaim pledge of a verified user");
        return Err(DomainError::Conflict(
            "pledges of verified users cannot be reclaimed".into(),
        ));
    }

    let claimant = scope
        .find_user(&actor.user_id)
        .await?
        .ok_or_else(|| DomainError::NotFound(format!("user {}", actor.user_id)))?;

    scope
        .reassign_pledge(&pledge.id, &owner.id, &claimant.id)
        .await?;
    scope.reassign_memberships(&owner.id, &claimant.id).await?;
    scope.reassign_payment_sources(&owner.id, &claimant.id).await?;
    scope
        .update_user_profile(&claimant.id, &merge_profile(&claimant, &owner))
        .await?;
    if owner.address_id.is_some() {
        scope.clear_user_address(&owner.id).await?;
    }

    tracing::info!(operation = OPERATION, actor_id = %actor.user_id, pledge_id, previous_owner_id = %owner.id, "pledge reclaimed");
    Ok(ReclaimResolution::Reassigned {
        previous_owner_id: owner.id,
    })
}

/// Profile fields for the claimant: its own values where present, otherwise
/// the donor's. Blank strings count as absent.
pub fn merge_profile(claimant: &User, donor: &User) -> ProfilePatch {
    fn pick(own: &Option<String>, other: &Option<String>) -> Option<String> {
        present(own).or_else(|| present(other))
    }
    fn present(value: &Option<String>) -> Option<String> {
        value
            .as_deref()
            .filter(|value| !value.trim().is_empty())
            .map(str::to_string)
    }

    ProfilePatch {
        first_name: pick(&claimant.first_name, &donor.first_name),
        last_name: pick(&claimant.last_name, &donor.last_name),
        birthday: pick(&claimant.birthday, &donor.birthday),
        address_id: pick(&claimant.address_id, &donor.address_id),
    }
}
