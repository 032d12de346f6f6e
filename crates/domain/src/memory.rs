use std::collections::HashMap;
use std::future::ready;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use crate::DomainResult;
use crate::error::DomainError;
use crate::model::{
    Address, Comment, Membership, Package, Payment, PaymentSource, Pledge, PledgePayment,
    ProfilePatch, Testimonial, TestimonialPatch, User,
};
use crate::ports::BoxFuture;
use crate::ports::store::{Store, StoreScope};

#[derive(Clone, Debug, Default, PartialEq)]
pub struct Tables {
    pub users: HashMap<String, User>,
    pub addresses: HashMap<String, Address>,
    pub testimonials: HashMap<String, Testimonial>,
    pub comments: HashMap<String, Comment>,
    pub pledges: HashMap<String, Pledge>,
    pub memberships: HashMap<String, Membership>,
    pub payment_sources: HashMap<String, PaymentSource>,
    pub packages: HashMap<String, Package>,
    pub payments: HashMap<String, Payment>,
    pub pledge_payments: Vec<PledgePayment>,
}

impl Tables {
    fn testimonial_by_user(&self, user_id: &str) -> Option<&Testimonial> {
        self.testimonials
            .values()
            .find(|testimonial| testimonial.user_id == user_id)
    }
}

/// Process-local store. Scopes work on a private copy of the tables and
/// replay their writes onto the shared tables at commit, all or nothing.
#[derive(Clone, Default)]
pub struct InMemoryStore {
    tables: Arc<Mutex<Tables>>,
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_tables(tables: Tables) -> Self {
        Self {
            tables: Arc::new(Mutex::new(tables)),
        }
    }

    pub fn seed(&self, fill: impl FnOnce(&mut Tables)) {
        fill(&mut lock(&self.tables));
    }

    pub fn snapshot(&self) -> Tables {
        lock(&self.tables).clone()
    }
}

fn lock(tables: &Mutex<Tables>) -> MutexGuard<'_, Tables> {
    tables.lock().unwrap_or_else(PoisonError::into_inner)
}

impl Store for InMemoryStore {
    fn name(&self) -> &'static str {
        "memory"
    }

    fn begin(&self) -> BoxFuture<'_, DomainResult<Box<dyn StoreScope>>> {
        let working = self.snapshot();
        let scope: Box<dyn StoreScope> = Box::new(InMemoryScope {
            shared: self.tables.clone(),
            working,
            staged: Vec::new(),
        });
        Box::pin(ready(Ok(scope)))
    }
}

#[derive(Clone, Debug)]
enum StagedWrite {
    InsertTestimonial(Testimonial),
    UpdateTestimonial(String, TestimonialPatch),
    SetCommentPublished(String, bool),
    ReassignPledge {
        pledge_id: String,
        from: String,
        to: String,
    },
    ReassignMemberships { from: String, to: String },
    ReassignPaymentSources { from: String, to: String },
    UpdateUserProfile(String, ProfilePatch),
    ClearUserAddress(String),
    ClearConfirmationFlags(Vec<String>),
}

impl StagedWrite {
    fn apply(&self, tables: &mut Tables) -> DomainResult<()> {
        match self {
            Self::InsertTestimonial(testimonial) => {
                if tables.testimonials.contains_key(&testimonial.id) {
                    return Err(DomainError::Persistence(format!(
                        "testimonial {} already exists",
                        testimonial.id
                    )));
                }
                if tables.testimonial_by_user(&testimonial.user_id).is_some() {
                    return Err(DomainError::Persistence(format!(
                        "user {} already has a testimonial",
                        testimonial.user_id
                    )));
                }
                tables
                    .testimonials
                    .insert(testimonial.id.clone(), testimonial.clone());
            }
            Self::UpdateTestimonial(id, patch) => {
                let testimonial = tables
                    .testimonials
                    .get_mut(id)
                    .ok_or_else(|| missing_row("testimonial", id))?;
                patch.apply(testimonial);
            }
            Self::SetCommentPublished(id, published) => {
                let comment = tables
                    .comments
                    .get_mut(id)
                    .ok_or_else(|| missing_row("comment", id))?;
                comment.published = *published;
            }
            Self::ReassignPledge {
                pledge_id,
                from,
                to,
            } => {
                let pledge = tables
                    .pledges
                    .get_mut(pledge_id)
                    .ok_or_else(|| missing_row("pledge", pledge_id))?;
                if &pledge.user_id != from {
                    return Err(DomainError::Persistence(format!(
                        "pledge {pledge_id} is no longer owned by {from}"
                    )));
                }
                pledge.user_id = to.clone();
            }
            Self::ReassignMemberships { from, to } => {
                tables
                    .memberships
                    .values_mut()
                    .filter(|membership| &membership.user_id == from)
                    .for_each(|membership| membership.user_id = to.clone());
            }
            Self::ReassignPaymentSources { from, to } => {
                tables
                    .payment_sources
                    .values_mut()
                    .filter(|source| &source.user_id == from)
                    .for_each(|source| source.user_id = to.clone());
            }
            Self::UpdateUserProfile(id, patch) => {
                let user = tables
                    .users
                    .get_mut(id)
                    .ok_or_else(|| missing_row("user", id))?;
                patch.apply(user);
            }
            Self::ClearUserAddress(id) => {
                let user = tables
                    .users
                    .get_mut(id)
                    .ok_or_else(|| missing_row("user", id))?;
                user.address_id = None;
            }
            Self::ClearConfirmationFlags(ids) => {
                for id in ids {
                    if let Some(pledge) = tables.pledges.get_mut(id) {
                        pledge.send_confirm_mail = false;
                    }
                }
            }
        }
        Ok(())
    }
}

fn missing_row(table: &str, id: &str) -> DomainError {
    DomainError::Persistence(format!("{table} {id} does not exist"))
}

struct InMemoryScope {
    shared: Arc<Mutex<Tables>>,
    working: Tables,
    staged: Vec<StagedWrite>,
}

impl InMemoryScope {
    fn stage(&mut self, write: StagedWrite) -> BoxFuture<'_, DomainResult<()>> {
        let result = write.apply(&mut self.working).map(|()| self.staged.push(write));
        Box::pin(ready(result))
    }

    fn read<T: Send + 'static>(&self, query: impl FnOnce(&Tables) -> T) -> BoxFuture<'_, DomainResult<T>> {
        Box::pin(ready(Ok(query(&self.working))))
    }
}

impl StoreScope for InMemoryScope {
    fn count_pledges_for_user(&mut self, user_id: &str) -> BoxFuture<'_, DomainResult<u64>> {
        self.read(|tables| {
            tables
                .pledges
                .values()
                .filter(|pledge| pledge.user_id == user_id)
                .count() as u64
        })
    }

    fn count_memberships_for_user(&mut self, user_id: &str) -> BoxFuture<'_, DomainResult<u64>> {
        self.read(|tables| {
            tables
                .memberships
                .values()
                .filter(|membership| membership.user_id == user_id)
                .count() as u64
        })
    }

    fn find_testimonial_by_user(
        &mut self,
        user_id: &str,
    ) -> BoxFuture<'_, DomainResult<Option<Testimonial>>> {
        self.read(|tables| tables.testimonial_by_user(user_id).cloned())
    }

    fn first_membership_for_user(
        &mut self,
        user_id: &str,
    ) -> BoxFuture<'_, DomainResult<Option<Membership>>> {
        self.read(|tables| {
            tables
                .memberships
                .values()
                .filter(|membership| membership.user_id == user_id)
                .min_by_key(|membership| membership.sequence_number)
                .cloned()
        })
    }

    fn insert_testimonial(&mut self, testimonial: &Testimonial) -> BoxFuture<'_, DomainResult<()>> {
        self.stage(StagedWrite::InsertTestimonial(testimonial.clone()))
    }

    fn update_testimonial(
        &mut self,
        testimonial_id: &str,
        patch: &TestimonialPatch,
    ) -> BoxFuture<'_, DomainResult<()>> {
        self.stage(StagedWrite::UpdateTestimonial(
            testimonial_id.to_string(),
            patch.clone(),
        ))
    }

    fn find_comment(&mut self, comment_id: &str) -> BoxFuture<'_, DomainResult<Option<Comment>>> {
        self.read(|tables| tables.comments.get(comment_id).cloned())
    }

    fn set_comment_published(
        &mut self,
        comment_id: &str,
        published: bool,
    ) -> BoxFuture<'_, DomainResult<()>> {
        self.stage(StagedWrite::SetCommentPublished(
            comment_id.to_string(),
            published,
        ))
    }

    fn find_pledge(&mut self, pledge_id: &str) -> BoxFuture<'_, DomainResult<Option<Pledge>>> {
        self.read(|tables| tables.pledges.get(pledge_id).cloned())
    }

    fn find_user(&mut self, user_id: &str) -> BoxFuture<'_, DomainResult<Option<User>>> {
        self.read(|tables| tables.users.get(user_id).cloned())
    }

    fn find_address(
        &mut self,
        address_id: &str,
    ) -> BoxFuture<'_, DomainResult<Option<Address>>> {
        self.read(|tables| tables.addresses.get(address_id).cloned())
    }

    fn reassign_pledge(
        &mut self,
        pledge_id: &str,
        from_user_id: &str,
        to_user_id: &str,
    ) -> BoxFuture<'_, DomainResult<()>> {
        self.stage(StagedWrite::ReassignPledge {
            pledge_id: pledge_id.to_string(),
            from: from_user_id.to_string(),
            to: to_user_id.to_string(),
        })
    }

    fn reassign_memberships(
        &mut self,
        from_user_id: &str,
        to_user_id: &str,
    ) -> BoxFuture<'_, DomainResult<()>> {
        self.stage(StagedWrite::ReassignMemberships {
            from: from_user_id.to_string(),
            to: to_user_id.to_string(),
        })
    }

    fn reassign_payment_sources(
        &mut self,
        from_user_id: &str,
        to_user_id: &str,
    ) -> BoxFuture<'_, DomainResult<()>> {
        self.stage(StagedWrite::ReassignPaymentSources {
            from: from_user_id.to_string(),
            to: to_user_id.to_string(),
        })
    }

    fn update_user_profile(
        &mut self,
        user_id: &str,
        patch: &ProfilePatch,
    ) -> BoxFuture<'_, DomainResult<()>> {
        self.stage(StagedWrite::UpdateUserProfile(
            user_id.to_string(),
            patch.clone(),
        ))
    }

    fn clear_user_address(&mut self, user_id: &str) -> BoxFuture<'_, DomainResult<()>> {
        self.stage(StagedWrite::ClearUserAddress(user_id.to_string()))
    }

    fn pledges_owing_confirmation(
        &mut self,
        user_id: &str,
    ) -> BoxFuture<'_, DomainResult<Vec<Pledge>>> {
        self.read(|tables| {
            let mut pledges: Vec<_> = tables
                .pledges
                .values()
                .filter(|pledge| pledge.user_id == user_id && pledge.send_confirm_mail)
                .cloned()
                .collect();
            pledges.sort_by(|left, right| left.id.cmp(&right.id));
            pledges
        })
    }

    fn find_package(&mut self, package_id: &str) -> BoxFuture<'_, DomainResult<Option<Package>>> {
        self.read(|tables| tables.packages.get(package_id).cloned())
    }

    fn memberships_for_pledge(
        &mut self,
        pledge_id: &str,
    ) -> BoxFuture<'_, DomainResult<Vec<Membership>>> {
        self.read(|tables| {
            let mut memberships: Vec<_> = tables
                .memberships
                .values()
                .filter(|membership| membership.pledge_id.as_deref() == Some(pledge_id))
                .cloned()
                .collect();
            memberships.sort_by_key(|membership| membership.sequence_number);
            memberships
        })
    }

    fn latest_pledge_payment(
        &mut self,
        pledge_id: &str,
    ) -> BoxFuture<'_, DomainResult<Option<PledgePayment>>> {
        self.read(|tables| {
            tables
                .pledge_payments
                .iter()
                .filter(|link| link.pledge_id == pledge_id)
                .max_by_key(|link| link.created_at_ms)
                .cloned()
        })
    }

    fn find_payment(&mut self, payment_id: &str) -> BoxFuture<'_, DomainResult<Option<Payment>>> {
        self.read(|tables| tables.payments.get(payment_id).cloned())
    }

    fn clear_confirmation_flags(
        &mut self,
        pledge_ids: &[String],
    ) -> BoxFuture<'_, DomainResult<()>> {
        self.stage(StagedWrite::ClearConfirmationFlags(pledge_ids.to_vec()))
    }

    fn commit(self: Box<Self>) -> BoxFuture<'static, DomainResult<()>> {
        let Self { shared, staged, .. } = *self;
        let result = {
            let mut tables = lock(&shared);
            let mut next = tables.clone();
            staged
                .iter()
                .try_for_each(|write| write.apply(&mut next))
                .map(|()| *tables = next)
        };
        Box::pin(ready(result))
    }

    fn rollback(self: Box<Self>) -> BoxFuture<'static, ()> {
        Box::pin(ready(()))
    }
}
