use crate::DomainResult;
use crate::model::{
    Address, Comment, Membership, Package, Payment, Pledge, PledgePayment, ProfilePatch,
    Testimonial, TestimonialPatch, User,
};
use crate::ports::BoxFuture;

/// Opens transactional scopes over the relational store.
pub trait Store: Send + Sync {
    fn name(&self) -> &'static str;

    fn begin(&self) -> BoxFuture<'_, DomainResult<Box<dyn StoreScope>>>;
}

/// A single unit of work. Every read and write of a workflow goes through the
/// same scope; nothing written here is visible elsewhere until `commit`
/// returns `Ok`. `commit` and `rollback` consume the scope.
#[allow(clippy::needless_pass_by_value)]
pub trait StoreScope: Send {
    fn count_pledges_for_user(&mut self, user_id: &str) -> BoxFuture<'_, DomainResult<u64>>;

    fn count_memberships_for_user(&mut self, user_id: &str) -> BoxFuture<'_, DomainResult<u64>>;

    fn find_testimonial_by_user(
        &mut self,
        user_id: &str,
    ) -> BoxFuture<'_, DomainResult<Option<Testimonial>>>;

    /// Earliest membership of the user, ordered by ascending sequence number.
    fn first_membership_for_user(
        &mut self,
        user_id: &str,
    ) -> BoxFuture<'_, DomainResult<Option<Membership>>>;

    fn insert_testimonial(&mut self, testimonial: &Testimonial) -> BoxFuture<'_, DomainResult<()>>;

    fn update_testimonial(
        &mut self,
        testimonial_id: &str,
        patch: &TestimonialPatch,
    ) -> BoxFuture<'_, DomainResult<()>>;

    fn find_comment(&mut self, comment_id: &str) -> BoxFuture<'_, DomainResult<Option<Comment>>>;

    fn set_comment_published(
        &mut self,
        comment_id: &str,
        published: bool,
    ) -> BoxFuture<'_, DomainResult<()>>;

    fn find_pledge(&mut self, pledge_id: &str) -> BoxFuture<'_, DomainResult<Option<Pledge>>>;

    fn find_user(&mut self, user_id: &str) -> BoxFuture<'_, DomainResult<Option<User>>>;

    fn find_address(&mut self, address_id: &str)
    -> BoxFuture<'_, DomainResult<Option<Address>>>;

    /// Moves the pledge to `to_user_id`. The write fails at commit when the
    /// pledge is no longer owned by `from_user_id`.
    fn reassign_pledge(
        &mut self,
        pledge_id: &str,
        from_user_id: &str,
        to_user_id: &str,
    ) -> BoxFuture<'_, DomainResult<()>>;

    fn reassign_memberships(
        &mut self,
        from_user_id: &str,
        to_user_id: &str,
    ) -> BoxFuture<'_, DomainResult<()>>;

    fn reassign_payment_sources(
        &mut self,
        from_user_id: &str,
        to_user_id: &str,
    ) -> BoxFuture<'_, DomainResult<()>>;

    fn update_user_profile(
        &mut self,
        user_id: &str,
        patch: &ProfilePatch,
    ) -> BoxFuture<'_, DomainResult<()>>;

    fn clear_user_address(&mut self, user_id: &str) -> BoxFuture<'_, DomainResult<()>>;

    fn pledges_owing_confirmation(
        &mut self,
        user_id: &str,
    ) -> BoxFuture<'_, DomainResult<Vec<Pledge>>>;

    fn find_package(&mut self, package_id: &str) -> BoxFuture<'_, DomainResult<Option<Package>>>;

    fn memberships_for_pledge(
        &mut self,
        pledge_id: &str,
    ) -> BoxFuture<'_, DomainResult<Vec<Membership>>>;

    /// Most recent payment attempt of the pledge, ordered by creation time.
    fn latest_pledge_payment(
        &mut self,
        pledge_id: &str,
    ) -> BoxFuture<'_, DomainResult<Option<PledgePayment>>>;

    fn find_payment(&mut self, payment_id: &str) -> BoxFuture<'_, DomainResult<Option<Payment>>>;

    fn clear_confirmation_flags(&mut self, pledge_ids: &[String])
    -> BoxFuture<'_, DomainResult<()>>;

    fn commit(self: Box<Self>) -> BoxFuture<'static, DomainResult<()>>;

    fn rollback(self: Box<Self>) -> BoxFuture<'static, ()>;
}
