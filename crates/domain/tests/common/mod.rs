#![allow(dead_code)]

use std::future::ready;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};

use tokio::sync::Barrier;

use patronage_domain::DomainResult;
use patronage_domain::comments::CommentService;
use patronage_domain::config::WorkflowConfig;
use patronage_domain::confirmations::ConfirmationSweep;
use patronage_domain::error::DomainError;
use patronage_domain::identity::ActorIdentity;
use patronage_domain::memory::{InMemoryStore, Tables};
use patronage_domain::model::{
    Address, Comment, Membership, Package, Payment, PaymentMethod, PaymentSource, Pledge,
    PledgePayment, PledgeStatus, ProfilePatch, Testimonial, TestimonialPatch, User,
};
use patronage_domain::pledges::ReclaimService;
use patronage_domain::ports::BoxFuture;
use patronage_domain::ports::clock::FixedClock;
use patronage_domain::ports::effects::{
    BlobStorage, BlobUpload, CdnPurger, EffectError, EffectResult, ImageTransformer, MailMessage,
    Mailer, PageRenderer,
};
use patronage_domain::ports::notify::{CommentEvent, CommentEventPublisher, OpsNotice, OpsNotifier};
use patronage_domain::ports::store::{Store, StoreScope};
use patronage_domain::testimonials::{TestimonialClients, TestimonialService};
use patronage_domain::uow::UnitOfWork;

pub const NOW_MS: i64 = 1_700_000_000_000;

/// Records every outbound call and fails the ones it is told to.
#[derive(Default)]
pub struct FakeEffects {
    pub uploads: Mutex<Vec<BlobUpload>>,
    pub purges: Mutex<Vec<Vec<String>>>,
    pub renders: Mutex<Vec<String>>,
    pub mails: Mutex<Vec<MailMessage>>,
    pub events: Mutex<Vec<CommentEvent>>,
    pub notices: Mutex<Vec<OpsNotice>>,
    pub fail_images: AtomicBool,
    pub fail_renderer: AtomicBool,
    pub fail_mail: AtomicBool,
    pub fail_events: AtomicBool,
    /// Mails carrying one of these HRIDs are rejected.
    pub failing_hrids: Mutex<Vec<String>>,
}

impl FakeEffects {
    pub fn upload_paths(&self) -> Vec<String> {
        self.uploads
            .lock()
            .unwrap()
            .iter()
            .map(|upload| upload.path.clone())
            .collect()
    }

    pub fn mails(&self) -> Vec<MailMessage> {
        self.mails.lock().unwrap().clone()
    }

    pub fn purges(&self) -> Vec<Vec<String>> {
        self.purges.lock().unwrap().clone()
    }
}

fn unavailable(service: &'static str) -> EffectError {
    EffectError::Unavailable {
        service,
        message: "injected failure".into(),
    }
}

impl ImageTransformer for FakeEffects {
    fn to_normalized_jpeg(&self, bytes: Vec<u8>) -> BoxFuture<'_, EffectResult<Vec<u8>>> {
        let result = if self.fail_images.load(Ordering::SeqCst) {
            Err(unavailable("images"))
        } else {
            Ok([b"jpeg:".as_slice(), bytes.as_slice()].concat())
        };
        Box::pin(ready(result))
    }

    fn to_small_monochrome(
        &self,
        bytes: Vec<u8>,
        edge: u32,
    ) -> BoxFuture<'_, EffectResult<Vec<u8>>> {
        let result = if self.fail_images.load(Ordering::SeqCst) {
            Err(unavailable("images"))
        } else {
            Ok([format!("bw{edge}:").as_bytes(), bytes.as_slice()].concat())
        };
        Box::pin(ready(result))
    }
}

impl BlobStorage for FakeEffects {
    fn upload(&self, upload: BlobUpload) -> BoxFuture<'_, EffectResult<()>> {
        self.uploads.lock().unwrap().push(upload);
        Box::pin(ready(Ok(())))
    }
}

impl CdnPurger for FakeEffects {
    fn purge(&self, paths: Vec<String>) -> BoxFuture<'_, EffectResult<()>> {
        self.purges.lock().unwrap().push(paths);
        Box::pin(ready(Ok(())))
    }
}

impl PageRenderer for FakeEffects {
    fn render_page(
        &self,
        url: String,
        _width: u32,
        _height: u32,
    ) -> BoxFuture<'_, EffectResult<Vec<u8>>> {
        self.renders.lock().unwrap().push(url);
        let result = if self.fail_renderer.load(Ordering::SeqCst) {
            Err(unavailable("renderer"))
        } else {
            Ok(b"png".to_vec())
        };
        Box::pin(ready(result))
    }
}

impl Mailer for FakeEffects {
    fn send(&self, message: MailMessage) -> BoxFuture<'_, EffectResult<()>> {
        let hrid_fails = message
            .field("HRID")
            .and_then(|value| value.as_str())
            .is_some_and(|hrid| self.failing_hrids.lock().unwrap().iter().any(|h| h == hrid));
        if self.fail_mail.load(Ordering::SeqCst) || hrid_fails {
            return Box::pin(ready(Err(EffectError::Rejected {
                service: "mail",
                status: 500,
                message: "injected failure".into(),
            })));
        }
        self.mails.lock().unwrap().push(message);
        Box::pin(ready(Ok(())))
    }
}

impl CommentEventPublisher for FakeEffects {
    fn publish(&self, event: CommentEvent) -> BoxFuture<'_, EffectResult<()>> {
        if self.fail_events.load(Ordering::SeqCst) {
            return Box::pin(ready(Err(unavailable("events"))));
        }
        self.events.lock().unwrap().push(event);
        Box::pin(ready(Ok(())))
    }
}

impl OpsNotifier for FakeEffects {
    fn notify(&self, notice: OpsNotice) -> BoxFuture<'_, EffectResult<()>> {
        self.notices.lock().unwrap().push(notice);
        Box::pin(ready(Ok(())))
    }
}

pub struct Harness {
    pub store: InMemoryStore,
    pub effects: Arc<FakeEffects>,
    pub config: Arc<WorkflowConfig>,
    pub testimonials: TestimonialService,
    pub comments: CommentService,
    pub reclaim: ReclaimService,
    pub sweep: ConfirmationSweep,
}

impl Harness {
    pub fn new(store: InMemoryStore) -> Self {
        Self::with_backend(store.clone(), Arc::new(store))
    }

    /// Services run against `backend` while assertions read `store`.
    pub fn with_backend(store: InMemoryStore, backend: Arc<dyn Store>) -> Self {
        let effects = Arc::new(FakeEffects::default());
        let config = Arc::new(WorkflowConfig::default());
        let uow = UnitOfWork::new(backend);
        let clients = TestimonialClients {
            images: effects.clone(),
            blobs: effects.clone(),
            cdn: effects.clone(),
            renderer: effects.clone(),
            mailer: effects.clone(),
        };
        let sweep = ConfirmationSweep::new(uow.clone(), effects.clone(), config.clone());
        Self {
            testimonials: TestimonialService::new(
                uow.clone(),
                clients,
                Arc::new(FixedClock(NOW_MS)),
                config.clone(),
            ),
            comments: CommentService::new(uow.clone(), effects.clone(), effects.clone()),
            reclaim: ReclaimService::new(uow, sweep.clone()),
            sweep,
            store,
            effects,
            config,
        }
    }
}

pub fn actor(user_id: &str, email: &str) -> ActorIdentity {
    ActorIdentity::new(user_id, email, true)
}

pub fn user(id: &str, email: &str, verified: bool) -> User {
    User {
        id: id.into(),
        email: email.into(),
        first_name: None,
        last_name: None,
        birthday: None,
        address_id: None,
        verified,
    }
}

pub fn pledge(id: &str, user_id: &str) -> Pledge {
    Pledge {
        id: id.into(),
        user_id: user_id.into(),
        package_id: "package-abo".into(),
        total: 24_000,
        status: PledgeStatus::Successful,
        send_confirm_mail: false,
    }
}

pub fn membership(id: &str, user_id: &str, sequence_number: i64) -> Membership {
    Membership {
        id: id.into(),
        user_id: user_id.into(),
        pledge_id: None,
        sequence_number,
        voucher_code: None,
    }
}

pub fn testimonial(id: &str, user_id: &str, published: bool) -> Testimonial {
    Testimonial {
        id: id.into(),
        user_id: user_id.into(),
        role: Some("Reader".into()),
        quote: "Worth every cent".into(),
        image: Some("http://127.0.0.1:9000/assets/testimonials/old_256x256.jpeg".into()),
        sm_image: None,
        published,
        sequence_number: None,
        created_at_ms: 1,
        updated_at_ms: 1,
    }
}

pub fn comment(id: &str, user_id: &str) -> Comment {
    Comment {
        id: id.into(),
        user_id: user_id.into(),
        content: "first!".into(),
        published: true,
    }
}

/// Seeds an unverified donor `old` owning `pledge-1`, its membership,
/// payment source and address, plus the verified claimant `new`.
pub fn reclaim_tables(tables: &mut Tables) {
    let mut donor = user("old", "old@example.org", false);
    donor.first_name = Some("Jane".into());
    donor.address_id = Some("addr-old".into());
    tables.users.insert(donor.id.clone(), donor);
    tables
        .users
        .insert("new".into(), user("new", "new@example.org", true));
    tables.addresses.insert(
        "addr-old".into(),
        Address {
            id: "addr-old".into(),
            name: "Jane Doe".into(),
            line1: "Main Street 1".into(),
            line2: None,
            postal_code: "8000".into(),
            city: "Zurich".into(),
            country: "Switzerland".into(),
        },
    );
    tables
        .pledges
        .insert("pledge-1".into(), pledge("pledge-1", "old"));
    let mut owned = membership("m-1", "old", 12);
    owned.pledge_id = Some("pledge-1".into());
    tables.memberships.insert(owned.id.clone(), owned);
    tables.payment_sources.insert(
        "ps-1".into(),
        PaymentSource {
            id: "ps-1".into(),
            user_id: "old".into(),
            method: "STRIPE".into(),
        },
    );
}

/// Adds package, payment and link rows so `pledge_id` can be confirmed.
pub fn payable(tables: &mut Tables, pledge_id: &str, hrid: &str) {
    tables.packages.insert(
        "package-abo".into(),
        Package {
            id: "package-abo".into(),
            name: "ABO".into(),
        },
    );
    let payment_id = format!("payment-{pledge_id}");
    tables.payments.insert(
        payment_id.clone(),
        Payment {
            id: payment_id.clone(),
            hrid: hrid.into(),
            method: PaymentMethod::Paymentslip,
            paper_invoice: false,
            total: 24_000,
        },
    );
    tables.pledge_payments.push(PledgePayment {
        pledge_id: pledge_id.into(),
        payment_id,
        created_at_ms: 10,
    });
    if let Some(pledge) = tables.pledges.get_mut(pledge_id) {
        pledge.send_confirm_mail = true;
    }
}

/// Store whose scopes fail the named write after staging everything before it.
pub struct FaultyStore {
    inner: InMemoryStore,
    failing_write: &'static str,
    reassign_gate: Option<Arc<Barrier>>,
}

impl FaultyStore {
    pub fn new(inner: InMemoryStore, failing_write: &'static str) -> Self {
        Self {
            inner,
            failing_write,
            reassign_gate: None,
        }
    }

    /// Scopes that reassigned a pledge wait on `gate` before committing, so
    /// concurrent reclaims all stage their writes before any of them lands.
    pub fn gated(inner: InMemoryStore, gate: Arc<Barrier>) -> Self {
        Self {
            inner,
            failing_write: "",
            reassign_gate: Some(gate),
        }
    }
}

impl Store for FaultyStore {
    fn name(&self) -> &'static str {
        "faulty"
    }

    fn begin(&self) -> BoxFuture<'_, DomainResult<Box<dyn StoreScope>>> {
        Box::pin(async move {
            let inner = self.inner.begin().await?;
            let scope: Box<dyn StoreScope> = Box::new(FaultyScope {
                inner,
                failing_write: self.failing_write,
                reassign_gate: self.reassign_gate.clone(),
                reassigned: false,
            });
            Ok(scope)
        })
    }
}

struct FaultyScope {
    inner: Box<dyn StoreScope>,
    failing_write: &'static str,
    reassign_gate: Option<Arc<Barrier>>,
    reassigned: bool,
}

impl FaultyScope {
    fn trip(&self, write: &'static str) -> Option<BoxFuture<'static, DomainResult<()>>> {
        (self.failing_write == write).then(|| {
            let err = DomainError::Persistence(format!("{write} failed"));
            Box::pin(ready(Err(err))) as BoxFuture<'static, DomainResult<()>>
        })
    }
}

impl StoreScope for FaultyScope {
    fn count_pledges_for_user(&mut self, user_id: &str) -> BoxFuture<'_, DomainResult<u64>> {
        self.inner.count_pledges_for_user(user_id)
    }

    fn count_memberships_for_user(&mut self, user_id: &str) -> BoxFuture<'_, DomainResult<u64>> {
        self.inner.count_memberships_for_user(user_id)
    }

    fn find_testimonial_by_user(
        &mut self,
        user_id: &str,
    ) -> BoxFuture<'_, DomainResult<Option<Testimonial>>> {
        self.inner.find_testimonial_by_user(user_id)
    }

    fn first_membership_for_user(
        &mut self,
        user_id: &str,
    ) -> BoxFuture<'_, DomainResult<Option<Membership>>> {
        self.inner.first_membership_for_user(user_id)
    }

    fn insert_testimonial(&mut self, testimonial: &Testimonial) -> BoxFuture<'_, DomainResult<()>> {
        if let Some(failed) = self.trip("insert_testimonial") {
            return failed;
        }
        self.inner.insert_testimonial(testimonial)
    }

    fn update_testimonial(
        &mut self,
        testimonial_id: &str,
        patch: &TestimonialPatch,
    ) -> BoxFuture<'_, DomainResult<()>> {
        if let Some(failed) = self.trip("update_testimonial") {
            return failed;
        }
        self.inner.update_testimonial(testimonial_id, patch)
    }

    fn find_comment(&mut self, comment_id: &str) -> BoxFuture<'_, DomainResult<Option<Comment>>> {
        self.inner.find_comment(comment_id)
    }

    fn set_comment_published(
        &mut self,
        comment_id: &str,
        published: bool,
    ) -> BoxFuture<'_, DomainResult<()>> {
        if let Some(failed) = self.trip("set_comment_published") {
            return failed;
        }
        self.inner.set_comment_published(comment_id, published)
    }

    fn find_pledge(&mut self, pledge_id: &str) -> BoxFuture<'_, DomainResult<Option<Pledge>>> {
        self.inner.find_pledge(pledge_id)
    }

    fn find_user(&mut self, user_id: &str) -> BoxFuture<'_, DomainResult<Option<User>>> {
        self.inner.find_user(user_id)
    }

    fn find_address(
        &mut self,
        address_id: &str,
    ) -> BoxFuture<'_, DomainResult<Option<Address>>> {
        self.inner.find_address(address_id)
    }

    fn reassign_pledge(
        &mut self,
        pledge_id: &str,
        from_user_id: &str,
        to_user_id: &str,
    ) -> BoxFuture<'_, DomainResult<()>> {
        if let Some(failed) = self.trip("reassign_pledge") {
            return failed;
        }
        self.reassigned = true;
        self.inner
            .reassign_pledge(pledge_id, from_user_id, to_user_id)
    }

    fn reassign_memberships(
        &mut self,
        from_user_id: &str,
        to_user_id: &str,
    ) -> BoxFuture<'_, DomainResult<()>> {
        if let Some(failed) = self.trip("reassign_memberships") {
            return failed;
        }
        self.inner.reassign_memberships(from_user_id, to_user_id)
    }

    fn reassign_payment_sources(
        &mut self,
        from_user_id: &str,
        to_user_id: &str,
    ) -> BoxFuture<'_, DomainResult<()>> {
        if let Some(failed) = self.trip("reassign_payment_sources") {
            return failed;
        }
        self.inner.reassign_payment_sources(from_user_id, to_user_id)
    }

    fn update_user_profile(
        &mut self,
        user_id: &str,
        patch: &ProfilePatch,
    ) -> BoxFuture<'_, DomainResult<()>> {
        if let Some(failed) = self.trip("update_user_profile") {
            return failed;
        }
        self.inner.update_user_profile(user_id, patch)
    }

    fn clear_user_address(&mut self, user_id: &str) -> BoxFuture<'_, DomainResult<()>> {
        if let Some(failed) = self.trip("clear_user_address") {
            return failed;
        }
        self.inner.clear_user_address(user_id)
    }

    fn pledges_owing_confirmation(
        &mut self,
        user_id: &str,
    ) -> BoxFuture<'_, DomainResult<Vec<Pledge>>> {
        self.inner.pledges_owing_confirmation(user_id)
    }

    fn find_package(&mut self, package_id: &str) -> BoxFuture<'_, DomainResult<Option<Package>>> {
        self.inner.find_package(package_id)
    }

    fn memberships_for_pledge(
        &mut self,
        pledge_id: &str,
    ) -> BoxFuture<'_, DomainResult<Vec<Membership>>> {
        self.inner.memberships_for_pledge(pledge_id)
    }

    fn latest_pledge_payment(
        &mut self,
        pledge_id: &str,
    ) -> BoxFuture<'_, DomainResult<Option<PledgePayment>>> {
        self.inner.latest_pledge_payment(pledge_id)
    }

    fn find_payment(&mut self, payment_id: &str) -> BoxFuture<'_, DomainResult<Option<Payment>>> {
        self.inner.find_payment(payment_id)
    }

    fn clear_confirmation_flags(
        &mut self,
        pledge_ids: &[String],
    ) -> BoxFuture<'_, DomainResult<()>> {
        if let Some(failed) = self.trip("clear_confirmation_flags") {
            return failed;
        }
        self.inner.clear_confirmation_flags(pledge_ids)
    }

    fn commit(self: Box<Self>) -> BoxFuture<'static, DomainResult<()>> {
        let Self {
            inner,
            reassign_gate,
            reassigned,
            ..
        } = *self;
        Box::pin(async move {
            if let Some(gate) = reassign_gate.filter(|_| reassigned) {
                gate.wait().await;
            }
            inner.commit().await
        })
    }

    fn rollback(self: Box<Self>) -> BoxFuture<'static, ()> {
        self.inner.rollback()
    }
}
