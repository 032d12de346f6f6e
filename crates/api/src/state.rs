use std::sync::Arc;

use patronage_domain::comments::CommentService;
use patronage_domain::confirmations::ConfirmationSweep;
use patronage_domain::memory::InMemoryStore;
use patronage_domain::pledges::ReclaimService;
use patronage_domain::ports::clock::SystemClock;
use patronage_domain::ports::store::Store;
use patronage_domain::testimonials::{TestimonialClients, TestimonialService};
use patronage_domain::uow::UnitOfWork;
use patronage_infra::config::AppConfig;
use patronage_infra::db::DbConfig;
use patronage_infra::effects::{
    BlobStorageClient, CdnClient, EffectHttp, ImageServiceClient, OpsWebhookNotifier,
    RendererClient, TemplateMailClient,
};
use patronage_infra::events::BroadcastCommentEvents;
use patronage_infra::store::SurrealStore;

#[derive(Clone)]
pub struct AppState {
    pub config: AppConfig,
    pub backend: &'static str,
    pub testimonials: TestimonialService,
    pub comments: CommentService,
    pub reclaim: ReclaimService,
    /// Live feed behind `/v1/comments/events`.
    pub comment_events: BroadcastCommentEvents,
}

impl AppState {
    pub async fn new(config: AppConfig) -> anyhow::Result<Self> {
        let store: Arc<dyn Store> = if config.uses_surreal() {
            let db_config = DbConfig::from_app_config(&config);
            db_config.health_check().await?;
            Arc::new(SurrealStore::connect(&db_config).await?)
        } else {
            tracing::warn!("DATA_BACKEND=memory, writes are lost on restart");
            Arc::new(InMemoryStore::new())
        };
        Ok(Self::with_store(config, store))
    }

    pub fn with_store(config: AppConfig, store: Arc<dyn Store>) -> Self {
        let http = EffectHttp::from_config(&config);
        let workflow = Arc::new(config.workflow_config());
        let uow = UnitOfWork::new(store);
        let mailer = Arc::new(TemplateMailClient::from_config(http.clone(), &config));

        let clients = TestimonialClients {
            images: Arc::new(ImageServiceClient::from_config(http.clone(), &config)),
            blobs: Arc::new(BlobStorageClient::from_config(http.clone(), &config)),
            cdn: Arc::new(CdnClient::from_config(http.clone(), &config)),
            renderer: Arc::new(RendererClient::from_config(http.clone(), &config)),
            mailer: mailer.clone(),
        };
        let comment_events = BroadcastCommentEvents::default();
        let ops = Arc::new(OpsWebhookNotifier::from_config(http, &config));
        let sweep = ConfirmationSweep::new(uow.clone(), mailer, workflow.clone());

        Self {
            backend: uow.backend(),
            testimonials: TestimonialService::new(
                uow.clone(),
                clients,
                Arc::new(SystemClock),
                workflow,
            ),
            comments: CommentService::new(uow.clone(), Arc::new(comment_events.clone()), ops),
            reclaim: ReclaimService::new(uow, sweep),
            comment_events,
            config,
        }
    }
}
