use std::sync::Arc;

use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use futures_util::future::try_join;
use serde::Serialize;

use crate::DomainResult;
use crate::config::WorkflowConfig;
use crate::error::DomainError;
use crate::guard::require_signed_in;
use crate::identity::ActorIdentity;
use crate::model::{Testimonial, TestimonialPatch};
use crate::ports::clock::Clock;
use crate::ports::effects::{
    BlobStorage, BlobUpload, CdnPurger, ImageTransformer, MailMessage, Mailer, MergeVar,
    PageRenderer,
};
use crate::ports::store::StoreScope;
use crate::post_commit::{EffectReport, PostCommit};
use crate::uow::{UnitOfWork, settle};
use crate::util::new_record_id;

const OPERATION: &str = "submit_testimonial";
const JPEG: &str = "image/jpeg";
const PNG: &str = "image/png";

#[derive(Clone, Debug, Default)]
pub struct TestimonialInput {
    pub role: Option<String>,
    pub quote: String,
    /// Base64 encoded image bytes.
    pub image: Option<String>,
}

/// Testimonial as returned to the caller, with the owner's display name.
#[derive(Clone, Debug, Serialize, PartialEq)]
pub struct TestimonialView {
    #[serde(flatten)]
    pub testimonial: Testimonial,
    pub name: String,
}

#[derive(Clone, Debug, PartialEq)]
pub struct TestimonialSubmission {
    pub testimonial: TestimonialView,
    pub effects: EffectReport,
}

#[derive(Clone)]
pub struct TestimonialClients {
    pub images: Arc<dyn ImageTransformer>,
    pub blobs: Arc<dyn BlobStorage>,
    pub cdn: Arc<dyn CdnPurger>,
    pub renderer: Arc<dyn PageRenderer>,
    pub mailer: Arc<dyn Mailer>,
}

#[derive(Clone)]
pub struct TestimonialService {
    uow: UnitOfWork,
    clients: TestimonialClients,
    clock: Arc<dyn Clock>,
    config: Arc<WorkflowConfig>,
}

#[derive(Debug)]
struct ValidatedInput {
    /// `None` leaves the stored role alone, `Some(None)` clears it.
    role: Option<Option<String>>,
    quote: String,
    image: Option<Vec<u8>>,
}

struct Written {
    testimonial: Testimonial,
    name: String,
    first_publish: bool,
}

impl TestimonialService {
    pub fn new(
        uow: UnitOfWork,
        clients: TestimonialClients,
        clock: Arc<dyn Clock>,
        config: Arc<WorkflowConfig>,
    ) -> Self {
        Self {
            uow,
            clients,
            clock,
            config,
        }
    }

    pub async fn submit(
        &self,
        actor: Option<&ActorIdentity>,
        input: TestimonialInput,
    ) -> DomainResult<TestimonialSubmission> {
        let actor = require_signed_in(actor)?;

        let mut scope = self.uow.begin().await?;
        let outcome = self.write(scope.as_mut(), actor, &input).await;
        let Written {
            mut testimonial,
            name,
            first_publish,
        } = settle(scope, OPERATION, outcome).await?;

        let subject = testimonial.id.clone();
        let mut post = PostCommit::new(OPERATION, &actor.user_id, &subject);
        if let Some(sm_image) = post
            .run("share_card", self.publish_share_card(&testimonial.id))
            .await
        {
            testimonial.sm_image = Some(sm_image);
        }
        if first_publish && testimonial.published {
            post.run("confirmation_mail", self.send_confirmation(actor, &name))
                .await;
        }

        Ok(TestimonialSubmission {
            testimonial: TestimonialView { testimonial, name },
            effects: post.finish(),
        })
    }

    async fn write(
        &self,
        scope: &mut dyn StoreScope,
        actor: &ActorIdentity,
        input: &TestimonialInput,
    ) -> DomainResult<Written> {
        ensure_entitled(scope, actor).await?;
        let payload = validate_input(input, self.config.max_quote_length).inspect_err(|err| {
            tracing::warn!(operation = OPERATION, actor_id = %actor.user_id, error = %err, "testimonial rejected");
        })?;

        let existing = scope.find_testimonial_by_user(&actor.user_id).await?;
        let first_publish = existing.as_ref().is_none_or(|prior| !prior.published);

        let sequence_number = scope
            .first_membership_for_user(&actor.user_id)
            .await?
            .map(|membership| membership.sequence_number);
        let name = scope
            .find_user(&actor.user_id)
            .await?
            .map(|user| user.display_name())
            .unwrap_or_else(|| actor.email.clone());

        let testimonial = match (existing, payload.image) {
            (None, None) => {
                return Err(DomainError::Validation(
                    "an image is required for a new testimonial".into(),
                ));
            }
            (Some(mut prior), None) => {
                let patch = TestimonialPatch {
                    role: payload.role,
                    quote: Some(payload.quote),
                    sequence_number: missing_sequence(&prior, sequence_number),
                    ..TestimonialPatch::default()
                };
                scope.update_testimonial(&prior.id, &patch).await?;
                patch.apply(&mut prior);
                prior
            }
            (existing, Some(bytes)) => {
                let id = existing
                    .as_ref()
                    .map(|prior| prior.id.clone())
                    .unwrap_or_else(new_record_id);
                let image = self.store_renditions(&id, bytes, existing.is_some()).await?;
                let now = self.clock.now_ms();
                match existing {
                    Some(mut prior) => {
                        let patch = TestimonialPatch {
                            role: payload.role,
                            quote: Some(payload.quote),
                            image: Some(image),
                            published: Some(true),
                            sequence_number: missing_sequence(&prior, sequence_number),
                            updated_at_ms: Some(now),
                            ..TestimonialPatch::default()
                        };
                        scope.update_testimonial(&prior.id, &patch).await?;
                        patch.apply(&mut prior);
                        prior
                    }
                    None => {
                        let created = Testimonial {
                            id,
                            user_id: actor.user_id.clone(),
                            role: payload.role.flatten(),
                            quote: payload.quote,
                            image: Some(image),
                            sm_image: None,
                            published: true,
                            sequence_number,
                            created_at_ms: now,
                            updated_at_ms: now,
                        };
                        scope.insert_testimonial(&created).await?;
                        created
                    }
                }
            }
        };

        Ok(Written {
            testimonial,
            name,
            first_publish,
        })
    }

    /// Uploads the normalized original and the small monochrome rendition,
    /// returning the public URL of the small one.
    async fn store_renditions(
        &self,
        testimonial_id: &str,
        bytes: Vec<u8>,
        replaces_prior: bool,
    ) -> DomainResult<String> {
        let original_path = self.config.original_image_path(testimonial_id);
        let small_path = self.config.small_image_path(testimonial_id);

        let original = async {
            let jpeg = self.clients.images.to_normalized_jpeg(bytes.clone()).await?;
            self.clients
                .blobs
                .upload(self.blob(jpeg, &original_path, JPEG))
                .await
        };
        let small = async {
            let jpeg = self
                .clients
                .images
                .to_small_monochrome(bytes.clone(), self.config.small_image_edge)
                .await?;
            self.clients
                .blobs
                .upload(self.blob(jpeg, &small_path, JPEG))
                .await
        };
        try_join(original, small).await?;

        if replaces_prior {
            self.clients
                .cdn
                .purge(vec![original_path, small_path.clone()])
                .await?;
        }
        Ok(self.config.asset_url(&small_path))
    }

    async fn publish_share_card(&self, testimonial_id: &str) -> DomainResult<String> {
        let path = self.config.share_card_path(testimonial_id);
        let png = self
            .clients
            .renderer
            .render_page(
                self.config.share_page_url(testimonial_id),
                self.config.share_card_width,
                self.config.share_card_height,
            )
            .await?;
        self.clients.blobs.upload(self.blob(png, &path, PNG)).await?;
        self.clients.cdn.purge(vec![path.clone()]).await?;

        let url = self.config.asset_url(&path);
        let patch = TestimonialPatch {
            sm_image: Some(url.clone()),
            ..TestimonialPatch::default()
        };
        let mut scope = self.uow.begin().await?;
        let outcome = scope.update_testimonial(testimonial_id, &patch).await;
        settle(scope, "store_share_card", outcome).await?;
        Ok(url)
    }

    async fn send_confirmation(&self, actor: &ActorIdentity, name: &str) -> DomainResult<()> {
        let message = MailMessage {
            to: actor.email.clone(),
            from_email: self.config.mail_from_address.clone(),
            subject: self.config.testimonial_mail_subject.clone(),
            template_name: self.config.testimonial_mail_template.clone(),
            fields: vec![MergeVar::new("NAME", name)],
        };
        self.clients.mailer.send(message).await?;
        Ok(())
    }

    fn blob(&self, bytes: Vec<u8>, path: &str, mime_type: &'static str) -> BlobUpload {
        BlobUpload {
            bytes,
            path: path.to_string(),
            mime_type,
            bucket: self.config.bucket.clone(),
        }
    }
}

/// Sequence number to write when the stored testimonial has none yet.
fn missing_sequence(prior: &Testimonial, earliest: Option<i64>) -> Option<i64> {
    match prior.sequence_number {
        Some(_) => None,
        None => earliest,
    }
}

async fn ensure_entitled(scope: &mut dyn StoreScope, actor: &ActorIdentity) -> DomainResult<()> {
    if scope.count_pledges_for_user(&actor.user_id).await? > 0 {
        return Ok(());
    }
    if scope.count_memberships_for_user(&actor.user_id).await? > 0 {
        return Ok(());
    }
    tracing::warn!(operation = OPERATION, actor_id = %actor.user_id, "testimonial without pledge or membership");
    Err(DomainError::NotEntitled(
        "a pledge or membership is required to submit a testimonial".into(),
    ))
}

fn validate_input(input: &TestimonialInput, max_quote_length: usize) -> DomainResult<ValidatedInput> {
    let quote = input.quote.trim().to_string();
    if quote.chars().count() > max_quote_length {
        return Err(DomainError::Validation(format!(
            "quote must be at most {max_quote_length} characters"
        )));
    }

    let role = input.role.as_deref().map(|role| {
        let role = role.trim();
        (!role.is_empty()).then(|| role.to_string())
    });

    let image = match input.image.as_deref().map(str::trim) {
        Some(encoded) if !encoded.is_empty() => Some(
            STANDARD
                .decode(encoded)
                .map_err(|_| DomainError::Validation("image is not valid base64".into()))?,
        ),
        _ => None,
    };

    Ok(ValidatedInput { role, quote, image })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn input(quote: String) -> TestimonialInput {
        TestimonialInput {
            role: None,
            quote,
            image: None,
        }
    }

    #[test]
    fn quote_of_exactly_max_length_is_accepted() {
        let payload = validate_input(&input("a".repeat(140)), 140).expect("valid");
        assert_eq!(payload.quote.len(), 140);
    }

    #[test]
    fn quote_over_max_length_is_rejected() {
        let err = validate_input(&input("a".repeat(141)), 140).expect_err("too long");
        assert!(matches!(err, DomainError::Validation(_)));
    }

    #[test]
    fn surrounding_whitespace_does_not_count() {
        let padded = format!("   {}   ", "ä".repeat(140));
        let payload = validate_input(&input(padded), 140).expect("valid");
        assert_eq!(payload.quote.chars().count(), 140);
    }

    #[test]
    fn blank_role_clears_and_blank_image_is_absent() {
        let payload = validate_input(
            &TestimonialInput {
                role: Some("  ".into()),
                quote: "hello".into(),
                image: Some(String::new()),
            },
            140,
        )
        .expect("valid");
        assert_eq!(payload.role, Some(None));
        assert!(payload.image.is_none());
    }

    #[test]
    fn missing_role_leaves_stored_role_untouched() {
        let payload = validate_input(&input("hello".into()), 140).expect("valid");
        assert_eq!(payload.role, None);
    }

    #[test]
    fn image_must_be_base64() {
        let err = validate_input(
            &TestimonialInput {
                role: None,
                quote: "hello".into(),
                image: Some("not base64!".into()),
            },
            140,
        )
        .expect_err("invalid image");
        assert!(matches!(err, DomainError::Validation(_)));
    }

    #[test]
    fn image_is_decoded() {
        let payload = validate_input(
            &TestimonialInput {
                role: Some(" Reader ".into()),
                quote: "hello".into(),
                image: Some(STANDARD.encode([1u8, 2, 3])),
            },
            140,
        )
        .expect("valid");
        assert_eq!(payload.role, Some(Some("Reader".to_string())));
        assert_eq!(payload.image, Some(vec![1, 2, 3]));
    }
}
