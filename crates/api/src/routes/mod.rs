use std::convert::Infallible;
use std::time::Duration;

use axum::extract::{Extension, Path, State};
use axum::{
    Json, Router,
    http::{StatusCode, header},
    middleware,
    response::{
        IntoResponse, Response,
        sse::{Event, KeepAlive, Sse},
    },
    routing::{get, post},
};
use patronage_domain::{
    error::DomainError,
    identity::ActorIdentity,
    ports::notify::CommentEvent,
    pledges::ReclaimResolution,
    testimonials::{TestimonialInput, TestimonialView},
};
use serde::{Deserialize, Serialize};
use tokio::sync::{broadcast::error::RecvError, mpsc};
use tokio_stream::wrappers::UnboundedReceiverStream;
use tracing::Instrument;
use validator::Validate;

use crate::middleware::{AuthContext, CorrelationId};
use crate::{
    error::ApiError, middleware as app_middleware, observability, state::AppState, validation,
};

pub fn router(state: AppState) -> Router {
    let protected = Router::new()
        .route("/v1/testimonials", post(submit_testimonial))
        .route(
            "/v1/comments/:comment_id/unpublish",
            post(unpublish_comment),
        )
        .route("/v1/pledges/:pledge_id/reclaim", post(reclaim_pledge))
        .route_layer(middleware::from_fn(app_middleware::require_auth_middleware));

    let mut app = Router::new()
        .route("/health", get(health))
        .route("/metrics", get(metrics))
        .route("/v1/comments/events", get(stream_comment_events))
        .merge(protected)
        .layer(middleware::from_fn(app_middleware::metrics_layer))
        .layer(app_middleware::timeout_layer())
        .layer(app_middleware::trace_layer())
        .layer(app_middleware::set_request_id_layer())
        .layer(app_middleware::propagate_request_id_layer())
        .layer(middleware::from_fn_with_state(
            state.clone(),
            app_middleware::auth_middleware,
        ))
        .layer(middleware::from_fn(
            app_middleware::correlation_id_middleware,
        ));

    if !state.config.app_env.eq_ignore_ascii_case("test") {
        app = app.layer(app_middleware::rate_limit_layer());
    }

    app.with_state(state)
}

#[derive(Serialize)]
struct HealthResponse {
    status: &'static str,
    version: &'static str,
    environment: String,
    backend: &'static str,
}

async fn health(State(state): State<AppState>) -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok",
        version: env!("CARGO_PKG_VERSION"),
        environment: state.config.app_env.clone(),
        backend: state.backend,
    })
}

async fn metrics() -> Response {
    match observability::render_metrics() {
        Some(body) => (
            StatusCode::OK,
            [(header::CONTENT_TYPE, "text/plain; version=0.0.4")],
            body,
        )
            .into_response(),
        None => (StatusCode::SERVICE_UNAVAILABLE, "metrics recorder not installed").into_response(),
    }
}

#[derive(Debug, Deserialize, Validate)]
struct SubmitTestimonialRequest {
    #[serde(default)]
    #[validate(length(max = 256))]
    role: Option<String>,
    #[validate(length(max = 4096))]
    quote: String,
    /// Base64 encoded image.
    #[serde(default)]
    image: Option<String>,
}

async fn submit_testimonial(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    Extension(correlation): Extension<CorrelationId>,
    Json(payload): Json<SubmitTestimonialRequest>,
) -> Result<Json<TestimonialView>, ApiError> {
    validation::validate(&payload)?;
    let input = TestimonialInput {
        role: payload.role,
        quote: payload.quote,
        image: payload.image,
    };
    let submission = state
        .testimonials
        .submit(actor_identity(&auth), input)
        .instrument(workflow_span("submit_testimonial", &correlation))
        .await
        .map_err(map_domain_error)?;
    observability::register_effect_report("submit_testimonial", &submission.effects);
    Ok(Json(submission.testimonial))
}

#[derive(Serialize)]
struct UnpublishResponse {
    unpublished: bool,
}

async fn unpublish_comment(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    Extension(correlation): Extension<CorrelationId>,
    Path(comment_id): Path<String>,
) -> Result<Json<UnpublishResponse>, ApiError> {
    let outcome = state
        .comments
        .unpublish(actor_identity(&auth), &comment_id)
        .instrument(workflow_span("unpublish_comment", &correlation))
        .await
        .map_err(map_domain_error)?;
    observability::register_effect_report("unpublish_comment", &outcome.effects);
    Ok(Json(UnpublishResponse {
        unpublished: outcome.unpublished,
    }))
}

#[derive(Serialize)]
struct ReclaimResponse {
    reclaimed: bool,
    already_owned: bool,
}

async fn reclaim_pledge(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    Extension(correlation): Extension<CorrelationId>,
    Path(pledge_id): Path<String>,
) -> Result<Json<ReclaimResponse>, ApiError> {
    let outcome = state
        .reclaim
        .reclaim(actor_identity(&auth), &pledge_id)
        .instrument(workflow_span("reclaim_pledge", &correlation))
        .await
        .map_err(map_domain_error)?;
    observability::register_effect_report("reclaim_pledge", &outcome.effects);
    if let Some(report) = &outcome.confirmations {
        observability::register_confirmation_failures(report.failures.len());
    }
    Ok(Json(ReclaimResponse {
        reclaimed: true,
        already_owned: outcome.resolution == ReclaimResolution::AlreadyOwned,
    }))
}

/// Live feed of comment events. Subscribers that fall behind get a `replay`
/// event in place of what they missed.
async fn stream_comment_events(State(state): State<AppState>) -> Response {
    let (tx, rx) = mpsc::unbounded_channel::<Result<Event, Infallible>>();
    let mut receiver = state.comment_events.subscribe();

    tokio::spawn(async move {
        loop {
            tokio::select! {
                event = receiver.recv() => {
                    let event = match event {
                        Ok(event) => comment_stream_event(&event),
                        Err(RecvError::Lagged(skipped)) => {
                            tracing::debug!(skipped, "comment event subscriber lagged");
                            Event::default().event("replay").data("missed_events")
                        }
                        Err(RecvError::Closed) => break,
                    };
                    if tx.send(Ok(event)).is_err() {
                        break;
                    }
                }
                _ = tx.closed() => break,
            }
        }
    });

    Sse::new(UnboundedReceiverStream::new(rx))
        .keep_alive(KeepAlive::new().interval(Duration::from_secs(15)))
        .into_response()
}

fn comment_stream_event(event: &CommentEvent) -> Event {
    let name = match event {
        CommentEvent::CommentRemoved { .. } => "comment_removed",
    };
    Event::default()
        .event(name)
        .json_data(event)
        .unwrap_or_else(|_| Event::default().event("error").data("failed-to-serialize-event"))
}

fn workflow_span(operation: &'static str, correlation: &CorrelationId) -> tracing::Span {
    tracing::info_span!("workflow", operation, correlation_id = %correlation.0)
}

fn actor_identity(auth: &AuthContext) -> Option<&ActorIdentity> {
    auth.actor.as_ref()
}

fn map_domain_error(err: DomainError) -> ApiError {
    match err {
        DomainError::Unauthenticated => ApiError::Unauthorized,
        DomainError::Forbidden(message) => ApiError::Forbidden(message),
        DomainError::NotEntitled(message) => ApiError::NotEntitled(message),
        DomainError::Validation(message) => ApiError::Validation(message),
        DomainError::NotFound(message) => ApiError::NotFound(message),
        DomainError::Conflict(message) => ApiError::Conflict(message),
        DomainError::Persistence(_) | DomainError::ExternalEffect(_) => {
            tracing::error!(code = err.code(), error = %err, "workflow failed");
            ApiError::Internal
        }
    }
}
