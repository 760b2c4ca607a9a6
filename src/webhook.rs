//! Webhook endpoint and event state machine
//!
//! Receives GitHub events on `POST /github/`, dispatched by the
//! `X-GitHub-Event` header, and re-runs the decision pipeline for the
//! affected pull request. Each transition gets its own comment; the
//! decision itself always lands as a status check.

use crate::engine;
use crate::error::Result;
use crate::platform::{PlatformFactory, PlatformService};
use crate::registry::RegistrationStore;
use crate::report::Reporter;
use crate::sweep::merge_if_eligible;
use crate::types::{ReviewEvent, ReviewState};
use axum::Router;
use axum::extract::{Json, State};
use axum::http::{HeaderMap, StatusCode};
use axum::routing::post;
use chrono::{DateTime, Utc};
use serde::Deserialize;
use serde_json::{Value, json};
use std::sync::Arc;
use tower_http::trace::TraceLayer;
use tracing::{info, warn};

/// Shared state for the webhook handlers
#[derive(Clone)]
pub struct AppState {
    /// Registration lookup
    pub registry: Arc<dyn RegistrationStore>,
    /// Platform service factory
    pub factory: Arc<dyn PlatformFactory>,
    /// Dashboard base URL used in statuses and comments
    pub base_url: String,
}

/// Build the webhook router.
pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/github/", post(handle_github))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Response shape shared by all webhook handlers
pub type ApiResponse = (StatusCode, Json<Value>);

fn info_response(message: &str) -> ApiResponse {
    (StatusCode::OK, Json(json!({ "info": message })))
}

fn error_response(status: StatusCode, message: &str) -> ApiResponse {
    (status, Json(json!({ "error": message })))
}

// Webhook payload shapes (only the fields the engine needs)

#[derive(Deserialize)]
struct PullRequestEvent {
    action: String,
    repository: RepositoryRef,
    pull_request: PullRef,
}

#[derive(Deserialize)]
struct ReviewSubmittedEvent {
    action: String,
    repository: RepositoryRef,
    pull_request: PullRef,
    review: ReviewPayload,
}

#[derive(Deserialize)]
struct RepositoryRef {
    full_name: String,
}

#[derive(Deserialize)]
struct PullRef {
    number: u64,
}

#[derive(Deserialize)]
struct ReviewPayload {
    state: Option<String>,
    user: Option<UserRef>,
    submitted_at: Option<DateTime<Utc>>,
}

#[derive(Deserialize)]
struct UserRef {
    login: String,
}

async fn handle_github(
    State(state): State<AppState>,
    headers: HeaderMap,
    Json(payload): Json<Value>,
) -> ApiResponse {
    let event = headers
        .get("X-GitHub-Event")
        .and_then(|v| v.to_str().ok())
        .unwrap_or_default()
        .to_string();
    handle_event(&state, &event, payload).await
}

/// Dispatch one GitHub event. This is the whole webhook state machine;
/// the axum handler above only peels off the event-type header.
pub async fn handle_event(state: &AppState, event: &str, payload: Value) -> ApiResponse {
    match event {
        // Branch-protection bookkeeping lives outside this service
        "push" => info_response("Push event received"),
        "pull_request" => handle_pull_request(state, payload).await,
        "pull_request_review" => handle_review(state, payload).await,
        _ => {
            info!(event, "ignoring event type");
            info_response("Event ignored")
        }
    }
}

/// Look up the registration and build a platform service for it.
///
/// Returns `Ok(None)` when the repository is simply not registered, which
/// the handlers acknowledge without action.
async fn platform_for(
    state: &AppState,
    full_name: &str,
) -> Result<Option<Arc<dyn PlatformService>>> {
    let Some(registration) = state.registry.find(full_name).await? else {
        info!(repository = full_name, "repository not registered");
        return Ok(None);
    };
    state.factory.create(&registration).map(Some)
}

async fn handle_pull_request(state: &AppState, payload: Value) -> ApiResponse {
    let event: PullRequestEvent = match serde_json::from_value(payload) {
        Ok(event) => event,
        Err(e) => {
            return error_response(
                StatusCode::BAD_REQUEST,
                &format!("malformed pull_request event: {e}"),
            );
        }
    };

    let number = event.pull_request.number;
    info!(
        repository = %event.repository.full_name,
        number,
        action = %event.action,
        "pull_request event"
    );

    match event.action.as_str() {
        "opened" | "synchronize" => {
            let platform = match platform_for(state, &event.repository.full_name).await {
                Ok(Some(platform)) => platform,
                Ok(None) => return info_response("Repository not registered"),
                Err(e) => {
                    warn!(error = %e, "failed to prepare platform service");
                    return error_response(StatusCode::INTERNAL_SERVER_ERROR, &e.to_string());
                }
            };

            let reporter = Reporter::new(platform.as_ref(), &state.base_url);
            let result = async {
                let evaluation = engine::evaluate(platform.as_ref(), number).await?;
                reporter.publish_status(&evaluation).await?;

                let comment = if event.action == "opened" {
                    reporter.opened_comment(&evaluation)
                } else {
                    reporter.synchronize_comment(&evaluation)
                };
                reporter.comment(number, &comment).await?;

                merge_if_eligible(platform.as_ref(), &reporter, &evaluation).await
            }
            .await;

            match result {
                Ok(_) => info_response("Webhook processed"),
                Err(e) => {
                    warn!(number, error = %e, "failed to process pull_request event");
                    error_response(StatusCode::INTERNAL_SERVER_ERROR, &e.to_string())
                }
            }
        }
        // Title and description edits affect neither votes nor timeline
        "edited" => info_response("Edit noted"),
        // Merge or close already concluded the lifecycle
        "closed" => info_response("Already closed"),
        _ => info_response("Action ignored"),
    }
}

async fn handle_review(state: &AppState, payload: Value) -> ApiResponse {
    let event: ReviewSubmittedEvent = match serde_json::from_value(payload) {
        Ok(event) => event,
        Err(e) => {
            return error_response(
                StatusCode::BAD_REQUEST,
                &format!("malformed pull_request_review event: {e}"),
            );
        }
    };

    if event.action != "submitted" {
        return info_response("Review action ignored");
    }

    let Some(state_str) = event.review.state.as_deref() else {
        // A submitted review must carry a state; surface the data error
        return error_response(StatusCode::SERVICE_UNAVAILABLE, "No state");
    };

    let Some(review_state) = ReviewState::parse(state_str) else {
        return error_response(
            StatusCode::BAD_REQUEST,
            &format!("unknown review state: {state_str}"),
        );
    };

    if review_state == ReviewState::Commented {
        return info_response("Only commented");
    }

    let Some(user) = event.review.user else {
        return error_response(StatusCode::BAD_REQUEST, "review has no user");
    };

    let number = event.pull_request.number;
    info!(
        repository = %event.repository.full_name,
        number,
        reviewer = %user.login,
        state = state_str,
        "pull_request_review event"
    );

    let platform = match platform_for(state, &event.repository.full_name).await {
        Ok(Some(platform)) => platform,
        Ok(None) => return info_response("Repository not registered"),
        Err(e) => {
            warn!(error = %e, "failed to prepare platform service");
            return error_response(StatusCode::INTERNAL_SERVER_ERROR, &e.to_string());
        }
    };

    let review = ReviewEvent {
        reviewer_login: user.login,
        state: review_state,
        submitted_at: event.review.submitted_at.unwrap_or_else(Utc::now),
    };

    let reporter = Reporter::new(platform.as_ref(), &state.base_url);
    let result = async {
        let evaluation = engine::evaluate_with_review(platform.as_ref(), number, Some(&review)).await?;
        reporter.publish_status(&evaluation).await?;
        reporter
            .comment(number, &reporter.review_comment(&evaluation))
            .await?;
        merge_if_eligible(platform.as_ref(), &reporter, &evaluation).await
    }
    .await;

    match result {
        Ok(_) => info_response("Review processed"),
        Err(e) => {
            warn!(number, error = %e, "failed to process review event");
            error_response(StatusCode::INTERNAL_SERVER_ERROR, &e.to_string())
        }
    }
}
