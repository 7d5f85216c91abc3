//! REST endpoints for onboarding decisions and staged context.

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::routing::get;
use axum::{Json, Router};

use crate::client_service::ClientLookup;
use crate::error::OnboardingError;

use super::orchestrator::OnboardingOrchestrator;

/// Shared state for onboarding routes.
#[derive(Clone)]
pub struct OnboardingRouteState {
    pub orchestrator: OnboardingOrchestrator,
}

/// Build the onboarding REST routes.
pub fn onboarding_routes(state: OnboardingRouteState) -> Router {
    Router::new()
        .route("/health", get(health))
        .route("/api/onboarding/decision/{client}", get(get_decision))
        .route("/api/onboarding/staged/{key}", get(take_staged))
        .with_state(state)
}

async fn health() -> impl IntoResponse {
    Json(serde_json::json!({
        "status": "ok",
        "service": "cowork-onboarding"
    }))
}

/// GET /api/onboarding/decision/{client}
///
/// `client` is a client id, or `me` for the client bound to the API token.
async fn get_decision(
    State(state): State<OnboardingRouteState>,
    Path(client): Path<String>,
) -> Response {
    let Some(lookup) = ClientLookup::parse(&client) else {
        return (
            StatusCode::BAD_REQUEST,
            Json(serde_json::json!({ "error": "client id is required" })),
        )
            .into_response();
    };
    match state.orchestrator.decide(lookup).await {
        Ok(decision) => {
            let path = decision.path();
            let mut body = serde_json::to_value(&decision).unwrap_or_default();
            if let Some(obj) = body.as_object_mut() {
                obj.insert("path".to_string(), path.into());
            }
            (StatusCode::OK, Json(body)).into_response()
        }
        Err(e) => {
            let status = match &e {
                OnboardingError::NoClientFound { .. } => StatusCode::NOT_FOUND,
                OnboardingError::FetchFailed(_) => StatusCode::BAD_GATEWAY,
                OnboardingError::MalformedFlags(_) => StatusCode::UNPROCESSABLE_ENTITY,
                OnboardingError::Store(_) | OnboardingError::Cancelled => {
                    StatusCode::INTERNAL_SERVER_ERROR
                }
            };
            let message = match &e {
                OnboardingError::NoClientFound { .. } => "no client found".to_string(),
                other => other.to_string(),
            };
            (status, Json(serde_json::json!({ "error": message }))).into_response()
        }
    }
}

/// GET /api/onboarding/staged/{key}
///
/// Reads and consumes a staged-context value.
async fn take_staged(
    State(state): State<OnboardingRouteState>,
    Path(key): Path<String>,
) -> Response {
    match state.orchestrator.store().take(&key).await {
        Ok(Some(value)) => (
            StatusCode::OK,
            Json(serde_json::json!({ "key": key, "value": value })),
        )
            .into_response(),
        Ok(None) => (
            StatusCode::NOT_FOUND,
            Json(serde_json::json!({ "error": format!("nothing staged under {key}") })),
        )
            .into_response(),
        Err(e) => {
            tracing::warn!(key = %key, error = %e, "Failed to read staged context");
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(serde_json::json!({ "error": e.to_string() })),
            )
                .into_response()
        }
    }
}
