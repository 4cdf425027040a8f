pub mod admin;
pub mod auth;
pub mod rest;

use axum::Json;
use axum::Router;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde_json::json;
use std::sync::Arc;
use tower_http::trace::TraceLayer;

use crate::cache::GuardedCache;
use crate::config::SourceRegistry;
use crate::error::Error;
use crate::price_infra::orchestrator::Orchestrator;

pub struct ApiState {
    pub orchestrator: Arc<Orchestrator>,
    /// Admin routes answer 401 when unset.
    pub admin_token: Option<String>,
}

impl ApiState {
    pub fn cache(&self) -> &GuardedCache {
        self.orchestrator.cache()
    }

    pub fn registry(&self) -> &SourceRegistry {
        self.orchestrator.registry()
    }
}

pub fn create_router(state: Arc<ApiState>) -> Router {
    Router::new()
        .merge(rest::routes())
        .merge(admin::routes())
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// JSON `{error}` response for a crate error.
pub struct ApiError(pub Error);

impl From<Error> for ApiError {
    fn from(err: Error) -> Self {
        ApiError(err)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = match &self.0 {
            Error::Unauthorized => StatusCode::UNAUTHORIZED,
            Error::UnknownGroup(_) => StatusCode::NOT_FOUND,
            Error::BadRequest(_) | Error::InvalidPrice(_) | Error::InvalidNumber(_) => {
                StatusCode::BAD_REQUEST
            }
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        };
        if status.is_server_error() {
            tracing::error!(error = %self.0, "Request failed");
        }
        (status, Json(json!({ "error": self.0.to_string() }))).into_response()
    }
}
