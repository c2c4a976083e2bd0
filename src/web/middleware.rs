//! Request middleware for the filedepot Web API.

use std::sync::Arc;

use axum::{async_trait, extract::FromRequestParts, http::request::Parts, http::HeaderValue};
use tower_http::cors::{Any, CorsLayer};

use crate::db::{User, UserRepository};

use super::error::ApiError;
use super::handlers::AppState;

/// Header carrying the resolved owner id, set by the fronting auth layer.
pub const OWNER_ID_HEADER: &str = "x-owner-id";

/// Owner identity consumed from the fronting auth layer.
///
/// This service never authenticates. The external collaborator resolves the
/// caller and forwards the owner id; this extractor loads the matching
/// active account and rejects anything else with 401.
#[derive(Debug, Clone)]
pub struct OwnerIdentity(pub User);

#[async_trait]
impl FromRequestParts<Arc<AppState>> for OwnerIdentity {
    type Rejection = ApiError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &Arc<AppState>,
    ) -> Result<Self, Self::Rejection> {
        let raw = parts
            .headers
            .get(OWNER_ID_HEADER)
            .and_then(|value| value.to_str().ok())
            .ok_or_else(|| ApiError::unauthorized("missing owner identity"))?;

        let owner_id: i64 = raw
            .trim()
            .parse()
            .map_err(|_| ApiError::unauthorized("invalid owner identity"))?;

        let user = UserRepository::new(state.db.pool())
            .get_by_id(owner_id)
            .await?
            .filter(|user| user.is_active)
            .ok_or_else(|| ApiError::unauthorized("unknown owner identity"))?;

        Ok(OwnerIdentity(user))
    }
}

/// Create the CORS layer from configured origins.
///
/// An empty origin list allows any origin.
pub fn create_cors_layer(cors_origins: &[String]) -> CorsLayer {
    if cors_origins.is_empty() {
        CorsLayer::new()
            .allow_origin(Any)
            .allow_methods(Any)
            .allow_headers(Any)
    } else {
        let origins: Vec<HeaderValue> = cors_origins
            .iter()
            .filter_map(|origin| origin.parse().ok())
            .collect();
        CorsLayer::new()
            .allow_origin(origins)
            .allow_methods(Any)
            .allow_headers(Any)
    }
}
