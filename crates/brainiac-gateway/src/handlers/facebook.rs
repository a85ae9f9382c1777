//! Facebook page proxy handlers.
//!
//! Thin forwarding to the Graph API on behalf of the client app. The caller
//! supplies the Facebook token; no session is required.

use crate::errors::ApiError;
use crate::routes::AppState;
use crate::services::is_valid_graph_id;
use axum::extract::rejection::JsonRejection;
use axum::extract::State;
use axum::http::HeaderMap;
use axum::Json;
use common::secret::{ExposeSecret, SecretString};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::instrument;

/// Header carrying the user's Facebook token for the page listing proxy.
pub const FACEBOOK_TOKEN_HEADER: &str = "x-facebook-token";

/// Response for `GET /api/facebook/pages`.
#[derive(Debug, Serialize)]
pub struct PagesResponse {
    pub pages: Vec<serde_json::Value>,
}

/// Request body for `POST /api/facebook/post`.
#[derive(Debug, Deserialize)]
pub struct PostRequest {
    pub page_id: Option<String>,
    pub page_token: Option<SecretString>,
    pub message: Option<String>,
}

/// Response for `POST /api/facebook/post`.
#[derive(Debug, Serialize)]
pub struct PostResponse {
    pub post_id: String,
    pub message: String,
}

/// Handler for GET /api/facebook/pages
///
/// ## Response
///
/// - 200 `{pages:[...]}` with page objects as the provider sent them
/// - 401 when `X-Facebook-Token` is missing or empty
/// - 502 when the provider call fails
#[instrument(skip_all, name = "gw.handlers.facebook.pages")]
pub async fn list_pages(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
) -> Result<Json<PagesResponse>, ApiError> {
    let user_token = headers
        .get(FACEBOOK_TOKEN_HEADER)
        .and_then(|h| h.to_str().ok())
        .map(str::trim)
        .filter(|t| !t.is_empty())
        .ok_or(ApiError::MissingProviderToken)?;

    let pages = state
        .identity_provider
        .list_pages(user_token)
        .await
        .map_err(|e| ApiError::Upstream(format!("list pages: {e}")))?;

    Ok(Json(PagesResponse { pages }))
}

/// Handler for POST /api/facebook/post
///
/// ## Response
///
/// - 200 `{post_id, message}`
/// - 400 when any of `page_id`, `page_token`, `message` is missing or empty
/// - 502 when the provider call fails
#[instrument(skip_all, name = "gw.handlers.facebook.post")]
pub async fn post_to_page(
    State(state): State<Arc<AppState>>,
    payload: Result<Json<PostRequest>, JsonRejection>,
) -> Result<Json<PostResponse>, ApiError> {
    let Json(request) = payload.map_err(|rejection| {
        tracing::debug!(target: "gw.handlers.facebook", error = %rejection, "Rejected post body");
        ApiError::BadRequest("Invalid request body".to_string())
    })?;

    let page_id = request.page_id.filter(|s| !s.trim().is_empty());
    let page_token = request
        .page_token
        .filter(|s| !s.expose_secret().trim().is_empty());
    let message = request.message.filter(|s| !s.trim().is_empty());

    let (Some(page_id), Some(page_token), Some(message)) = (page_id, page_token, message) else {
        return Err(ApiError::BadRequest(
            "Missing required fields: page_id, page_token, message".to_string(),
        ));
    };

    if !is_valid_graph_id(&page_id) {
        return Err(ApiError::BadRequest("page_id is invalid".to_string()));
    }

    let post_id = state
        .identity_provider
        .post_to_page(&page_id, page_token.expose_secret(), &message)
        .await
        .map_err(|e| ApiError::Upstream(format!("post to page: {e}")))?;

    Ok(Json(PostResponse {
        post_id,
        message: "Post created successfully".to_string(),
    }))
}
