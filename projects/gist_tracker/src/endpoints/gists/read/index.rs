use axum::{
    extract::{Extension, Path},
    http::{header, StatusCode},
    response::IntoResponse,
};
use chrono::Utc;
use thiserror::Error;
use tracing::error;

use crate::{
    registry::{models::Watermark, UserRegistry},
    state::AppState,
    upstream::{GistSource, GistSourceError},
    utils::cursor::since_cursor,
};

#[derive(Debug, Error)]
pub enum HandlerError {
    #[error("Request to GitHub failed: {source}")]
    RequestFail {
        #[from]
        source: FetchGistsSinceLastVisitError,
    },
}

impl IntoResponse for HandlerError {
    fn into_response(self) -> axum::response::Response {
        (StatusCode::BAD_GATEWAY, self.to_string()).into_response()
    }
}

/// Axum handler: GET /{username}/gists
pub async fn handler(
    Extension(state): Extension<AppState>,
    Path(username): Path<String>,
) -> Result<axum::response::Response, HandlerError> {
    let body = fetch_gists_since_last_visit(&state.registry, state.gists.as_ref(), &username)
        .await
        .inspect_err(|err| error!(username = %username, "Error fetching gists: {err}"))?;

    Ok(match body {
        Some(body) => ([(header::CONTENT_TYPE, "application/json")], body).into_response(),
        None => String::new().into_response(),
    })
}

#[derive(Debug, Error)]
pub enum FetchGistsSinceLastVisitError {
    #[error("FetchGists: {source}")]
    FetchGists {
        #[from]
        source: GistSourceError,
    },
}

/// Returns the raw upstream body for the gists published since the user's
/// last visit and moves `lastVisit` to the time of this fetch. Unknown users
/// get `None` and no upstream call.
pub async fn fetch_gists_since_last_visit(
    registry: &UserRegistry,
    gists: &dyn GistSource,
    username: &str,
) -> Result<Option<String>, FetchGistsSinceLastVisitError> {
    let Some(user) = registry.find_user(username).await else {
        return Ok(None);
    };

    let visited_at = Utc::now();
    let since = since_cursor(user.last_visit);
    let body = gists.fetch_gists_raw(&user.username, since.as_deref()).await?;

    registry
        .update_watermark(&user.username, Watermark::LastVisit, visited_at)
        .await;
    Ok(Some(body))
}
