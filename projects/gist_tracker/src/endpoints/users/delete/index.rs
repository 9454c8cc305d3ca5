use axum::{
    extract::{Extension, Path, Query},
    http::StatusCode,
};
use serde::Deserialize;
use tracing::info;

use crate::state::AppState;

#[derive(Deserialize)]
pub struct DeleteUserQuery {
    username: String,
}

/// Axum handler: DELETE /delete-user/{username}
pub async fn handler(
    Extension(state): Extension<AppState>,
    Path(username): Path<String>,
) -> StatusCode {
    delete_user(&state, &username).await
}

/// Axum handler: DELETE /delete-user?username=
pub async fn query_handler(
    Extension(state): Extension<AppState>,
    Query(input): Query<DeleteUserQuery>,
) -> StatusCode {
    delete_user(&state, &input.username).await
}

async fn delete_user(state: &AppState, username: &str) -> StatusCode {
    if state.registry.remove_user(username).await {
        info!(username, "user removed");
    }
    StatusCode::ACCEPTED
}
