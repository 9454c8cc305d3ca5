use axum::extract::{Extension, Json};

use crate::{registry::models::User, state::AppState};

/// Axum handler: GET /users
pub async fn handler(Extension(state): Extension<AppState>) -> Json<Vec<User>> {
    Json(state.registry.list_users().await)
}
