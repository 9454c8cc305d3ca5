pub mod gists;
pub mod users;

use axum::{
    routing::{delete, get, post},
    Extension, Router,
};

use crate::state::AppState;

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/add-user", post(users::add::index::handler))
        .route("/delete-user", delete(users::delete::index::query_handler))
        .route("/delete-user/{username}", delete(users::delete::index::handler))
        .route("/users", get(users::list::index::handler))
        .route("/{username}/gists", get(gists::read::index::handler))
        .layer(Extension(state))
}
