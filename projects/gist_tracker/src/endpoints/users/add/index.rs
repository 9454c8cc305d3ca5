use axum::{
    extract::{Extension, Form},
    http::StatusCode,
    response::IntoResponse,
};
use serde::Deserialize;
use thiserror::Error;
use tracing::info;

use crate::{registry::AddUserError, state::AppState};

#[derive(Debug, Error)]
pub enum HandlerError {
    #[error("AddUser: {source}")]
    AddUser {
        #[from]
        source: AddUserError,
    },
}

impl IntoResponse for HandlerError {
    fn into_response(self) -> axum::response::Response {
        match self {
            HandlerError::AddUser { source: AddUserError::DuplicateUser { .. } } => {
                (StatusCode::BAD_REQUEST, "Username already exists").into_response()
            }
            HandlerError::AddUser { source: source @ AddUserError::InvalidUsername { .. } } => {
                (StatusCode::BAD_REQUEST, source.to_string()).into_response()
            }
        }
    }
}

/// Form payload expected by the endpoint.
#[derive(Deserialize)]
pub struct AddUserForm {
    username: String,
}

/// Axum handler: POST /add-user
pub async fn handler(
    Extension(state): Extension<AppState>,
    Form(input): Form<AddUserForm>,
) -> Result<StatusCode, HandlerError> {
    if state.registry.add_user(&input.username).await? {
        info!(username = %input.username.trim(), "user added");
        Ok(StatusCode::CREATED)
    } else {
        Ok(StatusCode::OK)
    }
}
