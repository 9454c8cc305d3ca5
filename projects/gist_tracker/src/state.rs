use std::sync::Arc;

use crate::{registry::UserRegistry, upstream::GistSource};

/// Shared with every handler through an `Extension` layer.
#[derive(Clone)]
pub struct AppState {
    pub registry: Arc<UserRegistry>,
    pub gists: Arc<dyn GistSource>,
}
