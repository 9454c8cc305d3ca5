//! Seams over the two REST APIs the tracker talks to. The poller and the
//! endpoints only depend on these traits.

pub mod http;
#[cfg(test)]
pub mod fakes;

use async_trait::async_trait;
use interfaces_github_gists::index::{FetchUserGistsError, Gist, ParseGistsError};
use interfaces_pipedrive_activities::index::CreateActivityError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum GistSourceError {
    #[error("FetchUserGists: {source}")]
    FetchUserGists {
        #[from]
        source: FetchUserGistsError,
    },

    #[error("ParseGists: {source}")]
    ParseGists {
        #[from]
        source: ParseGistsError,
    },
}

#[derive(Debug, Error)]
pub enum ActivitySinkError {
    #[error("CreateActivity: {source}")]
    CreateActivity {
        #[from]
        source: CreateActivityError,
    },
}

#[async_trait]
pub trait GistSource: Send + Sync {
    async fn fetch_gists(
        &self,
        username: &str,
        since: Option<&str>,
    ) -> Result<Vec<Gist>, GistSourceError>;

    /// Same request as [`GistSource::fetch_gists`], body left untouched.
    async fn fetch_gists_raw(
        &self,
        username: &str,
        since: Option<&str>,
    ) -> Result<String, GistSourceError>;
}

#[async_trait]
pub trait ActivitySink: Send + Sync {
    /// `Ok(false)` is a rejected activity, not a transport failure.
    async fn report_activity(&self, gist: &Gist) -> Result<bool, ActivitySinkError>;
}
