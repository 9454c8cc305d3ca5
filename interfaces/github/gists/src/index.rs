use reqwest::{Client, StatusCode};
use serde::Deserialize;
use thiserror::Error;

pub const DEFAULT_API_URL: &str = "https://api.github.com";

pub struct GitHubRestResult {
    pub body: String,
    pub status: StatusCode,
}

/// A gist as listed by `GET /users/{username}/gists`. Only the fields the
/// tracker forwards are kept.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct Gist {
    pub id: String,
    #[serde(rename = "html_url")]
    pub url: String,
}

/// Connection details for the gist API.
#[derive(Debug, Clone)]
pub struct GitHubApi {
    pub base_url: String,
    pub token: Option<String>,
}

pub fn user_gists_url(base_url: &str, username: &str) -> String {
    format!("{}/users/{username}/gists", base_url.trim_end_matches('/'))
}

pub async fn fetch_user_gists(
    client: &Client,
    api: &GitHubApi,
    username: &str,
    since: Option<&str>,
) -> Result<GitHubRestResult, FetchUserGistsError> {
    let mut request = client
        .get(user_gists_url(&api.base_url, username))
        .header("Accept", "application/vnd.github+json")
        .header("User-Agent", "rust-client");

    if let Some(token) = api.token.as_deref() {
        request = request.header("Authorization", format!("Bearer {token}"));
    }
    if let Some(since) = since {
        request = request.query(&[("since", since)]);
    }

    let response = request
        .send()
        .await
        .map_err(|source| FetchUserGistsError::RequestSend { source })?;

    let status = response.status();

    let body = response
        .text()
        .await
        .map_err(|source| FetchUserGistsError::ResponseRead { source })?;

    if !status.is_success() {
        return Err(FetchUserGistsError::UnexpectedStatus { status, body });
    }

    Ok(GitHubRestResult { body, status })
}

pub fn parse_gists(body: &str) -> Result<Vec<Gist>, ParseGistsError> {
    serde_json::from_str(body).map_err(|source| ParseGistsError::DeserializeResponseBody { source })
}

#[derive(Debug, Error)]
pub enum FetchUserGistsError {
    #[error("RequestSend: {source}")]
    RequestSend {
        source: reqwest::Error,
    },

    #[error("ResponseRead: {source}")]
    ResponseRead {
        source: reqwest::Error,
    },

    #[error("UnexpectedStatus: {status}: {body}")]
    UnexpectedStatus {
        status: StatusCode,
        body: String,
    },
}

#[derive(Debug, Error)]
pub enum ParseGistsError {
    #[error("DeserializeResponseBody: {source}")]
    DeserializeResponseBody {
        #[from]
        source: serde_json::Error,
    },
}
