use reqwest::{Client, StatusCode};
use serde::{Deserialize, Serialize};
use thiserror::Error;

pub const DEFAULT_API_URL: &str = "https://api.pipedrive.com";

/// Activity type under which gists are filed.
pub const GIST_ACTIVITY_TYPE: &str = "github-gist";

/// Connection details for the Pipedrive API.
#[derive(Debug, Clone)]
pub struct PipedriveApi {
    pub base_url: String,
    pub api_token: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct NewActivity<'a> {
    pub subject: String,
    pub done: bool,
    #[serde(rename = "type")]
    pub kind: &'a str,
    pub note: &'a str,
}

impl<'a> NewActivity<'a> {
    /// An open `github-gist` activity pointing at the gist's web page.
    pub fn for_gist(gist_id: &str, gist_url: &'a str) -> Self {
        Self {
            subject: format!("Gist #{gist_id}"),
            done: false,
            kind: GIST_ACTIVITY_TYPE,
            note: gist_url,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct ActivityResponse {
    pub success: bool,
    #[serde(default)]
    pub error: Option<String>,
}

pub async fn create_activity(
    client: &Client,
    api: &PipedriveApi,
    activity: &NewActivity<'_>,
) -> Result<ActivityResponse, CreateActivityError> {
    let url = format!("{}/v1/activities", api.base_url.trim_end_matches('/'));

    let response = client
        .post(url)
        .query(&[("api_token", api.api_token.as_str())])
        .header("User-Agent", "rust-client")
        .json(activity)
        .send()
        .await
        .map_err(|source| CreateActivityError::RequestSend { source })?;

    let status = response.status();

    let body = response
        .text()
        .await
        .map_err(|source| CreateActivityError::ResponseRead { source })?;

    // Pipedrive reports rejected activities as `{"success": false, ...}` with a
    // 4xx status; only bodies without the flag are failures.
    serde_json::from_str(&body)
        .map_err(|source| CreateActivityError::DeserializeResponseBody { status, source })
}

#[derive(Debug, Error)]
pub enum CreateActivityError {
    #[error("RequestSend: {source}")]
    RequestSend {
        source: reqwest::Error,
    },

    #[error("ResponseRead: {source}")]
    ResponseRead {
        source: reqwest::Error,
    },

    #[error("DeserializeResponseBody ({status}): {source}")]
    DeserializeResponseBody {
        status: StatusCode,
        source: serde_json::Error,
    },
}
