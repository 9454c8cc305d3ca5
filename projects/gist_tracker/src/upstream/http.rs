use async_trait::async_trait;
use interfaces_github_gists::index::{fetch_user_gists, parse_gists, Gist, GitHubApi};
use interfaces_pipedrive_activities::index::{create_activity, NewActivity, PipedriveApi};
use reqwest::Client;
use tracing::debug;

use super::{ActivitySink, ActivitySinkError, GistSource, GistSourceError};

#[derive(Debug, Clone)]
pub struct GitHubGists {
    client: Client,
    api: GitHubApi,
}

impl GitHubGists {
    pub fn new(client: Client, api: GitHubApi) -> Self {
        Self { client, api }
    }
}

#[async_trait]
impl GistSource for GitHubGists {
    async fn fetch_gists(
        &self,
        username: &str,
        since: Option<&str>,
    ) -> Result<Vec<Gist>, GistSourceError> {
        let body = self.fetch_gists_raw(username, since).await?;
        Ok(parse_gists(&body)?)
    }

    async fn fetch_gists_raw(
        &self,
        username: &str,
        since: Option<&str>,
    ) -> Result<String, GistSourceError> {
        debug!(username, since, "fetching gists");
        let result = fetch_user_gists(&self.client, &self.api, username, since).await?;
        Ok(result.body)
    }
}

#[derive(Debug, Clone)]
pub struct PipedriveActivities {
    client: Client,
    api: PipedriveApi,
}

impl PipedriveActivities {
    pub fn new(client: Client, api: PipedriveApi) -> Self {
        Self { client, api }
    }
}

#[async_trait]
impl ActivitySink for PipedriveActivities {
    async fn report_activity(&self, gist: &Gist) -> Result<bool, ActivitySinkError> {
        let activity = NewActivity::for_gist(&gist.id, &gist.url);
        let response = create_activity(&self.client, &self.api, &activity).await?;
        if let Some(error) = response.error.as_deref() {
            debug!(gist_id = %gist.id, error, "pipedrive rejected activity");
        }
        Ok(response.success)
    }
}
