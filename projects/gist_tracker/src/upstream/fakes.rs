use std::collections::{HashMap, HashSet};
use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use interfaces_github_gists::index::{FetchUserGistsError, Gist};
use interfaces_pipedrive_activities::index::CreateActivityError;
use reqwest::StatusCode;
use tokio::sync::{oneshot, Mutex, Notify};

use super::{ActivitySink, ActivitySinkError, GistSource, GistSourceError};

pub fn gist(id: &str) -> Gist {
    Gist {
        id: id.to_string(),
        url: format!("https://gist.github.com/{id}"),
    }
}

/// Serves canned gists per user, honouring `since` against each gist's
/// update time the way GitHub does.
#[derive(Default)]
pub struct FakeGists {
    gists: Mutex<HashMap<String, Vec<(DateTime<Utc>, Gist)>>>,
    failing: Mutex<HashSet<String>>,
    calls: Mutex<Vec<(String, Option<String>)>>,
    hold: Mutex<Option<oneshot::Receiver<()>>>,
    pub entered: Arc<Notify>,
}

impl FakeGists {
    pub async fn publish(&self, username: &str, updated_at: DateTime<Utc>, gist: Gist) {
        self.gists
            .lock()
            .await
            .entry(username.to_ascii_lowercase())
            .or_default()
            .push((updated_at, gist));
    }

    pub async fn fail_for(&self, username: &str) {
        self.failing.lock().await.insert(username.to_ascii_lowercase());
    }

    /// The next fetch signals `entered` and then waits until the returned
    /// sender fires.
    pub async fn hold_next_fetch(&self) -> oneshot::Sender<()> {
        let (tx, rx) = oneshot::channel();
        *self.hold.lock().await = Some(rx);
        tx
    }

    pub async fn calls(&self) -> Vec<(String, Option<String>)> {
        self.calls.lock().await.clone()
    }

    async fn matching(&self, username: &str, since: Option<&str>) -> Result<Vec<Gist>, GistSourceError> {
        self.calls
            .lock()
            .await
            .push((username.to_string(), since.map(str::to_string)));

        let held = self.hold.lock().await.take();
        if let Some(release) = held {
            self.entered.notify_one();
            let _ = release.await;
        }

        let key = username.to_ascii_lowercase();
        if self.failing.lock().await.contains(&key) {
            return Err(FetchUserGistsError::UnexpectedStatus {
                status: StatusCode::INTERNAL_SERVER_ERROR,
                body: "boom".to_string(),
            }
            .into());
        }

        let since = since
            .and_then(|raw| DateTime::parse_from_rfc3339(raw).ok())
            .map(|since| since.with_timezone(&Utc));
        Ok(self
            .gists
            .lock()
            .await
            .get(&key)
            .map(|gists| {
                gists
                    .iter()
                    .filter(|(updated_at, _)| since.map_or(true, |since| *updated_at >= since))
                    .map(|(_, gist)| gist.clone())
                    .collect()
            })
            .unwrap_or_default())
    }
}

#[async_trait]
impl GistSource for FakeGists {
    async fn fetch_gists(&self, username: &str, since: Option<&str>) -> Result<Vec<Gist>, GistSourceError> {
        self.matching(username, since).await
    }

    async fn fetch_gists_raw(&self, username: &str, since: Option<&str>) -> Result<String, GistSourceError> {
        let gists = self.matching(username, since).await?;
        let body: Vec<serde_json::Value> = gists
            .into_iter()
            .map(|gist| serde_json::json!({ "id": gist.id, "html_url": gist.url }))
            .collect();
        Ok(serde_json::Value::Array(body).to_string())
    }
}

/// Records every reported gist id. Ids can be set up to be rejected or to
/// fail in transport.
#[derive(Default)]
pub struct FakeActivities {
    reported: Mutex<Vec<String>>,
    rejected: Mutex<HashSet<String>>,
    broken: Mutex<HashSet<String>>,
}

impl FakeActivities {
    pub async fn reject(&self, gist_id: &str) {
        self.rejected.lock().await.insert(gist_id.to_string());
    }

    pub async fn break_on(&self, gist_id: &str) {
        self.broken.lock().await.insert(gist_id.to_string());
    }

    pub async fn reported(&self) -> Vec<String> {
        self.reported.lock().await.clone()
    }
}

#[async_trait]
impl ActivitySink for FakeActivities {
    async fn report_activity(&self, gist: &Gist) -> Result<bool, ActivitySinkError> {
        self.reported.lock().await.push(gist.id.clone());
        if self.broken.lock().await.contains(&gist.id) {
            let source = serde_json::from_str::<serde_json::Value>("<html>")
                .expect_err("html is not json");
            return Err(CreateActivityError::DeserializeResponseBody {
                status: StatusCode::BAD_GATEWAY,
                source,
            }
            .into());
        }
        Ok(!self.rejected.lock().await.contains(&gist.id))
    }
}
