//! The periodic job: walk every tracked user, fetch the gists published since
//! the user's `lastAdded` watermark, file one Pipedrive activity per gist and
//! advance the watermark.

use std::sync::{
    atomic::{AtomicBool, Ordering},
    Arc,
};
use std::time::Duration;

use chrono::Utc;
use tokio::{
    sync::watch,
    task::JoinHandle,
    time::{self, MissedTickBehavior},
};
use tracing::{debug, error, info, warn};

use crate::{
    registry::{
        models::{User, Watermark},
        UserRegistry,
    },
    upstream::{ActivitySink, GistSource, GistSourceError},
    utils::cursor::since_cursor,
};

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct RunSummary {
    pub users: usize,
    pub gists: usize,
    pub reported: usize,
    pub failed: usize,
    pub fetch_failures: usize,
}

pub struct Poller {
    registry: Arc<UserRegistry>,
    gists: Arc<dyn GistSource>,
    activities: Arc<dyn ActivitySink>,
    running: AtomicBool,
}

/// Clears the single-flight flag when a run ends, including by panic or abort.
struct RunningGuard<'a>(&'a AtomicBool);

impl Drop for RunningGuard<'_> {
    fn drop(&mut self) {
        self.0.store(false, Ordering::Release);
    }
}

impl Poller {
    pub fn new(
        registry: Arc<UserRegistry>,
        gists: Arc<dyn GistSource>,
        activities: Arc<dyn ActivitySink>,
    ) -> Self {
        Self {
            registry,
            gists,
            activities,
            running: AtomicBool::new(false),
        }
    }

    pub fn is_running(&self) -> bool {
        self.running.load(Ordering::Acquire)
    }

    /// Runs one pass over all users. Returns `None` without doing anything if
    /// another pass is still in progress.
    pub async fn run_once(&self) -> Option<RunSummary> {
        if self
            .running
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .is_err()
        {
            warn!("previous gist run still in progress, skipping this tick");
            return None;
        }
        let _guard = RunningGuard(&self.running);

        info!("Started processing users...");
        let users = self.registry.list_users().await;
        let mut summary = RunSummary {
            users: users.len(),
            ..RunSummary::default()
        };

        for user in &users {
            if let Err(err) = self.process_user(user, &mut summary).await {
                summary.fetch_failures += 1;
                error!(username = %user.username, "Error fetching gists: {err}");
            }
        }

        info!(
            users = summary.users,
            gists = summary.gists,
            reported = summary.reported,
            failed = summary.failed,
            fetch_failures = summary.fetch_failures,
            "Ended processing users..."
        );
        Some(summary)
    }

    async fn process_user(&self, user: &User, summary: &mut RunSummary) -> Result<(), GistSourceError> {
        let started_at = Utc::now();
        let since = since_cursor(user.last_added);

        let gists = self.gists.fetch_gists(&user.username, since.as_deref()).await?;
        debug!(username = %user.username, since = since.as_deref(), count = gists.len(), "gists since last run");
        summary.gists += gists.len();

        for gist in &gists {
            match self.activities.report_activity(gist).await {
                Ok(true) => {
                    summary.reported += 1;
                    debug!(gist_id = %gist.id, "Pipedrive activity added");
                }
                Ok(false) => {
                    summary.failed += 1;
                    error!(gist_id = %gist.id, "Error adding activity: rejected by Pipedrive");
                }
                Err(err) => {
                    summary.failed += 1;
                    error!(gist_id = %gist.id, "Error adding activity: {err}");
                }
            }
        }

        if !self
            .registry
            .update_watermark(&user.username, Watermark::LastAdded, started_at)
            .await
        {
            debug!(username = %user.username, "user removed during run, watermark dropped");
        }
        Ok(())
    }

    /// Fires `run_once` every `period` on a fixed rate, starting immediately,
    /// until `shutdown` turns true. Each run gets its own task so a slow run
    /// never shifts the schedule. A tick that finds the previous run still
    /// going is skipped, and the run still going at shutdown is aborted.
    pub fn spawn(self: Arc<Self>, period: Duration, mut shutdown: watch::Receiver<bool>) -> JoinHandle<()> {
        tokio::spawn(async move {
            let mut ticker = time::interval(period);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);
            let mut in_flight: Option<JoinHandle<()>> = None;

            info!(period_secs = period.as_secs(), "gist poller started");
            loop {
                tokio::select! {
                    _ = ticker.tick() => {
                        if in_flight.as_ref().is_some_and(|run| !run.is_finished()) {
                            warn!("previous gist run still in progress, skipping this tick");
                            continue;
                        }
                        let poller = Arc::clone(&self);
                        in_flight = Some(tokio::spawn(async move {
                            poller.run_once().await;
                        }));
                    }
                    changed = shutdown.changed() => {
                        if changed.is_err() || *shutdown.borrow() {
                            break;
                        }
                    }
                }
            }

            if let Some(run) = in_flight.filter(|run| !run.is_finished()) {
                info!("aborting in-flight gist run for shutdown");
                run.abort();
                // Wait for the cancelled run to drop so nothing reports after this returns.
                let _ = run.await;
            }
            info!("gist poller stopped");
        })
    }
}
