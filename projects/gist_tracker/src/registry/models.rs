use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A tracked GitHub user and its two watermarks.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct User {
    pub username: String,
    /// Last time the on-demand gist endpoint was served for this user.
    pub last_visit: Option<DateTime<Utc>>,
    /// Last time the poller reported this user's gists.
    pub last_added: Option<DateTime<Utc>>,
}

impl User {
    pub fn new(username: impl Into<String>) -> Self {
        Self {
            username: username.into(),
            last_visit: None,
            last_added: None,
        }
    }

    pub fn is(&self, username: &str) -> bool {
        self.username.eq_ignore_ascii_case(username)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Watermark {
    LastVisit,
    LastAdded,
}

/// What `add_user` does with a username that is already tracked.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum DuplicatePolicy {
    #[default]
    Reject,
    Ignore,
}

impl std::str::FromStr for DuplicatePolicy {
    type Err = String;

    fn from_str(raw: &str) -> Result<Self, Self::Err> {
        match raw.trim().to_ascii_lowercase().as_str() {
            "reject" | "reject-duplicate" => Ok(Self::Reject),
            "ignore" | "ignore-duplicate" => Ok(Self::Ignore),
            other => Err(format!("expected `reject` or `ignore`, got `{other}`")),
        }
    }
}
