pub mod models;

use chrono::{DateTime, Utc};
use thiserror::Error;
use tokio::sync::Mutex;
use tracing::warn;

use models::{DuplicatePolicy, User, Watermark};

/// GitHub caps logins at 39 characters.
const MAX_USERNAME_LEN: usize = 39;

/// First path segments taken by the service's own routes. A user with one of
/// these names could never reach `/{username}/gists`.
const RESERVED_USERNAMES: [&str; 3] = ["add-user", "delete-user", "users"];

#[derive(Debug, Error, PartialEq, Eq)]
pub enum AddUserError {
    #[error("Username already exists: {username}")]
    DuplicateUser { username: String },

    #[error("Invalid username: {username:?}")]
    InvalidUsername { username: String },
}

/// In-memory set of tracked users. Every read and write goes through one
/// mutex; callers only ever see copies.
#[derive(Debug, Default)]
pub struct UserRegistry {
    users: Mutex<Vec<User>>,
    policy: DuplicatePolicy,
}

impl UserRegistry {
    pub fn new(policy: DuplicatePolicy) -> Self {
        Self {
            users: Mutex::new(Vec::new()),
            policy,
        }
    }

    /// Builds a registry from restored records, keeping the first of any
    /// case-insensitive duplicates.
    pub fn from_users(policy: DuplicatePolicy, restored: Vec<User>) -> Self {
        let mut users: Vec<User> = Vec::with_capacity(restored.len());
        for user in restored {
            if users.iter().any(|existing| existing.is(&user.username)) {
                warn!(username = %user.username, "dropping duplicate restored user");
                continue;
            }
            users.push(user);
        }
        Self {
            users: Mutex::new(users),
            policy,
        }
    }

    /// Returns `Ok(true)` when the user was inserted, `Ok(false)` when an
    /// existing entry was kept under [`DuplicatePolicy::Ignore`].
    pub async fn add_user(&self, username: &str) -> Result<bool, AddUserError> {
        let username = username.trim();
        if !is_valid_username(username) {
            return Err(AddUserError::InvalidUsername {
                username: username.to_string(),
            });
        }

        let mut users = self.users.lock().await;
        if users.iter().any(|user| user.is(username)) {
            return match self.policy {
                DuplicatePolicy::Reject => Err(AddUserError::DuplicateUser {
                    username: username.to_string(),
                }),
                DuplicatePolicy::Ignore => Ok(false),
            };
        }
        users.push(User::new(username));
        Ok(true)
    }

    /// Idempotent. Returns whether an entry was removed.
    pub async fn remove_user(&self, username: &str) -> bool {
        let mut users = self.users.lock().await;
        let before = users.len();
        users.retain(|user| !user.is(username.trim()));
        users.len() != before
    }

    pub async fn list_users(&self) -> Vec<User> {
        self.users.lock().await.clone()
    }

    pub async fn find_user(&self, username: &str) -> Option<User> {
        self.users
            .lock()
            .await
            .iter()
            .find(|user| user.is(username.trim()))
            .cloned()
    }

    /// Returns false if the user is no longer tracked; never re-inserts.
    pub async fn update_watermark(
        &self,
        username: &str,
        field: Watermark,
        at: DateTime<Utc>,
    ) -> bool {
        let mut users = self.users.lock().await;
        let Some(user) = users.iter_mut().find(|user| user.is(username)) else {
            return false;
        };
        match field {
            Watermark::LastVisit => user.last_visit = Some(at),
            Watermark::LastAdded => user.last_added = Some(at),
        }
        true
    }

    pub async fn len(&self) -> usize {
        self.users.lock().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.users.lock().await.is_empty()
    }
}

pub fn is_valid_username(username: &str) -> bool {
    !username.is_empty()
        && username.len() <= MAX_USERNAME_LEN
        && username
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '-')
        && !RESERVED_USERNAMES
            .iter()
            .any(|reserved| reserved.eq_ignore_ascii_case(username))
}
