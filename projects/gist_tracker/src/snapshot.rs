//! Flat-file persistence of the registry between restarts.
//!
//! The file is a versioned JSON document:
//! `{"version": 1, "users": [{"username": .., "lastVisit": .., "lastAdded": ..}]}`.

use std::{
    io::ErrorKind,
    path::{Path, PathBuf},
};

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{error, info};

use crate::registry::models::User;

pub const SNAPSHOT_VERSION: u32 = 1;

#[derive(Debug, Error)]
pub enum SnapshotError {
    #[error("Read {path}: {source}")]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("Parse {path}: {source}")]
    Parse {
        path: PathBuf,
        source: serde_json::Error,
    },

    #[error("UnsupportedVersion {path}: {version}")]
    UnsupportedVersion { path: PathBuf, version: u32 },

    #[error("Serialize: {source}")]
    Serialize {
        #[from]
        source: serde_json::Error,
    },

    #[error("Write {path}: {source}")]
    Write {
        path: PathBuf,
        source: std::io::Error,
    },
}

#[derive(Debug, Serialize, Deserialize)]
struct SnapshotFile {
    version: u32,
    users: Vec<User>,
}

#[derive(Debug, Clone)]
pub struct SnapshotStore {
    path: PathBuf,
}

impl SnapshotStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Never fails: a missing file is a first start, a broken one is logged
    /// and treated as empty.
    pub async fn load(&self) -> Vec<User> {
        match self.try_load().await {
            Ok(Some(users)) => {
                info!(path = %self.path.display(), users = users.len(), "loaded user snapshot");
                users
            }
            Ok(None) => {
                info!(path = %self.path.display(), "no user snapshot, starting empty");
                Vec::new()
            }
            Err(err) => {
                error!("Error loading users from snapshot: {err}");
                Vec::new()
            }
        }
    }

    pub async fn try_load(&self) -> Result<Option<Vec<User>>, SnapshotError> {
        let raw = match tokio::fs::read(&self.path).await {
            Ok(raw) => raw,
            Err(source) if source.kind() == ErrorKind::NotFound => return Ok(None),
            Err(source) => {
                return Err(SnapshotError::Read {
                    path: self.path.clone(),
                    source,
                })
            }
        };

        let file: SnapshotFile =
            serde_json::from_slice(&raw).map_err(|source| SnapshotError::Parse {
                path: self.path.clone(),
                source,
            })?;

        if file.version != SNAPSHOT_VERSION {
            return Err(SnapshotError::UnsupportedVersion {
                path: self.path.clone(),
                version: file.version,
            });
        }

        Ok(Some(file.users))
    }

    /// Writes a sibling `.tmp` file and renames it over the snapshot.
    pub async fn save(&self, users: &[User]) -> Result<(), SnapshotError> {
        let json = serde_json::to_vec_pretty(&SnapshotFile {
            version: SNAPSHOT_VERSION,
            users: users.to_vec(),
        })?;

        let mut tmp = self.path.clone().into_os_string();
        tmp.push(".tmp");
        let tmp = PathBuf::from(tmp);

        let write_err = |source| SnapshotError::Write {
            path: self.path.clone(),
            source,
        };
        tokio::fs::write(&tmp, json).await.map_err(write_err)?;
        tokio::fs::rename(&tmp, &self.path).await.map_err(write_err)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use anyhow::Result;
    use chrono::{TimeZone, Utc};

    fn octocat() -> User {
        User {
            username: "octocat".to_string(),
            last_visit: Some(Utc.with_ymd_and_hms(2024, 3, 1, 8, 30, 0).unwrap()),
            last_added: None,
        }
    }

    #[tokio::test]
    async fn save_then_load_restores_users() -> Result<()> {
        let dir = tempfile::tempdir()?;
        let store = SnapshotStore::new(dir.path().join("users.json"));

        store.save(&[octocat(), User::new("mattboldt")]).await?;
        let users = store.load().await;

        assert_eq!(users, vec![octocat(), User::new("mattboldt")]);
        Ok(())
    }

    #[tokio::test]
    async fn save_overwrites_previous_snapshot() -> Result<()> {
        let dir = tempfile::tempdir()?;
        let store = SnapshotStore::new(dir.path().join("users.json"));

        store.save(&[octocat(), User::new("mattboldt")]).await?;
        store.save(&[User::new("mattboldt")]).await?;

        assert_eq!(store.load().await, vec![User::new("mattboldt")]);
        assert!(!dir.path().join("users.json.tmp").exists());
        Ok(())
    }

    #[tokio::test]
    async fn file_uses_explicit_schema() -> Result<()> {
        let dir = tempfile::tempdir()?;
        let path = dir.path().join("users.json");
        SnapshotStore::new(&path).save(&[octocat()]).await?;

        let value: serde_json::Value = serde_json::from_slice(&std::fs::read(&path)?)?;
        assert_eq!(
            value,
            serde_json::json!({
                "version": 1,
                "users": [{
                    "username": "octocat",
                    "lastVisit": "2024-03-01T08:30:00Z",
                    "lastAdded": null,
                }]
            })
        );
        Ok(())
    }

    #[tokio::test]
    async fn missing_file_loads_empty() -> Result<()> {
        let dir = tempfile::tempdir()?;
        let store = SnapshotStore::new(dir.path().join("absent.json"));

        assert!(store.try_load().await?.is_none());
        assert!(store.load().await.is_empty());
        Ok(())
    }

    #[tokio::test]
    async fn corrupt_file_loads_empty() -> Result<()> {
        let dir = tempfile::tempdir()?;
        let path = dir.path().join("users.json");
        std::fs::write(&path, b"\xac\xed\x00\x05sr\x00java.util.HashSet")?;
        let store = SnapshotStore::new(&path);

        assert!(matches!(store.try_load().await, Err(SnapshotError::Parse { .. })));
        assert!(store.load().await.is_empty());
        Ok(())
    }

    #[tokio::test]
    async fn unknown_version_loads_empty() -> Result<()> {
        let dir = tempfile::tempdir()?;
        let path = dir.path().join("users.json");
        std::fs::write(&path, r#"{"version": 2, "users": []}"#)?;
        let store = SnapshotStore::new(&path);

        assert!(matches!(
            store.try_load().await,
            Err(SnapshotError::UnsupportedVersion { version: 2, .. })
        ));
        assert!(store.load().await.is_empty());
        Ok(())
    }

    #[tokio::test]
    async fn save_into_missing_directory_fails() -> Result<()> {
        let dir = tempfile::tempdir()?;
        let store = SnapshotStore::new(dir.path().join("nope").join("users.json"));

        assert!(matches!(store.save(&[octocat()]).await, Err(SnapshotError::Write { .. })));
        Ok(())
    }
}
