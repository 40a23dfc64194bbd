//! Where a logged-in session lives between calls.
//!
//! "Remember me" picks a [`Backing::Persistent`] store that survives restarts
//! as a JSON file; otherwise the session lives only in memory.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::client::api::ClientError;
use crate::db::models::ProfileSnapshot;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionData {
    pub token: String,
    pub user_id: String,
    pub email: String,
    pub profile: Option<ProfileSnapshot>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Backing {
    Persistent(PathBuf),
    Ephemeral,
}

#[derive(Debug)]
pub struct SessionStore {
    backing: Backing,
    data: Option<SessionData>,
}

impl SessionStore {
    pub fn ephemeral() -> Self {
        Self {
            backing: Backing::Ephemeral,
            data: None,
        }
    }

    /// The store a fresh login writes to.
    pub fn for_login(remember: bool, path: impl Into<PathBuf>) -> Self {
        let backing = if remember {
            Backing::Persistent(path.into())
        } else {
            Backing::Ephemeral
        };
        Self {
            backing,
            data: None,
        }
    }

    /// Reload a remembered session. A missing file is an empty store.
    pub fn resume(path: impl Into<PathBuf>) -> Result<Self, ClientError> {
        let path = path.into();
        let data = match std::fs::read(&path) {
            Ok(bytes) => Some(serde_json::from_slice(&bytes)?),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => None,
            Err(e) => return Err(e.into()),
        };
        Ok(Self {
            backing: Backing::Persistent(path),
            data,
        })
    }

    /// Remove a remembered session file, if any.
    pub fn forget(path: &Path) -> Result<(), ClientError> {
        match std::fs::remove_file(path) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e.into()),
        }
    }

    pub fn backing(&self) -> &Backing {
        &self.backing
    }

    pub fn is_persistent(&self) -> bool {
        matches!(self.backing, Backing::Persistent(_))
    }

    pub fn get(&self) -> Option<&SessionData> {
        self.data.as_ref()
    }

    pub fn set(&mut self, data: SessionData) -> Result<(), ClientError> {
        if let Backing::Persistent(path) = &self.backing {
            if let Some(parent) = path.parent() {
                std::fs::create_dir_all(parent)?;
            }
            std::fs::write(path, serde_json::to_vec_pretty(&data)?)?;
        }
        self.data = Some(data);
        Ok(())
    }

    /// Replace the cached profile, keeping the token.
    pub fn set_profile(&mut self, profile: ProfileSnapshot) -> Result<(), ClientError> {
        let mut data = self.data.clone().ok_or(ClientError::NotLoggedIn)?;
        data.profile = Some(profile);
        self.set(data)
    }

    pub fn clear(&mut self) -> Result<(), ClientError> {
        if let Backing::Persistent(path) = &self.backing {
            Self::forget(path)?;
        }
        self.data = None;
        Ok(())
    }
}
