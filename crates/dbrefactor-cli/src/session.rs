use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use time::OffsetDateTime;
use time::format_description::well_known::Rfc3339;

/// A backend database session, saved per profile between commands.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StoredSession {
    pub server: String,
    pub session_id: String,
    pub expires_at_utc: String,
}

impl StoredSession {
    /// Parsed expiry. `None` when the backend sent something that is not RFC 3339.
    pub fn expires_at(&self) -> Option<OffsetDateTime> {
        OffsetDateTime::parse(&self.expires_at_utc, &Rfc3339).ok()
    }

    /// A session without a readable expiry is treated as live; the backend decides.
    pub fn is_expired_at(&self, now: OffsetDateTime) -> bool {
        self.expires_at().is_some_and(|at| at <= now)
    }

    pub fn is_expired(&self) -> bool {
        self.is_expired_at(OffsetDateTime::now_utc())
    }
}

fn session_path(dir: &Path, profile: &str) -> PathBuf {
    dir.join(format!("session.{profile}.json"))
}

pub fn load_session(dir: &Path, profile: &str) -> Result<Option<StoredSession>> {
    let path = session_path(dir, profile);
    if !path.exists() {
        return Ok(None);
    }
    let content = fs::read_to_string(&path)?;
    let session: StoredSession = serde_json::from_str(&content)
        .with_context(|| format!("Invalid session file {}", path.display()))?;
    Ok(Some(session))
}

pub fn save_session(dir: &Path, profile: &str, session: &StoredSession) -> Result<()> {
    fs::create_dir_all(dir)?;
    let content = serde_json::to_string_pretty(session)?;
    fs::write(session_path(dir, profile), content)?;
    Ok(())
}

pub fn remove_session(dir: &Path, profile: &str) -> Result<bool> {
    let path = session_path(dir, profile);
    if path.exists() {
        fs::remove_file(path)?;
        Ok(true)
    } else {
        Ok(false)
    }
}
