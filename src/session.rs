//! Backend credentials.
//!
//! Session resolution order:
//! 1) CLI --uid/--token (clap also fills these from HANDOVER_UID/HANDOVER_TOKEN)
//! 2) Persisted value in .handover/session.toml
//!
//! The library never reads credentials on its own; callers resolve a
//! `Session` once and pass it to every backend call.

use std::fmt;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

const SESSION_DIR: &str = ".handover";
const SESSION_FILENAME: &str = "session.toml";

#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Session {
    uid: String,
    token: String,
}

impl Session {
    /// The uid is trimmed. The token is kept exactly as given, since
    /// surrounding spaces may be part of the password.
    pub fn new(uid: &str, token: &str) -> Result<Self> {
        let uid = non_empty(Some(uid))
            .ok_or_else(|| Error::InvalidArgument("uid cannot be empty".to_string()))?;
        let token = non_empty(Some(token))
            .ok_or_else(|| Error::InvalidArgument("token cannot be empty".to_string()))?;
        Ok(Self {
            uid: uid.trim().to_string(),
            token: token.to_string(),
        })
    }

    pub fn uid(&self) -> &str {
        &self.uid
    }

    pub fn token(&self) -> &str {
        &self.token
    }

    /// Token with everything but the last two characters masked.
    pub fn redacted_token(&self) -> String {
        let count = self.token.chars().count();
        if count <= 4 {
            return "****".to_string();
        }
        let tail: String = self.token.chars().skip(count - 2).collect();
        format!("****{tail}")
    }
}

impl fmt::Debug for Session {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Session")
            .field("uid", &self.uid)
            .field("token", &self.redacted_token())
            .finish()
    }
}

/// Resolve the session from explicit values, falling back to the persisted
/// file in `dir`. Both values must be present on one level to be used.
pub fn resolve_session(dir: &Path, uid: Option<&str>, token: Option<&str>) -> Result<Session> {
    match (non_empty(uid), non_empty(token)) {
        (Some(uid), Some(token)) => return Session::new(uid, token),
        (Some(_), None) | (None, Some(_)) => {
            tracing::debug!("partial credentials supplied; falling back to persisted session");
        }
        (None, None) => {}
    }

    load_persisted_session(dir)?.ok_or(Error::MissingSession)
}

/// Persist credentials in `.handover/session.toml`. On Unix the file is
/// readable by its owner only.
pub fn persist_session(dir: &Path, session: &Session) -> Result<PathBuf> {
    let session_dir = dir.join(SESSION_DIR);
    std::fs::create_dir_all(&session_dir)?;
    let path = session_path(dir);
    let content = toml::to_string_pretty(session)?;
    write_private(&session_dir, &path, content.as_bytes())?;
    Ok(path)
}

#[cfg(unix)]
fn write_private(session_dir: &Path, path: &Path, content: &[u8]) -> Result<()> {
    use std::fs::{OpenOptions, Permissions};
    use std::io::Write;
    use std::os::unix::fs::{OpenOptionsExt, PermissionsExt};

    std::fs::set_permissions(session_dir, Permissions::from_mode(0o700))?;
    let mut file = OpenOptions::new()
        .write(true)
        .create(true)
        .truncate(true)
        .mode(0o600)
        .open(path)?;
    // `mode` only applies on creation; tighten a file left by an older write.
    file.set_permissions(Permissions::from_mode(0o600))?;
    file.write_all(content)?;
    Ok(())
}

#[cfg(not(unix))]
fn write_private(_session_dir: &Path, path: &Path, content: &[u8]) -> Result<()> {
    std::fs::write(path, content)?;
    Ok(())
}

/// Load the persisted session, if present.
pub fn load_persisted_session(dir: &Path) -> Result<Option<Session>> {
    let path = session_path(dir);
    if !path.exists() {
        return Ok(None);
    }

    let raw = std::fs::read_to_string(&path)?;
    let stored: Session = toml::from_str(&raw)?;
    match Session::new(&stored.uid, &stored.token) {
        Ok(session) => Ok(Some(session)),
        Err(_) => Ok(None),
    }
}

pub fn session_path(dir: &Path) -> PathBuf {
    dir.join(SESSION_DIR).join(SESSION_FILENAME)
}

/// `input` unchanged, unless it is missing or blank.
fn non_empty(input: Option<&str>) -> Option<&str> {
    input.filter(|value| !value.trim().is_empty())
}
