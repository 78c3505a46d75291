//! File-backed credential store shared by every API client.
//!
//! Design goals:
//! - One durable location for the bearer/refresh token pair; every client
//!   reads it at call time, so a login in one place is visible everywhere.
//! - Writes are atomic (temp file + rename) so a crash never leaves a
//!   half-written credentials file behind.
//! - Concurrent writers follow last-write-wins; there is no file locking.
//!
//! The in-memory mirror is an `ArcSwapOption`, which keeps the call-time
//! read on the request path lock-free.

use std::io;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use arc_swap::ArcSwapOption;
use serde::{Deserialize, Serialize};
use tempfile::NamedTempFile;

/// Bearer/refresh token pair as issued by a login endpoint.
///
/// The refresh token is persisted alongside the bearer token but is not
/// currently redeemed anywhere; an expired session simply forces a fresh
/// login.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TokenPair {
    pub token: String,
    #[serde(rename = "refreshToken")]
    pub refresh_token: String,
}

impl TokenPair {
    pub fn new(token: impl Into<String>, refresh_token: impl Into<String>) -> Self {
        Self {
            token: token.into(),
            refresh_token: refresh_token.into(),
        }
    }
}

/// Handle to the credentials file plus a lock-free in-memory mirror.
///
/// Cloning is cheap; clones share the same mirror, so a `set` through one
/// clone is observed by `bearer()` on every other.
#[derive(Clone)]
pub struct TokenStore {
    path: Arc<PathBuf>,
    current: Arc<ArcSwapOption<TokenPair>>,
}

impl TokenStore {
    /// Open the store at `path`, reading whatever pair is already persisted.
    ///
    /// A missing file means logged out. A file that exists but cannot be
    /// read or parsed is treated the same way, with a warning; the broken
    /// file is left in place until the next successful `set`.
    pub fn load(path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        let current = match read_pair(&path) {
            Ok(pair) => pair,
            Err(e) => {
                tracing::warn!(path = %path.display(), error = %e, "ignoring unreadable credentials file");
                None
            }
        };
        Self {
            path: Arc::new(path),
            current: Arc::new(ArcSwapOption::from_pointee(current)),
        }
    }

    /// Bearer token for the `Authorization` header, if logged in.
    /// Read at call time, never captured at client construction.
    pub fn bearer(&self) -> Option<String> {
        self.current.load().as_ref().map(|p| p.token.clone())
    }

    /// Full persisted pair, if logged in.
    pub fn current(&self) -> Option<TokenPair> {
        self.current.load().as_ref().map(|p| TokenPair::clone(p))
    }

    pub fn is_logged_in(&self) -> bool {
        self.current.load().is_some()
    }

    /// Persist a new pair and publish it to the mirror.
    ///
    /// The file is written first; if that fails, the mirror keeps the old
    /// value and the error propagates to the caller.
    pub fn set(&self, pair: TokenPair) -> io::Result<()> {
        write_pair(&self.path, &pair)?;
        self.current.store(Some(Arc::new(pair)));
        Ok(())
    }

    /// Drop the persisted pair and the mirror. Never fails: a file that
    /// cannot be removed is logged and the in-memory state still clears,
    /// so logout always takes effect for this process.
    pub fn clear(&self) {
        if let Err(e) = std::fs::remove_file(self.path.as_ref()) {
            if e.kind() != io::ErrorKind::NotFound {
                tracing::warn!(path = %self.path.display(), error = %e, "failed to remove credentials file");
            }
        }
        self.current.store(None);
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

fn read_pair(path: &Path) -> io::Result<Option<TokenPair>> {
    let raw = match std::fs::read_to_string(path) {
        Ok(raw) => raw,
        Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(None),
        Err(e) => return Err(e),
    };
    let pair = serde_json::from_str(&raw)?;
    Ok(Some(pair))
}

/// Write the pair next to its final location, then rename into place.
fn write_pair(path: &Path, pair: &TokenPair) -> io::Result<()> {
    let parent = match path.parent() {
        Some(p) if !p.as_os_str().is_empty() => p,
        _ => Path::new("."),
    };
    std::fs::create_dir_all(parent)?;
    let mut tmp = NamedTempFile::new_in(parent)?;
    serde_json::to_writer_pretty(&mut tmp, pair)?;
    tmp.persist(path).map_err(|e| e.error)?;
    Ok(())
}
