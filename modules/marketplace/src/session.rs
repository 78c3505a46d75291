//! Login state shared by everything in the process.
//!
//! The session tracks two things: whether a token pair is held, and the
//! member profile once it has been fetched. Restoring from disk is
//! optimistic: a persisted token counts as logged in before any server
//! round trip, and the first profile fetch either confirms the session or
//! collapses it.
//!
//! Any profile fetch failure logs the session out, transport errors
//! included; the caller sends the user back through login.

use std::fmt;
use std::io;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use arc_swap::ArcSwapOption;
use clientkit::{ApiError, TokenPair, TokenStore};

use crate::api::MembersApi;
use crate::model::MemberProfile;

/// Where the session currently stands.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionPhase {
    /// No token held.
    LoggedOut,
    /// A token is held but no profile has been fetched yet. This is the
    /// state right after process start with persisted credentials.
    Restored,
    /// Token held and profile loaded.
    Active,
}

impl fmt::Display for SessionPhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::LoggedOut => "logged out",
            Self::Restored => "logged in (profile not loaded)",
            Self::Active => "logged in",
        })
    }
}

/// Process-wide login state.
///
/// Observable invariant: a loaded profile implies the authenticated flag
/// is set. State changes order their writes so readers never see a
/// profile on a logged-out session.
pub struct Session {
    store: TokenStore,
    authenticated: AtomicBool,
    member: ArcSwapOption<MemberProfile>,
}

impl Session {
    /// Rebuild session state from whatever the store already holds.
    /// A persisted token counts as logged in until a fetch says otherwise.
    pub fn restore(store: TokenStore) -> Self {
        let authenticated = store.is_logged_in();
        Self {
            store,
            authenticated: AtomicBool::new(authenticated),
            member: ArcSwapOption::empty(),
        }
    }

    pub fn is_authenticated(&self) -> bool {
        self.authenticated.load(Ordering::SeqCst)
    }

    /// The loaded member profile, if any.
    pub fn member(&self) -> Option<Arc<MemberProfile>> {
        self.member.load_full()
    }

    pub fn phase(&self) -> SessionPhase {
        if self.member.load().is_some() {
            SessionPhase::Active
        } else if self.is_authenticated() {
            SessionPhase::Restored
        } else {
            SessionPhase::LoggedOut
        }
    }

    /// Persist a fresh token pair and mark the session live.
    ///
    /// Fails only if the credentials file cannot be written; the session
    /// state is untouched in that case.
    pub fn login(&self, pair: TokenPair) -> io::Result<()> {
        self.store.set(pair)?;
        self.authenticated.store(true, Ordering::SeqCst);
        tracing::info!("logged in");
        Ok(())
    }

    /// Drop credentials and profile. Never fails.
    pub fn logout(&self) {
        // Profile first so no reader sees a profile without the flag.
        self.member.store(None);
        self.authenticated.store(false, Ordering::SeqCst);
        self.store.clear();
        tracing::info!("logged out");
    }

    /// Fetch the member profile and activate the session.
    ///
    /// On any failure the session logs out before the error propagates;
    /// expired tokens and unreachable servers are not distinguished.
    pub async fn fetch_profile(&self, api: &dyn MembersApi) -> Result<Arc<MemberProfile>, ApiError> {
        match api.profile().await {
            Ok(profile) => {
                let profile = Arc::new(profile);
                self.authenticated.store(true, Ordering::SeqCst);
                self.member.store(Some(profile.clone()));
                tracing::debug!(nick = %profile.member_nick, "profile loaded");
                Ok(profile)
            }
            Err(e) => {
                if e.is_auth_rejected() {
                    tracing::warn!(error = %e, "session expired or revoked, logging out");
                } else {
                    tracing::warn!(error = %e, "profile fetch failed, logging out");
                }
                self.logout();
                Err(e)
            }
        }
    }
}
