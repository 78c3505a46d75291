use reqwest::StatusCode;
use thiserror::Error;

/// Errors surfaced by [`crate::http::ApiClient`] calls.
///
/// Two shapes cover every request outcome:
/// - `Network`: the request never produced a usable response (connect,
///   timeout, TLS, or response-body decode failure).
/// - `Rejected`: the server answered with a non-2xx status; the raw
///   response body is kept for diagnostics.
#[derive(Debug, Error)]
pub enum ApiError {
    #[error("network failure: {0}")]
    Network(#[from] reqwest::Error),

    #[error("server rejected request: {status}")]
    Rejected { status: StatusCode, body: String },
}

impl ApiError {
    pub fn rejected(status: StatusCode, body: impl Into<String>) -> Self {
        Self::Rejected {
            status,
            body: body.into(),
        }
    }

    /// Status code of the rejection, if the server answered at all.
    pub fn status(&self) -> Option<StatusCode> {
        match self {
            Self::Network(_) => None,
            Self::Rejected { status, .. } => Some(*status),
        }
    }

    /// True when the server explicitly refused the caller's credentials
    /// (401 or 403). Used to pick the log flavor; callers treat every
    /// profile-fetch failure the same way regardless.
    pub fn is_auth_rejected(&self) -> bool {
        matches!(
            self,
            Self::Rejected { status, .. }
                if *status == StatusCode::UNAUTHORIZED || *status == StatusCode::FORBIDDEN
        )
    }
}
