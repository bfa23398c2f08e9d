use std::error::Error;
use std::fmt::{Display, Formatter};

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum FirestoreErrorCode {
    /// A native value has no wire representation.
    UnsupportedValue,
    /// A query specification was rejected before it reached the network.
    InvalidQuery,
    InvalidArgument,
    NotFound,
    /// An operation that needs a bearer token was invoked without one.
    AuthRequired,
    /// Network failure or a response the client could not parse.
    Transport,
    /// A structured error reported by the store.
    Domain,
}

impl FirestoreErrorCode {
    pub fn as_str(&self) -> &'static str {
        match self {
            FirestoreErrorCode::UnsupportedValue => "firestore/unsupported-value",
            FirestoreErrorCode::InvalidQuery => "firestore/invalid-query",
            FirestoreErrorCode::InvalidArgument => "firestore/invalid-argument",
            FirestoreErrorCode::NotFound => "firestore/not-found",
            FirestoreErrorCode::AuthRequired => "firestore/auth-required",
            FirestoreErrorCode::Transport => "firestore/transport",
            FirestoreErrorCode::Domain => "firestore/domain",
        }
    }
}

#[derive(Clone, Debug)]
pub struct FirestoreError {
    pub code: FirestoreErrorCode,
    message: String,
    http_status: Option<u16>,
    store_status: Option<String>,
}

impl FirestoreError {
    pub fn new(code: FirestoreErrorCode, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
            http_status: None,
            store_status: None,
        }
    }

    pub(crate) fn with_http_status(mut self, status: u16) -> Self {
        self.http_status = Some(status);
        self
    }

    pub(crate) fn with_store_status(mut self, status: impl Into<String>) -> Self {
        self.store_status = Some(status.into());
        self
    }

    pub fn code_str(&self) -> &'static str {
        self.code.as_str()
    }

    /// The message as reported by the store or the client.
    pub fn message(&self) -> &str {
        &self.message
    }

    /// Raw HTTP status of the failed response, when one was received.
    pub fn http_status(&self) -> Option<u16> {
        self.http_status
    }

    /// Canonical status string from the store's error body (e.g. `PERMISSION_DENIED`).
    pub fn store_status(&self) -> Option<&str> {
        self.store_status.as_deref()
    }
}

impl Display for FirestoreError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match (&self.store_status, self.http_status) {
            (Some(status), _) => write!(f, "{} [{status}] ({})", self.message, self.code_str()),
            (None, Some(http)) => write!(f, "{} [HTTP {http}] ({})", self.message, self.code_str()),
            (None, None) => write!(f, "{} ({})", self.message, self.code_str()),
        }
    }
}

impl Error for FirestoreError {}

pub type FirestoreResult<T> = Result<T, FirestoreError>;

pub fn unsupported_value(message: impl Into<String>) -> FirestoreError {
    FirestoreError::new(FirestoreErrorCode::UnsupportedValue, message)
}

pub fn invalid_query(message: impl Into<String>) -> FirestoreError {
    FirestoreError::new(FirestoreErrorCode::InvalidQuery, message)
}

pub fn invalid_argument(message: impl Into<String>) -> FirestoreError {
    FirestoreError::new(FirestoreErrorCode::InvalidArgument, message)
}

pub fn not_found(message: impl Into<String>) -> FirestoreError {
    FirestoreError::new(FirestoreErrorCode::NotFound, message)
}

pub fn auth_required(message: impl Into<String>) -> FirestoreError {
    FirestoreError::new(FirestoreErrorCode::AuthRequired, message)
}

pub fn transport_error(message: impl Into<String>) -> FirestoreError {
    FirestoreError::new(FirestoreErrorCode::Transport, message)
}

pub fn domain_error(status: impl Into<String>, message: impl Into<String>) -> FirestoreError {
    FirestoreError::new(FirestoreErrorCode::Domain, message).with_store_status(status)
}

/// Returns the token or fails with `firestore/auth-required`.
///
/// Write paths that must not run anonymously call this before issuing the
/// request; the client itself accepts `None` everywhere.
pub fn require_token(token: Option<&str>) -> FirestoreResult<&str> {
    match token {
        Some(token) if !token.is_empty() => Ok(token),
        _ => Err(auth_required("This operation requires a signed-in user")),
    }
}
