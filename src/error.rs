//! Unified client error model.
//! One enum covers every failure surface of the client so callers can always
//! tell a malformed or absent credential apart from a service that rejected
//! or never answered a request.

use serde::{Deserialize, Serialize};
use std::fmt::{Display, Formatter};

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ApiError {
    /// Credential could not be decoded (malformed, wrong shape, or expired).
    /// Local only; never produced by a network failure.
    Decode { message: String },
    /// Sign-in rejected or the token endpoint was unreachable; also raised
    /// when an operation needs a credential and none is present.
    Auth { reason: String },
    Registration { reason: String },
    Query { reason: String },
    /// `denied` marks the service's not-authorized verdict (401/403) as
    /// opposed to any other upload failure.
    Upload { reason: String, denied: bool },
    /// Local input validation; no request was issued.
    Input { message: String },
    Io { message: String },
}

impl ApiError {
    pub fn decode<S: Into<String>>(msg: S) -> Self { ApiError::Decode { message: msg.into() } }
    pub fn auth<S: Into<String>>(reason: S) -> Self { ApiError::Auth { reason: reason.into() } }
    pub fn registration<S: Into<String>>(reason: S) -> Self { ApiError::Registration { reason: reason.into() } }
    pub fn query<S: Into<String>>(reason: S) -> Self { ApiError::Query { reason: reason.into() } }
    pub fn upload<S: Into<String>>(reason: S) -> Self { ApiError::Upload { reason: reason.into(), denied: false } }
    pub fn upload_denied<S: Into<String>>(reason: S) -> Self { ApiError::Upload { reason: reason.into(), denied: true } }
    pub fn input<S: Into<String>>(msg: S) -> Self { ApiError::Input { message: msg.into() } }
    pub fn io<S: Into<String>>(msg: S) -> Self { ApiError::Io { message: msg.into() } }

    pub fn kind(&self) -> &'static str {
        match self {
            ApiError::Decode { .. } => "decode",
            ApiError::Auth { .. } => "auth",
            ApiError::Registration { .. } => "registration",
            ApiError::Query { .. } => "query",
            ApiError::Upload { .. } => "upload",
            ApiError::Input { .. } => "input",
            ApiError::Io { .. } => "io",
        }
    }

    pub fn message(&self) -> &str {
        match self {
            ApiError::Decode { message }
            | ApiError::Input { message }
            | ApiError::Io { message } => message.as_str(),
            ApiError::Auth { reason }
            | ApiError::Registration { reason }
            | ApiError::Query { reason }
            | ApiError::Upload { reason, .. } => reason.as_str(),
        }
    }

    /// True when the service itself refused the operation for lack of
    /// privilege. The client treats that verdict as authoritative regardless
    /// of its locally derived role.
    pub fn is_denied(&self) -> bool {
        matches!(self, ApiError::Upload { denied: true, .. })
    }

    /// True for failures the user can fix without touching the network
    /// (empty input, absent credential, bad flags).
    pub fn is_local(&self) -> bool {
        matches!(self, ApiError::Input { .. } | ApiError::Decode { .. })
    }
}

impl Display for ApiError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}: {}", self.kind(), self.message())
    }
}

impl std::error::Error for ApiError {}

pub type ApiResult<T> = Result<T, ApiError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn kind_and_message_accessors() {
        assert_eq!(ApiError::decode("bad segment").kind(), "decode");
        assert_eq!(ApiError::auth("no").message(), "no");
        assert_eq!(ApiError::registration("taken").kind(), "registration");
        assert_eq!(ApiError::query("boom").kind(), "query");
        assert_eq!(ApiError::input("empty").kind(), "input");
        assert_eq!(ApiError::io("disk").kind(), "io");
    }

    #[test]
    fn display_includes_kind_prefix() {
        let e = ApiError::auth("Incorrect username or password");
        assert_eq!(e.to_string(), "auth: Incorrect username or password");
    }

    #[test]
    fn denied_is_distinct_from_other_upload_failures() {
        assert!(ApiError::upload_denied("Not authorized").is_denied());
        assert!(!ApiError::upload("connection reset").is_denied());
        assert!(!ApiError::query("500").is_denied());
    }

    #[test]
    fn local_failures_classified() {
        assert!(ApiError::input("please enter a question").is_local());
        assert!(ApiError::decode("garbage").is_local());
        assert!(!ApiError::auth("unreachable").is_local());
    }
}
