//! Wire types for the service's four endpoints.

use serde::{Deserialize, Serialize};

use crate::token::Role;

/// Body of `POST /v1/auth/register/`. `admin_key` is only serialized when
/// present; user-role registrations never carry the field.
#[derive(Debug, Clone, Serialize)]
pub struct RegisterRequest {
    pub username: String,
    pub password: String,
    pub role: Role,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub admin_key: Option<String>,
}

/// Success body of `POST /v1/auth/token/`.
#[derive(Debug, Deserialize)]
pub struct TokenResponse {
    pub access_token: String,
    #[serde(default)]
    pub token_type: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct AskRequest {
    pub query: String,
}

/// One cited excerpt backing an answer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SourceFragment {
    pub file_path: String,
    pub chunk_index: u32,
    pub text: String,
}

/// Success body of `POST /v1/query/ask/`. `sources` keeps the order the
/// service returned (retrieval relevance); it is never re-sorted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct QueryResult {
    pub answer: String,
    #[serde(default)]
    pub sources: Vec<SourceFragment>,
}

/// Generic `{message}` success body (register, upload).
#[derive(Debug, Deserialize)]
pub struct MessageResponse {
    pub message: String,
}

/// Failure body shape used by the service: `{"detail": <text>}`.
#[derive(Debug, Deserialize)]
pub struct ErrorBody {
    #[serde(default)]
    pub detail: Option<String>,
}
