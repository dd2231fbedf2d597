//! HTTP client for the document GPT service: registration, sign-in, corpus
//! queries and document upload. Each operation keeps its own payload
//! encoding (JSON for register and ask, form-urlencoded for the token
//! endpoint, multipart for upload) because the service expects exactly that
//! asymmetry. No operation retries on its own.

use std::sync::Arc;

use reqwest::multipart;
use reqwest::{StatusCode, Url};
use tracing::debug;

use crate::api::{AskRequest, ErrorBody, MessageResponse, QueryResult, RegisterRequest, TokenResponse};
use crate::error::{ApiError, ApiResult};
use crate::session::{Session, SessionStore};
use crate::token::Role;

pub struct ApiClient {
    base: Url,
    http: reqwest::Client,
    session: Arc<SessionStore>,
}

impl ApiClient {
    pub fn new(base: &str, session: Arc<SessionStore>) -> ApiResult<Self> {
        let base = Url::parse(base).map_err(|e| ApiError::input(format!("invalid API URL: {e}")))?;
        let http = reqwest::Client::builder()
            .build()
            .map_err(|e| ApiError::io(e.to_string()))?;
        Ok(Self { base, http, session })
    }

    pub fn base(&self) -> &Url {
        &self.base
    }

    pub fn session(&self) -> &SessionStore {
        &self.session
    }

    /// Create an account. Requesting the admin role requires the service's
    /// admin key; a missing key fails locally before any request, a wrong
    /// one is the service's call.
    pub async fn register(&self, req: &RegisterRequest) -> ApiResult<String> {
        if req.role == Role::Admin
            && req.admin_key.as_deref().map_or(true, |k| k.trim().is_empty())
        {
            return Err(ApiError::registration("admin registration requires an admin key"));
        }
        let url = self.endpoint("/v1/auth/register/")?;
        let resp = self
            .http
            .post(url)
            .json(req)
            .send()
            .await
            .map_err(|e| ApiError::registration(e.to_string()))?;
        if !resp.status().is_success() {
            return Err(ApiError::registration(reason_from(resp).await));
        }
        let body: MessageResponse = resp
            .json()
            .await
            .map_err(|e| ApiError::registration(e.to_string()))?;
        debug!("registered '{}' as {}", req.username, req.role);
        Ok(body.message)
    }

    /// Sign in and install the issued credential in the session store. A
    /// failed attempt leaves the session exactly as it was.
    pub async fn login(&self, username: &str, password: &str) -> ApiResult<Session> {
        let url = self.endpoint("/v1/auth/token/")?;
        let resp = self
            .http
            .post(url)
            .form(&[("username", username), ("password", password)])
            .send()
            .await
            .map_err(|e| ApiError::auth(e.to_string()))?;
        if !resp.status().is_success() {
            return Err(ApiError::auth(reason_from(resp).await));
        }
        let body: TokenResponse = resp.json().await.map_err(|e| ApiError::auth(e.to_string()))?;
        self.session.set(&body.access_token)
    }

    /// Ask a question against the document corpus. Empty input is rejected
    /// before any request goes out; the result's source order is the
    /// service's and is returned untouched.
    pub async fn ask(&self, question: &str) -> ApiResult<QueryResult> {
        let question = question.trim();
        if question.is_empty() {
            return Err(ApiError::input("please enter a question"));
        }
        let session = self
            .session
            .current()
            .ok_or_else(|| ApiError::auth("not signed in"))?;
        let url = self.endpoint("/v1/query/ask/")?;
        let resp = self
            .http
            .post(url)
            .bearer_auth(&session.token)
            .json(&AskRequest { query: question.to_string() })
            .send()
            .await
            .map_err(|e| ApiError::query(e.to_string()))?;
        if !resp.status().is_success() {
            return Err(ApiError::query(reason_from(resp).await));
        }
        resp.json::<QueryResult>()
            .await
            .map_err(|e| ApiError::query(e.to_string()))
    }

    /// Upload a document for ingestion. The service only accepts this from
    /// admin accounts; the client sends regardless of its local role and
    /// surfaces the service's not-authorized verdict distinctly.
    pub async fn upload(&self, file_name: &str, bytes: Vec<u8>) -> ApiResult<String> {
        let session = self
            .session
            .current()
            .ok_or_else(|| ApiError::auth("not signed in"))?;
        let part = multipart::Part::bytes(bytes).file_name(file_name.to_string());
        let form = multipart::Form::new().part("file", part);
        let url = self.endpoint("/v1/document/upload/")?;
        let resp = self
            .http
            .post(url)
            .bearer_auth(&session.token)
            .multipart(form)
            .send()
            .await
            .map_err(|e| ApiError::upload(e.to_string()))?;
        let status = resp.status();
        if status == StatusCode::UNAUTHORIZED || status == StatusCode::FORBIDDEN {
            return Err(ApiError::upload_denied(reason_from(resp).await));
        }
        if !status.is_success() {
            return Err(ApiError::upload(reason_from(resp).await));
        }
        let body: MessageResponse = resp.json().await.map_err(|e| ApiError::upload(e.to_string()))?;
        Ok(body.message)
    }

    /// Drop the current session (memory and durable copy).
    pub fn logout(&self) {
        self.session.clear();
    }

    fn endpoint(&self, path: &str) -> ApiResult<Url> {
        self.base
            .join(path)
            .map_err(|e| ApiError::input(format!("invalid endpoint path: {e}")))
    }
}

/// Pull the service's `detail` text out of a failure response, falling back
/// to the HTTP status when the body is absent or unparseable.
async fn reason_from(resp: reqwest::Response) -> String {
    let status = resp.status();
    match resp.json::<ErrorBody>().await {
        Ok(ErrorBody { detail: Some(d) }) if !d.is_empty() => d,
        _ => format!("HTTP {status}"),
    }
}
