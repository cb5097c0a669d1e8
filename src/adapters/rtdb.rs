//! Firebase Realtime Database adapter.
//!
//! Implements [`DocumentStore`] over the RTDB REST API:
//!
//! | Operation         | Request                                            |
//! |-------------------|----------------------------------------------------|
//! | `fetch`           | `GET  {db}{path}.json?auth={idToken}`              |
//! | `store`           | `PUT  {db}{path}.json?auth={idToken}` (full body)  |
//! | `refresh_session` | `POST identitytoolkit …/accounts:signInWithPassword` |
//!
//! The client is generic over [`HttpTransport`] so the protocol mapping is
//! tested on the host against a scripted transport; on the device the
//! transport is [`EspHttpTransport`](super::http::EspHttpTransport).

use log::{info, warn};
use serde::{Deserialize, Serialize};

use crate::app::document::Document;
use crate::app::ports::DocumentStore;
use crate::config::RemoteConfig;
use crate::error::RemoteError;

use super::utils::trim_trailing_slash;

const SIGN_IN_URL: &str =
    "https://identitytoolkit.googleapis.com/v1/accounts:signInWithPassword?key=";

// ───────────────────────────────────────────────────────────────
// Transport seam
// ───────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HttpMethod {
    Get,
    Put,
    Post,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HttpResponse {
    pub status: u16,
    pub body: Vec<u8>,
}

/// One blocking HTTPS exchange.  Transport failures map to
/// `RemoteError::Network` or `RemoteError::Timeout`; any HTTP status,
/// including errors, is a successful exchange.
pub trait HttpTransport {
    fn request(
        &mut self,
        method: HttpMethod,
        url: &str,
        body: Option<&[u8]>,
    ) -> Result<HttpResponse, RemoteError>;
}

// ───────────────────────────────────────────────────────────────
// Wire types
// ───────────────────────────────────────────────────────────────

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct SignInRequest<'a> {
    email: &'a str,
    password: &'a str,
    return_secure_token: bool,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct SignInResponse {
    id_token: String,
}

// ───────────────────────────────────────────────────────────────
// Client
// ───────────────────────────────────────────────────────────────

pub struct RtdbClient<T: HttpTransport> {
    transport: T,
    config: RemoteConfig,
    id_token: Option<String>,
}

impl<T: HttpTransport> RtdbClient<T> {
    pub fn new(transport: T, config: &RemoteConfig) -> Self {
        Self {
            transport,
            config: config.clone(),
            id_token: None,
        }
    }

    pub fn has_session(&self) -> bool {
        self.id_token.is_some()
    }

    /// Exchange the account credentials for a fresh ID token.
    pub fn sign_in(&mut self) -> Result<(), RemoteError> {
        self.id_token = None;

        let url = format!("{}{}", SIGN_IN_URL, self.config.api_key);
        let body = serde_json::to_vec(&SignInRequest {
            email: &self.config.email,
            password: &self.config.password,
            return_secure_token: true,
        })
        .map_err(|_| RemoteError::Malformed)?;

        let resp = self.transport.request(HttpMethod::Post, &url, Some(body.as_slice()))?;
        match resp.status {
            200..=299 => {
                let parsed: SignInResponse =
                    serde_json::from_slice(&resp.body).map_err(|_| RemoteError::Malformed)?;
                if parsed.id_token.is_empty() {
                    return Err(RemoteError::Malformed);
                }
                self.id_token = Some(parsed.id_token);
                info!("RTDB: signed in as {}", self.config.email);
                Ok(())
            }
            400 => {
                warn!("RTDB: sign-in rejected for {}", self.config.email);
                Err(RemoteError::Auth)
            }
            status => Err(self.map_status(status)),
        }
    }

    /// `{db}{path}.json?auth={token}`, or `Auth` without a session.
    fn document_url(&self, path: &str) -> Result<String, RemoteError> {
        let token = self.id_token.as_deref().ok_or(RemoteError::Auth)?;
        Ok(format!(
            "{}{}.json?auth={}",
            trim_trailing_slash(&self.config.database_url),
            path,
            token
        ))
    }

    /// Classify a non-2xx status.  Auth rejections drop the session.
    fn map_status(&mut self, status: u16) -> RemoteError {
        match status {
            401 | 403 => {
                self.id_token = None;
                RemoteError::Auth
            }
            408 => RemoteError::Timeout,
            other => RemoteError::Rejected(other),
        }
    }
}

impl<T: HttpTransport> DocumentStore for RtdbClient<T> {
    fn fetch(&mut self, path: &str) -> Result<Document, RemoteError> {
        let url = self.document_url(path)?;
        let resp = self.transport.request(HttpMethod::Get, &url, None)?;
        if !(200..=299).contains(&resp.status) {
            return Err(self.map_status(resp.status));
        }
        serde_json::from_slice(&resp.body).map_err(|_| RemoteError::Malformed)
    }

    fn store(&mut self, path: &str, doc: &Document) -> Result<(), RemoteError> {
        let url = self.document_url(path)?;
        let body = serde_json::to_vec(doc).map_err(|_| RemoteError::Malformed)?;
        let resp = self.transport.request(HttpMethod::Put, &url, Some(body.as_slice()))?;
        if !(200..=299).contains(&resp.status) {
            return Err(self.map_status(resp.status));
        }
        Ok(())
    }

    fn refresh_session(&mut self) -> Result<(), RemoteError> {
        self.sign_in()
    }
}

// ───────────────────────────────────────────────────────────────
// Tests
// ───────────────────────────────────────────────────────────────
