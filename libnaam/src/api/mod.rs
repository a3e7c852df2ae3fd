//! Typed client for the NAAM REST backend
//!
//! One async method per endpoint, spread over the submodules by area.
//! Every method returns either an `ApiResult<T>` or, for the three calls
//! whose callers must handle failure explicitly, a `Result<T, ApiError>`.
//!
//! Authenticated requests take their bearer token from the shared
//! `SessionManager`. A 401 invalidates the session for every holder of
//! the manager, unless the rejected token was already replaced.

pub mod auth;
pub mod collections;
pub mod endpoints;
pub mod envelope;
pub mod feed;
pub mod land;
pub mod locations;
pub mod mock;
pub mod profile;

pub use auth::LoginData;
pub use envelope::{Ack, ActionOutcome, ApiResult, Envelope};

use std::sync::Arc;
use std::time::Duration;

use reqwest::header::{AUTHORIZATION, COOKIE};
use reqwest::multipart::{Form, Part};
use reqwest::{Method, RequestBuilder, StatusCode};
use serde::Serialize;

use crate::config::Config;
use crate::error::{ApiError, ConfigError, Result};
use crate::session::SessionManager;
use crate::types::Attachment;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Auth {
    /// Login endpoints; no token yet
    Public,
    Bearer,
}

pub struct ApiClient {
    http: reqwest::Client,
    root: String,
    cookie: Option<String>,
    session: Arc<SessionManager>,
}

impl ApiClient {
    /// # Errors
    ///
    /// Returns a configuration error if the HTTP client cannot be built
    /// (for example, no TLS backend is available).
    pub fn new(config: &Config, session: Arc<SessionManager>) -> Result<Self> {
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.api.timeout_secs))
            .user_agent(concat!("naam/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|e| ConfigError::InvalidValue(format!("HTTP client: {}", e)))?;

        Ok(Self {
            http,
            root: config.api_root(),
            cookie: config.api.cookie.clone().filter(|c| !c.is_empty()),
            session,
        })
    }

    pub fn session(&self) -> &Arc<SessionManager> {
        &self.session
    }

    pub fn api_root(&self) -> &str {
        &self.root
    }

    /// Start a request; Bearer requests remember the token they carry
    fn request(&self, method: Method, path: &str, auth: Auth) -> std::result::Result<Prepared, ApiError> {
        let mut builder = self.http.request(method, format!("{}{}", self.root, path));
        if let Some(cookie) = &self.cookie {
            builder = builder.header(COOKIE, cookie);
        }
        let bearer = match auth {
            Auth::Public => None,
            Auth::Bearer => {
                let bearer = self.session.bearer().ok_or(ApiError::NotAuthenticated)?;
                builder = builder.header(AUTHORIZATION, &bearer);
                Some(bearer)
            }
        };
        Ok(Prepared { builder, bearer })
    }

    async fn dispatch(
        &self,
        prepared: Prepared,
        method: Method,
        path: &str,
    ) -> std::result::Result<Envelope, ApiError> {
        tracing::debug!("{} {}", method, path);
        let response = prepared
            .builder
            .send()
            .await
            .map_err(|e| ApiError::Network(e.to_string()))?;
        let status = response.status();
        tracing::debug!("{} {} -> {}", method, path, status);

        if status == StatusCode::UNAUTHORIZED {
            if let Some(bearer) = &prepared.bearer {
                self.session
                    .invalidate_bearer(bearer, &format!("HTTP 401 on {}", path));
                return Err(ApiError::Unauthorized(format!("{} {}", method, path)));
            }
        }

        let body = response
            .bytes()
            .await
            .map_err(|e| ApiError::Network(e.to_string()))?;
        envelope::parse(status, &body)
    }

    async fn get(&self, path: &str, query: &[(&str, String)]) -> std::result::Result<Envelope, ApiError> {
        let mut prepared = self.request(Method::GET, path, Auth::Bearer)?;
        if !query.is_empty() {
            prepared.builder = prepared.builder.query(query);
        }
        self.dispatch(prepared, Method::GET, path).await
    }

    async fn send_json<B: Serialize + ?Sized>(
        &self,
        method: Method,
        path: &str,
        auth: Auth,
        body: &B,
    ) -> std::result::Result<Envelope, ApiError> {
        let mut prepared = self.request(method.clone(), path, auth)?;
        prepared.builder = prepared.builder.json(body);
        self.dispatch(prepared, method, path).await
    }

    async fn send_form(&self, path: &str, form: Form) -> std::result::Result<Envelope, ApiError> {
        let mut prepared = self.request(Method::POST, path, Auth::Bearer)?;
        prepared.builder = prepared.builder.multipart(form);
        self.dispatch(prepared, Method::POST, path).await
    }
}

struct Prepared {
    builder: RequestBuilder,
    /// `Authorization` value sent, if any
    bearer: Option<String>,
}

/// Build a multipart form from text fields and files on disk
pub(crate) async fn multipart_form(
    fields: Vec<(&'static str, String)>,
    attachments: &[Attachment],
) -> std::result::Result<Form, ApiError> {
    let mut form = Form::new();
    for (name, value) in fields {
        form = form.text(name, value);
    }
    for attachment in attachments {
        let bytes = tokio::fs::read(&attachment.file_path)
            .await
            .map_err(|e| ApiError::Upload(format!("{}: {}", attachment.file_name, e)))?;
        let part = Part::bytes(bytes)
            .file_name(attachment.file_name.clone())
            .mime_str(attachment.mime_type.as_str())
            .map_err(|e| ApiError::Upload(e.to_string()))?;
        form = form.part(attachment.field.clone(), part);
    }
    Ok(form)
}
