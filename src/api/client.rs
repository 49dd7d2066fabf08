//! Session-aware HTTP client for the ERP backend
//!
//! Wraps reqwest::Client with bearer token injection and one-shot
//! recovery from access-token expiry via `/token/refresh/`.

use std::sync::Arc;

use anyhow::Context;
use reqwest::{Method, StatusCode};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use tokio::sync::Mutex;
use url::Url;

use super::error::{render_field_errors, ApiError};
use crate::auth::{
    CredentialPair, LoginRedirect, SessionStore, TerminalRedirect, ACCESS_TOKEN_KEY,
    REFRESH_TOKEN_KEY,
};
use crate::config::{Config, FileSessionStore};

const TOKEN_PATH: &str = "/token/";
const TOKEN_REFRESH_PATH: &str = "/token/refresh/";

/// How 401s arriving together share a token refresh.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "kebab-case")]
pub enum RefreshPolicy {
    /// One refresh at a time; requests that queued behind it reuse its token.
    #[default]
    SingleFlight,
    /// Every failing request runs its own refresh call.
    PerRequest,
}

/// Retry state of a logical request. Moves `Initial -> Retried` at most once.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum Attempt {
    #[default]
    Initial,
    Retried,
}

/// File carried by a multipart body.
#[derive(Debug, Clone)]
pub struct FilePart {
    pub field: String,
    pub file_name: String,
    pub bytes: Vec<u8>,
}

/// `multipart/form-data` body, kept as plain data so a retry can rebuild it.
#[derive(Debug, Clone, Default)]
pub struct MultipartBody {
    fields: Vec<(String, String)>,
    file: Option<FilePart>,
}

impl MultipartBody {
    pub fn text(mut self, name: &str, value: impl Into<String>) -> Self {
        self.fields.push((name.to_string(), value.into()));
        self
    }

    pub fn file(mut self, part: FilePart) -> Self {
        self.file = Some(part);
        self
    }

    fn to_form(&self) -> reqwest::multipart::Form {
        let mut form = reqwest::multipart::Form::new();
        for (name, value) in &self.fields {
            form = form.text(name.clone(), value.clone());
        }
        if let Some(file) = &self.file {
            let part = reqwest::multipart::Part::bytes(file.bytes.clone())
                .file_name(file.file_name.clone());
            form = form.part(file.field.clone(), part);
        }
        form
    }
}

#[derive(Debug, Clone)]
enum RequestBody {
    Json(serde_json::Value),
    Multipart(MultipartBody),
}

/// Outbound request descriptor, rebuilt into a reqwest request on every send.
#[derive(Debug, Clone)]
pub struct PendingRequest {
    method: Method,
    path: String,
    query: Vec<(String, String)>,
    body: Option<RequestBody>,
    bearer: Option<String>,
    attempt: Attempt,
}

impl PendingRequest {
    pub fn new(method: Method, path: impl Into<String>) -> Self {
        Self {
            method,
            path: path.into(),
            query: Vec::new(),
            body: None,
            bearer: None,
            attempt: Attempt::Initial,
        }
    }

    pub fn get(path: impl Into<String>) -> Self {
        Self::new(Method::GET, path)
    }

    pub fn post(path: impl Into<String>) -> Self {
        Self::new(Method::POST, path)
    }

    pub fn put(path: impl Into<String>) -> Self {
        Self::new(Method::PUT, path)
    }

    pub fn delete(path: impl Into<String>) -> Self {
        Self::new(Method::DELETE, path)
    }

    pub fn query(mut self, key: &str, value: &str) -> Self {
        self.query.push((key.to_string(), value.to_string()));
        self
    }

    pub fn json<B: Serialize + ?Sized>(mut self, body: &B) -> Result<Self, ApiError> {
        self.body = Some(RequestBody::Json(serde_json::to_value(body)?));
        Ok(self)
    }

    pub fn multipart(mut self, body: MultipartBody) -> Self {
        self.body = Some(RequestBody::Multipart(body));
        self
    }

    #[cfg(test)]
    pub fn attempt(&self) -> Attempt {
        self.attempt
    }

    /// Flip to `Retried`. Returns false if the request was already retried.
    pub fn mark_retried(&mut self) -> bool {
        match self.attempt {
            Attempt::Initial => {
                self.attempt = Attempt::Retried;
                true
            }
            Attempt::Retried => false,
        }
    }
}

#[derive(Debug, Serialize)]
struct TokenRequest<'a> {
    username: &'a str,
    password: &'a str,
}

#[derive(Debug, Deserialize)]
struct TokenResponse {
    access: String,
    refresh: String,
}

#[derive(Debug, Serialize)]
struct RefreshRequest<'a> {
    refresh: &'a str,
}

#[derive(Debug, Deserialize)]
struct RefreshResponse {
    access: String,
    /// Present when the backend rotates refresh tokens.
    #[serde(default)]
    refresh: Option<String>,
}

/// Authenticated client for the ERP REST API.
pub struct ApiClient {
    http: reqwest::Client,
    base_url: Url,
    store: Arc<dyn SessionStore>,
    redirect: Arc<dyn LoginRedirect>,
    login_route: String,
    policy: RefreshPolicy,
    refresh_lock: Mutex<()>,
}

impl ApiClient {
    pub fn new(
        config: &Config,
        store: Arc<dyn SessionStore>,
        redirect: Arc<dyn LoginRedirect>,
    ) -> anyhow::Result<Self> {
        let base_url = Url::parse(&format!("{}/", config.api_base_url.trim_end_matches('/')))
            .with_context(|| format!("Invalid API URL: {}", config.api_base_url))?;

        let mut builder = reqwest::Client::builder();
        if let Some(timeout) = config.request_timeout() {
            builder = builder.timeout(timeout);
        }
        let http = builder.build().context("Failed to build HTTP client")?;

        Ok(Self {
            http,
            base_url,
            store,
            redirect,
            login_route: config.login_route.clone(),
            policy: config.refresh_policy,
            refresh_lock: Mutex::new(()),
        })
    }

    /// Client backed by the on-disk session file, reporting expiry on the terminal.
    pub fn connect(config: &Config) -> anyhow::Result<Self> {
        let store = FileSessionStore::open_default()?;
        Self::new(config, Arc::new(store), Arc::new(TerminalRedirect))
    }

    pub fn store(&self) -> &Arc<dyn SessionStore> {
        &self.store
    }

    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    fn url_for(&self, path: &str) -> Result<Url, ApiError> {
        self.base_url
            .join(path.trim_start_matches('/'))
            .map_err(|source| ApiError::InvalidUrl {
                path: path.to_string(),
                source,
            })
    }

    /// Attach the stored access token as the request's bearer credential.
    fn authorize(&self, req: &mut PendingRequest) {
        req.bearer = self.store.access_token();
    }

    async fn dispatch(&self, req: &PendingRequest) -> Result<reqwest::Response, ApiError> {
        let url = self.url_for(&req.path)?;
        tracing::debug!("{} {} ({:?})", req.method, url, req.attempt);

        let mut builder = self.http.request(req.method.clone(), url.clone());
        if !req.query.is_empty() {
            builder = builder.query(&req.query);
        }
        if let Some(token) = &req.bearer {
            builder = builder.bearer_auth(token);
        }
        match &req.body {
            Some(RequestBody::Json(body)) => builder = builder.json(body),
            Some(RequestBody::Multipart(body)) => builder = builder.multipart(body.to_form()),
            None => {}
        }

        let resp = builder
            .send()
            .await
            .map_err(|source| ApiError::Transport {
                method: req.method.clone(),
                url: url.to_string(),
                source,
            })?;

        check_response(resp, url.as_str()).await
    }

    /// Send through the gateway: attach the bearer token, and on a first 401
    /// swap the refresh token for a new access token and retry once.
    pub async fn send(&self, mut req: PendingRequest) -> Result<reqwest::Response, ApiError> {
        self.authorize(&mut req);

        let err = match self.dispatch(&req).await {
            Ok(resp) => return Ok(resp),
            Err(err) => err,
        };

        if !err.is_unauthorized() || self.store.refresh_token().is_none() {
            return Err(err);
        }
        if !req.mark_retried() {
            return Err(err);
        }

        let renewed = self.renew_access_token(req.bearer.as_deref()).await?;
        match renewed {
            Some(access) => {
                req.bearer = Some(access);
                self.dispatch(&req).await
            }
            None => Err(err),
        }
    }

    /// New access token for a request that was rejected while carrying `stale`.
    ///
    /// `None` means no refresh was possible; the session has been ended if the
    /// refresh endpoint rejected the token.
    async fn renew_access_token(&self, stale: Option<&str>) -> Result<Option<String>, ApiError> {
        match self.policy {
            RefreshPolicy::PerRequest => self.refresh_session().await,
            RefreshPolicy::SingleFlight => {
                let _guard = self.refresh_lock.lock().await;
                if let Some(current) = self.store.access_token() {
                    if stale != Some(current.as_str()) {
                        tracing::debug!("Access token already refreshed by a concurrent request");
                        return Ok(Some(current));
                    }
                }
                self.refresh_session().await
            }
        }
    }

    async fn refresh_session(&self) -> Result<Option<String>, ApiError> {
        let Some(refresh) = self.store.refresh_token() else {
            return Ok(None);
        };

        tracing::info!("Access token rejected, refreshing...");
        match self.request_refresh(&refresh).await {
            Ok(tokens) => {
                self.store
                    .set(ACCESS_TOKEN_KEY, &tokens.access)
                    .map_err(ApiError::Store)?;
                if let Some(rotated) = &tokens.refresh {
                    self.store
                        .set(REFRESH_TOKEN_KEY, rotated)
                        .map_err(ApiError::Store)?;
                }
                tracing::info!("Access token refreshed");
                Ok(Some(tokens.access))
            }
            Err(e) => {
                tracing::warn!("Token refresh failed: {:#}", anyhow::Error::new(e));
                self.end_session()?;
                Ok(None)
            }
        }
    }

    /// Drop all session state and hand control to the login redirect.
    fn end_session(&self) -> Result<(), ApiError> {
        let cleared = self.store.clear();
        self.redirect.redirect_to_login(&self.login_route);
        cleared.map_err(ApiError::Store)
    }

    /// Unauthenticated call to the refresh endpoint.
    async fn request_refresh(&self, refresh: &str) -> Result<RefreshResponse, ApiError> {
        let req = PendingRequest::post(TOKEN_REFRESH_PATH).json(&RefreshRequest { refresh })?;
        self.fetch_anonymous(req).await
    }

    /// Exchange username and password for a credential pair (`POST /token/`).
    pub async fn obtain_credentials(
        &self,
        username: &str,
        password: &str,
    ) -> Result<CredentialPair, ApiError> {
        let req = PendingRequest::post(TOKEN_PATH).json(&TokenRequest { username, password })?;
        let tokens: TokenResponse = self.fetch_anonymous(req).await?;
        Ok(CredentialPair {
            access_token: tokens.access,
            refresh_token: tokens.refresh,
        })
    }

    /// Send without the gateway: no bearer header, no refresh on 401.
    pub async fn fetch_anonymous<T: DeserializeOwned>(
        &self,
        req: PendingRequest,
    ) -> Result<T, ApiError> {
        let resp = self.dispatch(&req).await?;
        let url = resp.url().to_string();
        decode(resp, &url).await
    }

    /// Send and decode a JSON response body.
    pub async fn fetch<T: DeserializeOwned>(&self, req: PendingRequest) -> Result<T, ApiError> {
        let resp = self.send(req).await?;
        let url = resp.url().to_string();
        decode(resp, &url).await
    }

    pub async fn get<T: DeserializeOwned>(&self, path: &str) -> Result<T, ApiError> {
        self.fetch(PendingRequest::get(path)).await
    }

    pub async fn post<B, T>(&self, path: &str, body: &B) -> Result<T, ApiError>
    where
        B: Serialize + ?Sized,
        T: DeserializeOwned,
    {
        self.fetch(PendingRequest::post(path).json(body)?).await
    }

    pub async fn put<B, T>(&self, path: &str, body: &B) -> Result<T, ApiError>
    where
        B: Serialize + ?Sized,
        T: DeserializeOwned,
    {
        self.fetch(PendingRequest::put(path).json(body)?).await
    }

    pub async fn delete(&self, path: &str) -> Result<(), ApiError> {
        self.send(PendingRequest::delete(path)).await?;
        Ok(())
    }
}

async fn decode<T: DeserializeOwned>(resp: reqwest::Response, url: &str) -> Result<T, ApiError> {
    resp.json().await.map_err(|source| ApiError::Decode {
        url: url.to_string(),
        source,
    })
}

/// Map non-2xx responses onto `ApiError`.
async fn check_response(resp: reqwest::Response, url: &str) -> Result<reqwest::Response, ApiError> {
    let status = resp.status();
    if status.is_success() {
        return Ok(resp);
    }

    let body = resp.text().await.unwrap_or_default();
    if status == StatusCode::UNAUTHORIZED {
        return Err(ApiError::Unauthorized {
            url: url.to_string(),
            body,
        });
    }

    let body = if status == StatusCode::BAD_REQUEST {
        render_field_errors(&body).unwrap_or(body)
    } else {
        body
    };
    Err(ApiError::Status {
        status,
        url: url.to_string(),
        body,
    })
}
