use std::sync::Arc;
use anyhow::{Context, Result};
use log::{debug, warn};
use reqwest::{Client, Method, RequestBuilder, StatusCode};
use serde::de::DeserializeOwned;
use serde::Serialize;
use url::Url;
use crate::config::Config;
use crate::error::ApiError;
use crate::models::ErrorBody;
use crate::session::SessionStore;

struct Inner {
    client: Client,
    base: String,
    session: SessionStore,
}

/// JSON client for the course backend.
///
/// Each request carries the bearer token currently held in storage. A 401 from
/// any endpoint expires the session (which routes back to the login screen)
/// before the error is returned to the caller.
#[derive(Clone)]
pub struct HttpClient {
    inner: Arc<Inner>,
}

impl HttpClient {
    pub fn new(config: &Config, session: SessionStore) -> Result<Self> {
        let client = Client::builder()
            .cookie_store(true)
            .timeout(config.timeout)
            .build()
            .context("Failed to build the client")?;

        Ok(Self::with_client(client, &config.api_url, session))
    }

    pub fn with_client(client: Client, base: &Url, session: SessionStore) -> Self {
        let base = base.as_str().trim_end_matches('/').to_string();
        HttpClient { inner: Arc::new(Inner { client, base, session }) }
    }

    pub fn session(&self) -> &SessionStore {
        &self.inner.session
    }

    pub fn base_url(&self) -> &str {
        &self.inner.base
    }

    fn request(&self, method: Method, path: &str, fallback: &str) -> Result<RequestBuilder, ApiError> {
        let raw = format!("{}{}", self.inner.base, path);
        let url = Url::parse(&raw).map_err(|e| ApiError::Transport {
            message: fallback.to_string(),
            detail: format!("invalid url {}: {}", raw, e),
        })?;

        debug!("{} {}", method, url);
        let mut builder = self.inner.client.request(method, url);
        if let Some(token) = self.inner.session.persisted_token() {
            builder = builder.bearer_auth(token);
        }
        Ok(builder)
    }

    async fn execute(&self, builder: RequestBuilder, fallback: &str) -> Result<Vec<u8>, ApiError> {
        let response = builder.send().await.map_err(|e| {
            warn!("{}: {}", fallback, e);
            ApiError::Transport { message: fallback.to_string(), detail: e.to_string() }
        })?;

        let status = response.status();
        let body = response.bytes().await.map_err(|e| ApiError::Transport {
            message: fallback.to_string(),
            detail: format!("failed to read response body: {}", e),
        })?;

        if status.is_success() {
            return Ok(body.to_vec());
        }

        let message = backend_message(&body).unwrap_or_else(|| fallback.to_string());
        warn!("{} ({}): {}", fallback, status, message);

        if status == StatusCode::UNAUTHORIZED {
            self.inner.session.expire();
            return Err(ApiError::Unauthorized { message });
        }

        Err(ApiError::Backend { status: status.as_u16(), message })
    }

    async fn fetch<T: DeserializeOwned>(&self, builder: RequestBuilder, fallback: &str) -> Result<T, ApiError> {
        let body = self.execute(builder, fallback).await?;
        serde_json::from_slice(&body).map_err(|e| {
            warn!("{}: unexpected response body: {}", fallback, e);
            ApiError::Decode { message: fallback.to_string(), detail: e.to_string() }
        })
    }

    pub async fn get<T: DeserializeOwned>(&self, path: &str, fallback: &str) -> Result<T, ApiError> {
        let builder = self.request(Method::GET, path, fallback)?;
        self.fetch(builder, fallback).await
    }

    pub async fn get_with_query<T, Q>(&self, path: &str, query: &Q, fallback: &str) -> Result<T, ApiError>
    where
        T: DeserializeOwned,
        Q: Serialize + ?Sized,
    {
        let builder = self.request(Method::GET, path, fallback)?.query(query);
        self.fetch(builder, fallback).await
    }

    pub async fn post<B, T>(&self, path: &str, body: &B, fallback: &str) -> Result<T, ApiError>
    where
        B: Serialize + ?Sized,
        T: DeserializeOwned,
    {
        let builder = self.request(Method::POST, path, fallback)?.json(body);
        self.fetch(builder, fallback).await
    }

    pub async fn post_empty<T: DeserializeOwned>(&self, path: &str, fallback: &str) -> Result<T, ApiError> {
        let builder = self.request(Method::POST, path, fallback)?;
        self.fetch(builder, fallback).await
    }

    pub async fn put<B, T>(&self, path: &str, body: &B, fallback: &str) -> Result<T, ApiError>
    where
        B: Serialize + ?Sized,
        T: DeserializeOwned,
    {
        let builder = self.request(Method::PUT, path, fallback)?.json(body);
        self.fetch(builder, fallback).await
    }

    pub async fn put_with_query<T, Q>(&self, path: &str, query: &Q, fallback: &str) -> Result<T, ApiError>
    where
        T: DeserializeOwned,
        Q: Serialize + ?Sized,
    {
        let builder = self.request(Method::PUT, path, fallback)?.query(query);
        self.fetch(builder, fallback).await
    }

    pub async fn delete(&self, path: &str, fallback: &str) -> Result<(), ApiError> {
        let builder = self.request(Method::DELETE, path, fallback)?;
        self.execute(builder, fallback).await.map(|_| ())
    }
}

// The backend's `message` field, when the error body has a non-blank one.
fn backend_message(body: &[u8]) -> Option<String> {
    serde_json::from_slice::<ErrorBody>(body)
        .ok()
        .and_then(|b| b.message)
        .map(|m| m.trim().to_string())
        .filter(|m| !m.is_empty())
}
