//! HTTP client for the hosted platform
//!
//! Tables and procedures are reached through `/rest/v1`, auth through
//! `/auth/v1`. Every request carries the `apikey` header plus a bearer token:
//! the service-role key for privileged clients, or a member's access token
//! for clients produced by [`Platform::as_user`].

use async_trait::async_trait;
use reqwest::{header, Client, Method, RequestBuilder, Response};
use serde_json::{json, Value};
use std::sync::Arc;
use std::time::Duration;
use tracing::debug;

use super::error::{PlatformError, Result};
use super::query::{encode_query, Filter};
use super::{AuthUser, Platform, Session};

/// Client configuration
#[derive(Debug, Clone)]
pub struct PlatformConfig {
    /// Project base URL, e.g. `https://xyz.example.co`
    pub url: String,
    /// Public anon key
    pub anon_key: Option<String>,
    /// Service-role key (bypasses row-level security)
    pub service_role_key: Option<String>,
    /// Request timeout in seconds (default: 30)
    pub timeout_secs: u64,
}

impl Default for PlatformConfig {
    fn default() -> Self {
        Self {
            url: "http://localhost:54321".to_string(),
            anon_key: None,
            service_role_key: None,
            timeout_secs: 30,
        }
    }
}

/// HTTP implementation of [`Platform`]
#[derive(Clone)]
pub struct PlatformClient {
    config: Arc<PlatformConfig>,
    http: Client,
    api_key: String,
    bearer: String,
}

impl PlatformClient {
    /// Client acting with the service-role key (falls back to the anon key)
    pub fn service(config: PlatformConfig) -> Result<Self> {
        let key = config
            .service_role_key
            .clone()
            .or_else(|| config.anon_key.clone())
            .ok_or_else(|| PlatformError::Auth("No platform API key configured".into()))?;
        Self::build(config, key.clone(), key)
    }

    /// Client acting as an anonymous visitor
    pub fn anon(config: PlatformConfig) -> Result<Self> {
        let key = config
            .anon_key
            .clone()
            .ok_or_else(|| PlatformError::Auth("PLATFORM_ANON_KEY is not configured".into()))?;
        Self::build(config, key.clone(), key)
    }

    fn build(config: PlatformConfig, api_key: String, bearer: String) -> Result<Self> {
        let http = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()?;

        Ok(Self {
            config: Arc::new(PlatformConfig {
                url: config.url.trim_end_matches('/').to_string(),
                ..config
            }),
            http,
            api_key,
            bearer,
        })
    }

    pub fn base_url(&self) -> &str {
        &self.config.url
    }

    fn rest_url(&self, segments: &[&str]) -> String {
        let path: Vec<_> = segments.iter().map(|s| urlencoding::encode(s)).collect();
        format!("{}/rest/v1/{}", self.config.url, path.join("/"))
    }

    fn request(&self, method: Method, url: &str) -> RequestBuilder {
        self.http
            .request(method, url)
            .header("apikey", &self.api_key)
            .header(header::AUTHORIZATION, format!("Bearer {}", self.bearer))
    }

    async fn check(response: Response) -> Result<Response> {
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }
        let body = response.text().await.unwrap_or_default();
        Err(PlatformError::from_body(status.as_u16(), &body))
    }

    /// Parse a representation response; empty bodies become no rows
    async fn rows(response: Response) -> Result<Vec<Value>> {
        let response = Self::check(response).await?;
        let text = response.text().await?;
        if text.trim().is_empty() {
            return Ok(Vec::new());
        }
        match serde_json::from_str::<Value>(&text)? {
            Value::Array(rows) => Ok(rows),
            Value::Null => Ok(Vec::new()),
            other => Ok(vec![other]),
        }
    }

    async fn table_write(
        &self,
        method: Method,
        table: &str,
        filters: &[Filter],
        prefer: &str,
        body: Option<Value>,
    ) -> Result<Vec<Value>> {
        let url = format!("{}?{}", self.rest_url(&[table]), encode_query("*", filters));
        debug!(table, %method, "platform table write");

        let mut request = self.request(method, &url).header("Prefer", prefer);
        if let Some(body) = body {
            request = request.json(&body);
        }
        Self::rows(request.send().await?).await
    }
}

/// Parse the total from a `Content-Range: 0-24/3573` header
pub(crate) fn parse_content_range_total(value: &str) -> Option<u64> {
    value.rsplit('/').next()?.trim().parse().ok()
}

#[async_trait]
impl Platform for PlatformClient {
    async fn rpc(&self, name: &str, params: Value) -> Result<Value> {
        let url = self.rest_url(&["rpc", name]);
        debug!(procedure = name, "platform rpc");

        let response = self.request(Method::POST, &url).json(&params).send().await?;
        let response = Self::check(response).await?;
        let text = response.text().await?;
        if text.trim().is_empty() {
            return Ok(Value::Null);
        }
        Ok(serde_json::from_str(&text)?)
    }

    async fn select(&self, table: &str, filters: &[Filter]) -> Result<Vec<Value>> {
        let url = format!("{}?{}", self.rest_url(&[table]), encode_query("*", filters));
        let response = self.request(Method::GET, &url).send().await?;
        Self::rows(response).await
    }

    async fn count(&self, table: &str, filters: &[Filter]) -> Result<u64> {
        let url = format!("{}?{}", self.rest_url(&[table]), encode_query("*", filters));
        let response = self
            .request(Method::HEAD, &url)
            .header("Prefer", "count=exact")
            .send()
            .await?;
        let response = Self::check(response).await?;

        response
            .headers()
            .get(header::CONTENT_RANGE)
            .and_then(|v| v.to_str().ok())
            .and_then(parse_content_range_total)
            .ok_or_else(|| PlatformError::InvalidResponse(format!("No row count for {}", table)))
    }

    async fn insert(&self, table: &str, rows: Value) -> Result<Vec<Value>> {
        self.table_write(Method::POST, table, &[], "return=representation", Some(rows))
            .await
    }

    async fn upsert(&self, table: &str, rows: Value, on_conflict: &str) -> Result<Vec<Value>> {
        let url = format!(
            "{}?{}",
            self.rest_url(&[table]),
            serde_urlencoded::to_string([("on_conflict", on_conflict)]).unwrap_or_default()
        );
        let response = self
            .request(Method::POST, &url)
            .header("Prefer", "resolution=merge-duplicates,return=representation")
            .json(&rows)
            .send()
            .await?;
        Self::rows(response).await
    }

    async fn update(&self, table: &str, filters: &[Filter], patch: Value) -> Result<Vec<Value>> {
        self.table_write(Method::PATCH, table, filters, "return=representation", Some(patch))
            .await
    }

    async fn delete(&self, table: &str, filters: &[Filter]) -> Result<Vec<Value>> {
        self.table_write(Method::DELETE, table, filters, "return=representation", None)
            .await
    }

    async fn sign_in(&self, email: &str, password: &str) -> Result<Session> {
        let url = format!("{}/auth/v1/token?grant_type=password", self.config.url);
        let response = self
            .request(Method::POST, &url)
            .json(&json!({ "email": email, "password": password }))
            .send()
            .await?;
        let response = Self::check(response).await?;
        Ok(response.json::<Session>().await?)
    }

    async fn create_user(&self, email: &str, password: &str) -> Result<AuthUser> {
        let url = format!("{}/auth/v1/admin/users", self.config.url);
        let response = self
            .request(Method::POST, &url)
            .json(&json!({
                "email": email,
                "password": password,
                "email_confirm": true,
            }))
            .send()
            .await?;
        let response = Self::check(response).await?;
        Ok(response.json::<AuthUser>().await?)
    }

    fn as_user(&self, access_token: &str) -> Arc<dyn Platform> {
        let api_key = self
            .config
            .anon_key
            .clone()
            .unwrap_or_else(|| self.api_key.clone());
        Arc::new(Self {
            config: Arc::clone(&self.config),
            http: self.http.clone(),
            api_key,
            bearer: access_token.to_string(),
        })
    }
}
