//! HTTP implementation of the backend against a PostgREST-style interface.

use async_trait::async_trait;
use reqwest::header::CONTENT_RANGE;
use reqwest::{Client, Method, RequestBuilder, Response, Url};
use serde::Deserialize;
use serde_json::Value;

use super::query::filter_params;
use super::{Backend, BackendError, Filter, Query, Selection};

/// Error body returned by the store on rejected requests.
#[derive(Debug, Deserialize)]
struct StoreErrorBody {
    message: String,
}

/// Backend talking to `{url}/rest/v1` and `{url}/functions/v1` with an
/// anonymous API key.
#[derive(Debug, Clone)]
pub struct PostgrestBackend {
    http: Client,
    base_url: Url,
    api_key: String,
}

impl PostgrestBackend {
    /// Creates a client for the backend rooted at `base_url`.
    ///
    /// # Errors
    ///
    /// Returns [`BackendError::Transport`] if `base_url` is not a valid URL.
    pub fn new(base_url: &str, api_key: impl Into<String>) -> Result<Self, BackendError> {
        let mut normalized = base_url.trim().to_string();
        if !normalized.ends_with('/') {
            normalized.push('/');
        }
        let base_url = Url::parse(&normalized)
            .map_err(|e| BackendError::Transport(format!("invalid backend url: {e}")))?;
        Ok(Self {
            http: Client::new(),
            base_url,
            api_key: api_key.into(),
        })
    }

    /// Builds `{base}/{path}?{params}`.
    fn endpoint(&self, path: &str, params: &[(String, String)]) -> Result<Url, BackendError> {
        let mut url = self
            .base_url
            .join(path)
            .map_err(|e| BackendError::Transport(format!("invalid endpoint {path}: {e}")))?;
        if !params.is_empty() {
            url.query_pairs_mut()
                .extend_pairs(params.iter().map(|(k, v)| (k.as_str(), v.as_str())));
        }
        Ok(url)
    }

    fn request(&self, method: Method, url: Url) -> RequestBuilder {
        self.http
            .request(method, url)
            .header("apikey", &self.api_key)
            .bearer_auth(&self.api_key)
    }

    async fn send(builder: RequestBuilder) -> Result<Response, BackendError> {
        let response = builder
            .send()
            .await
            .map_err(|e| BackendError::Transport(e.to_string()))?;
        if response.status().is_success() {
            return Ok(response);
        }
        let status = response.status();
        let text = response.text().await.unwrap_or_default();
        let message = serde_json::from_str::<StoreErrorBody>(&text)
            .map(|body| body.message)
            .unwrap_or_else(|_| {
                if text.trim().is_empty() {
                    status
                        .canonical_reason()
                        .unwrap_or("request rejected")
                        .to_string()
                } else {
                    text
                }
            });
        tracing::warn!(status = status.as_u16(), %message, "backend rejected request");
        Err(BackendError::Rejected {
            status: status.as_u16(),
            message,
        })
    }

    async fn rows(response: Response) -> Result<Vec<Value>, BackendError> {
        response
            .json::<Vec<Value>>()
            .await
            .map_err(|e| BackendError::Decode(e.to_string()))
    }
}

/// Extracts the total from a `Content-Range` header (`0-19/42`, `*/42`).
fn parse_total(content_range: Option<&str>) -> Option<u64> {
    content_range
        .and_then(|v| v.split_once('/'))
        .and_then(|(_, total)| total.trim().parse().ok())
}

#[async_trait]
impl Backend for PostgrestBackend {
    async fn select(&self, query: &Query) -> Result<Selection, BackendError> {
        let url = self.endpoint(&format!("rest/v1/{}", query.table), &query.params())?;
        let method = if query.head { Method::HEAD } else { Method::GET };
        let mut builder = self.request(method, url);
        if query.count {
            builder = builder.header("Prefer", "count=exact");
        }

        let response = Self::send(builder).await?;
        let total = parse_total(
            response
                .headers()
                .get(CONTENT_RANGE)
                .and_then(|v| v.to_str().ok()),
        )
        .filter(|_| query.count);

        let rows = if query.head {
            Vec::new()
        } else {
            Self::rows(response).await?
        };
        Ok(Selection { rows, total })
    }

    async fn insert(&self, table: &str, row: &Value) -> Result<Value, BackendError> {
        let url = self.endpoint(&format!("rest/v1/{table}"), &[])?;
        let builder = self
            .request(Method::POST, url)
            .header("Prefer", "return=representation")
            .json(row);
        let response = Self::send(builder).await?;
        Self::rows(response)
            .await?
            .into_iter()
            .next()
            .ok_or_else(|| BackendError::Decode("insert returned no row".to_string()))
    }

    async fn update(
        &self,
        table: &str,
        filters: &[Filter],
        patch: &Value,
    ) -> Result<u64, BackendError> {
        let url = self.endpoint(&format!("rest/v1/{table}"), &filter_params(filters))?;
        let builder = self
            .request(Method::PATCH, url)
            .header("Prefer", "return=representation")
            .json(patch);
        let response = Self::send(builder).await?;
        Ok(Self::rows(response).await?.len() as u64)
    }

    async fn delete(&self, table: &str, filters: &[Filter]) -> Result<u64, BackendError> {
        let url = self.endpoint(&format!("rest/v1/{table}"), &filter_params(filters))?;
        let builder = self
            .request(Method::DELETE, url)
            .header("Prefer", "return=representation");
        let response = Self::send(builder).await?;
        Ok(Self::rows(response).await?.len() as u64)
    }

    async fn invoke(
        &self,
        function: &str,
        params: &[(String, String)],
        body: &Value,
    ) -> Result<(), BackendError> {
        let url = self.endpoint(&format!("functions/v1/{function}"), params)?;
        let response = self
            .request(Method::POST, url)
            .json(body)
            .send()
            .await
            .map_err(|e| BackendError::Transport(e.to_string()))?;
        let status = response.status();
        if !status.is_success() {
            tracing::warn!(function, status = status.as_u16(), "remote function failed");
            return Err(BackendError::Function {
                name: function.to_string(),
                status: status.as_u16(),
            });
        }
        Ok(())
    }
}
