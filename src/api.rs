//! Client for the layer/annotation REST API.
//!
//! The reader talks to the backend only through [`Backend`], so the view-model
//! can be driven against the real server ([`HttpBackend`]) or an in-memory
//! stand-in in tests.

use std::time::Duration;

use log::debug;
use reqwest::header::{HeaderMap, HeaderValue, COOKIE};
use serde::de::DeserializeOwned;
use url::Url;

use crate::error::ReaderError;
use crate::models::{
    Annotation, ApiErrorBody, ExplainRequest, Explanation, Group, Layer, LayerSummary,
    NewAnnotation, NewLayer,
};
use crate::REQUEST_TIMEOUT_SECS;

// ============================================================================
// Backend Interface
// ============================================================================

/// Operations the reader needs from the annotation server.
///
/// Futures are not required to be `Send`: the reader drives them from a single
/// event sequence.
#[allow(async_fn_in_trait)]
pub trait Backend {
    async fn list_layers(&self, ebook_id: i64) -> Result<Vec<Layer>, ReaderError>;
    async fn list_annotations(&self, layer_id: i64) -> Result<Vec<Annotation>, ReaderError>;
    async fn create_annotation(&self, payload: &NewAnnotation) -> Result<Annotation, ReaderError>;
    async fn delete_annotation(&self, annotation_id: i64) -> Result<(), ReaderError>;
    async fn list_groups(&self) -> Result<Vec<Group>, ReaderError>;
    async fn create_layer(&self, payload: &NewLayer) -> Result<Layer, ReaderError>;
    async fn explain(&self, request: &ExplainRequest) -> Result<Explanation, ReaderError>;
    async fn summarize_layer(&self, layer_id: i64) -> Result<LayerSummary, ReaderError>;
}

// ============================================================================
// HTTP Implementation
// ============================================================================

#[derive(Clone)]
pub struct HttpBackend {
    client: reqwest::Client,
    base: Url,
}

impl HttpBackend {
    /// Build a client rooted at `base`. `session_cookie` is sent verbatim as the
    /// `Cookie` header, since every endpoint requires a logged-in session.
    pub fn new(base: Url, session_cookie: Option<&str>) -> Result<Self, ReaderError> {
        let mut headers = HeaderMap::new();
        if let Some(cookie) = session_cookie {
            let value = HeaderValue::from_str(cookie)
                .map_err(|e| ReaderError::Config(format!("Invalid session cookie: {}", e)))?;
            headers.insert(COOKIE, value);
        }

        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(REQUEST_TIMEOUT_SECS))
            .default_headers(headers)
            .build()
            .map_err(|e| ReaderError::Config(format!("Cannot build HTTP client: {}", e)))?;

        Ok(Self {
            client,
            base: with_trailing_slash(base),
        })
    }

    pub fn base_url(&self) -> &Url {
        &self.base
    }

    fn endpoint(&self, path: &str) -> Result<Url, ReaderError> {
        self.base
            .join(path.trim_start_matches('/'))
            .map_err(|e| ReaderError::Config(format!("Bad endpoint {}: {}", path, e)))
    }

    async fn get_json<T: DeserializeOwned>(&self, path: &str) -> Result<T, ReaderError> {
        let url = self.endpoint(path)?;
        debug!("GET {}", url);
        let response = self.client.get(url).send().await?;
        read_json(response).await
    }

    async fn post_json<B, T>(&self, path: &str, body: &B) -> Result<T, ReaderError>
    where
        B: serde::Serialize + ?Sized,
        T: DeserializeOwned,
    {
        let url = self.endpoint(path)?;
        debug!("POST {}", url);
        let response = self.client.post(url).json(body).send().await?;
        read_json(response).await
    }
}

impl Backend for HttpBackend {
    async fn list_layers(&self, ebook_id: i64) -> Result<Vec<Layer>, ReaderError> {
        self.get_json(&format!("/api/book/{}/layers", ebook_id)).await
    }

    async fn list_annotations(&self, layer_id: i64) -> Result<Vec<Annotation>, ReaderError> {
        self.get_json(&format!("/api/layer/{}/annotations", layer_id))
            .await
    }

    async fn create_annotation(&self, payload: &NewAnnotation) -> Result<Annotation, ReaderError> {
        self.post_json("/api/annotation/new", payload).await
    }

    async fn delete_annotation(&self, annotation_id: i64) -> Result<(), ReaderError> {
        let url = self.endpoint(&format!("/api/annotation/{}/delete", annotation_id))?;
        debug!("POST {}", url);
        let response = self.client.post(url).send().await?;
        let status = response.status();
        if status.is_success() {
            Ok(())
        } else {
            Err(api_error(status, response).await)
        }
    }

    async fn list_groups(&self) -> Result<Vec<Group>, ReaderError> {
        self.get_json("/api/user/groups").await
    }

    async fn create_layer(&self, payload: &NewLayer) -> Result<Layer, ReaderError> {
        self.post_json("/api/layer/new", payload).await
    }

    async fn explain(&self, request: &ExplainRequest) -> Result<Explanation, ReaderError> {
        self.post_json("/api/ai/explain", request).await
    }

    async fn summarize_layer(&self, layer_id: i64) -> Result<LayerSummary, ReaderError> {
        self.get_json(&format!("/api/layer/{}/summarize", layer_id))
            .await
    }
}

// ============================================================================
// Response Handling
// ============================================================================

async fn read_json<T: DeserializeOwned>(response: reqwest::Response) -> Result<T, ReaderError> {
    let status = response.status();
    if !status.is_success() {
        return Err(api_error(status, response).await);
    }
    let text = response.text().await?;
    serde_json::from_str(&text).map_err(|e| ReaderError::Decode(e.to_string()))
}

/// Turn a non-success response into an error, preferring the server's
/// `{"error": ...}` message over the bare status text.
async fn api_error(status: reqwest::StatusCode, response: reqwest::Response) -> ReaderError {
    let text = response.text().await.unwrap_or_default();
    let message = serde_json::from_str::<ApiErrorBody>(&text)
        .map(|body| body.error)
        .unwrap_or_else(|_| status.canonical_reason().unwrap_or("error").to_string());
    ReaderError::Api {
        status: status.as_u16(),
        message,
    }
}

fn with_trailing_slash(mut url: Url) -> Url {
    if !url.path().ends_with('/') {
        let path = format!("{}/", url.path());
        url.set_path(&path);
    }
    url
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_endpoint_keeps_base_path() {
        let base = Url::parse("https://reader.example.com/app").unwrap();
        let backend = HttpBackend::new(base, None).unwrap();
        assert_eq!(backend.base_url().as_str(), "https://reader.example.com/app/");
        assert_eq!(
            backend.endpoint("/api/user/groups").unwrap().as_str(),
            "https://reader.example.com/app/api/user/groups"
        );
    }

    #[test]
    fn test_rejects_unprintable_cookie() {
        let base = Url::parse("https://reader.example.com/").unwrap();
        let result = HttpBackend::new(base, Some("session=abc\n"));
        assert!(matches!(result, Err(ReaderError::Config(_))));
    }
}
