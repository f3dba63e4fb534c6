//! Shared outbound HTTP plumbing for provider clients.
//!
//! Thin wrapper over `reqwest` that returns parsed JSON or a
//! [`ProviderError`]. Status mapping is uniform across providers: 401
//! becomes `Unauthorized`, any other non-2xx becomes `Upstream`.

use serde_json::Value;

use crate::providers::trait_::ProviderError;

/// JSON API client bound to one provider's base URL.
#[derive(Debug, Clone)]
pub struct ApiClient {
    http: reqwest::Client,
    base_url: String,
}

impl ApiClient {
    pub fn new<S: Into<String>>(base_url: S) -> Self {
        Self {
            http: reqwest::Client::new(),
            base_url: base_url.into().trim_end_matches('/').to_string(),
        }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn url(&self, path: &str) -> String {
        format!("{}/{}", self.base_url, path.trim_start_matches('/'))
    }

    pub async fn get(
        &self,
        path: &str,
        bearer: &str,
        query: &[(&str, String)],
    ) -> Result<Value, ProviderError> {
        let request = self
            .http
            .get(self.url(path))
            .bearer_auth(bearer)
            .query(query);
        Self::execute(request).await
    }

    pub async fn post_json(
        &self,
        path: &str,
        bearer: &str,
        body: &Value,
    ) -> Result<Value, ProviderError> {
        let request = self
            .http
            .post(self.url(path))
            .bearer_auth(bearer)
            .json(body);
        Self::execute(request).await
    }

    pub async fn put_json(
        &self,
        path: &str,
        bearer: &str,
        body: &Value,
    ) -> Result<Value, ProviderError> {
        let request = self
            .http
            .put(self.url(path))
            .bearer_auth(bearer)
            .json(body);
        Self::execute(request).await
    }

    /// Form-encoded POST against an absolute URL (token endpoints live on
    /// a different host than the API base), with an optional raw
    /// `Authorization` header value.
    pub async fn post_form(
        &self,
        url: &str,
        authorization: Option<&str>,
        form: &[(&str, &str)],
    ) -> Result<Value, ProviderError> {
        let mut request = self.http.post(url).form(form);
        if let Some(value) = authorization {
            request = request.header(reqwest::header::AUTHORIZATION, value);
        }
        Self::execute(request).await
    }

    async fn execute(request: reqwest::RequestBuilder) -> Result<Value, ProviderError> {
        let response = request.send().await.map_err(|e| ProviderError::Transport {
            detail: e.to_string(),
        })?;

        let status = response.status();
        if status == reqwest::StatusCode::UNAUTHORIZED {
            return Err(ProviderError::Unauthorized);
        }
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(ProviderError::Upstream {
                status: status.as_u16(),
                body,
            });
        }

        // Some mutation endpoints answer 200 with an empty body
        let text = response.text().await.map_err(|e| ProviderError::Transport {
            detail: e.to_string(),
        })?;
        if text.trim().is_empty() {
            return Ok(Value::Null);
        }
        serde_json::from_str(&text)
            .map_err(|e| ProviderError::invalid_response(format!("response is not JSON: {e}")))
    }
}

/// Deserialize a JSON value into a typed provider shape, mapping the serde
/// failure into `InvalidResponse` with the validation detail.
pub fn parse_shape<T: serde::de::DeserializeOwned>(value: Value) -> Result<T, ProviderError> {
    serde_json::from_value(value).map_err(|e| ProviderError::invalid_response(e.to_string()))
}
