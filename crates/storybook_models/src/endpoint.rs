//! Provider endpoints.

use reqwest::RequestBuilder;
use serde::{Deserialize, Serialize};

/// Base URL and credentials of one OpenAI-compatible provider endpoint.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Endpoint {
    /// Base URL without trailing slash, e.g. `https://api.openai.com/v1`
    pub base_url: String,
    /// Bearer token, if the endpoint requires one
    #[serde(default)]
    pub api_key: Option<String>,
}

impl Endpoint {
    /// Create an endpoint.
    pub fn new(base_url: impl Into<String>, api_key: Option<impl Into<String>>) -> Self {
        Self {
            base_url: base_url.into().trim_end_matches('/').to_string(),
            api_key: api_key.map(Into::into),
        }
    }

    /// Full URL for an API path such as `"/chat/completions"`.
    pub fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    /// Attach the bearer header when a key is configured.
    pub(crate) fn authorize(&self, request: RequestBuilder) -> RequestBuilder {
        match &self.api_key {
            Some(key) => request.header("Authorization", format!("Bearer {}", key)),
            None => request,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_trailing_slash_trimmed() {
        let endpoint = Endpoint::new("http://localhost:8080/v1/", None::<String>);
        assert_eq!(endpoint.url("/chat/completions"), "http://localhost:8080/v1/chat/completions");
    }
}
