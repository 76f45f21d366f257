//! Image generation over the OpenAI-compatible images API.

use crate::{Endpoint, ModelCatalog};
use async_trait::async_trait;
use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use storybook_error::{OracleError, OracleErrorKind, StorybookResult};
use storybook_interface::{GeneratedImage, ImageOracle, ImageRequest};
use storybook_storage::{MediaStorage, MediaType};
use tracing::instrument;

/// Landscape 3:2, the picture-book page shape.
const GENERATION_SIZE: &str = "1536x1024";
/// The edits endpoint only accepts square output for reference images.
const EDIT_SIZE: &str = "1024x1024";

#[derive(Debug, Serialize)]
struct GenerationBody<'a> {
    model: &'a str,
    prompt: &'a str,
    n: u8,
    size: &'a str,
}

#[derive(Debug, Deserialize)]
struct ImagesResponse {
    #[serde(default)]
    data: Vec<ImageData>,
}

#[derive(Debug, Deserialize)]
struct ImageData {
    #[serde(default)]
    b64_json: Option<String>,
    #[serde(default)]
    url: Option<String>,
}

/// [`ImageOracle`] that calls an images endpoint and stores the result
/// through a [`MediaStorage`].
#[derive(Clone)]
pub struct ImageGenerationClient {
    client: reqwest::Client,
    catalog: ModelCatalog,
    endpoint: Endpoint,
    storage: Arc<dyn MediaStorage>,
}

impl std::fmt::Debug for ImageGenerationClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ImageGenerationClient")
            .field("endpoint", &self.endpoint.base_url)
            .finish()
    }
}

impl ImageGenerationClient {
    /// Create a client writing into `storage`.
    pub fn new(endpoint: Endpoint, catalog: ModelCatalog, storage: Arc<dyn MediaStorage>) -> Self {
        Self {
            client: reqwest::Client::new(),
            catalog,
            endpoint,
            storage,
        }
    }

    async fn check(response: reqwest::Response) -> Result<reqwest::Response, OracleError> {
        if response.status().is_success() {
            return Ok(response);
        }
        let status = response.status();
        let body = response.text().await.unwrap_or_default();
        tracing::error!(status = %status, body = %body, "Image provider returned error");
        Err(OracleError::new(OracleErrorKind::Api {
            status: status.as_u16(),
            message: body,
        }))
    }

    async fn download(&self, url: &str) -> Result<Vec<u8>, OracleError> {
        let response = self.client.get(url).send().await.map_err(|e| {
            OracleError::new(OracleErrorKind::Http(format!("fetching {}: {}", url, e)))
        })?;
        let response = Self::check(response).await?;
        let bytes = response
            .bytes()
            .await
            .map_err(|e| OracleError::new(OracleErrorKind::Http(e.to_string())))?;
        Ok(bytes.to_vec())
    }

    #[instrument(skip(self, prompt))]
    async fn generate(&self, model_id: &str, prompt: &str) -> Result<ImagesResponse, OracleError> {
        let body = GenerationBody {
            model: model_id,
            prompt,
            n: 1,
            size: GENERATION_SIZE,
        };
        let response = self
            .endpoint
            .authorize(self.client.post(self.endpoint.url("/images/generations")).json(&body))
            .send()
            .await
            .map_err(|e| OracleError::new(OracleErrorKind::Http(e.to_string())))?;
        Self::check(response)
            .await?
            .json()
            .await
            .map_err(|e| OracleError::new(OracleErrorKind::Deserialization(e.to_string())))
    }

    #[instrument(skip(self, prompt, reference))]
    async fn edit(
        &self,
        model_id: &str,
        prompt: &str,
        reference: Vec<u8>,
    ) -> Result<ImagesResponse, OracleError> {
        let image = reqwest::multipart::Part::bytes(reference)
            .file_name("reference.png")
            .mime_str(MediaType::Png.mime_type())
            .map_err(|e| OracleError::new(OracleErrorKind::Http(e.to_string())))?;
        let form = reqwest::multipart::Form::new()
            .text("model", model_id.to_string())
            .text("prompt", prompt.to_string())
            .text("n", "1")
            .text("size", EDIT_SIZE)
            .part("image", image);
        let response = self
            .endpoint
            .authorize(self.client.post(self.endpoint.url("/images/edits")).multipart(form))
            .send()
            .await
            .map_err(|e| OracleError::new(OracleErrorKind::Http(e.to_string())))?;
        Self::check(response)
            .await?
            .json()
            .await
            .map_err(|e| OracleError::new(OracleErrorKind::Deserialization(e.to_string())))
    }
}

#[async_trait]
impl ImageOracle for ImageGenerationClient {
    #[instrument(skip(self, request), fields(path = %request.storage_path, model = %request.model.model))]
    async fn generate_image(&self, request: ImageRequest) -> StorybookResult<GeneratedImage> {
        let model_id = self.catalog.resolve(&request.model)?;

        let response = match &request.reference_image_url {
            Some(reference_url) => {
                let reference = self.download(reference_url).await?;
                tracing::debug!(bytes = reference.len(), "Using reference image");
                self.edit(model_id, &request.prompt, reference).await?
            }
            None => self.generate(model_id, &request.prompt).await?,
        };

        let data = response.data.into_iter().next().ok_or_else(|| {
            OracleError::new(OracleErrorKind::EmptyResponse("image generation".to_string()))
        })?;
        let bytes = match (data.b64_json, data.url) {
            (Some(encoded), _) => STANDARD.decode(encoded.as_bytes()).map_err(|e| {
                OracleError::new(OracleErrorKind::Deserialization(format!(
                    "image payload is not base64: {}",
                    e
                )))
            })?,
            (None, Some(url)) => self.download(&url).await?,
            (None, None) => {
                return Err(OracleError::new(OracleErrorKind::EmptyResponse(
                    "image generation".to_string(),
                ))
                .into());
            }
        };

        let stored = self
            .storage
            .put(&request.storage_path, &bytes, MediaType::Png)
            .await?;
        tracing::info!(url = %stored.url, size = stored.size_bytes, "Stored generated image");
        Ok(GeneratedImage {
            url: stored.url,
            storage_path: stored.path,
            file_size_bytes: stored.size_bytes,
            mime_type: stored.mime_type,
        })
    }
}
