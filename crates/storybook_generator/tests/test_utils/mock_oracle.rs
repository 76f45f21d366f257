//! Scripted oracles and a recording usage ledger.

use async_trait::async_trait;
use serde_json::Value;
use std::collections::{HashMap, HashSet, VecDeque};
use std::sync::{Arc, Mutex};
use storybook_core::{ModelChoice, TokenUsage};
use storybook_error::{DatabaseError, DatabaseErrorKind, OracleError, OracleErrorKind, StorybookResult};
use storybook_interface::{
    GeneratedImage, ImageOracle, ImageRequest, StoryOracle, StructuredRequest, StructuredResponse,
    TextResponse, UsageLedger,
};

/// A single scripted reply.
#[derive(Debug, Clone)]
pub enum MockResponse {
    /// Structured JSON reply
    Json(Value),
    /// Free-text reply
    Text(String),
    /// Provider failure
    Error(OracleErrorKind),
}

/// One call the oracle received.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecordedCall {
    /// Schema name for structured calls, `None` for text
    pub schema: Option<String>,
    /// Model the call was routed to
    pub model: ModelChoice,
    /// Rendered prompt
    pub prompt: String,
}

/// Oracle that replays queued responses.
///
/// Structured replies are queued per schema name, text replies in one
/// queue. Every call is recorded. An exhausted queue is an oracle error.
#[derive(Debug, Clone)]
pub struct MockOracle {
    structured: Arc<Mutex<HashMap<String, VecDeque<MockResponse>>>>,
    text: Arc<Mutex<VecDeque<MockResponse>>>,
    calls: Arc<Mutex<Vec<RecordedCall>>>,
    usage: TokenUsage,
}

impl Default for MockOracle {
    fn default() -> Self {
        Self::new()
    }
}

impl MockOracle {
    /// Create an oracle with nothing queued, billing 10 + 5 tokens per call.
    pub fn new() -> Self {
        Self {
            structured: Arc::new(Mutex::new(HashMap::new())),
            text: Arc::new(Mutex::new(VecDeque::new())),
            calls: Arc::new(Mutex::new(Vec::new())),
            usage: TokenUsage::new(10, 5),
        }
    }

    /// Report `usage` for every call.
    #[allow(dead_code)]
    pub fn with_usage(mut self, usage: TokenUsage) -> Self {
        self.usage = usage;
        self
    }

    /// Queue a structured reply for `schema`.
    pub fn with_structured(self, schema: &str, value: Value) -> Self {
        self.push_structured(schema, MockResponse::Json(value));
        self
    }

    /// Queue a structured failure for `schema`.
    #[allow(dead_code)]
    pub fn with_structured_error(self, schema: &str, error: OracleErrorKind) -> Self {
        self.push_structured(schema, MockResponse::Error(error));
        self
    }

    /// Queue a text reply.
    #[allow(dead_code)]
    pub fn with_text(self, text: impl Into<String>) -> Self {
        self.text
            .lock()
            .unwrap()
            .push_back(MockResponse::Text(text.into()));
        self
    }

    fn push_structured(&self, schema: &str, response: MockResponse) {
        self.structured
            .lock()
            .unwrap()
            .entry(schema.to_string())
            .or_default()
            .push_back(response);
    }

    /// Every call received, in order.
    pub fn calls(&self) -> Vec<RecordedCall> {
        self.calls.lock().unwrap().clone()
    }

    /// Number of calls received.
    #[allow(dead_code)]
    pub fn call_count(&self) -> usize {
        self.calls.lock().unwrap().len()
    }

    /// Prompts sent for `schema`, in order.
    #[allow(dead_code)]
    pub fn prompts_for(&self, schema: &str) -> Vec<String> {
        self.calls()
            .into_iter()
            .filter(|call| call.schema.as_deref() == Some(schema))
            .map(|call| call.prompt)
            .collect()
    }

    fn record(&self, schema: Option<&str>, model: &ModelChoice, prompt: &str) {
        self.calls.lock().unwrap().push(RecordedCall {
            schema: schema.map(str::to_string),
            model: model.clone(),
            prompt: prompt.to_string(),
        });
    }
}

fn exhausted(what: &str) -> OracleError {
    OracleError::new(OracleErrorKind::EmptyResponse(format!("no scripted reply for {}", what)))
}

#[async_trait]
impl StoryOracle for MockOracle {
    async fn generate_structured(
        &self,
        request: StructuredRequest,
    ) -> StorybookResult<StructuredResponse> {
        self.record(Some(&request.schema_name), &request.model, &request.prompt);
        let next = self
            .structured
            .lock()
            .unwrap()
            .get_mut(&request.schema_name)
            .and_then(VecDeque::pop_front);
        match next {
            Some(MockResponse::Json(value)) => Ok(StructuredResponse {
                value,
                usage: self.usage,
            }),
            Some(MockResponse::Error(kind)) => Err(OracleError::new(kind).into()),
            Some(MockResponse::Text(_)) | None => Err(exhausted(&request.schema_name).into()),
        }
    }

    async fn generate_text(
        &self,
        model: &ModelChoice,
        prompt: &str,
    ) -> StorybookResult<TextResponse> {
        self.record(None, model, prompt);
        let next = self.text.lock().unwrap().pop_front();
        match next {
            Some(MockResponse::Text(text)) => Ok(TextResponse {
                text,
                usage: self.usage,
            }),
            Some(MockResponse::Error(kind)) => Err(OracleError::new(kind).into()),
            Some(MockResponse::Json(_)) | None => Err(exhausted("text").into()),
        }
    }
}

/// Image oracle that pretends to store a PNG per request.
#[derive(Debug, Clone, Default)]
pub struct MockImages {
    requests: Arc<Mutex<Vec<ImageRequest>>>,
    failing_paths: HashSet<String>,
}

impl MockImages {
    /// Create an image oracle that always succeeds.
    #[allow(dead_code)]
    pub fn new() -> Self {
        Self::default()
    }

    /// Fail requests for `storage_path`.
    #[allow(dead_code)]
    pub fn failing_on(mut self, storage_path: impl Into<String>) -> Self {
        self.failing_paths.insert(storage_path.into());
        self
    }

    /// Requests received, in order.
    #[allow(dead_code)]
    pub fn requests(&self) -> Vec<ImageRequest> {
        self.requests.lock().unwrap().clone()
    }
}

#[async_trait]
impl ImageOracle for MockImages {
    async fn generate_image(&self, request: ImageRequest) -> StorybookResult<GeneratedImage> {
        self.requests.lock().unwrap().push(request.clone());
        if self.failing_paths.contains(&request.storage_path) {
            return Err(OracleError::new(OracleErrorKind::Api {
                status: 500,
                message: "image backend down".to_string(),
            })
            .into());
        }
        Ok(GeneratedImage {
            url: format!("http://cdn.test/media/{}.png", request.storage_path),
            storage_path: format!("{}.png", request.storage_path),
            file_size_bytes: 4,
            mime_type: "image/png".to_string(),
        })
    }
}

/// Usage ledger that records every write.
#[derive(Debug, Clone, Default)]
pub struct RecordingUsage {
    writes: Arc<Mutex<Vec<(String, i64)>>>,
    failing: bool,
}

impl RecordingUsage {
    /// Create a ledger that accepts writes.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a ledger whose writes always fail.
    #[allow(dead_code)]
    pub fn failing() -> Self {
        Self {
            failing: true,
            ..Self::default()
        }
    }

    /// Writes received, as `(user_id, tokens)`.
    pub fn writes(&self) -> Vec<(String, i64)> {
        self.writes.lock().unwrap().clone()
    }
}

#[async_trait]
impl UsageLedger for RecordingUsage {
    async fn increment_credits_used(&self, user_id: &str, tokens: i64) -> StorybookResult<()> {
        self.writes.lock().unwrap().push((user_id.to_string(), tokens));
        if self.failing {
            return Err(DatabaseError::new(DatabaseErrorKind::Connection(
                "ledger offline".to_string(),
            ))
            .into());
        }
        Ok(())
    }
}
