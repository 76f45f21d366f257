//! Shared fakes and request helpers for the HTTP tests.

use async_trait::async_trait;
use axum::Router;
use axum::body::{Body, to_bytes};
use axum::http::{Request, StatusCode};
use serde_json::{Map, Value, json};
use std::collections::{HashMap, VecDeque};
use std::sync::{Arc, Mutex};
use storybook_core::{ModelChoice, TokenUsage};
use storybook_database::InMemoryStoryStore;
use storybook_error::{
    AuthError, AuthErrorKind, OracleError, OracleErrorKind, StorybookResult,
};
use storybook_generator::{Services, StageModels};
use storybook_interface::{
    Audience, Claims, GeneratedImage, ImageOracle, ImageRequest, StoryOracle, StoryStore,
    StructuredRequest, StructuredResponse, TextResponse, TokenVerifier, UsageLedger,
};
use storybook_server::{AppState, router};
use tower::ServiceExt;

/// Accepts `token-<user>` and nothing else.
#[derive(Debug, Clone, Default)]
pub struct StaticVerifier;

#[async_trait]
impl TokenVerifier for StaticVerifier {
    async fn verify(&self, token: &str) -> StorybookResult<Claims> {
        let sub = token
            .strip_prefix("token-")
            .ok_or_else(|| AuthError::new(AuthErrorKind::InvalidToken("unknown token".to_string())))?;
        Ok(Claims {
            sub: sub.to_string(),
            iss: "https://clerk.test".to_string(),
            aud: Audience::One("storybook".to_string()),
            exp: i64::MAX,
            extra: Map::new(),
        })
    }
}

/// Oracle replaying structured replies queued per schema name, and text
/// replies in order.
#[derive(Debug, Clone, Default)]
pub struct ScriptedOracle {
    structured: Arc<Mutex<HashMap<String, VecDeque<Value>>>>,
    text: Arc<Mutex<VecDeque<String>>>,
    calls: Arc<Mutex<usize>>,
}

impl ScriptedOracle {
    /// Queue a structured reply for `schema`.
    pub fn with_structured(self, schema: &str, value: Value) -> Self {
        self.structured
            .lock()
            .unwrap()
            .entry(schema.to_string())
            .or_default()
            .push_back(value);
        self
    }

    /// Queue a text reply.
    #[allow(dead_code)]
    pub fn with_text(self, text: &str) -> Self {
        self.text.lock().unwrap().push_back(text.to_string());
        self
    }

    /// Calls received so far.
    #[allow(dead_code)]
    pub fn call_count(&self) -> usize {
        *self.calls.lock().unwrap()
    }
}

fn exhausted(what: &str) -> OracleError {
    OracleError::new(OracleErrorKind::EmptyResponse(format!("no scripted reply for {}", what)))
}

#[async_trait]
impl StoryOracle for ScriptedOracle {
    async fn generate_structured(
        &self,
        request: StructuredRequest,
    ) -> StorybookResult<StructuredResponse> {
        *self.calls.lock().unwrap() += 1;
        let value = self
            .structured
            .lock()
            .unwrap()
            .get_mut(&request.schema_name)
            .and_then(VecDeque::pop_front)
            .ok_or_else(|| exhausted(&request.schema_name))?;
        Ok(StructuredResponse {
            value,
            usage: TokenUsage::new(10, 5),
        })
    }

    async fn generate_text(
        &self,
        _model: &ModelChoice,
        _prompt: &str,
    ) -> StorybookResult<TextResponse> {
        *self.calls.lock().unwrap() += 1;
        let text = self
            .text
            .lock()
            .unwrap()
            .pop_front()
            .ok_or_else(|| exhausted("text"))?;
        Ok(TextResponse {
            text,
            usage: TokenUsage::new(10, 5),
        })
    }
}

/// Image oracle returning a fixed CDN URL per storage path.
#[derive(Debug, Clone, Default)]
pub struct FixedImages;

#[async_trait]
impl ImageOracle for FixedImages {
    async fn generate_image(&self, request: ImageRequest) -> StorybookResult<GeneratedImage> {
        Ok(GeneratedImage {
            url: format!("http://cdn.test/{}.png", request.storage_path),
            storage_path: format!("{}.png", request.storage_path),
            file_size_bytes: 4,
            mime_type: "image/png".to_string(),
        })
    }
}

/// Router over an in-memory store and the given oracle.
pub fn app(store: &InMemoryStoryStore, oracle: &ScriptedOracle) -> Router {
    let shared: Arc<dyn StoryStore> = Arc::new(store.clone());
    let ledger: Arc<dyn UsageLedger> = Arc::new(store.clone());
    let services = Services::new(
        shared,
        ledger,
        Arc::new(oracle.clone()),
        Arc::new(FixedImages),
        StageModels::default(),
    );
    router(AppState::new(services, Arc::new(StaticVerifier)))
}

/// Send a request as `user` (or anonymously) and return status and JSON body.
pub async fn send(
    app: &Router,
    method: &str,
    uri: &str,
    user: Option<&str>,
    body: Option<Value>,
) -> (StatusCode, Value) {
    let mut builder = Request::builder().method(method).uri(uri);
    if let Some(user) = user {
        builder = builder.header("authorization", format!("Bearer token-{}", user));
    }
    let request = match body {
        Some(body) => builder
            .header("content-type", "application/json")
            .body(Body::from(body.to_string()))
            .unwrap(),
        None => builder.body(Body::empty()).unwrap(),
    };

    let response = app.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    let value = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap()
    };
    (status, value)
}

/// A fourteen-spread script body.
pub fn script_json(storybook_id: &str, user_id: &str) -> Value {
    let spreads: Vec<Value> = (1..=14)
        .map(|n| {
            json!({
                "spread_number": n,
                "script_1": format!("Spread {} left.", n),
                "script_2": format!("Spread {} right.", n),
            })
        })
        .collect();
    json!({ "storybook_id": storybook_id, "user_id": user_id, "spreads": spreads })
}

/// A bible with a single character.
pub fn bible_json() -> Value {
    json!({
        "characters": [{
            "character_name": "Ember",
            "description": "A shy dragon",
            "visual_features": "Small red dragon with golden eyes"
        }],
        "name": "Ember Hollow",
        "time_period": "Once upon a time",
        "location_type": "volcanic valley",
        "description": "A warm valley of glowing stones",
        "world_rules": "Dragons can talk",
        "main_theme": "friendship",
        "main_conflict": "Ember is too shy to say hello",
        "conflict_resolution": "Ember shares a warm stone"
    })
}

/// A valid arc.
pub fn arc_json() -> Value {
    let spreads: Vec<Value> = (1..=14)
        .map(|n| {
            let act = if n <= 4 { 1 } else if n <= 11 { 2 } else { 3 };
            json!({ "spread_number": n, "act_number": act, "description": format!("beat {}", n) })
        })
        .collect();
    json!({
        "acts": [
            { "act_number": 1, "act_name": "Setup", "description": "Ember hides", "start_spread": 1, "end_spread": 4 },
            { "act_number": 2, "act_name": "Trouble", "description": "Ember tries", "start_spread": 5, "end_spread": 11 },
            { "act_number": 3, "act_name": "Home", "description": "Ember belongs", "start_spread": 12, "end_spread": 14 }
        ],
        "spreads": spreads
    })
}
