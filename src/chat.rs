//! Chat relay: forwards a question to a hosted generative-text model and
//! returns its answer. Failures are not retried; they propagate to the
//! caller and fail that request only.

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::{sync::Arc, time::Duration};
use thiserror::Error;

/// Returned when the model produces no usable text.
pub const FALLBACK_ANSWER: &str = "I couldn't understand.";

pub const DEFAULT_BASE_URL: &str = "https://generativelanguage.googleapis.com/v1beta";

#[derive(Debug, Error)]
pub enum ChatError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("API error (status {status}): {message}")]
    Api { status: u16, message: String },

    #[error("no API key configured")]
    NotConfigured,
}

/// A text-in, text-out model. `Ok(None)` means the model answered with no text.
#[async_trait]
pub trait TextGenerator: Send + Sync {
    async fn generate(&self, prompt: &str) -> Result<Option<String>, ChatError>;
}

#[derive(Clone)]
pub struct ChatRelay {
    generator: Arc<dyn TextGenerator>,
}

impl ChatRelay {
    pub fn new(generator: Arc<dyn TextGenerator>) -> Self {
        Self { generator }
    }

    /// Forward `query` verbatim and return the trimmed answer, or
    /// [`FALLBACK_ANSWER`] when there is none.
    pub async fn ask(&self, query: &str) -> Result<String, ChatError> {
        let answer = self.generator.generate(query).await?;
        Ok(match answer.as_deref().map(str::trim) {
            Some(text) if !text.is_empty() => text.to_string(),
            _ => FALLBACK_ANSWER.to_string(),
        })
    }
}

// ── Gemini ────────────────────────────────────────────────────────────────────

#[derive(Debug, Serialize)]
struct GenerateRequest<'a> {
    contents: Vec<RequestContent<'a>>,
}

#[derive(Debug, Serialize)]
struct RequestContent<'a> {
    parts: Vec<RequestPart<'a>>,
}

#[derive(Debug, Serialize)]
struct RequestPart<'a> {
    text: &'a str,
}

#[derive(Debug, Default, Deserialize)]
struct GenerateResponse {
    #[serde(default)]
    candidates: Vec<ResponseCandidate>,
}

#[derive(Debug, Deserialize)]
struct ResponseCandidate {
    content: Option<ResponseContent>,
}

#[derive(Debug, Deserialize)]
struct ResponseContent {
    #[serde(default)]
    parts: Vec<ResponsePart>,
}

#[derive(Debug, Deserialize)]
struct ResponsePart {
    text: Option<String>,
}

impl GenerateResponse {
    /// Concatenated text parts of the first candidate.
    fn text(&self) -> Option<String> {
        let parts = &self.candidates.first()?.content.as_ref()?.parts;
        let text: String = parts.iter().filter_map(|p| p.text.as_deref()).collect();
        (!text.is_empty()).then_some(text)
    }
}

#[derive(Debug, Deserialize)]
struct ApiError {
    error: ApiErrorBody,
}

#[derive(Debug, Deserialize)]
struct ApiErrorBody {
    message: String,
}

/// Client for the Gemini `generateContent` endpoint.
#[derive(Clone)]
pub struct GeminiClient {
    client: Client,
    api_key: String,
    model: String,
    base_url: String,
}

impl GeminiClient {
    pub fn new(
        api_key: String,
        model: String,
        base_url: String,
        timeout: Duration,
    ) -> Result<Self, ChatError> {
        Ok(Self {
            client: Client::builder().timeout(timeout).build()?,
            api_key,
            model,
            base_url: base_url.trim_end_matches('/').to_string(),
        })
    }

    fn endpoint(&self) -> String {
        format!("{}/models/{}:generateContent", self.base_url, self.model)
    }
}

#[async_trait]
impl TextGenerator for GeminiClient {
    async fn generate(&self, prompt: &str) -> Result<Option<String>, ChatError> {
        let body = GenerateRequest {
            contents: vec![RequestContent {
                parts: vec![RequestPart { text: prompt }],
            }],
        };

        let response = self
            .client
            .post(self.endpoint())
            .header("x-goog-api-key", &self.api_key)
            .json(&body)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            let message = serde_json::from_str::<ApiError>(&body)
                .map(|e| e.error.message)
                .unwrap_or(body);
            return Err(ChatError::Api {
                status: status.as_u16(),
                message,
            });
        }

        let parsed: GenerateResponse = response.json().await?;
        tracing::debug!(model = %self.model, candidates = parsed.candidates.len(), "Chat call succeeded");
        Ok(parsed.text())
    }
}

/// Stand-in used when no API key is configured.
pub struct DisabledGenerator;

#[async_trait]
impl TextGenerator for DisabledGenerator {
    async fn generate(&self, _prompt: &str) -> Result<Option<String>, ChatError> {
        Err(ChatError::NotConfigured)
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use std::sync::Mutex;

    /// Replays a fixed answer and records the prompts it was given.
    pub(crate) struct CannedGenerator {
        answer: Option<String>,
        pub(crate) prompts: Mutex<Vec<String>>,
    }

    impl CannedGenerator {
        pub(crate) fn new(answer: Option<&str>) -> Self {
            Self {
                answer: answer.map(str::to_string),
                prompts: Mutex::new(Vec::new()),
            }
        }
    }

    #[async_trait]
    impl TextGenerator for CannedGenerator {
        async fn generate(&self, prompt: &str) -> Result<Option<String>, ChatError> {
            self.prompts.lock().unwrap().push(prompt.to_string());
            Ok(self.answer.clone())
        }
    }

    fn relay(answer: Option<&str>) -> (Arc<CannedGenerator>, ChatRelay) {
        let generator = Arc::new(CannedGenerator::new(answer));
        (generator.clone(), ChatRelay::new(generator))
    }

    #[tokio::test]
    async fn test_answer_is_trimmed() {
        let (_, relay) = relay(Some("  Hello \n"));
        assert_eq!(relay.ask("hi").await.unwrap(), "Hello");
    }

    #[tokio::test]
    async fn test_empty_answer_falls_back() {
        for answer in [None, Some(""), Some("   \n")] {
            let (_, relay) = relay(answer);
            assert_eq!(relay.ask("").await.unwrap(), FALLBACK_ANSWER);
        }
    }

    #[tokio::test]
    async fn test_query_forwarded_verbatim() {
        let (generator, relay) = relay(Some("ok"));
        relay.ask("  What is Rust?  ").await.unwrap();
        assert_eq!(
            generator.prompts.lock().unwrap().as_slice(),
            ["  What is Rust?  ".to_string()]
        );
    }

    #[tokio::test]
    async fn test_errors_propagate() {
        let relay = ChatRelay::new(Arc::new(DisabledGenerator));
        assert!(matches!(
            relay.ask("hi").await,
            Err(ChatError::NotConfigured)
        ));
    }

    #[test]
    fn test_response_text_joins_parts() {
        let parsed: GenerateResponse = serde_json::from_str(
            r#"{"candidates":[{"content":{"parts":[{"text":"Hel"},{"text":"lo"}],"role":"model"}},
                {"content":{"parts":[{"text":"ignored"}]}}]}"#,
        )
        .unwrap();
        assert_eq!(parsed.text().as_deref(), Some("Hello"));
    }

    #[test]
    fn test_response_without_text() {
        let blocked: GenerateResponse =
            serde_json::from_str(r#"{"promptFeedback":{"blockReason":"SAFETY"}}"#).unwrap();
        assert_eq!(blocked.text(), None);

        let no_content: GenerateResponse =
            serde_json::from_str(r#"{"candidates":[{"finishReason":"SAFETY"}]}"#).unwrap();
        assert_eq!(no_content.text(), None);
    }

    #[test]
    fn test_request_shape() {
        let body = GenerateRequest {
            contents: vec![RequestContent {
                parts: vec![RequestPart { text: "hi" }],
            }],
        };
        assert_eq!(
            serde_json::to_value(&body).unwrap(),
            serde_json::json!({"contents": [{"parts": [{"text": "hi"}]}]})
        );
    }

    #[test]
    fn test_endpoint_trims_trailing_slash() {
        let client = GeminiClient::new(
            "key".to_string(),
            "gemini-2.0-flash".to_string(),
            "http://localhost:9000/v1beta/".to_string(),
            Duration::from_secs(5),
        )
        .unwrap();
        assert_eq!(
            client.endpoint(),
            "http://localhost:9000/v1beta/models/gemini-2.0-flash:generateContent"
        );
    }

    /// Serve a stand-in for the generateContent endpoint on a free local
    /// port and return its base URL. Prompts pick the reply.
    async fn spawn_fake_gemini() -> String {
        use axum::{
            Json, Router,
            http::{HeaderMap, StatusCode, Uri},
            response::{IntoResponse, Response},
        };
        use serde_json::{Value, json};

        async fn handle(uri: Uri, headers: HeaderMap, Json(body): Json<Value>) -> Response {
            let key = headers.get("x-goog-api-key").and_then(|v| v.to_str().ok());
            if key != Some("test-key") {
                let error = json!({"error": {"code": 403, "message": "API key not valid"}});
                return (StatusCode::FORBIDDEN, Json(error)).into_response();
            }
            if uri.path() != "/v1beta/models/gemini-test:generateContent" {
                return (StatusCode::NOT_FOUND, uri.path().to_string()).into_response();
            }

            let prompt = body["contents"][0]["parts"][0]["text"]
                .as_str()
                .unwrap_or_default()
                .to_string();
            match prompt.as_str() {
                "fail" => {
                    let error = json!({"error": {
                        "code": 400,
                        "message": "Invalid prompt",
                        "status": "INVALID_ARGUMENT"
                    }});
                    (StatusCode::BAD_REQUEST, Json(error)).into_response()
                }
                "plain" => (StatusCode::SERVICE_UNAVAILABLE, "upstream down").into_response(),
                "blocked" => Json(json!({"promptFeedback": {"blockReason": "SAFETY"}})).into_response(),
                _ => Json(json!({"candidates": [{"content": {
                    "role": "model",
                    "parts": [{"text": "You said: "}, {"text": prompt}]
                }}]}))
                .into_response(),
            }
        }

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, Router::new().fallback(handle))
                .await
                .unwrap();
        });
        format!("http://{addr}/v1beta")
    }

    fn gemini(base_url: &str, api_key: &str) -> GeminiClient {
        GeminiClient::new(
            api_key.to_string(),
            "gemini-test".to_string(),
            base_url.to_string(),
            Duration::from_secs(5),
        )
        .unwrap()
    }

    #[tokio::test]
    async fn test_gemini_joins_response_text() {
        let base = spawn_fake_gemini().await;
        let client = gemini(&base, "test-key");
        assert_eq!(
            client.generate("hello").await.unwrap().as_deref(),
            Some("You said: hello")
        );

        let relay = ChatRelay::new(Arc::new(client));
        assert_eq!(relay.ask("blocked").await.unwrap(), FALLBACK_ANSWER);
    }

    #[tokio::test]
    async fn test_gemini_api_error_message() {
        let base = spawn_fake_gemini().await;
        let client = gemini(&base, "test-key");
        match client.generate("fail").await {
            Err(ChatError::Api { status, message }) => {
                assert_eq!(status, 400);
                assert_eq!(message, "Invalid prompt");
            }
            other => panic!("expected API error, got {other:?}"),
        }

        match client.generate("plain").await {
            Err(ChatError::Api { status, message }) => {
                assert_eq!(status, 503);
                assert_eq!(message, "upstream down");
            }
            other => panic!("expected API error, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_gemini_sends_api_key_header() {
        let base = spawn_fake_gemini().await;
        match gemini(&base, "wrong-key").generate("hello").await {
            Err(ChatError::Api { status, message }) => {
                assert_eq!(status, 403);
                assert_eq!(message, "API key not valid");
            }
            other => panic!("expected API error, got {other:?}"),
        }
        assert!(gemini(&base, "test-key").generate("hello").await.is_ok());
    }
}
