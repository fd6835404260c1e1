//! Google Gemini API Client
//!
//! ## Authentication
//! API key as a query parameter (`?key={GEMINI_API_KEY}`) against the Google
//! AI Studio endpoint.
//!
//! ## Endpoint URLs
//!
//! | Call | URL |
//! |------|-----|
//! | One-shot | `{base}/models/{model}:generateContent` |
//! | Stream | `{base}/models/{model}:streamGenerateContent?alt=sse` |
//!
//! Every call is a single attempt; there is no retry or backoff.

use async_trait::async_trait;
use futures::StreamExt;
use itinera_core::{AppConfig, DraftItinerary};
use reqwest::Client;
use reqwest_eventsource::{retry::Never, Error as EventSourceError, Event, EventSource};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use std::time::Duration;
use tokio::sync::{mpsc, oneshot};
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};

use crate::error::{GenerationError, Result};
use crate::intent::intent_prompt;
use crate::provider::GenerationService;
use crate::stream::TokenStream;

// =============================================================================
// API ENDPOINT CONFIGURATION
// =============================================================================

/// Gemini API endpoints
pub mod endpoints {
    /// Google AI Studio (API key mode)
    pub const GOOGLE_AI_BASE_URL: &str = "https://generativelanguage.googleapis.com/v1beta";

    pub const GENERATE: &str = "generateContent";
    pub const STREAM_GENERATE: &str = "streamGenerateContent";
}

const CONNECT_TIMEOUT: Duration = Duration::from_secs(15);
const DEFAULT_REQUEST_TIMEOUT: Duration = Duration::from_secs(60);
const DEFAULT_STREAM_TIMEOUT: Duration = Duration::from_secs(300);

/// Response schema for the structured draft call.
pub fn draft_itinerary_schema() -> Value {
    json!({
        "type": "OBJECT",
        "properties": {
            "stops": {
                "type": "ARRAY",
                "items": {
                    "type": "OBJECT",
                    "properties": {
                        "name": {"type": "STRING", "description": "The name of the venue."},
                        "latitude": {"type": "NUMBER", "description": "Latitude of the venue."},
                        "longitude": {"type": "NUMBER", "description": "Longitude of the venue."},
                        "start_time": {
                            "type": "STRING",
                            "description": "The suggested start time for the visit (HH:MM)."
                        }
                    },
                    "required": ["name", "latitude", "longitude", "start_time"]
                }
            }
        },
        "required": ["stops"]
    })
}

// =============================================================================
// DATA STRUCTURES
// =============================================================================

#[derive(Debug, Serialize)]
struct GeminiRequest {
    contents: Vec<GeminiContent>,
    #[serde(rename = "generationConfig", skip_serializing_if = "Option::is_none")]
    generation_config: Option<GenerationConfig>,
}

impl GeminiRequest {
    fn user_text(prompt: &str) -> Self {
        Self {
            contents: vec![GeminiContent {
                role: "user".to_string(),
                parts: vec![GeminiPart {
                    text: prompt.to_string(),
                }],
            }],
            generation_config: None,
        }
    }

    fn with_config(mut self, config: GenerationConfig) -> Self {
        self.generation_config = Some(config);
        self
    }
}

#[derive(Debug, Serialize)]
struct GeminiContent {
    role: String,
    parts: Vec<GeminiPart>,
}

#[derive(Debug, Serialize)]
struct GeminiPart {
    text: String,
}

#[derive(Debug, Default, Serialize)]
struct GenerationConfig {
    #[serde(skip_serializing_if = "Option::is_none")]
    temperature: Option<f32>,
    #[serde(rename = "responseMimeType", skip_serializing_if = "Option::is_none")]
    response_mime_type: Option<String>,
    #[serde(rename = "responseSchema", skip_serializing_if = "Option::is_none")]
    response_schema: Option<Value>,
}

#[derive(Debug, Deserialize)]
struct GeminiResponse {
    #[serde(default)]
    candidates: Vec<GeminiCandidate>,
}

impl GeminiResponse {
    /// Concatenated text parts of the first candidate.
    fn text(&self) -> String {
        self.candidates
            .first()
            .and_then(|c| c.content.as_ref())
            .map(|content| {
                content
                    .parts
                    .iter()
                    .filter_map(|p| p.text.as_deref())
                    .collect::<String>()
            })
            .unwrap_or_default()
    }
}

#[derive(Debug, Deserialize)]
struct GeminiCandidate {
    #[serde(default)]
    content: Option<GeminiContentResponse>,
}

#[derive(Debug, Deserialize)]
struct GeminiContentResponse {
    #[serde(default)]
    parts: Vec<GeminiPartResponse>,
}

#[derive(Debug, Deserialize)]
struct GeminiPartResponse {
    text: Option<String>,
}

fn preview(raw: &str) -> String {
    if raw.len() > 1000 {
        let mut end = 1000;
        while !raw.is_char_boundary(end) {
            end -= 1;
        }
        format!("{}...[truncated]", &raw[..end])
    } else {
        raw.to_string()
    }
}

fn parse_stream_chunk(data: &str) -> std::result::Result<String, serde_json::Error> {
    let chunk: GeminiResponse = serde_json::from_str(data)?;
    Ok(chunk.text())
}

async fn describe_stream_error(err: EventSourceError) -> String {
    match err {
        EventSourceError::InvalidStatusCode(status, response) => {
            let body = response.text().await.unwrap_or_default();
            format!("Gemini API error {}: {}", status, body)
        }
        EventSourceError::Transport(e) => e.without_url().to_string(),
        other => other.to_string(),
    }
}

// =============================================================================
// CLIENT IMPLEMENTATION
// =============================================================================

/// Google Gemini Client (API key mode)
pub struct GeminiClient {
    client: Client,
    api_key: String,
    /// Base API URL
    api_url: String,
    model: String,
    request_timeout: Duration,
    stream_timeout: Duration,
}

impl GeminiClient {
    /// Create a new Gemini client with API key and default settings
    pub fn new(api_key: impl Into<String>) -> Self {
        Self {
            client: Client::builder()
                .connect_timeout(CONNECT_TIMEOUT)
                .build()
                .unwrap_or_default(),
            api_key: api_key.into(),
            api_url: endpoints::GOOGLE_AI_BASE_URL.to_string(),
            model: itinera_core::config::DEFAULT_MODEL.to_string(),
            request_timeout: DEFAULT_REQUEST_TIMEOUT,
            stream_timeout: DEFAULT_STREAM_TIMEOUT,
        }
    }

    /// Create from the process configuration
    pub fn from_config(config: &AppConfig) -> Self {
        let mut client = Self::with_endpoint(&config.gemini_api_key, &config.gemini_api_url)
            .with_model(&config.gemini_model);
        client.request_timeout = config.generation_timeout;
        client.stream_timeout = config.stream_timeout;
        client
    }

    /// Create with custom endpoint
    pub fn with_endpoint(api_key: impl Into<String>, endpoint: impl Into<String>) -> Self {
        let mut client = Self::new(api_key);
        client.api_url = endpoint.into().trim_end_matches('/').to_string();
        client
    }

    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.model = model.into();
        self
    }

    /// Get the current API URL
    pub fn api_url(&self) -> &str {
        &self.api_url
    }

    fn build_url(&self, action: &str) -> String {
        format!(
            "{}/models/{}:{}?key={}",
            self.api_url, self.model, action, self.api_key
        )
    }

    /// One-shot generation, returning the text of the first candidate.
    async fn generate(&self, request: &GeminiRequest) -> Result<String> {
        let url = self.build_url(endpoints::GENERATE);
        debug!("Gemini request to: {}", url.split('?').next().unwrap_or(&url));

        let response = self
            .client
            .post(&url)
            .timeout(self.request_timeout)
            .json(request)
            .send()
            .await
            .map_err(|e| {
                let e = e.without_url();
                error!("Gemini HTTP request failed: {}", e);
                GenerationError::Request(e)
            })?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            error!("Gemini API error {}: {}", status, body);
            return Err(GenerationError::Status {
                status: status.as_u16(),
                body,
            });
        }

        let raw_body = response
            .text()
            .await
            .map_err(|e| GenerationError::Request(e.without_url()))?;

        let result: GeminiResponse = serde_json::from_str(&raw_body).map_err(|e| {
            let preview = preview(&raw_body);
            error!("Failed to parse Gemini response: {}", e);
            error!("Raw response: {}", preview);
            GenerationError::Decode(format!("{}. Raw: {}", e, preview))
        })?;

        Ok(result.text())
    }

    /// Background loop relaying stream chunks into the handoff channel.
    ///
    /// Reports the open/fail outcome of the connection once on `open_tx`,
    /// then relays non-empty text fragments until the upstream ends, errors,
    /// or `cancel` fires. The upstream connection is closed on every exit.
    fn spawn_producer(
        mut source: EventSource,
        tx: mpsc::Sender<String>,
        cancel: CancellationToken,
        open_tx: oneshot::Sender<std::result::Result<(), String>>,
    ) {
        tokio::spawn(async move {
            let mut open_tx = Some(open_tx);
            let mut relayed = 0usize;

            loop {
                let event = tokio::select! {
                    _ = cancel.cancelled() => {
                        debug!("Gemini stream cancelled by consumer after {} tokens", relayed);
                        break;
                    }
                    event = source.next() => event,
                };

                match event {
                    Some(Ok(Event::Open)) => {
                        if let Some(open) = open_tx.take() {
                            let _ = open.send(Ok(()));
                        }
                    }
                    Some(Ok(Event::Message(message))) => {
                        if let Some(open) = open_tx.take() {
                            let _ = open.send(Ok(()));
                        }

                        let text = match parse_stream_chunk(&message.data) {
                            Ok(text) => text,
                            Err(e) => {
                                warn!("Could not extract text from stream chunk: {}", e);
                                continue;
                            }
                        };
                        if text.is_empty() {
                            continue;
                        }

                        tokio::select! {
                            _ = cancel.cancelled() => {
                                debug!("Gemini stream cancelled by consumer after {} tokens", relayed);
                                break;
                            }
                            sent = tx.send(text) => {
                                if sent.is_err() {
                                    debug!("Token consumer went away after {} tokens", relayed);
                                    break;
                                }
                                relayed += 1;
                            }
                        }
                    }
                    Some(Err(EventSourceError::StreamEnded)) | None => {
                        debug!("Gemini stream finished after {} tokens", relayed);
                        break;
                    }
                    Some(Err(e)) => {
                        let reason = describe_stream_error(e).await;
                        match open_tx.take() {
                            Some(open) => {
                                let _ = open.send(Err(reason));
                            }
                            None => warn!("Gemini stream error after {} tokens: {}", relayed, reason),
                        }
                        break;
                    }
                }
            }

            source.close();
        });
    }
}

#[async_trait]
impl GenerationService for GeminiClient {
    fn model(&self) -> &str {
        &self.model
    }

    async fn classify_intent(&self, text: &str) -> Result<String> {
        info!("Gemini: classifying intent (model={})", self.model);
        let request = GeminiRequest::user_text(&intent_prompt(text));
        let intent = self.generate(&request).await?;
        let intent = intent.trim();

        if intent.is_empty() {
            return Err(GenerationError::EmptyResponse);
        }

        Ok(intent.to_string())
    }

    async fn generate_structured_itinerary(&self, prompt: &str) -> Result<DraftItinerary> {
        info!("Gemini: generating structured itinerary (model={})", self.model);
        let request = GeminiRequest::user_text(prompt).with_config(GenerationConfig {
            response_mime_type: Some("application/json".to_string()),
            response_schema: Some(draft_itinerary_schema()),
            ..Default::default()
        });

        let raw = self.generate(&request).await?;
        if raw.trim().is_empty() {
            return Err(GenerationError::UnparsableOutput {
                raw,
                reason: "empty model output".to_string(),
            });
        }

        let draft: DraftItinerary = serde_json::from_str(&raw).map_err(|e| {
            error!("Failed to unmarshal draft itinerary: {}", preview(&raw));
            GenerationError::UnparsableOutput {
                raw: raw.clone(),
                reason: e.to_string(),
            }
        })?;

        if draft.stops.is_empty() {
            return Err(GenerationError::EmptyDraft);
        }

        Ok(draft)
    }

    async fn stream_plan(&self, prompt: &str, cancel: CancellationToken) -> Result<TokenStream> {
        let url = format!("{}&alt=sse", self.build_url(endpoints::STREAM_GENERATE));
        info!("Gemini: opening stream (model={})", self.model);

        let builder = self
            .client
            .post(&url)
            .timeout(self.stream_timeout)
            .json(&GeminiRequest::user_text(prompt));

        let mut source = EventSource::new(builder)
            .map_err(|e| GenerationError::StreamInit(e.to_string()))?;
        source.set_retry_policy(Box::new(Never));

        let (tx, stream) = TokenStream::channel(cancel.clone());
        let (open_tx, open_rx) = oneshot::channel();
        Self::spawn_producer(source, tx, cancel, open_tx);

        match open_rx.await {
            Ok(Ok(())) => {
                debug!("Gemini stream open");
                Ok(stream)
            }
            Ok(Err(reason)) => {
                error!("Gemini stream failed to open: {}", reason);
                Err(GenerationError::StreamInit(reason))
            }
            Err(_) => Err(GenerationError::StreamInit(
                "stream closed before opening".to_string(),
            )),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::{
        extract::Path,
        http::StatusCode,
        response::{
            sse::{Event as SseEvent, Sse},
            IntoResponse,
        },
        routing::post,
        Json, Router,
    };
    use std::convert::Infallible;
    use std::sync::{Arc, Mutex};

    fn candidate(text: &str) -> Value {
        json!({
            "candidates": [{
                "content": {"role": "model", "parts": [{"text": text}]},
                "finishReason": "STOP"
            }]
        })
    }

    async fn spawn_server(app: Router) -> String {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });
        format!("http://{}", addr)
    }

    /// Server answering every one-shot call with `text`, recording the body.
    async fn one_shot_server(text: &'static str, seen: Arc<Mutex<Vec<Value>>>) -> String {
        let app = Router::new().route(
            "/models/*rest",
            post(move |Path(rest): Path<String>, Json(body): Json<Value>| async move {
                assert!(rest.ends_with(":generateContent"), "unexpected action {}", rest);
                seen.lock().unwrap().push(body);
                Json(candidate(text))
            }),
        );
        spawn_server(app).await
    }

    /// Server streaming `tokens` as SSE chunks, then closing.
    async fn stream_server(tokens: Vec<&'static str>) -> String {
        let app = Router::new().route(
            "/models/*rest",
            post(move |Path(rest): Path<String>| async move {
                assert!(rest.ends_with(":streamGenerateContent"));
                let stream = async_stream::stream! {
                    for token in tokens {
                        yield Ok::<_, Infallible>(SseEvent::default().data(candidate(token).to_string()));
                    }
                };
                Sse::new(stream)
            }),
        );
        spawn_server(app).await
    }

    fn client(base: &str) -> GeminiClient {
        GeminiClient::with_endpoint("test-key", base).with_model("test-model")
    }

    #[tokio::test]
    async fn test_classify_intent_trims() {
        let seen = Arc::new(Mutex::new(Vec::new()));
        let base = one_shot_server("  plan_day \n", seen.clone()).await;

        let intent = client(&base).classify_intent("Plan Kyoto").await.unwrap();
        assert_eq!(intent, "plan_day");

        let body = seen.lock().unwrap()[0].clone();
        let prompt = body["contents"][0]["parts"][0]["text"].as_str().unwrap();
        assert!(prompt.contains("User Request: \"Plan Kyoto\""));
        assert!(body.get("generationConfig").is_none());
    }

    #[tokio::test]
    async fn test_classify_intent_passes_unknown_labels_through() {
        let base = one_shot_server("book_hotel", Arc::default()).await;
        let intent = client(&base).classify_intent("x").await.unwrap();
        assert_eq!(intent, "book_hotel");
    }

    #[tokio::test]
    async fn test_classify_intent_empty_is_error() {
        let base = one_shot_server("   ", Arc::default()).await;
        let err = client(&base).classify_intent("x").await.unwrap_err();
        assert!(matches!(err, GenerationError::EmptyResponse));
    }

    #[tokio::test]
    async fn test_structured_itinerary_sends_schema() {
        let seen = Arc::new(Mutex::new(Vec::new()));
        let base = one_shot_server(
            r#"{"stops":[
                {"name":"A","latitude":1.0,"longitude":2.0,"start_time":"09:00"},
                {"name":"B","latitude":1.1,"longitude":2.1,"start_time":"11:00"},
                {"name":"C","latitude":1.2,"longitude":2.2,"start_time":"13:30"},
                {"name":"D","latitude":1.3,"longitude":2.3,"start_time":"16:00"}
            ]}"#,
            seen.clone(),
        )
        .await;

        let draft = client(&base)
            .generate_structured_itinerary("draft please")
            .await
            .unwrap();
        assert_eq!(draft.stops.len(), 4);
        assert_eq!(draft.stops[2].start_time, "13:30");

        let body = seen.lock().unwrap()[0].clone();
        let config = &body["generationConfig"];
        assert_eq!(config["responseMimeType"], "application/json");
        assert_eq!(
            config["responseSchema"]["properties"]["stops"]["items"]["required"],
            json!(["name", "latitude", "longitude", "start_time"])
        );
    }

    #[tokio::test]
    async fn test_structured_itinerary_unparsable_keeps_raw() {
        let base = one_shot_server("Sure! Here is your plan: {", Arc::default()).await;
        let err = client(&base)
            .generate_structured_itinerary("draft")
            .await
            .unwrap_err();
        assert_eq!(err.raw_output(), Some("Sure! Here is your plan: {"));
        assert!(err.to_string().contains("Sure! Here is your plan: {"));
    }

    #[tokio::test]
    async fn test_structured_itinerary_without_stops_is_error() {
        let base = one_shot_server(r#"{"stops":[]}"#, Arc::default()).await;
        let err = client(&base)
            .generate_structured_itinerary("draft")
            .await
            .unwrap_err();
        assert!(matches!(err, GenerationError::EmptyDraft));
    }

    #[tokio::test]
    async fn test_api_error_status() {
        let app = Router::new().route(
            "/models/*rest",
            post(|| async { (StatusCode::TOO_MANY_REQUESTS, "quota").into_response() }),
        );
        let base = spawn_server(app).await;
        let err = client(&base).classify_intent("x").await.unwrap_err();
        assert!(matches!(err, GenerationError::Status { status: 429, ref body } if body == "quota"));
    }

    #[tokio::test]
    async fn test_stream_relays_tokens_in_order() {
        let base = stream_server(vec!["Day ", "", "in ", "Kyoto"]).await;
        let stream = client(&base)
            .stream_plan("narrate", CancellationToken::new())
            .await
            .unwrap();
        let tokens: Vec<String> = stream.collect().await;
        assert_eq!(tokens, vec!["Day ", "in ", "Kyoto"]);
    }

    #[tokio::test]
    async fn test_stream_error_after_open_ends_silently() {
        let app = Router::new().route(
            "/models/*rest",
            post(|| async {
                let stream = async_stream::stream! {
                    for token in ["Morning ", "walk"] {
                        yield Ok::<_, std::io::Error>(SseEvent::default().data(candidate(token).to_string()));
                    }
                    tokio::time::sleep(Duration::from_millis(50)).await;
                    yield Err(std::io::Error::new(std::io::ErrorKind::ConnectionReset, "upstream reset"));
                };
                Sse::new(stream)
            }),
        );
        let base = spawn_server(app).await;

        let stream = client(&base)
            .stream_plan("narrate", CancellationToken::new())
            .await
            .unwrap();
        let tokens: Vec<String> = tokio::time::timeout(Duration::from_secs(5), stream.collect())
            .await
            .expect("stream did not end after the upstream error");
        assert_eq!(tokens, vec!["Morning ", "walk"]);
    }

    #[tokio::test]
    async fn test_stream_open_failure_is_init_error() {
        let app = Router::new().route(
            "/models/*rest",
            post(|| async { (StatusCode::SERVICE_UNAVAILABLE, "overloaded").into_response() }),
        );
        let base = spawn_server(app).await;
        let err = client(&base)
            .stream_plan("narrate", CancellationToken::new())
            .await
            .unwrap_err();
        match err {
            GenerationError::StreamInit(reason) => {
                assert!(reason.contains("503"), "{}", reason);
                assert!(reason.contains("overloaded"), "{}", reason);
            }
            other => panic!("unexpected error: {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_dropping_stream_releases_upstream() {
        struct Released(Option<oneshot::Sender<()>>);
        impl Drop for Released {
            fn drop(&mut self) {
                if let Some(tx) = self.0.take() {
                    let _ = tx.send(());
                }
            }
        }

        let (released_tx, released_rx) = oneshot::channel();
        let released = Arc::new(Mutex::new(Some(released_tx)));
        let app = Router::new().route(
            "/models/*rest",
            post(move || {
                let released = released.clone();
                async move {
                    let guard = Released(released.lock().unwrap().take());
                    let stream = async_stream::stream! {
                        let _guard = guard;
                        let mut i = 0u64;
                        loop {
                            yield Ok::<_, Infallible>(SseEvent::default().data(candidate(&format!("t{} ", i)).to_string()));
                            i += 1;
                            tokio::time::sleep(Duration::from_millis(10)).await;
                        }
                    };
                    Sse::new(stream)
                }
            }),
        );
        let base = spawn_server(app).await;

        let cancel = CancellationToken::new();
        let mut stream = client(&base).stream_plan("narrate", cancel.clone()).await.unwrap();
        assert_eq!(stream.next().await.as_deref(), Some("t0 "));
        drop(stream);
        assert!(cancel.is_cancelled());

        tokio::time::timeout(Duration::from_secs(5), released_rx)
            .await
            .expect("upstream connection was not released")
            .unwrap();
    }

    #[test]
    fn test_build_url() {
        let client = GeminiClient::with_endpoint("k", "http://llm.local/v1beta/").with_model("m");
        assert_eq!(
            client.build_url(endpoints::GENERATE),
            "http://llm.local/v1beta/models/m:generateContent?key=k"
        );
    }

    #[test]
    fn test_response_text_joins_parts() {
        let response: GeminiResponse = serde_json::from_value(json!({
            "candidates": [{"content": {"parts": [{"text": "a"}, {"text": "b"}]}}]
        }))
        .unwrap();
        assert_eq!(response.text(), "ab");

        let empty: GeminiResponse = serde_json::from_value(json!({})).unwrap();
        assert_eq!(empty.text(), "");
    }
}
