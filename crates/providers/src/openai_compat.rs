//! OpenAI-compatible completion engine.
//!
//! Uses three endpoints: `chat/completions`, `images/generations` (with
//! `b64_json` output) and `audio/transcriptions` (multipart upload).

use std::{fmt, sync::Arc, time::Duration};

use {
    async_trait::async_trait,
    larkbot_common::types::{ChatMessage, Resolution},
    larkbot_config::OpenAiConfig,
    reqwest::{
        Client, Response,
        multipart::{Form, Part},
    },
    secrecy::{ExposeSecret, Secret},
    serde::{Deserialize, Serialize},
    tracing::debug,
};

use crate::{AudioSource, CompletionEngine, Error, Result};

const PROVIDER: &str = "OpenAI-compatible";

pub struct OpenAiCompatEngine {
    client: Client,
    api_key: Option<Secret<String>>,
    base_url: String,
    chat_model: String,
    image_model: String,
    transcription_model: String,
    audio: Arc<dyn AudioSource>,
}

impl fmt::Debug for OpenAiCompatEngine {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("OpenAiCompatEngine")
            .field("api_key", &"[REDACTED]")
            .field("base_url", &self.base_url)
            .field("chat_model", &self.chat_model)
            .field("image_model", &self.image_model)
            .field("transcription_model", &self.transcription_model)
            .finish()
    }
}

impl OpenAiCompatEngine {
    pub fn from_config(config: &OpenAiConfig, audio: Arc<dyn AudioSource>) -> Result<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs.max(1)))
            .build()
            .map_err(|e| Error::http("failed to build HTTP client", e))?;
        Ok(Self {
            client,
            api_key: config.api_key.clone(),
            base_url: config.base_url.trim_end_matches('/').to_string(),
            chat_model: config.chat_model.clone(),
            image_model: config.image_model.clone(),
            transcription_model: config.transcription_model.clone(),
            audio,
        })
    }

    #[must_use]
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into().trim_end_matches('/').to_string();
        self
    }

    fn bearer(&self) -> Result<String> {
        let key = self
            .api_key
            .as_ref()
            .filter(|k| !k.expose_secret().trim().is_empty())
            .ok_or(Error::NotConfigured { provider: PROVIDER })?;
        Ok(format!("Bearer {}", key.expose_secret()))
    }

    fn url(&self, endpoint: &str) -> String {
        format!("{}/{endpoint}", self.base_url)
    }
}

/// Turn a non-2xx response into [`Error::Api`].
async fn check_status(operation: &'static str, response: Response) -> Result<Response> {
    if response.status().is_success() {
        return Ok(response);
    }
    let status = response.status().as_u16();
    let body = response.text().await.unwrap_or_default();
    Err(Error::Api {
        operation,
        status,
        body,
    })
}

#[async_trait]
impl CompletionEngine for OpenAiCompatEngine {
    async fn transcribe(&self, file_key: &str) -> Result<String> {
        let auth = self.bearer()?;
        let clip = self.audio.fetch(file_key).await?;

        let file_part = Part::bytes(clip.bytes)
            .file_name(clip.file_name)
            .mime_str(clip.mime_type)
            .map_err(|e| Error::http("failed to create file part", e))?;
        let form = Form::new()
            .part("file", file_part)
            .text("model", self.transcription_model.clone())
            .text("response_format", "json");

        let response = self
            .client
            .post(self.url("audio/transcriptions"))
            .header("Authorization", auth)
            .multipart(form)
            .send()
            .await
            .map_err(|e| Error::http("failed to send transcription request", e))?;
        let parsed: TranscriptionResponse = check_status("transcription", response)
            .await?
            .json()
            .await
            .map_err(|e| Error::http("failed to parse transcription response", e))?;

        debug!(file_key, chars = parsed.text.len(), "transcribed audio");
        Ok(parsed.text.trim().to_string())
    }

    async fn generate_reply(&self, history: &[ChatMessage], question: &str) -> Result<String> {
        let auth = self.bearer()?;
        let user = ChatMessage::user(question);
        let messages: Vec<&ChatMessage> = history.iter().chain(std::iter::once(&user)).collect();
        let body = ChatRequest {
            model: &self.chat_model,
            messages,
        };

        let response = self
            .client
            .post(self.url("chat/completions"))
            .header("Authorization", auth)
            .json(&body)
            .send()
            .await
            .map_err(|e| Error::http("failed to send chat request", e))?;
        let parsed: ChatResponse = check_status("chat", response)
            .await?
            .json()
            .await
            .map_err(|e| Error::http("failed to parse chat response", e))?;

        let answer = parsed
            .choices
            .into_iter()
            .next()
            .and_then(|c| c.message.content)
            .filter(|c| !c.trim().is_empty())
            .ok_or(Error::EmptyResponse { operation: "chat" })?;
        debug!(
            history = history.len(),
            chars = answer.len(),
            "chat completion received"
        );
        Ok(answer.trim().to_string())
    }

    async fn generate_image(&self, prompt: &str, resolution: Resolution) -> Result<String> {
        let auth = self.bearer()?;
        let body = ImageRequest {
            model: &self.image_model,
            prompt,
            n: 1,
            size: resolution.as_str(),
            response_format: "b64_json",
        };

        let response = self
            .client
            .post(self.url("images/generations"))
            .header("Authorization", auth)
            .json(&body)
            .send()
            .await
            .map_err(|e| Error::http("failed to send image request", e))?;
        let parsed: ImageResponse = check_status("image", response)
            .await?
            .json()
            .await
            .map_err(|e| Error::http("failed to parse image response", e))?;

        let image = parsed
            .data
            .into_iter()
            .find_map(|d| d.b64_json)
            .ok_or(Error::EmptyResponse { operation: "image" })?;
        debug!(%resolution, bytes = image.len(), "image generated");
        Ok(image)
    }
}

// ── API Types ──────────────────────────────────────────────────────────────

#[derive(Debug, Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: Vec<&'a ChatMessage>,
}

#[derive(Debug, Deserialize)]
struct ChatResponse {
    #[serde(default)]
    choices: Vec<ChatChoice>,
}

#[derive(Debug, Deserialize)]
struct ChatChoice {
    message: ChatChoiceMessage,
}

#[derive(Debug, Deserialize)]
struct ChatChoiceMessage {
    #[serde(default)]
    content: Option<String>,
}

#[derive(Debug, Serialize)]
struct ImageRequest<'a> {
    model: &'a str,
    prompt: &'a str,
    n: u8,
    size: &'a str,
    response_format: &'a str,
}

#[derive(Debug, Deserialize)]
struct ImageResponse {
    #[serde(default)]
    data: Vec<ImageDatum>,
}

#[derive(Debug, Deserialize)]
struct ImageDatum {
    #[serde(default)]
    b64_json: Option<String>,
}

#[derive(Debug, Deserialize)]
struct TranscriptionResponse {
    text: String,
}

#[allow(clippy::unwrap_used, clippy::expect_used)]
#[cfg(test)]
mod tests {
    use {
        super::*,
        crate::FsAudioSource,
        serde_json::json,
        wiremock::{
            Mock, MockServer, ResponseTemplate,
            matchers::{body_partial_json, header, method, path},
        },
    };

    fn engine(server: &MockServer) -> OpenAiCompatEngine {
        let config = OpenAiConfig {
            api_key: Some(Secret::new("sk-test".into())),
            ..Default::default()
        };
        OpenAiCompatEngine::from_config(&config, Arc::new(FsAudioSource::unrestricted()))
            .unwrap()
            .with_base_url(server.uri())
    }

    #[tokio::test]
    async fn chat_sends_history_then_question() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/chat/completions"))
            .and(header("Authorization", "Bearer sk-test"))
            .and(body_partial_json(json!({
                "model": "gpt-4o-mini",
                "messages": [
                    {"role": "system", "content": "be brief"},
                    {"role": "user", "content": "hi"}
                ]
            })))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "choices": [{"message": {"role": "assistant", "content": " hello \n"}}]
            })))
            .expect(1)
            .mount(&server)
            .await;

        let answer = engine(&server)
            .generate_reply(&[ChatMessage::system("be brief")], "hi")
            .await
            .unwrap();
        assert_eq!(answer, "hello");
    }

    #[tokio::test]
    async fn chat_without_choices_is_empty_response() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/chat/completions"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({"choices": []})))
            .mount(&server)
            .await;

        let err = engine(&server).generate_reply(&[], "hi").await.unwrap_err();
        assert!(matches!(err, Error::EmptyResponse { operation: "chat" }));
    }

    #[tokio::test]
    async fn api_error_reports_status() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/chat/completions"))
            .respond_with(ResponseTemplate::new(429).set_body_string("slow down"))
            .mount(&server)
            .await;

        let err = engine(&server).generate_reply(&[], "hi").await.unwrap_err();
        assert!(matches!(err, Error::Api { status: 429, .. }));
        assert!(err.to_string().contains("slow down"));
    }

    #[tokio::test]
    async fn image_requests_size_and_base64() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/images/generations"))
            .and(body_partial_json(json!({
                "prompt": "a cat",
                "size": "512x512",
                "response_format": "b64_json"
            })))
            .respond_with(
                ResponseTemplate::new(200).set_body_json(json!({"data": [{"b64_json": "aW1n"}]})),
            )
            .expect(1)
            .mount(&server)
            .await;

        let image = engine(&server)
            .generate_image("a cat", Resolution::Medium)
            .await
            .unwrap();
        assert_eq!(image, "aW1n");
    }

    #[tokio::test]
    async fn transcription_uploads_audio() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/audio/transcriptions"))
            .and(header("Authorization", "Bearer sk-test"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({"text": " hello "})))
            .expect(1)
            .mount(&server)
            .await;

        let dir = tempfile::tempdir().unwrap();
        let file = dir.path().join("voice.opus");
        std::fs::write(&file, b"OggS fake").unwrap();

        let text = engine(&server)
            .transcribe(file.to_str().unwrap())
            .await
            .unwrap();
        assert_eq!(text, "hello");
    }

    #[tokio::test]
    async fn missing_api_key_fails_before_any_request() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(200))
            .expect(0)
            .mount(&server)
            .await;

        let engine = OpenAiCompatEngine::from_config(
            &OpenAiConfig::default(),
            Arc::new(FsAudioSource::unrestricted()),
        )
        .unwrap()
        .with_base_url(server.uri());
        let err = engine.generate_reply(&[], "hi").await.unwrap_err();
        assert!(matches!(err, Error::NotConfigured { .. }));
    }

    #[test]
    fn debug_redacts_key() {
        let config = OpenAiConfig {
            api_key: Some(Secret::new("sk-very-secret".into())),
            ..Default::default()
        };
        let engine =
            OpenAiCompatEngine::from_config(&config, Arc::new(FsAudioSource::unrestricted()))
                .unwrap();
        assert!(!format!("{engine:?}").contains("sk-very-secret"));
    }
}
