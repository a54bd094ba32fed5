//! HTTP client for the generative language API

use serde::de::DeserializeOwned;
use serde::Serialize;
use std::sync::Arc;

use crate::config::AiConfig;
use crate::error::AiError;
use crate::types::{AspectRatio, ChatMessage, InlineData, UserLocation, VideoResolution};
use crate::wire::{
    Content, ErrorBody, GenerateContentRequest, GenerateContentResponse, GenerationConfig,
    ImageBytes, LatLng, Operation, Part, PredictInstance, PredictParameters, PredictRequest,
    PredictResponse, PrebuiltVoiceConfig, RetrievalConfig, SpeechConfig, Tool, ToolConfig,
    VoiceConfig,
};
use crate::Result;

const API_KEY_HEADER: &str = "x-goog-api-key";

#[derive(Clone)]
pub struct AiClient {
    http: reqwest::Client,
    config: Arc<AiConfig>,
}

impl AiClient {
    /// Fails when the config carries no API key.
    pub fn new(config: AiConfig) -> Result<Self> {
        Self::with_http_client(reqwest::Client::new(), config)
    }

    pub fn with_http_client(http: reqwest::Client, config: AiConfig) -> Result<Self> {
        if !config.has_api_key() {
            return Err(AiError::MissingApiKey);
        }

        Ok(Self {
            http,
            config: Arc::new(config),
        })
    }

    pub fn config(&self) -> &AiConfig {
        &self.config
    }

    fn api_key(&self) -> &str {
        self.config.api_key.as_deref().unwrap_or_default()
    }

    fn model_url(&self, model: &str, method: &str) -> String {
        format!("{}/models/{}:{}", self.config.base_url, model, method)
    }

    async fn post<B, R>(&self, url: &str, body: &B) -> Result<R>
    where
        B: Serialize + ?Sized,
        R: DeserializeOwned,
    {
        let response = self
            .http
            .post(url)
            .header(API_KEY_HEADER, self.api_key())
            .json(body)
            .send()
            .await?;
        parse_response(response).await
    }

    async fn get<R: DeserializeOwned>(&self, url: &str) -> Result<R> {
        let response = self
            .http
            .get(url)
            .header(API_KEY_HEADER, self.api_key())
            .send()
            .await?;
        parse_response(response).await
    }

    async fn generate_content(
        &self,
        model: &str,
        request: &GenerateContentRequest,
    ) -> Result<GenerateContentResponse> {
        let response: GenerateContentResponse = self
            .post(&self.model_url(model, "generateContent"), request)
            .await?;
        if response.candidates.is_empty() {
            return Err(AiError::EmptyResponse);
        }
        Ok(response)
    }

    /// Single-turn grounded chat with web search and maps.
    pub async fn chat(
        &self,
        message: &str,
        location: Option<UserLocation>,
    ) -> Result<ChatMessage> {
        let request = GenerateContentRequest {
            contents: vec![Content::user(vec![Part::text(message)])],
            tools: vec![Tool::GoogleSearch {}, Tool::GoogleMaps {}],
            tool_config: location.map(|loc| ToolConfig {
                retrieval_config: RetrievalConfig {
                    lat_lng: LatLng {
                        latitude: loc.latitude,
                        longitude: loc.longitude,
                    },
                },
            }),
            ..GenerateContentRequest::default()
        };

        let response = self.generate_content(&self.config.chat_model, &request).await?;
        let sources = response.sources();

        tracing::debug!(sources = sources.len(), "Chat reply received");

        Ok(ChatMessage::model(response.text(), sources))
    }

    pub async fn generate_text(&self, prompt: &str) -> Result<String> {
        let request = GenerateContentRequest {
            contents: vec![Content::user(vec![Part::text(prompt)])],
            ..GenerateContentRequest::default()
        };
        let response = self.generate_content(&self.config.text_model, &request).await?;
        Ok(response.text())
    }

    pub async fn generate_images(
        &self,
        prompt: &str,
        aspect_ratio: AspectRatio,
        count: u32,
    ) -> Result<Vec<InlineData>> {
        let request = PredictRequest {
            instances: vec![PredictInstance {
                prompt: prompt.to_string(),
                image: None,
            }],
            parameters: PredictParameters {
                sample_count: Some(count.max(1)),
                aspect_ratio,
                resolution: None,
            },
        };

        let response: PredictResponse = self
            .post(&self.model_url(&self.config.image_model, "predict"), &request)
            .await?;

        let images: Vec<InlineData> = response
            .predictions
            .into_iter()
            .filter_map(|p| {
                Some(InlineData {
                    data: p.bytes_base64_encoded?,
                    mime_type: p.mime_type.unwrap_or_else(|| "image/png".to_string()),
                })
            })
            .collect();

        if images.is_empty() {
            return Err(AiError::EmptyResponse);
        }

        tracing::info!(count = images.len(), "Generated images");

        Ok(images)
    }

    /// Start a video generation and poll until it finishes. Returns the
    /// video URI.
    pub async fn generate_video(
        &self,
        prompt: &str,
        image: Option<InlineData>,
        aspect_ratio: AspectRatio,
        resolution: VideoResolution,
    ) -> Result<String> {
        if !aspect_ratio.is_video_ratio() {
            return Err(AiError::UnsupportedAspectRatio(aspect_ratio.as_str()));
        }

        let request = PredictRequest {
            instances: vec![PredictInstance {
                prompt: prompt.to_string(),
                image: image.map(|img| ImageBytes {
                    bytes_base64_encoded: img.data,
                    mime_type: img.mime_type,
                }),
            }],
            parameters: PredictParameters {
                sample_count: None,
                aspect_ratio,
                resolution: Some(resolution),
            },
        };

        let mut operation: Operation = self
            .post(
                &self.model_url(&self.config.video_model, "predictLongRunning"),
                &request,
            )
            .await?;

        tracing::info!(operation = %operation.name, "Video generation started");

        let mut attempts = 0;
        while !operation.done {
            if attempts >= self.config.max_poll_attempts {
                return Err(AiError::OperationTimedOut { attempts });
            }
            tokio::time::sleep(self.config.poll_interval()).await;
            attempts += 1;

            let url = format!("{}/{}", self.config.base_url, operation.name);
            operation = self.get(&url).await?;
            tracing::debug!(operation = %operation.name, attempts, done = operation.done, "Polled operation");
        }

        if let Some(status) = &operation.error {
            return Err(AiError::OperationFailed(format!(
                "{} (code {})",
                status.message, status.code
            )));
        }

        operation.video_uri().ok_or(AiError::EmptyResponse)
    }

    pub async fn generate_speech(&self, text: &str, voice: Option<&str>) -> Result<InlineData> {
        let voice = voice.unwrap_or(self.config.default_voice.as_str());
        let request = GenerateContentRequest {
            contents: vec![Content::user(vec![Part::text(text)])],
            generation_config: Some(GenerationConfig {
                response_modalities: vec!["AUDIO".to_string()],
                speech_config: Some(SpeechConfig {
                    voice_config: VoiceConfig {
                        prebuilt_voice_config: PrebuiltVoiceConfig {
                            voice_name: voice.to_string(),
                        },
                    },
                }),
            }),
            ..GenerateContentRequest::default()
        };

        let response = self
            .generate_content(&self.config.speech_model, &request)
            .await?;
        response.inline_data().ok_or(AiError::EmptyResponse)
    }

    /// Describe an image, audio or video payload. Without a prompt the
    /// model is asked what the content is.
    pub async fn analyze_content(
        &self,
        bytes: &[u8],
        mime_type: &str,
        prompt: Option<&str>,
    ) -> Result<String> {
        let prompt = prompt
            .map(str::to_string)
            .unwrap_or_else(|| default_analysis_prompt(mime_type));
        let request = GenerateContentRequest {
            contents: vec![Content::user(vec![
                Part::inline(InlineData::from_bytes(bytes, mime_type)),
                Part::text(prompt),
            ])],
            ..GenerateContentRequest::default()
        };

        let response = self
            .generate_content(&self.config.analysis_model, &request)
            .await?;
        Ok(response.text())
    }
}

fn default_analysis_prompt(mime_type: &str) -> String {
    let kind = mime_type.split('/').next().unwrap_or(mime_type);
    format!("What is in this {kind}?")
}

async fn parse_response<R: DeserializeOwned>(response: reqwest::Response) -> Result<R> {
    let status = response.status();
    if status.is_success() {
        return Ok(response.json().await?);
    }

    let body = response.text().await.unwrap_or_default();
    let message = serde_json::from_str::<ErrorBody>(&body)
        .map(|b| b.error.message)
        .unwrap_or(body);

    tracing::warn!(status = status.as_u16(), message = %message, "AI request failed");

    Err(AiError::Api {
        status: status.as_u16(),
        message,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{Role, SourceKind};
    use serde_json::json;
    use wiremock::matchers::{body_partial_json, header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn client_for(server: &MockServer) -> AiClient {
        let mut config = AiConfig::default()
            .with_api_key("test-key")
            .with_base_url(server.uri());
        config.poll_interval_ms = 5;
        config.max_poll_attempts = 3;
        AiClient::new(config).unwrap()
    }

    fn text_reply(text: &str) -> serde_json::Value {
        json!({"candidates": [{"content": {"role": "model", "parts": [{"text": text}]}}]})
    }

    #[test]
    fn test_requires_api_key() {
        assert!(matches!(
            AiClient::new(AiConfig::default()),
            Err(AiError::MissingApiKey)
        ));
    }

    #[test]
    fn test_default_analysis_prompt() {
        assert_eq!(default_analysis_prompt("image/png"), "What is in this image?");
        assert_eq!(default_analysis_prompt("audio/mpeg"), "What is in this audio?");
    }

    #[tokio::test]
    async fn test_chat_sends_tools_and_location() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/models/gemini-2.5-flash:generateContent"))
            .and(header("x-goog-api-key", "test-key"))
            .and(body_partial_json(json!({
                "tools": [{"googleSearch": {}}, {"googleMaps": {}}],
                "toolConfig": {"retrievalConfig": {"latLng": {"latitude": 1.5, "longitude": -2.0}}}
            })))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "candidates": [{
                    "content": {"parts": [{"text": "Try the cafe."}]},
                    "groundingMetadata": {"groundingChunks": [
                        {"maps": {"uri": "https://maps.example/cafe", "title": "Cafe"}}
                    ]}
                }]
            })))
            .mount(&server)
            .await;

        let client = client_for(&server);
        let reply = client
            .chat(
                "coffee nearby?",
                Some(UserLocation {
                    latitude: 1.5,
                    longitude: -2.0,
                }),
            )
            .await
            .unwrap();

        assert_eq!(reply.role, Role::Model);
        assert_eq!(reply.text, "Try the cafe.");
        assert_eq!(reply.sources.len(), 1);
        assert_eq!(reply.sources[0].kind, SourceKind::Maps);
    }

    #[tokio::test]
    async fn test_api_error_message_is_surfaced() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(400).set_body_json(json!({
                "error": {"code": 400, "message": "API key not valid"}
            })))
            .mount(&server)
            .await;

        let err = client_for(&server).generate_text("hi").await.unwrap_err();
        match err {
            AiError::Api { status, message } => {
                assert_eq!(status, 400);
                assert_eq!(message, "API key not valid");
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[tokio::test]
    async fn test_generate_images_decodes_predictions() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/models/imagen-4.0-generate-001:predict"))
            .and(body_partial_json(json!({"parameters": {"sampleCount": 2, "aspectRatio": "16:9"}})))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "predictions": [
                    {"bytesBase64Encoded": "aGk=", "mimeType": "image/jpeg"},
                    {"bytesBase64Encoded": "aGk="}
                ]
            })))
            .mount(&server)
            .await;

        let images = client_for(&server)
            .generate_images("a cat", AspectRatio::Wide, 2)
            .await
            .unwrap();
        assert_eq!(images.len(), 2);
        assert_eq!(images[0].mime_type, "image/jpeg");
        assert_eq!(images[1].mime_type, "image/png");
        assert_eq!(images[0].decode().unwrap(), b"hi");
    }

    #[tokio::test]
    async fn test_generate_video_polls_until_done() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/models/veo-3.0-fast-generate-001:predictLongRunning"))
            .respond_with(
                ResponseTemplate::new(200).set_body_json(json!({"name": "operations/op1"})),
            )
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/operations/op1"))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_json(json!({"name": "operations/op1", "done": false})),
            )
            .up_to_n_times(1)
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/operations/op1"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "name": "operations/op1",
                "done": true,
                "response": {"generateVideoResponse": {"generatedSamples": [
                    {"video": {"uri": "https://files.example/video.mp4"}}
                ]}}
            })))
            .mount(&server)
            .await;

        let uri = client_for(&server)
            .generate_video("waves", None, AspectRatio::Wide, VideoResolution::Hd)
            .await
            .unwrap();
        assert_eq!(uri, "https://files.example/video.mp4");
    }

    #[tokio::test]
    async fn test_generate_video_gives_up_after_max_polls() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(
                ResponseTemplate::new(200).set_body_json(json!({"name": "operations/slow"})),
            )
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/operations/slow"))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_json(json!({"name": "operations/slow", "done": false})),
            )
            .mount(&server)
            .await;

        let err = client_for(&server)
            .generate_video("waves", None, AspectRatio::Tall, VideoResolution::FullHd)
            .await
            .unwrap_err();
        assert!(matches!(err, AiError::OperationTimedOut { attempts: 3 }));
    }

    #[tokio::test]
    async fn test_generate_video_rejects_square_ratio() {
        let server = MockServer::start().await;

        let err = client_for(&server)
            .generate_video("waves", None, AspectRatio::Square, VideoResolution::Hd)
            .await
            .unwrap_err();
        assert!(matches!(err, AiError::UnsupportedAspectRatio("1:1")));
        assert!(server.received_requests().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_speech_and_analysis() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/models/gemini-2.5-flash-preview-tts:generateContent"))
            .and(body_partial_json(json!({"generationConfig": {"responseModalities": ["AUDIO"]}})))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "candidates": [{"content": {"parts": [
                    {"inlineData": {"mimeType": "audio/pcm", "data": "AAAA"}}
                ]}}]
            })))
            .mount(&server)
            .await;
        Mock::given(method("POST"))
            .and(path("/models/gemini-2.5-flash:generateContent"))
            .and(body_partial_json(json!({"contents": [{"parts": [
                {"inlineData": {"mimeType": "image/png", "data": "aGk="}},
                {"text": "What is in this image?"}
            ]}]})))
            .respond_with(ResponseTemplate::new(200).set_body_json(text_reply("A greeting.")))
            .mount(&server)
            .await;

        let client = client_for(&server);
        let audio = client.generate_speech("hello", None).await.unwrap();
        assert_eq!(audio.mime_type, "audio/pcm");

        let description = client.analyze_content(b"hi", "image/png", None).await.unwrap();
        assert_eq!(description, "A greeting.");
    }

    #[tokio::test]
    async fn test_empty_candidates_is_an_error() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({"candidates": []})))
            .mount(&server)
            .await;

        let err = client_for(&server).generate_text("hi").await.unwrap_err();
        assert!(matches!(err, AiError::EmptyResponse));
    }
}
