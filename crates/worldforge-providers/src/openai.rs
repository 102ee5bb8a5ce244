//! OpenAI-compatible chat completion and image generation clients.
//!
//! Each call is a single attempt; retries, backoff, and timeouts belong to
//! the call executor.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use tracing::debug;
use worldforge_generation::domain::call::{
    GeneratedImage, ImageRequest, TextCompletion, TextRequest, TokenUsage,
};
use worldforge_generation::domain::error::GenerationError;
use worldforge_generation::domain::ports::{ImageGenerator, TextGenerator};

/// Default API base URL.
pub const DEFAULT_BASE_URL: &str = "https://api.openai.com/v1";

const CONNECT_TIMEOUT: Duration = Duration::from_secs(10);
const REQUEST_TIMEOUT: Duration = Duration::from_secs(180);

/// Connection settings shared by the text and image clients.
#[derive(Debug, Clone)]
pub struct OpenAiConfig {
    /// API base URL without a trailing slash.
    pub base_url: String,
    /// Bearer token.
    pub api_key: String,
    /// Model used for image generation.
    pub image_model: String,
}

impl OpenAiConfig {
    /// Config for `api_key` against the default endpoint.
    #[must_use]
    pub fn new(api_key: impl Into<String>) -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_owned(),
            api_key: api_key.into(),
            image_model: "dall-e-3".to_owned(),
        }
    }

    fn endpoint(&self, path: &str) -> String {
        format!("{}/{path}", self.base_url.trim_end_matches('/'))
    }
}

fn build_http_client() -> Result<Client, GenerationError> {
    Client::builder()
        .connect_timeout(CONNECT_TIMEOUT)
        .timeout(REQUEST_TIMEOUT)
        .build()
        .map_err(|e| GenerationError::Request(format!("failed to create HTTP client: {e}")))
}

/// Sends `body` to `url` and returns the raw success body.
async fn post_json<B: Serialize + Sync>(
    client: &Client,
    config: &OpenAiConfig,
    url: &str,
    body: &B,
) -> Result<String, GenerationError> {
    let response = client
        .post(url)
        .bearer_auth(&config.api_key)
        .json(body)
        .send()
        .await
        .map_err(|e| GenerationError::Request(e.to_string()))?;

    let status = response.status();
    let text = response
        .text()
        .await
        .map_err(|e| GenerationError::Request(e.to_string()))?;
    if !status.is_success() {
        return Err(GenerationError::Transport {
            status: status.as_u16(),
            body: text,
        });
    }
    Ok(text)
}

#[derive(Serialize)]
struct ChatCompletionRequest<'a> {
    model: &'a str,
    messages: [ChatMessage<'a>; 2],
    temperature: f32,
    max_tokens: u32,
    response_format: ResponseFormat,
}

#[derive(Serialize)]
struct ChatMessage<'a> {
    role: &'static str,
    content: &'a str,
}

#[derive(Serialize)]
struct ResponseFormat {
    #[serde(rename = "type")]
    kind: &'static str,
}

#[derive(Deserialize)]
struct ChatCompletionResponse {
    model: String,
    choices: Vec<Choice>,
    usage: Option<Usage>,
}

#[derive(Deserialize)]
struct Choice {
    message: ChoiceMessage,
}

#[derive(Deserialize)]
struct ChoiceMessage {
    content: Option<String>,
}

#[derive(Deserialize)]
struct Usage {
    prompt_tokens: u32,
    completion_tokens: u32,
    total_tokens: u32,
}

fn chat_body(request: &TextRequest) -> ChatCompletionRequest<'_> {
    ChatCompletionRequest {
        model: &request.model.model,
        messages: [
            ChatMessage {
                role: "system",
                content: &request.system_prompt,
            },
            ChatMessage {
                role: "user",
                content: &request.prompt,
            },
        ],
        temperature: request.model.temperature,
        max_tokens: request.model.max_tokens,
        response_format: ResponseFormat {
            kind: "json_object",
        },
    }
}

fn parse_chat_completion(body: &str) -> Result<TextCompletion, GenerationError> {
    let completion: ChatCompletionResponse = serde_json::from_str(body)
        .map_err(|e| GenerationError::MalformedResponse(format!("chat completion: {e}")))?;
    let content = completion
        .choices
        .into_iter()
        .next()
        .and_then(|choice| choice.message.content)
        .filter(|content| !content.trim().is_empty())
        .ok_or(GenerationError::EmptyPayload)?;
    let usage = completion.usage.map_or_else(TokenUsage::default, |u| TokenUsage {
        prompt_tokens: u.prompt_tokens,
        completion_tokens: u.completion_tokens,
        total_tokens: u.total_tokens,
    });
    Ok(TextCompletion {
        content,
        model: completion.model,
        usage,
    })
}

/// Text generation through `POST {base}/chat/completions`.
#[derive(Debug, Clone)]
pub struct OpenAiTextGenerator {
    client: Client,
    config: OpenAiConfig,
}

impl OpenAiTextGenerator {
    /// Creates a client.
    ///
    /// # Errors
    ///
    /// Returns `GenerationError::Request` if the HTTP client cannot be built.
    pub fn new(config: OpenAiConfig) -> Result<Self, GenerationError> {
        Ok(Self {
            client: build_http_client()?,
            config,
        })
    }
}

#[async_trait]
impl TextGenerator for OpenAiTextGenerator {
    async fn generate_text(&self, request: &TextRequest) -> Result<TextCompletion, GenerationError> {
        let url = self.config.endpoint("chat/completions");
        debug!(kind = %request.kind, model = %request.model.model, "posting chat completion");
        let body = post_json(&self.client, &self.config, &url, &chat_body(request)).await?;
        parse_chat_completion(&body)
    }
}

#[derive(Serialize)]
struct ImageGenerationRequest<'a> {
    model: &'a str,
    prompt: String,
    n: u8,
    size: String,
}

#[derive(Deserialize)]
struct ImageGenerationResponse {
    data: Vec<ImageData>,
}

#[derive(Deserialize)]
struct ImageData {
    url: Option<String>,
}

fn image_body<'a>(model: &'a str, request: &ImageRequest) -> ImageGenerationRequest<'a> {
    let prompt = match &request.style {
        Some(style) => format!("{}. Style: {style}", request.prompt),
        None => request.prompt.clone(),
    };
    ImageGenerationRequest {
        model,
        prompt,
        n: 1,
        size: request.dimensions.to_string(),
    }
}

fn parse_image_response(body: &str, model: &str) -> Result<GeneratedImage, GenerationError> {
    let response: ImageGenerationResponse = serde_json::from_str(body)
        .map_err(|e| GenerationError::MalformedResponse(format!("image generation: {e}")))?;
    let url = response
        .data
        .into_iter()
        .find_map(|image| image.url)
        .filter(|url| !url.trim().is_empty())
        .ok_or(GenerationError::EmptyPayload)?;
    Ok(GeneratedImage {
        url,
        model: Some(model.to_owned()),
    })
}

/// Image generation through `POST {base}/images/generations`.
#[derive(Debug, Clone)]
pub struct OpenAiImageGenerator {
    client: Client,
    config: OpenAiConfig,
}

impl OpenAiImageGenerator {
    /// Creates a client.
    ///
    /// # Errors
    ///
    /// Returns `GenerationError::Request` if the HTTP client cannot be built.
    pub fn new(config: OpenAiConfig) -> Result<Self, GenerationError> {
        Ok(Self {
            client: build_http_client()?,
            config,
        })
    }
}

#[async_trait]
impl ImageGenerator for OpenAiImageGenerator {
    async fn generate_image(
        &self,
        request: &ImageRequest,
    ) -> Result<GeneratedImage, GenerationError> {
        let url = self.config.endpoint("images/generations");
        let model = self.config.image_model.as_str();
        debug!(model, size = %request.dimensions, "posting image generation");
        let body = post_json(&self.client, &self.config, &url, &image_body(model, request)).await?;
        parse_image_response(&body, model)
    }
}
