//! Model collaborators: the traits the orchestrator talks to, and an
//! OpenAI-compatible implementation over `reqwest`.
//!
//! Chat completions: <https://platform.openai.com/docs/api-reference/chat>
//! Images: <https://platform.openai.com/docs/api-reference/images>

use std::time::Duration;

use async_trait::async_trait;
use base64::Engine;
use base64::engine::general_purpose;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use tracing::{debug, instrument};
use url::Url;

use crate::constants::PANEL_IMAGE_SIZE;
use crate::error::ComicError;

/// Quality tier requested from the image model.
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq, clap::ValueEnum)]
pub enum ImageQuality {
    /// The default, cheaper tier
    #[default]
    Standard,
    /// Finer detail, slower and pricier
    Hd,
}

/// One image generation call.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct ImageRequest {
    /// What to draw
    pub prompt: String,
    /// `WIDTHxHEIGHT`
    pub size: &'static str,
    /// Quality tier
    pub quality: ImageQuality,
    /// Number of images, always 1 for panels
    pub count: u8,
}

impl ImageRequest {
    /// A single square panel illustration.
    pub fn panel(prompt: String, quality: ImageQuality) -> Self {
        Self {
            prompt,
            size: PANEL_IMAGE_SIZE,
            quality,
            count: 1,
        }
    }
}

/// What an image model hands back.
#[derive(Clone, Debug, Eq, PartialEq)]
pub enum GeneratedImage {
    /// A URL the image can be downloaded from
    Url(String),
    /// The image itself, already decoded from base64
    Bytes(Vec<u8>),
}

/// Writes text given a system and a user instruction.
#[async_trait]
pub trait TextGenerator: Send + Sync {
    /// Returns the generated text blob.
    async fn complete(&self, system: &str, user: &str) -> Result<String, ComicError>;
}

/// Draws an image from a prompt.
#[async_trait]
pub trait ImageGenerator: Send + Sync {
    /// Returns where to find the generated image.
    async fn generate(&self, request: &ImageRequest) -> Result<GeneratedImage, ComicError>;
}

/// Downloads raw bytes.
#[async_trait]
pub trait ImageFetcher: Send + Sync {
    /// Returns the body of `url`; non-success statuses are errors.
    async fn fetch(&self, url: &str) -> Result<Vec<u8>, ComicError>;
}

/// Builds the shared HTTP client used for every upstream call.
pub fn build_http_client(timeout: Duration) -> Result<reqwest::Client, ComicError> {
    reqwest::Client::builder()
        .timeout(timeout)
        .connect_timeout(Duration::from_secs(10))
        .pool_idle_timeout(Duration::from_secs(90))
        .build()
        .map_err(|err| {
            ComicError::InternalServerError(format!("Failed to create HTTP client: {err}"))
        })
}

// -----------------------------
// Chat completions (text)
// -----------------------------

#[derive(Serialize, Debug)]
struct ChatCompletionRequest<'a> {
    model: &'a str,
    messages: [ChatMessage<'a>; 2],
}

#[derive(Serialize, Debug)]
struct ChatMessage<'a> {
    role: &'a str,
    content: &'a str,
}

#[derive(Deserialize, Debug)]
struct ChatCompletionResponse {
    #[serde(default)]
    choices: Vec<ChatChoice>,
}

#[derive(Deserialize, Debug)]
struct ChatChoice {
    message: ChatResponseMessage,
}

#[derive(Deserialize, Debug)]
struct ChatResponseMessage {
    #[serde(default)]
    content: Option<String>,
}

// -----------------------------
// Images API
// -----------------------------

/// Request body for POST /images/generations
#[derive(Serialize, Debug, Eq, PartialEq)]
struct ImagesGenerateRequest<'a> {
    model: &'a str,
    prompt: &'a str,
    n: u8,
    size: &'a str,

    #[serde(skip_serializing_if = "Option::is_none")]
    quality: Option<&'a str>,

    // GPT image models only return base64 and reject this field.
    #[serde(skip_serializing_if = "Option::is_none")]
    response_format: Option<&'a str>,
}

#[derive(Deserialize, Debug)]
struct ImagesGenerateResponse {
    #[serde(default)]
    data: Vec<ImageData>,
}

#[derive(Deserialize, Debug)]
struct ImageData {
    #[serde(default)]
    b64_json: Option<String>,
    #[serde(default)]
    url: Option<String>,
    #[serde(default)]
    revised_prompt: Option<String>,
}

#[derive(Deserialize, Debug)]
struct ApiErrorBody {
    error: ApiErrorDetail,
}

#[derive(Deserialize, Debug)]
struct ApiErrorDetail {
    message: String,
}

fn images_request_body<'a>(model: &'a str, request: &'a ImageRequest) -> ImagesGenerateRequest<'a> {
    let is_gpt_image = model.starts_with("gpt-image");
    let quality = match (model, request.quality) {
        (_, ImageQuality::Standard) if is_gpt_image => Some("medium"),
        (_, ImageQuality::Hd) if is_gpt_image => Some("high"),
        ("dall-e-3", ImageQuality::Standard) => Some("standard"),
        ("dall-e-3", ImageQuality::Hd) => Some("hd"),
        // dall-e-2 etc
        _ => None,
    };
    ImagesGenerateRequest {
        model,
        prompt: &request.prompt,
        n: request.count,
        size: request.size,
        quality,
        response_format: if is_gpt_image { None } else { Some("url") },
    }
}

/// Pulls the human readable message out of an error body when there is one.
fn api_error(endpoint: &str, status: reqwest::StatusCode, body: &[u8]) -> ComicError {
    let detail = serde_json::from_slice::<ApiErrorBody>(body)
        .map(|parsed| parsed.error.message)
        .unwrap_or_else(|_| String::from_utf8_lossy(body).to_string());
    ComicError::Upstream(format!("OpenAI {endpoint} error {status}: {detail}"))
}

/// Client for an OpenAI-compatible API, serving both the text and image side.
#[derive(Clone, Debug)]
pub struct OpenAiClient {
    client: reqwest::Client,
    api_key: String,
    base_url: Url,
    text_model: String,
    image_model: String,
}

impl OpenAiClient {
    /// `base_url` is the API root, eg `https://api.openai.com/v1/`.
    pub fn new(
        client: reqwest::Client,
        api_key: &str,
        base_url: &str,
        text_model: &str,
        image_model: &str,
    ) -> Result<Self, ComicError> {
        let mut base_url = Url::parse(base_url)?;
        if !base_url.path().ends_with('/') {
            let path = format!("{}/", base_url.path());
            base_url.set_path(&path);
        }
        Ok(Self {
            client,
            api_key: api_key.to_string(),
            base_url,
            text_model: text_model.to_string(),
            image_model: image_model.to_string(),
        })
    }

    async fn post_json<B, R>(&self, endpoint: &str, body: &B) -> Result<R, ComicError>
    where
        B: Serialize + Sync,
        R: DeserializeOwned,
    {
        let url = self.base_url.join(endpoint)?;
        let resp = self
            .client
            .post(url)
            .bearer_auth(&self.api_key)
            .json(body)
            .send()
            .await
            .map_err(|err| ComicError::Upstream(format!("Request to {endpoint} failed: {err}")))?;

        let status = resp.status();
        let bytes = resp.bytes().await.map_err(|err| {
            ComicError::Upstream(format!("Failed reading {endpoint} body: {err}"))
        })?;
        if !status.is_success() {
            return Err(api_error(endpoint, status, &bytes));
        }
        Ok(serde_json::from_slice(&bytes)?)
    }
}

#[async_trait]
impl TextGenerator for OpenAiClient {
    #[instrument(skip_all, fields(model = %self.text_model))]
    async fn complete(&self, system: &str, user: &str) -> Result<String, ComicError> {
        let request = ChatCompletionRequest {
            model: &self.text_model,
            messages: [
                ChatMessage {
                    role: "system",
                    content: system,
                },
                ChatMessage {
                    role: "user",
                    content: user,
                },
            ],
        };
        let response: ChatCompletionResponse =
            self.post_json("chat/completions", &request).await?;
        let content = response
            .choices
            .into_iter()
            .next()
            .and_then(|choice| choice.message.content)
            .ok_or_else(|| {
                ComicError::Upstream("Chat completion returned no content".to_string())
            })?;
        debug!("Chat completion returned {} chars", content.len());
        Ok(content)
    }
}

#[async_trait]
impl ImageGenerator for OpenAiClient {
    #[instrument(skip_all, fields(model = %self.image_model))]
    async fn generate(&self, request: &ImageRequest) -> Result<GeneratedImage, ComicError> {
        let body = images_request_body(&self.image_model, request);
        let response: ImagesGenerateResponse =
            self.post_json("images/generations", &body).await?;

        let first = response
            .data
            .into_iter()
            .next()
            .ok_or_else(|| ComicError::Upstream("No image data returned".to_string()))?;

        if let Some(revised_prompt) = first.revised_prompt {
            debug!("Revised prompt from OpenAI: {}", revised_prompt);
        }

        if let Some(b64_json) = first.b64_json {
            Ok(GeneratedImage::Bytes(general_purpose::STANDARD.decode(b64_json)?))
        } else if let Some(url) = first.url {
            Ok(GeneratedImage::Url(url))
        } else {
            Err(ComicError::Upstream(
                "Image response missing b64_json and url fields".to_string(),
            ))
        }
    }
}

/// Plain HTTP downloader for generated image URLs.
#[derive(Clone, Debug)]
pub struct HttpImageFetcher {
    client: reqwest::Client,
}

impl HttpImageFetcher {
    /// Wraps a shared client.
    pub fn new(client: reqwest::Client) -> Self {
        Self { client }
    }
}

#[async_trait]
impl ImageFetcher for HttpImageFetcher {
    async fn fetch(&self, url: &str) -> Result<Vec<u8>, ComicError> {
        let resp = self
            .client
            .get(url)
            .send()
            .await
            .map_err(|err| ComicError::Download(err.to_string()))?;
        let status = resp.status();
        if !status.is_success() {
            return Err(ComicError::Download(format!("{status} from {url}")));
        }
        let bytes = resp
            .bytes()
            .await
            .map_err(|err| ComicError::Download(err.to_string()))?;
        debug!("Downloaded {} bytes", bytes.len());
        Ok(bytes.to_vec())
    }
}
