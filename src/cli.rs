//! CLI parser
use clap::{Args, Parser};
use std::num::NonZeroU16;
use std::path::PathBuf;
use std::time::Duration;

use crate::constants::{
    DEFAULT_IMAGE_DIR, DEFAULT_IMAGE_MODEL, DEFAULT_OPENAI_BASE_URL,
    DEFAULT_REQUEST_TIMEOUT_SECONDS, DEFAULT_TEXT_MODEL,
};
use crate::error::ComicError;
use crate::openai::{ImageQuality, OpenAiClient, build_http_client};

#[derive(Parser, Debug)]
/// CLI Options
pub struct CliOptions {
    #[clap(long, help = "Enable debug logging", env = "COMICGEN_DEBUG")]
    /// Enable debug logging. Env: COMICGEN_DEBUG
    pub debug: bool,
    #[clap(long, short, default_value = "5000", env = "COMICGEN_PORT")]
    /// http listener, defaults to `5000`.
    /// Env: COMICGEN_PORT
    pub port: NonZeroU16,
    #[clap(
        long,
        short,
        default_value = "127.0.0.1",
        env = "COMICGEN_LISTEN_ADDRESS"
    )]
    /// Listen address, defaults to `127.0.0.1`.
    /// Env: COMICGEN_LISTEN_ADDRESS
    pub listen_address: String,

    #[clap(long, short, default_value = DEFAULT_IMAGE_DIR, env = "COMICGEN_IMAGE_DIR")]
    /// Where generated panel images are written and served from.
    /// Env: COMICGEN_IMAGE_DIR
    pub image_dir: PathBuf,

    #[command(flatten)]
    /// Model settings
    pub openai: OpenAiOptions,
}

/// Settings for the OpenAI-compatible API, shared by every binary.
#[derive(Args, Debug, Clone)]
pub struct OpenAiOptions {
    /// OpenAI API key
    #[arg(required = true, long, env = "OPENAI_API_KEY", hide_env_values = true)]
    pub openai_api_key: String,

    /// API root, change it to point at a compatible server
    #[arg(long, default_value = DEFAULT_OPENAI_BASE_URL, env = "OPENAI_BASE_URL")]
    pub openai_base_url: String,

    /// Text model used to write the script
    #[arg(long, default_value = DEFAULT_TEXT_MODEL, env = "COMICGEN_TEXT_MODEL")]
    pub text_model: String,

    /// Image model used to draw each panel
    #[arg(long, default_value = DEFAULT_IMAGE_MODEL, env = "COMICGEN_IMAGE_MODEL")]
    pub image_model: String,

    /// Quality tier for panel illustrations
    #[arg(
        long,
        value_enum,
        default_value_t = ImageQuality::Standard,
        env = "COMICGEN_IMAGE_QUALITY"
    )]
    pub image_quality: ImageQuality,

    /// Seconds before an upstream call is abandoned
    #[arg(long, default_value_t = DEFAULT_REQUEST_TIMEOUT_SECONDS, env = "COMICGEN_REQUEST_TIMEOUT")]
    pub request_timeout: u64,
}

impl OpenAiOptions {
    /// Builds the shared HTTP client and the API client on top of it.
    pub fn build_clients(&self) -> Result<(reqwest::Client, OpenAiClient), ComicError> {
        let http = build_http_client(Duration::from_secs(self.request_timeout))?;
        let client = OpenAiClient::new(
            http.clone(),
            &self.openai_api_key,
            &self.openai_base_url,
            &self.text_model,
            &self.image_model,
        )?;
        Ok((http, client))
    }
}
