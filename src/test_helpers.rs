//! Shared test utilities: fake model collaborators and image fixtures.
//!
//! ```rust,ignore
//! use crate::test_helpers::*;
//!
//! let dir = tempfile::tempdir().unwrap();
//! let comic = fake_orchestrator(dir.path(), FakeText::replying(THREE_PANELS));
//! ```

use std::io::Cursor;
use std::path::Path;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use image::{ImageFormat, Rgb, RgbImage};

use crate::constants::PUBLIC_IMAGE_PREFIX;
use crate::error::ComicError;
use crate::openai::{
    GeneratedImage, ImageFetcher, ImageGenerator, ImageQuality, ImageRequest, TextGenerator,
};
use crate::orchestrator::ComicOrchestrator;
use crate::store::ImageStore;

/// The shape GPT-4 usually answers a 3-panel request with.
pub const THREE_PANELS: &str = "Panel 1:\nScene: A robot in a kitchen\nRobot: What is flour?\nVisual elements: apron\n\nPanel 2:\nScene: Flour explodes\nRobot: Oops.\nVisual elements: white cloud\n\nPanel 3:\nScene: A lopsided cake\nRobot: Perfect.\nVisual elements: candles";

/// A two panel continuation.
pub const TWO_PANELS: &str = "Panel 1:\nScene: The cake walks away\nRobot: Come back!\n\nPanel 2:\nScene: Robot chases cake\nCake: Never!";

/// A tiny valid PNG.
pub fn sample_png() -> Vec<u8> {
    let mut output = Vec::new();
    RgbImage::from_pixel(4, 4, Rgb([200, 40, 40]))
        .write_to(&mut Cursor::new(&mut output), ImageFormat::Png)
        .expect("encode sample png");
    output
}

/// Sorted file names in `dir`.
pub fn saved_files(dir: &Path) -> Vec<String> {
    let mut names: Vec<String> = std::fs::read_dir(dir)
        .expect("read dir")
        .map(|entry| {
            entry
                .expect("dir entry")
                .file_name()
                .to_string_lossy()
                .to_string()
        })
        .collect();
    names.sort();
    names
}

/// Text model that always gives the same answer and records its calls.
pub struct FakeText {
    reply: Result<String, String>,
    /// `(system, user)` per call
    pub calls: Mutex<Vec<(String, String)>>,
}

impl FakeText {
    pub fn replying(reply: &str) -> Arc<Self> {
        Arc::new(Self {
            reply: Ok(reply.to_string()),
            calls: Mutex::new(Vec::new()),
        })
    }

    pub fn failing(message: &str) -> Arc<Self> {
        Arc::new(Self {
            reply: Err(message.to_string()),
            calls: Mutex::new(Vec::new()),
        })
    }
}

#[async_trait]
impl TextGenerator for FakeText {
    async fn complete(&self, system: &str, user: &str) -> Result<String, ComicError> {
        self.calls
            .lock()
            .expect("lock")
            .push((system.to_string(), user.to_string()));
        self.reply.clone().map_err(ComicError::Upstream)
    }
}

/// Image model handing out fake URLs, or inline PNGs.
#[derive(Default)]
pub struct FakeImages {
    pub prompts: Mutex<Vec<String>>,
    pub qualities: Mutex<Vec<ImageQuality>>,
    /// 1-based call that fails
    pub fail_on: Option<usize>,
    pub inline: bool,
}

#[async_trait]
impl ImageGenerator for FakeImages {
    async fn generate(&self, request: &ImageRequest) -> Result<GeneratedImage, ComicError> {
        let call = {
            let mut prompts = self.prompts.lock().expect("lock");
            prompts.push(request.prompt.clone());
            prompts.len()
        };
        self.qualities.lock().expect("lock").push(request.quality);
        if self.fail_on == Some(call) {
            return Err(ComicError::Upstream("content policy violation".to_string()));
        }
        if self.inline {
            return Ok(GeneratedImage::Bytes(sample_png()));
        }
        Ok(GeneratedImage::Url(format!("https://images.test/{call}.png")))
    }
}

/// Downloader that returns [`sample_png`] for any URL.
#[derive(Default)]
pub struct FakeFetcher {
    pub urls: Mutex<Vec<String>>,
}

#[async_trait]
impl ImageFetcher for FakeFetcher {
    async fn fetch(&self, url: &str) -> Result<Vec<u8>, ComicError> {
        self.urls.lock().expect("lock").push(url.to_string());
        Ok(sample_png())
    }
}

/// Orchestrator over `dir` with the given collaborators.
pub fn orchestrator_with(
    dir: &Path,
    text: Arc<FakeText>,
    images: Arc<FakeImages>,
    fetcher: Arc<FakeFetcher>,
) -> ComicOrchestrator {
    ComicOrchestrator::new(
        ImageStore::new(dir, PUBLIC_IMAGE_PREFIX),
        text,
        images,
        fetcher,
    )
}

/// Orchestrator over `dir` with default image fakes.
pub fn fake_orchestrator(dir: &Path, text: Arc<FakeText>) -> ComicOrchestrator {
    orchestrator_with(
        dir,
        text,
        Arc::new(FakeImages::default()),
        Arc::new(FakeFetcher::default()),
    )
}
