//! Runs a generation request end to end: script, parse, draw, download, save.

use std::sync::Arc;

use serde::Serialize;
use tracing::{debug, error, info, instrument};

use crate::constants::{
    CONTINUE_SYSTEM_PROMPT, GENERATE_SYSTEM_PROMPT, IMAGE_PROMPT_PREFIX, PANEL_FIELDS_REQUEST,
};
use crate::error::ComicError;
use crate::openai::{
    GeneratedImage, ImageFetcher, ImageGenerator, ImageQuality, ImageRequest, TextGenerator,
};
use crate::panel::{Panel, PanelRole};
use crate::parser::parse_panels;
use crate::store::{ImageStore, normalize_image_to_png};

/// JSON envelope returned for both operations.
#[derive(Clone, Debug, Default, Eq, PartialEq, Serialize)]
pub struct ComicEnvelope {
    /// Whether the whole request worked
    pub success: bool,
    /// Panels of a fresh strip
    #[serde(skip_serializing_if = "Option::is_none")]
    pub panels: Option<Vec<Panel>>,
    /// Panels appended by a continuation
    #[serde(skip_serializing_if = "Option::is_none")]
    pub new_panels: Option<Vec<Panel>>,
    /// Error message when `success` is false
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl ComicEnvelope {
    fn failure(err: &ComicError) -> Self {
        Self {
            success: false,
            error: Some(err.to_string()),
            ..Default::default()
        }
    }
}

/// Coordinates the model collaborators, the parser and the image store.
#[derive(Clone)]
pub struct ComicOrchestrator {
    store: ImageStore,
    text: Arc<dyn TextGenerator>,
    images: Arc<dyn ImageGenerator>,
    fetcher: Arc<dyn ImageFetcher>,
    image_quality: ImageQuality,
}

impl std::fmt::Debug for ComicOrchestrator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ComicOrchestrator")
            .field("store", &self.store)
            .field("image_quality", &self.image_quality)
            .finish_non_exhaustive()
    }
}

impl ComicOrchestrator {
    /// Wires the orchestrator up with its collaborators.
    pub fn new(
        store: ImageStore,
        text: Arc<dyn TextGenerator>,
        images: Arc<dyn ImageGenerator>,
        fetcher: Arc<dyn ImageFetcher>,
    ) -> Self {
        Self {
            store,
            text,
            images,
            fetcher,
            image_quality: ImageQuality::default(),
        }
    }

    /// Quality tier asked of the image model for every panel.
    pub fn with_image_quality(mut self, image_quality: ImageQuality) -> Self {
        self.image_quality = image_quality;
        self
    }

    /// The image store this orchestrator writes to.
    pub fn store(&self) -> &ImageStore {
        &self.store
    }

    /// Purges the previous strip and draws a new 3-panel one from `idea`.
    #[instrument(skip(self))]
    pub async fn generate_from_idea(&self, idea: &str) -> ComicEnvelope {
        self.store.purge_generated().await;
        let user = format!(
            "Create a 3-panel comic strip based on this idea: {idea}. {PANEL_FIELDS_REQUEST}"
        );
        match self
            .draw_strip(GENERATE_SYSTEM_PROMPT, &user, PanelRole::Panel)
            .await
        {
            Ok(panels) => ComicEnvelope {
                success: true,
                panels: Some(panels),
                ..Default::default()
            },
            Err(err) => {
                error!("Failed to generate comic: {}", err);
                ComicEnvelope::failure(&err)
            }
        }
    }

    /// Adds two panels to `current_story`, steered by `user_choice`.
    #[instrument(skip(self, current_story))]
    pub async fn continue_from_choice(
        &self,
        current_story: &str,
        user_choice: &str,
    ) -> ComicEnvelope {
        let user = format!(
            "Here's the current comic strip: {current_story}\n\nThe reader wants the story to continue with: {user_choice}\n\nCreate 2 more panels for the comic strip. {PANEL_FIELDS_REQUEST}"
        );
        match self
            .draw_strip(CONTINUE_SYSTEM_PROMPT, &user, PanelRole::Continuation)
            .await
        {
            Ok(panels) => ComicEnvelope {
                success: true,
                new_panels: Some(panels),
                ..Default::default()
            },
            Err(err) => {
                error!("Failed to continue comic: {}", err);
                ComicEnvelope::failure(&err)
            }
        }
    }

    /// Any failure drops the whole batch.
    async fn draw_strip(
        &self,
        system: &str,
        user: &str,
        role: PanelRole,
    ) -> Result<Vec<Panel>, ComicError> {
        let script = self.text.complete(system, user).await?;
        let mut panels = parse_panels(&script);
        info!("Parsed {} panels from the script", panels.len());

        for (offset, panel) in panels.iter_mut().enumerate() {
            let index = offset + 1;
            let prompt = format!("{IMAGE_PROMPT_PREFIX}{}", panel.scene_description);
            let request = ImageRequest::panel(prompt, self.image_quality);
            let image = self.images.generate(&request).await?;
            let bytes = match image {
                GeneratedImage::Url(url) => {
                    debug!("Downloading panel {} from {}", index, url);
                    self.fetcher.fetch(&url).await?
                }
                GeneratedImage::Bytes(bytes) => bytes,
            };
            let png = normalize_image_to_png(&bytes)?;
            panel.image_path = Some(self.store.save(&png, role, index).await?);
        }
        Ok(panels)
    }
}
