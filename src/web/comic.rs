//! JSON endpoints for drawing, extending and downloading a strip.
//!
//! Generate and continue answer 200 with a [`ComicEnvelope`]; generation
//! failures are reported in the body as `{"success": false, "error": "..."}`.
//! Only a body that is not the expected JSON gets a 400. The download answers
//! with PNG bytes, or an error status when the image list is unusable.

use axum::http::header::{CONTENT_DISPOSITION, CONTENT_TYPE};
use axum::response::IntoResponse;

use super::prelude::*;
use crate::constants::STRIP_DOWNLOAD_FILENAME;
use crate::strip::compose_strip;

#[derive(Deserialize, Debug)]
pub(crate) struct GenerateComicRequest {
    #[serde(default)]
    initial_idea: String,
}

#[derive(Deserialize, Debug)]
pub(crate) struct ContinueComicRequest {
    #[serde(default)]
    current_story: String,
    #[serde(default)]
    user_choice: String,
}

#[derive(Deserialize, Debug)]
pub(crate) struct DownloadComicRequest {
    /// Public image paths, in reading order
    #[serde(default)]
    images: Vec<String>,
}

/// handles the /generate-comic POST
pub(crate) async fn generate_comic_handler(
    State(state): State<AppState>,
    payload: Result<Json<GenerateComicRequest>, JsonRejection>,
) -> Result<Json<ComicEnvelope>, ComicError> {
    let Json(request) =
        payload.map_err(|rejection| ComicError::BadRequest(rejection.body_text()))?;
    info!("Generating comic for idea: {}", request.initial_idea);
    Ok(Json(
        state
            .orchestrator
            .generate_from_idea(&request.initial_idea)
            .await,
    ))
}

/// handles the /continue-comic POST
pub(crate) async fn continue_comic_handler(
    State(state): State<AppState>,
    payload: Result<Json<ContinueComicRequest>, JsonRejection>,
) -> Result<Json<ComicEnvelope>, ComicError> {
    let Json(request) =
        payload.map_err(|rejection| ComicError::BadRequest(rejection.body_text()))?;
    info!("Continuing comic with: {}", request.user_choice);
    Ok(Json(
        state
            .orchestrator
            .continue_from_choice(&request.current_story, &request.user_choice)
            .await,
    ))
}

/// handles the /download-comic POST, answering with the strip as a PNG
pub(crate) async fn download_comic_handler(
    State(state): State<AppState>,
    payload: Result<Json<DownloadComicRequest>, JsonRejection>,
) -> Result<impl IntoResponse, ComicError> {
    let Json(request) =
        payload.map_err(|rejection| ComicError::BadRequest(rejection.body_text()))?;
    info!("Building a strip from {} panels", request.images.len());
    let panels = state
        .orchestrator
        .store()
        .load_strip_panels(&request.images)
        .await?;
    let png = tokio::task::spawn_blocking(move || compose_strip(&panels))
        .await
        .map_err(|err| {
            ComicError::InternalServerError(format!("Strip render failed: {err}"))
        })??;

    Ok((
        [
            (CONTENT_TYPE, "image/png".to_string()),
            (
                CONTENT_DISPOSITION,
                format!("attachment; filename=\"{STRIP_DOWNLOAD_FILENAME}\""),
            ),
        ],
        png,
    ))
}
