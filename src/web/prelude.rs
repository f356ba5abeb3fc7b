pub(crate) use crate::error::ComicError;
pub(crate) use crate::orchestrator::ComicEnvelope;
pub(crate) use crate::web::AppState;
pub(crate) use askama::Template;
pub(crate) use askama_web::WebTemplate;
pub(crate) use axum::Json;
pub(crate) use axum::extract::State;
pub(crate) use axum::extract::rejection::JsonRejection;
pub(crate) use serde::Deserialize;
pub(crate) use tracing::info;
