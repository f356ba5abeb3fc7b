//! Error handling

use axum::response::IntoResponse;
use tracing::info;

/// Error definitions for the comic generator.
#[derive(Debug)]
pub enum ComicError {
    /// The text or image model call failed
    Upstream(String),
    /// Downloading a generated image failed
    Download(String),
    /// Image bytes could not be decoded
    InvalidImage(String),
    /// Reading or writing the image directory failed
    Storage(std::io::Error),
    /// When you didn't do the right thing
    BadRequest(String),
    /// When an internal server error occurs
    InternalServerError(String),
}

impl std::fmt::Display for ComicError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Upstream(message) => write!(f, "{message}"),
            Self::Download(message) => write!(f, "Failed to download image: {message}"),
            Self::InvalidImage(message) => write!(f, "Invalid image data: {message}"),
            Self::Storage(err) => write!(f, "Image storage error: {err}"),
            Self::BadRequest(message) => write!(f, "Bad request: {message}"),
            Self::InternalServerError(message) => write!(f, "{message}"),
        }
    }
}

impl std::error::Error for ComicError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Storage(err) => Some(err),
            _ => None,
        }
    }
}

impl From<std::io::Error> for ComicError {
    fn from(err: std::io::Error) -> Self {
        ComicError::Storage(err)
    }
}

impl From<reqwest::Error> for ComicError {
    fn from(err: reqwest::Error) -> Self {
        ComicError::Upstream(err.to_string())
    }
}

impl From<serde_json::Error> for ComicError {
    fn from(err: serde_json::Error) -> Self {
        ComicError::Upstream(format!("Unexpected response format: {err}"))
    }
}

impl From<url::ParseError> for ComicError {
    fn from(err: url::ParseError) -> Self {
        ComicError::InternalServerError(err.to_string())
    }
}

impl From<image::ImageError> for ComicError {
    fn from(err: image::ImageError) -> Self {
        ComicError::InvalidImage(err.to_string())
    }
}

impl From<base64::DecodeError> for ComicError {
    fn from(err: base64::DecodeError) -> Self {
        ComicError::InvalidImage(err.to_string())
    }
}

impl IntoResponse for ComicError {
    fn into_response(self) -> axum::response::Response {
        let (status, body) = match &self {
            ComicError::BadRequest(message) => {
                info!("Bad request received: {}", message);
                (axum::http::StatusCode::BAD_REQUEST, "Bad Request")
            }
            ComicError::Upstream(_) | ComicError::Download(_) => {
                tracing::error!("Upstream error: {}", self);
                (axum::http::StatusCode::BAD_GATEWAY, "Upstream error")
            }
            ComicError::InvalidImage(_)
            | ComicError::Storage(_)
            | ComicError::InternalServerError(_) => {
                tracing::error!("Internal server error: {}", self);
                (
                    axum::http::StatusCode::INTERNAL_SERVER_ERROR,
                    "Internal server error",
                )
            }
        };
        let mut response = axum::response::Response::new(axum::body::Body::from(body));
        *response.status_mut() = status;
        response
    }
}
