//! The directory of generated panel images: naming, writing and purging.
//!
//! Files are named `{role}_{index}_{unix_timestamp}.png` and served by name
//! under a public prefix. `placeholder.png` lives in the same directory and is
//! never purged.

use std::io::{Cursor, ErrorKind};
use std::path::{Path, PathBuf};

use chrono::Utc;
use image::{DynamicImage, ImageFormat, Rgb, RgbImage};
use tokio::io::AsyncWriteExt;
use tracing::{debug, error, info, warn};

use crate::constants::{
    GENERATED_IMAGE_EXTENSION, GENERATED_IMAGE_PREFIX, MAX_STRIP_PANELS, PLACEHOLDER_FILENAME,
};
use crate::error::ComicError;
use crate::panel::PanelRole;

const PLACEHOLDER_SIZE: u32 = 256;
const PLACEHOLDER_COLOUR: Rgb<u8> = Rgb([229, 231, 235]);
const SAVE_ATTEMPTS: usize = 16;

/// Owns the image directory; nothing else touches it.
#[derive(Clone, Debug)]
pub struct ImageStore {
    dir: PathBuf,
    public_prefix: String,
}

impl ImageStore {
    /// Creates a store over `dir`, whose files are served under `public_prefix`.
    pub fn new(dir: impl Into<PathBuf>, public_prefix: &str) -> Self {
        Self {
            dir: dir.into(),
            public_prefix: public_prefix.trim_end_matches('/').to_string(),
        }
    }

    /// The managed directory.
    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Public path of the placeholder image.
    pub fn placeholder_url(&self) -> String {
        self.public_path(PLACEHOLDER_FILENAME)
    }

    /// Creates the directory and the placeholder image if they are missing.
    pub async fn init(&self) -> Result<(), ComicError> {
        tokio::fs::create_dir_all(&self.dir).await?;
        let placeholder = self.dir.join(PLACEHOLDER_FILENAME);
        if tokio::fs::try_exists(&placeholder).await? {
            return Ok(());
        }
        tokio::fs::write(&placeholder, placeholder_png()?).await?;
        info!("Wrote placeholder image to {}", placeholder.display());
        Ok(())
    }

    /// Deletes every generated panel image and returns how many went.
    ///
    /// Best effort: failures are logged and skipped, never returned.
    pub async fn purge_generated(&self) -> usize {
        let mut entries = match tokio::fs::read_dir(&self.dir).await {
            Ok(entries) => entries,
            Err(err) if err.kind() == ErrorKind::NotFound => {
                debug!("Image dir {} does not exist yet", self.dir.display());
                return 0;
            }
            Err(err) => {
                error!("Error clearing old images in {}: {}", self.dir.display(), err);
                return 0;
            }
        };

        let mut deleted = 0;
        loop {
            let entry = match entries.next_entry().await {
                Ok(Some(entry)) => entry,
                Ok(None) => break,
                Err(err) => {
                    error!("Error listing {}: {}", self.dir.display(), err);
                    break;
                }
            };
            let is_generated = entry
                .file_name()
                .to_str()
                .map(is_generated_image)
                .unwrap_or(false);
            if !is_generated {
                continue;
            }
            let path = entry.path();
            match tokio::fs::remove_file(&path).await {
                Ok(()) => {
                    debug!("Deleted old image: {}", path.display());
                    deleted += 1;
                }
                Err(err) => warn!("Error deleting {}: {}", path.display(), err),
            }
        }
        info!("Cleared {} old panel images", deleted);
        deleted
    }

    /// Writes a panel image and returns the path a client can load it from.
    ///
    /// Never replaces an existing file. When another request already took the
    /// name, the timestamp is moved forward a second at a time until a free
    /// name is found.
    pub async fn save(
        &self,
        bytes: &[u8],
        role: PanelRole,
        index: usize,
    ) -> Result<String, ComicError> {
        self.save_at(bytes, role, index, Utc::now().timestamp()).await
    }

    async fn save_at(
        &self,
        bytes: &[u8],
        role: PanelRole,
        index: usize,
        timestamp: i64,
    ) -> Result<String, ComicError> {
        let mut timestamp = timestamp;
        for _ in 0..SAVE_ATTEMPTS {
            let filename = image_filename(role, index, timestamp);
            let path = self.dir.join(&filename);
            let mut file = match tokio::fs::OpenOptions::new()
                .write(true)
                .create_new(true)
                .open(&path)
                .await
            {
                Ok(file) => file,
                Err(err) if err.kind() == ErrorKind::AlreadyExists => {
                    debug!("{} is taken, trying the next second", filename);
                    timestamp += 1;
                    continue;
                }
                Err(err) => return Err(err.into()),
            };
            file.write_all(bytes).await?;
            file.flush().await?;
            debug!("Saved {} bytes to {}", bytes.len(), path.display());
            return Ok(self.public_path(&filename));
        }
        Err(ComicError::Storage(std::io::Error::new(
            ErrorKind::AlreadyExists,
            format!("no free name for {role} {index} after {SAVE_ATTEMPTS} tries"),
        )))
    }

    /// Maps a public path handed out by [`ImageStore::save`] back to the file.
    ///
    /// Only panel images and the placeholder directly inside the managed
    /// directory resolve.
    pub fn resolve(&self, public_path: &str) -> Option<PathBuf> {
        let name = public_path
            .strip_prefix(&self.public_prefix)?
            .strip_prefix('/')?;
        if name.contains(['/', '\\']) {
            return None;
        }
        (name == PLACEHOLDER_FILENAME || is_generated_image(name)).then(|| self.dir.join(name))
    }

    /// Loads the images behind `public_paths`, in order, for a strip download.
    ///
    /// A file that has gone missing (eg purged by a newer strip) is drawn as
    /// the placeholder.
    pub async fn load_strip_panels(
        &self,
        public_paths: &[String],
    ) -> Result<Vec<DynamicImage>, ComicError> {
        if public_paths.len() > MAX_STRIP_PANELS {
            return Err(ComicError::BadRequest(format!(
                "at most {MAX_STRIP_PANELS} panels per download, got {}",
                public_paths.len()
            )));
        }

        let mut panels = Vec::with_capacity(public_paths.len());
        for public_path in public_paths {
            let path = self.resolve(public_path).ok_or_else(|| {
                ComicError::BadRequest(format!("not a comic image: {public_path}"))
            })?;
            let bytes = match tokio::fs::read(&path).await {
                Ok(bytes) => bytes,
                Err(err) => {
                    warn!("Using placeholder for {}: {}", path.display(), err);
                    placeholder_png()?
                }
            };
            panels.push(image::load_from_memory(&bytes)?);
        }
        Ok(panels)
    }

    fn public_path(&self, filename: &str) -> String {
        format!("{}/{}", self.public_prefix, filename)
    }
}

/// Filename for the `index`th (1-based) image of a batch.
pub fn image_filename(role: PanelRole, index: usize, timestamp: i64) -> String {
    format!("{role}_{index}_{timestamp}.{GENERATED_IMAGE_EXTENSION}")
}

fn is_generated_image(name: &str) -> bool {
    if name == PLACEHOLDER_FILENAME || !name.starts_with(GENERATED_IMAGE_PREFIX) {
        return false;
    }
    Path::new(name)
        .extension()
        .and_then(|ext| ext.to_str())
        .map(|ext| ext.eq_ignore_ascii_case(GENERATED_IMAGE_EXTENSION))
        .unwrap_or(false)
}

/// Ensures image bytes are a valid PNG, converting if possible.
pub fn normalize_image_to_png(bytes: &[u8]) -> Result<Vec<u8>, ComicError> {
    if bytes.len() < 4 {
        return Err(ComicError::InvalidImage(format!(
            "only {} bytes received",
            bytes.len()
        )));
    }

    let reader = image::ImageReader::new(Cursor::new(bytes))
        .with_guessed_format()
        .map_err(|err| ComicError::InvalidImage(err.to_string()))?;
    let format = reader.format();
    let image = reader.decode()?;

    if format == Some(ImageFormat::Png) {
        return Ok(bytes.to_vec());
    }

    debug!("Converting {:?} image to png", format);
    let mut output = Vec::new();
    image.write_to(&mut Cursor::new(&mut output), ImageFormat::Png)?;
    Ok(output)
}

fn placeholder_png() -> Result<Vec<u8>, ComicError> {
    let image = RgbImage::from_pixel(PLACEHOLDER_SIZE, PLACEHOLDER_SIZE, PLACEHOLDER_COLOUR);
    let mut output = Vec::new();
    image.write_to(&mut Cursor::new(&mut output), ImageFormat::Png)?;
    Ok(output)
}
