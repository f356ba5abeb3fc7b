//! Joins panel images into a single downloadable strip.
//!
//! Panels are laid out two per row, in order, each cropped to a square tile
//! and framed, on a white page.

use std::io::Cursor;

use image::imageops::{self, FilterType};
use image::{DynamicImage, ImageFormat, Rgb, RgbImage};

use crate::error::ComicError;

/// Edge of the square each panel is scaled and cropped to.
pub const TILE_SIZE: u32 = 512;
/// Panels per row.
pub const COLUMNS: u32 = 2;
/// Space around and between framed panels.
pub const GUTTER: u32 = 20;
/// Frame width around each panel.
pub const BORDER: u32 = 2;

const PAGE: Rgb<u8> = Rgb([255, 255, 255]);
const INK: Rgb<u8> = Rgb([0, 0, 0]);

/// Renders `panels` as one PNG.
pub fn compose_strip(panels: &[DynamicImage]) -> Result<Vec<u8>, ComicError> {
    if panels.is_empty() {
        return Err(ComicError::BadRequest("no panels to download".to_string()));
    }

    let count = u32::try_from(panels.len())
        .map_err(|_| ComicError::BadRequest("too many panels".to_string()))?;
    let columns = count.min(COLUMNS);
    let rows = count.div_ceil(COLUMNS);
    let framed = TILE_SIZE + 2 * BORDER;
    let mut page = RgbImage::from_pixel(
        columns * framed + (columns + 1) * GUTTER,
        rows * framed + (rows + 1) * GUTTER,
        PAGE,
    );
    let frame = RgbImage::from_pixel(framed, framed, INK);

    for (position, panel) in (0u32..).zip(panels) {
        let x = GUTTER + (position % COLUMNS) * (framed + GUTTER);
        let y = GUTTER + (position / COLUMNS) * (framed + GUTTER);
        let tile = panel
            .resize_to_fill(TILE_SIZE, TILE_SIZE, FilterType::Triangle)
            .to_rgb8();
        imageops::overlay(&mut page, &frame, i64::from(x), i64::from(y));
        imageops::overlay(
            &mut page,
            &tile,
            i64::from(x + BORDER),
            i64::from(y + BORDER),
        );
    }

    let mut output = Vec::new();
    page.write_to(&mut Cursor::new(&mut output), ImageFormat::Png)?;
    Ok(output)
}
