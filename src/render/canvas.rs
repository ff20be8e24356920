use image::{imageops, RgbaImage};
use voxmap_common::{Bounds, MapError, Result};

use super::footer::{draw_footer, FOOTER_HEIGHT};
use super::orientation::Orientation;

/// Edge length of one tile on the canvas, in pixels.
pub const TILE_PIXELS: u32 = 16;

/// Largest canvas allocated, in pixels (4 GiB of RGBA).
pub const MAX_CANVAS_PIXELS: u64 = 1 << 30;

/// The composite map image plus the footer band below it.
#[derive(Debug)]
pub struct Canvas {
    image: RgbaImage,
    bounds: Bounds,
    orientation: Orientation,
}

impl Canvas {
    pub fn new(bounds: Bounds, orientation: Orientation) -> Result<Self> {
        let (cols, rows) = orientation.grid_dims(bounds.width, bounds.height);
        let width = cols.checked_mul(TILE_PIXELS);
        let height = rows
            .checked_mul(TILE_PIXELS)
            .and_then(|h| h.checked_add(FOOTER_HEIGHT));
        let (Some(width), Some(height)) = (width, height) else {
            return Err(MapError::ImageError(format!(
                "a {}x{} tile map does not fit in one image",
                cols, rows
            )));
        };
        if width as u64 * height as u64 > MAX_CANVAS_PIXELS {
            return Err(MapError::ImageError(format!(
                "a {}x{} pixel map is larger than the {} pixel limit",
                width, height, MAX_CANVAS_PIXELS
            )));
        }
        Ok(Canvas {
            image: RgbaImage::new(width, height),
            bounds,
            orientation,
        })
    }

    pub fn bounds(&self) -> &Bounds {
        &self.bounds
    }

    /// Height of the map area, where the footer starts.
    pub fn map_height(&self) -> u32 {
        self.image.height() - FOOTER_HEIGHT
    }

    /// Pixel origin of the tile at world coordinates `(x, z)`.
    pub fn tile_origin(&self, x: i32, z: i32) -> (u32, u32) {
        let (col, row) = self.orientation.place(&self.bounds, x, z);
        (col * TILE_PIXELS, row * TILE_PIXELS)
    }

    /// Alpha-composites a rendered tile over its cell.
    pub fn composite(&mut self, x: i32, z: i32, tile: &RgbaImage) {
        let (px, py) = self.tile_origin(x, z);
        imageops::overlay(&mut self.image, tile, px as i64, py as i64);
    }

    pub fn draw_footer(&mut self, lines: &[String]) {
        let top = self.map_height();
        draw_footer(&mut self.image, top, lines);
    }

    pub fn image(&self) -> &RgbaImage {
        &self.image
    }

    pub fn into_image(self) -> RgbaImage {
        self.image
    }
}
