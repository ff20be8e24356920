//! Turning one loaded tile into a 16×16 image.

use image::{Rgba, RgbaImage};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use std::sync::Arc;
use voxmap_common::MapError;
use voxmap_world::tile::{TILE_HEIGHT, TILE_WIDTH};
use voxmap_world::Tile;

use super::orientation::Orientation;
use super::palette::{color_of, is_fiery, is_watery, AIR};

/// Brightness at which table colors are used unscaled.
pub const FULL_BRIGHTNESS: i32 = 128;
/// Light level assumed above the top layer, already offset by one.
const OPEN_SKY_LIGHT: i32 = 16;
const WATER_SURFACE_ALPHA: u8 = 128;

/// A per-tile rendering strategy. Implementations must be pure so that tiles
/// can be rasterized on any worker.
pub trait Rasterizer: Send + Sync {
    fn rasterize(&self, tile: &Tile, orientation: Orientation) -> RgbaImage;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ShadingMode {
    #[default]
    Flat,
    HeightCued,
}

impl ShadingMode {
    pub fn rasterizer(self) -> Arc<dyn Rasterizer> {
        match self {
            ShadingMode::Flat => Arc::new(FlatShading),
            ShadingMode::HeightCued => Arc::new(HeightCuedShading),
        }
    }
}

impl fmt::Display for ShadingMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ShadingMode::Flat => write!(f, "flat"),
            ShadingMode::HeightCued => write!(f, "height-cued"),
        }
    }
}

impl FromStr for ShadingMode {
    type Err = MapError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "flat" => Ok(ShadingMode::Flat),
            "height-cued" | "heightcued" => Ok(ShadingMode::HeightCued),
            _ => Err(MapError::ConfigError(format!(
                "unknown shading {:?}, expected flat or height-cued",
                s
            ))),
        }
    }
}

fn blank_tile_image() -> RgbaImage {
    RgbaImage::new(TILE_WIDTH as u32, TILE_WIDTH as u32)
}

/// Top surface color of every column.
#[derive(Debug, Clone, Copy, Default)]
pub struct FlatShading;

impl Rasterizer for FlatShading {
    fn rasterize(&self, tile: &Tile, orientation: Orientation) -> RgbaImage {
        let mut img = blank_tile_image();
        for x in 0..TILE_WIDTH {
            for z in 0..TILE_WIDTH {
                let top = (0..TILE_HEIGHT)
                    .rev()
                    .map(|y| tile.block_at(x, z, y))
                    .find(|&id| id != AIR);
                if let Some(id) = top {
                    let (col, row) = orientation.place_pixel(x, z);
                    img.put_pixel(col as u32, row as u32, Rgba(color_of(id)));
                }
            }
        }
        img
    }
}

/// Blends every column front to back, darkening blocks by their light and
/// depth so terrain height reads from the image.
#[derive(Debug, Clone, Copy, Default)]
pub struct HeightCuedShading;

impl HeightCuedShading {
    /// Light reaching the face of the voxel at `y`, plus one.
    fn light_above(tile: &Tile, x: usize, z: usize, y: usize) -> i32 {
        let above = y + 1;
        if above >= TILE_HEIGHT {
            return OPEN_SKY_LIGHT;
        }
        let sky = tile.sky_light_at(x, z, above);
        let block = tile.block_light_at(x, z, above);
        sky.max(block) as i32 + 1
    }

    fn brightness(light: i32, y: usize) -> i32 {
        let l = light * 4;
        ((0.8 * l as f64 + 0.5 * y as f64) as i32).min(FULL_BRIGHTNESS)
    }

    fn shade_column(tile: &Tile, x: usize, z: usize) -> [i32; 4] {
        let mut acc = [0i32; 4];
        for y in (0..TILE_HEIGHT).rev() {
            let id = tile.block_at(x, z, y);
            if id == AIR {
                continue;
            }
            let mut sample = color_of(id);
            if is_fiery(id) {
                blend(&mut acc, sample, FULL_BRIGHTNESS);
            } else {
                let brightness = Self::brightness(Self::light_above(tile, x, z, y), y);
                if is_watery(id) {
                    let exposed = y + 1 >= TILE_HEIGHT || tile.block_at(x, z, y + 1) == AIR;
                    if exposed {
                        sample[3] = WATER_SURFACE_ALPHA;
                        blend(&mut acc, sample, brightness);
                    }
                } else {
                    blend(&mut acc, sample, brightness);
                }
            }
            if acc[3] >= 255 {
                break;
            }
        }
        acc
    }
}

impl Rasterizer for HeightCuedShading {
    fn rasterize(&self, tile: &Tile, orientation: Orientation) -> RgbaImage {
        let mut img = blank_tile_image();
        for x in 0..TILE_WIDTH {
            for z in 0..TILE_WIDTH {
                let [r, g, b, a] = Self::shade_column(tile, x, z);
                let (col, row) = orientation.place_pixel(x, z);
                img.put_pixel(
                    col as u32,
                    row as u32,
                    Rgba([clamp(r), clamp(g), clamp(b), clamp(a)]),
                );
            }
        }
        img
    }
}

/// Composites `sample`, scaled by `brightness / 128`, underneath `acc`.
pub fn blend(acc: &mut [i32; 4], sample: [u8; 4], brightness: i32) {
    let alpha_a = acc[3] as f32 / 255.0;
    let alpha_b = sample[3] as f32 / 255.0;
    let alpha = alpha_a + alpha_b * (1.0 - alpha_a);
    if alpha <= 0.0 {
        return;
    }
    let k = brightness as f32 / FULL_BRIGHTNESS as f32;
    for i in 0..3 {
        let under = sample[i] as f32 * k * alpha_b * (1.0 - alpha_a);
        acc[i] = ((acc[i] as f32 * alpha_a + under) / alpha) as i32;
    }
    acc[3] = (alpha * 255.0) as i32;
}

fn clamp(v: i32) -> u8 {
    v.clamp(0, 255) as u8
}
