#![allow(dead_code)]

use image::RgbaImage;
use std::path::Path;
use tempfile::TempDir;
use voxmap::render::RenderReport;
use voxmap::{Orientation, Pipeline, RenderConfig, ShadingMode};
use voxmap_world::synth::{write_tile, TileContents};

pub const STONE: u8 = 1;
pub const GRASS: u8 = 2;
pub const STONE_RGBA: [u8; 4] = [120, 120, 120, 255];
pub const GRASS_RGBA: [u8; 4] = [117, 176, 73, 255];
pub const CLEAR: [u8; 4] = [0, 0, 0, 0];
pub const WHITE: [u8; 4] = [255, 255, 255, 255];

/// Builds a world on disk where every listed tile is solid up to y = 40.
pub fn build_world(tiles: &[(i32, i32, u8)]) -> TempDir {
    let dir = TempDir::new().expect("temp dir");
    for &(x, z, id) in tiles {
        let mut contents = TileContents::new(x, z);
        contents.fill_to(40, id);
        write_tile(dir.path(), &contents).expect("write tile");
    }
    dir
}

pub fn config(world: &Path, orientation: Orientation, shading: ShadingMode) -> RenderConfig {
    let mut config = RenderConfig::new(world);
    config.orientation = orientation;
    config.shading = shading;
    config.open_viewer = false;
    config
}

/// Runs a render and reads the written PNG back.
pub async fn render(config: RenderConfig) -> (RenderReport, RgbaImage) {
    let quiet = |_: &str| {};
    let report = Pipeline::new(config)
        .run(&quiet)
        .await
        .expect("render failed");
    let image = image::open(&report.output)
        .expect("output image")
        .to_rgba8();
    (report, image)
}

pub fn pixel(image: &RgbaImage, x: u32, y: u32) -> [u8; 4] {
    image.get_pixel(x, y).0
}
