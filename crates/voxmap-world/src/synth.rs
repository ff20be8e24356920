//! Writes tile files in the on-disk save layout. Used to build small worlds
//! for tests. Built only with the `test-support` feature.

use std::fs::{self, File};
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};

use voxmap_common::Result;
use voxmap_nbt::{NbtFile, Tag};

use crate::index::tile_path;
use crate::tile::{
    pack_nibbles, voxel_index, BLOCKS_FIELD, BLOCK_LIGHT_FIELD, SKY_LIGHT_FIELD, TILE_HEIGHT,
    TILE_VOXELS, TILE_WIDTH, X_POS_FIELD, Z_POS_FIELD,
};

/// Unpacked contents of one tile. Light arrays set to `None` are left out of
/// the written file.
#[derive(Debug, Clone)]
pub struct TileContents {
    pub x: i32,
    pub z: i32,
    /// Stored `xPos`, normally equal to `x`.
    pub x_pos: i32,
    pub z_pos: i32,
    pub blocks: Vec<u8>,
    pub sky_light: Option<Vec<u8>>,
    pub block_light: Option<Vec<u8>>,
}

impl TileContents {
    /// An all-air, fully dark tile.
    pub fn new(x: i32, z: i32) -> Self {
        TileContents {
            x,
            z,
            x_pos: x,
            z_pos: z,
            blocks: vec![0; TILE_VOXELS],
            sky_light: Some(vec![0; TILE_VOXELS]),
            block_light: Some(vec![0; TILE_VOXELS]),
        }
    }

    pub fn set_block(&mut self, x: usize, z: usize, y: usize, id: u8) {
        self.blocks[voxel_index(x, z, y)] = id;
    }

    pub fn set_sky_light(&mut self, x: usize, z: usize, y: usize, level: u8) {
        if let Some(light) = self.sky_light.as_mut() {
            light[voxel_index(x, z, y)] = level;
        }
    }

    pub fn set_block_light(&mut self, x: usize, z: usize, y: usize, level: u8) {
        if let Some(light) = self.block_light.as_mut() {
            light[voxel_index(x, z, y)] = level;
        }
    }

    /// Fills every column from the bottom up to and including `top` with `id`,
    /// and gives all voxels above it full sky light.
    pub fn fill_to(&mut self, top: usize, id: u8) {
        for x in 0..TILE_WIDTH {
            for z in 0..TILE_WIDTH {
                for y in 0..TILE_HEIGHT {
                    if y <= top {
                        self.set_block(x, z, y, id);
                    } else {
                        self.set_sky_light(x, z, y, 15);
                    }
                }
            }
        }
    }

    pub fn to_nbt(&self) -> NbtFile {
        let mut level = vec![
            (X_POS_FIELD.to_string(), Tag::Int(self.x_pos)),
            (Z_POS_FIELD.to_string(), Tag::Int(self.z_pos)),
            (BLOCKS_FIELD.to_string(), Tag::ByteArray(self.blocks.clone())),
        ];
        if let Some(light) = &self.sky_light {
            level.push((SKY_LIGHT_FIELD.to_string(), Tag::ByteArray(pack_nibbles(light))));
        }
        if let Some(light) = &self.block_light {
            level.push((BLOCK_LIGHT_FIELD.to_string(), Tag::ByteArray(pack_nibbles(light))));
        }
        level.push(("LastUpdate".to_string(), Tag::Long(0)));
        level.push(("TerrainPopulated".to_string(), Tag::Byte(1)));
        level.push((
            "Entities".to_string(),
            Tag::List(voxmap_nbt::TagType::Compound, Vec::new()),
        ));

        NbtFile::new(
            String::new(),
            Tag::Compound(vec![("Level".to_string(), Tag::Compound(level))]),
        )
    }
}

/// Writes a gzip tile file where the world index expects it and returns its
/// path. Shard directories are created as needed.
pub fn write_tile(root: &Path, contents: &TileContents) -> Result<PathBuf> {
    let path = tile_path(root, contents.x, contents.z);
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)?;
    }
    let mut out = BufWriter::new(File::create(&path)?);
    contents.to_nbt().write_gzip(&mut out)?;
    out.flush()?;
    Ok(path)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tile::Tile;
    use tempfile::TempDir;

    fn child<'a>(tag: &'a Tag, name: &str) -> Option<&'a Tag> {
        match tag {
            Tag::Compound(entries) => entries.iter().find(|(n, _)| n == name).map(|(_, t)| t),
            _ => None,
        }
    }

    #[test]
    fn test_written_tile_reads_back_as_tree() {
        let dir = TempDir::new().unwrap();
        let path = write_tile(dir.path(), &TileContents::new(-1, 64)).unwrap();
        assert!(path.ends_with("1r/0/c.-1.1s.dat"));

        let file = NbtFile::read_gzip(File::open(&path).unwrap()).unwrap();
        let level = child(&file.root, "Level").unwrap();
        assert_eq!(child(level, X_POS_FIELD), Some(&Tag::Int(-1)));
        assert_eq!(child(level, Z_POS_FIELD), Some(&Tag::Int(64)));
        match child(level, SKY_LIGHT_FIELD) {
            Some(Tag::ByteArray(light)) => assert_eq!(light.len(), TILE_VOXELS / 2),
            other => panic!("unexpected sky light tag {:?}", other),
        }
    }

    #[test]
    fn test_fill_to() {
        let dir = TempDir::new().unwrap();
        let mut contents = TileContents::new(0, 0);
        contents.fill_to(60, 3);
        let path = write_tile(dir.path(), &contents).unwrap();

        let mut tile = Tile::from_path(path).unwrap();
        tile.load().unwrap();
        assert_eq!(tile.block_at(7, 9, 60), 3);
        assert_eq!(tile.block_at(7, 9, 61), 0);
        assert_eq!(tile.sky_light_at(7, 9, 61), 15);
        assert_eq!(tile.sky_light_at(7, 9, 60), 0);
    }
}
