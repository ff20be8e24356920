use std::fs::File;
use std::io::BufReader;
use std::path::{Path, PathBuf};

use voxmap_common::base36::from_base36;
use voxmap_common::{MapError, Result};
use voxmap_logger::{log, LogSeverity};
use voxmap_nbt::{NbtValue, TagReader};

/// Tiles are 16 voxels wide along both x and z.
pub const TILE_WIDTH: usize = 16;
/// Number of voxel layers in a column.
pub const TILE_HEIGHT: usize = 128;
pub const TILE_VOXELS: usize = TILE_WIDTH * TILE_WIDTH * TILE_HEIGHT;
/// Light arrays are stored two voxels per byte.
pub const PACKED_LIGHT_LEN: usize = TILE_VOXELS / 2;

pub const BLOCKS_FIELD: &str = "Blocks";
pub const SKY_LIGHT_FIELD: &str = "SkyLight";
pub const BLOCK_LIGHT_FIELD: &str = "BlockLight";
pub const X_POS_FIELD: &str = "xPos";
pub const Z_POS_FIELD: &str = "zPos";

/// One tile of the world. Constructing a tile only parses its filename;
/// voxel and light data exist between [`Tile::load`] and [`Tile::unload`].
#[derive(Debug)]
pub struct Tile {
    x: i32,
    z: i32,
    path: PathBuf,
    payload: Option<Payload>,
}

#[derive(Debug)]
struct Payload {
    blocks: Vec<u8>,
    sky_light: Vec<u8>,
    block_light: Vec<u8>,
}

/// Parses `c.<x>.<z>.dat` into tile coordinates.
pub fn parse_tile_name(name: &str) -> Result<(i32, i32)> {
    let coords = name
        .strip_prefix("c.")
        .and_then(|rest| rest.strip_suffix(".dat"))
        .ok_or_else(|| MapError::format(format!("not a tile file name: {:?}", name)))?;
    let (x, z) = coords
        .split_once('.')
        .ok_or_else(|| MapError::format(format!("not a tile file name: {:?}", name)))?;
    Ok((from_base36(x)?, from_base36(z)?))
}

/// Flat array index of a voxel.
#[inline]
pub fn voxel_index(x: usize, z: usize, y: usize) -> usize {
    debug_assert!(x < TILE_WIDTH, "x out of range: {}", x);
    debug_assert!(z < TILE_WIDTH, "z out of range: {}", z);
    debug_assert!(y < TILE_HEIGHT, "y out of range: {}", y);
    x * TILE_WIDTH * TILE_HEIGHT + z * TILE_HEIGHT + y
}

/// Splits every byte into two values, low nibble first.
pub fn unpack_nibbles(packed: &[u8]) -> Vec<u8> {
    let mut out = Vec::with_capacity(packed.len() * 2);
    for &b in packed {
        out.push(b & 0x0f);
        out.push(b >> 4);
    }
    out
}

/// Inverse of [`unpack_nibbles`]. Values above 15 are truncated and a trailing
/// odd value is packed with a zero high nibble.
pub fn pack_nibbles(values: &[u8]) -> Vec<u8> {
    values
        .chunks(2)
        .map(|pair| {
            let low = pair[0] & 0x0f;
            let high = pair.get(1).copied().unwrap_or(0) & 0x0f;
            low | (high << 4)
        })
        .collect()
}

impl Tile {
    pub fn from_path(path: impl Into<PathBuf>) -> Result<Self> {
        let path = path.into();
        let name = path
            .file_name()
            .and_then(|name| name.to_str())
            .ok_or_else(|| MapError::format(format!("not a tile file: {}", path.display())))?;
        let (x, z) = parse_tile_name(name)?;
        Ok(Tile {
            x,
            z,
            path,
            payload: None,
        })
    }

    pub fn x(&self) -> i32 {
        self.x
    }

    pub fn z(&self) -> i32 {
        self.z
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn is_loaded(&self) -> bool {
        self.payload.is_some()
    }

    /// Decodes the tile file. Unrecognized fields are skipped.
    pub fn load(&mut self) -> Result<()> {
        let file = File::open(&self.path)?;
        let mut reader = TagReader::open(BufReader::new(file));

        let mut blocks = None;
        let mut sky_light = None;
        let mut block_light = None;

        while let Some(item) = reader.next_item()? {
            let Some(name) = item.name.as_deref() else {
                continue;
            };
            match (name, &item.value) {
                (BLOCKS_FIELD, NbtValue::ByteArray(bytes)) => {
                    if bytes.len() != TILE_VOXELS {
                        return Err(MapError::format(format!(
                            "{}: {} has {} bytes, expected {}",
                            self.path.display(),
                            BLOCKS_FIELD,
                            bytes.len(),
                            TILE_VOXELS
                        )));
                    }
                    blocks = Some(bytes.clone());
                }
                (SKY_LIGHT_FIELD, NbtValue::ByteArray(bytes)) => {
                    sky_light = Some(self.unpack_light(SKY_LIGHT_FIELD, bytes)?);
                }
                (BLOCK_LIGHT_FIELD, NbtValue::ByteArray(bytes)) => {
                    block_light = Some(self.unpack_light(BLOCK_LIGHT_FIELD, bytes)?);
                }
                (X_POS_FIELD, NbtValue::Int(x_pos)) => self.check_position('x', *x_pos, self.x)?,
                (Z_POS_FIELD, NbtValue::Int(z_pos)) => self.check_position('z', *z_pos, self.z)?,
                _ => {}
            }
        }
        reader.close();

        let blocks = blocks.ok_or_else(|| {
            MapError::format(format!(
                "{}: missing {} field",
                self.path.display(),
                BLOCKS_FIELD
            ))
        })?;
        self.payload = Some(Payload {
            blocks,
            sky_light: self.light_or_dark(SKY_LIGHT_FIELD, sky_light),
            block_light: self.light_or_dark(BLOCK_LIGHT_FIELD, block_light),
        });
        Ok(())
    }

    pub fn unload(&mut self) {
        self.payload = None;
    }

    /// Voxel identifier at a position. Unloaded tiles read as air.
    pub fn block_at(&self, x: usize, z: usize, y: usize) -> u8 {
        self.payload
            .as_ref()
            .map_or(0, |p| p.blocks[voxel_index(x, z, y)])
    }

    pub fn sky_light_at(&self, x: usize, z: usize, y: usize) -> u8 {
        self.payload
            .as_ref()
            .map_or(0, |p| p.sky_light[voxel_index(x, z, y)])
    }

    pub fn block_light_at(&self, x: usize, z: usize, y: usize) -> u8 {
        self.payload
            .as_ref()
            .map_or(0, |p| p.block_light[voxel_index(x, z, y)])
    }

    fn unpack_light(&self, field: &str, packed: &[u8]) -> Result<Vec<u8>> {
        if packed.len() != PACKED_LIGHT_LEN {
            return Err(MapError::format(format!(
                "{}: {} has {} bytes, expected {}",
                self.path.display(),
                field,
                packed.len(),
                PACKED_LIGHT_LEN
            )));
        }
        Ok(unpack_nibbles(packed))
    }

    fn check_position(&self, axis: char, stored: i32, expected: i32) -> Result<()> {
        if stored != expected {
            return Err(MapError::consistency(format!(
                "{}: {}Pos is {} but the file name says {}",
                self.path.display(),
                axis,
                stored,
                expected
            )));
        }
        Ok(())
    }

    fn light_or_dark(&self, field: &str, light: Option<Vec<u8>>) -> Vec<u8> {
        light.unwrap_or_else(|| {
            log(
                format!("{}: no {}, assuming darkness", self.path.display(), field),
                LogSeverity::Debug,
            );
            vec![0; TILE_VOXELS]
        })
    }
}
