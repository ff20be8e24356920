use serde::{Deserialize, Serialize};

use crate::error::MapError;

pub type Result<T> = std::result::Result<T, crate::error::MapError>;

/// Axis-aligned rectangle in tile-grid coordinates.
/// `width` spans the x axis and `height` the z axis, both inclusive of the
/// last tile.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Bounds {
    pub x: i32,
    pub z: i32,
    pub width: u32,
    pub height: u32,
}

/// Last coordinate of a span, clamped to the grid.
fn span_end(start: i32, len: u32) -> i64 {
    (start as i64 + len as i64 - 1).clamp(i32::MIN as i64, i32::MAX as i64)
}

impl Bounds {
    pub fn max_x(&self) -> i32 {
        span_end(self.x, self.width) as i32
    }

    pub fn max_z(&self) -> i32 {
        span_end(self.z, self.height) as i32
    }

    pub fn contains(&self, x: i32, z: i32) -> bool {
        let (x, z) = (x as i64, z as i64);
        x >= self.x as i64
            && x <= span_end(self.x, self.width)
            && z >= self.z as i64
            && z <= span_end(self.z, self.height)
    }
}

/// Running min/max over tile coordinates. Partial extents from separate
/// workers combine with [`Extent::merge`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Extent {
    pub min_x: i32,
    pub max_x: i32,
    pub min_z: i32,
    pub max_z: i32,
}

impl Extent {
    pub fn at(x: i32, z: i32) -> Self {
        Self {
            min_x: x,
            max_x: x,
            min_z: z,
            max_z: z,
        }
    }

    pub fn include(&mut self, x: i32, z: i32) {
        self.min_x = self.min_x.min(x);
        self.max_x = self.max_x.max(x);
        self.min_z = self.min_z.min(z);
        self.max_z = self.max_z.max(z);
    }

    pub fn merge(self, other: Extent) -> Extent {
        Extent {
            min_x: self.min_x.min(other.min_x),
            max_x: self.max_x.max(other.max_x),
            min_z: self.min_z.min(other.min_z),
            max_z: self.max_z.max(other.max_z),
        }
    }

    /// Merges two optional extents, where `None` means "no tiles seen".
    pub fn merge_opt(a: Option<Extent>, b: Option<Extent>) -> Option<Extent> {
        match (a, b) {
            (Some(a), Some(b)) => Some(a.merge(b)),
            (a, None) => a,
            (None, b) => b,
        }
    }

    /// The rectangle covering every included tile. Fails when a side is
    /// longer than `u32::MAX` tiles.
    pub fn bounds(&self) -> Result<Bounds> {
        let side = |min: i32, max: i32, axis: &str| {
            let len = max as i64 - min as i64 + 1;
            u32::try_from(len).map_err(|_| {
                MapError::format(format!(
                    "tiles span {} {}..={}, too wide for one map",
                    axis, min, max
                ))
            })
        };
        Ok(Bounds {
            x: self.min_x,
            z: self.min_z,
            width: side(self.min_x, self.max_x, "x")?,
            height: side(self.min_z, self.max_z, "z")?,
        })
    }
}
