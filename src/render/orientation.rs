use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use voxmap_common::{Bounds, MapError};

/// How the world is laid onto the image. The letters name the compass
/// direction found at the image's top, right, bottom and left edge. World x
/// grows to the east and world z to the south.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Orientation {
    #[default]
    Nesw,
    Wnes,
    Swne,
    Eswn,
    Senw,
    Wsen,
    Nwse,
    Enws,
}

impl Orientation {
    pub const ALL: [Orientation; 8] = [
        Orientation::Nesw,
        Orientation::Wnes,
        Orientation::Swne,
        Orientation::Eswn,
        Orientation::Senw,
        Orientation::Wsen,
        Orientation::Nwse,
        Orientation::Enws,
    ];

    pub fn name(self) -> &'static str {
        match self {
            Orientation::Nesw => "NESW",
            Orientation::Wnes => "WNES",
            Orientation::Swne => "SWNE",
            Orientation::Eswn => "ESWN",
            Orientation::Senw => "SENW",
            Orientation::Wsen => "WSEN",
            Orientation::Nwse => "NWSE",
            Orientation::Enws => "ENWS",
        }
    }

    /// `(swap_axes, right_positive, down_positive)`
    fn flags(self) -> (bool, bool, bool) {
        match self {
            Orientation::Nesw => (false, true, true),
            Orientation::Wnes => (true, false, true),
            Orientation::Swne => (false, false, false),
            Orientation::Eswn => (true, true, false),
            Orientation::Senw => (false, true, false),
            Orientation::Wsen => (true, true, true),
            Orientation::Nwse => (false, false, true),
            Orientation::Enws => (true, false, false),
        }
    }

    fn from_flags(flags: (bool, bool, bool)) -> Orientation {
        Orientation::ALL
            .into_iter()
            .find(|o| o.flags() == flags)
            .unwrap_or_default()
    }

    /// Whether world x runs along image columns. Otherwise world z does.
    pub fn x_along_columns(self) -> bool {
        !self.flags().0
    }

    /// Whether image columns grow with the world axis they follow.
    pub fn right_positive(self) -> bool {
        self.flags().1
    }

    /// Whether image rows grow with the world axis they follow.
    pub fn down_positive(self) -> bool {
        self.flags().2
    }

    /// The orientation that maps placed coordinates back onto the world grid.
    pub fn inverse(self) -> Orientation {
        let (swap, right, down) = self.flags();
        if swap {
            Orientation::from_flags((swap, down, right))
        } else {
            self
        }
    }

    /// `(columns, rows)` of a `width` by `height` grid once oriented.
    pub fn grid_dims(self, width: u32, height: u32) -> (u32, u32) {
        if self.x_along_columns() {
            (width, height)
        } else {
            (height, width)
        }
    }

    /// Sort key `(row, column)` of a tile. Ascending keys run left to right,
    /// then top to bottom on the image.
    pub fn sort_key(self, x: i32, z: i32) -> (i64, i64) {
        let (x, z) = (x as i64, z as i64);
        let (mut col, mut row) = if self.x_along_columns() { (x, z) } else { (z, x) };
        if !self.right_positive() {
            col = -col;
        }
        if !self.down_positive() {
            row = -row;
        }
        (row, col)
    }

    /// Places `(x, z)` of a `width` by `height` grid whose origin is 0.
    /// Returns `(column, row)`.
    pub fn place_in(self, width: u32, height: u32, x: u32, z: u32) -> (u32, u32) {
        let (cols, rows) = self.grid_dims(width, height);
        let (mut col, mut row) = if self.x_along_columns() { (x, z) } else { (z, x) };
        if !self.right_positive() {
            col = cols - 1 - col;
        }
        if !self.down_positive() {
            row = rows - 1 - row;
        }
        (col, row)
    }

    /// Grid cell `(column, row)` of tile `(x, z)` inside `bounds`.
    pub fn place(self, bounds: &Bounds, x: i32, z: i32) -> (u32, u32) {
        debug_assert!(bounds.contains(x, z));
        let abs_x = (x as i64 - bounds.x as i64) as u32;
        let abs_z = (z as i64 - bounds.z as i64) as u32;
        self.place_in(bounds.width, bounds.height, abs_x, abs_z)
    }

    /// Pixel `(column, row)` inside a tile image for the voxel column `(x, z)`.
    #[inline]
    pub fn place_pixel(self, x: usize, z: usize) -> (usize, usize) {
        let (col, row) = self.place_in(16, 16, x as u32, z as u32);
        (col as usize, row as usize)
    }
}

impl fmt::Display for Orientation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Orientation {
    type Err = MapError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let upper = s.to_ascii_uppercase();
        Orientation::ALL
            .into_iter()
            .find(|o| o.name() == upper)
            .ok_or_else(|| {
                MapError::ConfigError(format!(
                    "unknown orientation {:?}, expected one of NESW, WNES, SWNE, ESWN, SENW, WSEN, NWSE, ENWS",
                    s
                ))
            })
    }
}
