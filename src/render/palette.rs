//! Block identifier to RGBA color table.

/// Colors of the identifiers the save format knew about. Everything past the
/// end of this list is drawn fully transparent.
const KNOWN: [[u8; 4]; 84] = [
    [255, 255, 255, 0],
    [120, 120, 120, 255],
    [117, 176, 73, 255],
    [134, 96, 67, 255],
    [115, 115, 115, 255],
    [157, 128, 79, 255],
    [120, 120, 120, 0],
    [84, 84, 84, 255],
    [38, 92, 255, 51],
    [38, 92, 255, 51],
    [255, 90, 0, 255],
    [255, 90, 0, 255],
    [218, 210, 158, 255],
    [136, 126, 126, 255],
    [143, 140, 125, 255],
    [136, 130, 127, 255],
    [115, 115, 115, 255],
    [102, 81, 51, 255],
    [60, 192, 41, 100],
    [0, 0, 0, 0],
    [255, 255, 255, 64],
    [0, 0, 0, 0],
    [0, 0, 0, 0],
    [0, 0, 0, 0],
    [0, 0, 0, 0],
    [0, 0, 0, 0],
    [0, 0, 0, 0],
    [0, 0, 0, 0],
    [0, 0, 0, 0],
    [0, 0, 0, 0],
    [0, 0, 0, 0],
    [0, 0, 0, 0],
    [0, 0, 0, 0],
    [0, 0, 0, 0],
    [0, 0, 0, 0],
    [222, 222, 222, 255],
    [0, 0, 0, 0],
    [255, 255, 0, 255],
    [255, 0, 0, 255],
    [0, 0, 0, 0],
    [0, 0, 0, 0],
    [231, 165, 45, 255],
    [191, 191, 191, 255],
    [200, 200, 200, 255],
    [200, 200, 200, 255],
    [170, 86, 62, 255],
    [160, 83, 65, 255],
    [0, 0, 0, 0],
    [115, 115, 115, 255],
    [26, 11, 43, 255],
    [245, 220, 50, 200],
    [255, 170, 30, 200],
    [0, 0, 0, 0],
    [157, 128, 79, 255],
    [125, 91, 38, 255],
    [0, 0, 0, 0],
    [129, 140, 143, 255],
    [45, 166, 152, 255],
    [114, 88, 56, 255],
    [146, 192, 0, 255],
    [95, 58, 30, 255],
    [96, 96, 96, 255],
    [96, 96, 96, 255],
    [111, 91, 54, 255],
    [136, 109, 67, 255],
    [181, 140, 64, 32],
    [150, 134, 102, 180],
    [115, 115, 115, 255],
    [0, 0, 0, 0],
    [0, 0, 0, 0],
    [0, 0, 0, 0],
    [191, 191, 191, 255],
    [0, 0, 0, 0],
    [131, 107, 107, 255],
    [131, 107, 107, 255],
    [181, 140, 64, 32],
    [255, 0, 0, 200],
    [0, 0, 0, 0],
    [255, 255, 255, 255],
    [83, 113, 163, 51],
    [250, 250, 250, 255],
    [25, 120, 25, 255],
    [151, 157, 169, 255],
    [100, 67, 50, 255],
];

const fn build_table() -> [[u8; 4]; 256] {
    let mut table = [[0; 4]; 256];
    let mut i = 0;
    while i < KNOWN.len() {
        table[i] = KNOWN[i];
        i += 1;
    }
    table
}

pub static COLORS: [[u8; 4]; 256] = build_table();

pub const AIR: u8 = 0;

#[inline]
pub fn color_of(id: u8) -> [u8; 4] {
    COLORS[id as usize]
}

/// Lava and fire, drawn at full brightness regardless of light.
pub fn is_fiery(id: u8) -> bool {
    matches!(id, 10 | 11 | 50 | 51 | 76)
}

/// Water and ice, only drawn where the surface is exposed.
pub fn is_watery(id: u8) -> bool {
    matches!(id, 8 | 9 | 79)
}
