pub mod index;
#[cfg(any(test, feature = "test-support"))]
pub mod synth;
pub mod tile;

pub use index::{scan, scan_partition, tile_path, Partition};
pub use tile::Tile;
