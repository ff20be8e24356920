//! Discovery of tile files in the sharded save directory.
//!
//! A save keeps every tile two directories deep:
//! `<root>/<x mod 64>/<z mod 64>/c.<x>.<z>.dat`, all numbers in base 36.

use std::fs;
use std::path::{Path, PathBuf};
use std::thread;

use voxmap_common::base36::{shard_dir_name, to_base36};
use voxmap_common::{Bounds, Extent, MapError, Result};
use voxmap_logger::{log, LogSeverity};

use crate::tile::{parse_tile_name, Tile};

/// Number of workers the directory walk is split across.
pub const SCAN_PARTITIONS: usize = 2;

/// Tiles and coordinate extent found in one share of the level directories.
#[derive(Debug, Default)]
pub struct Partition {
    pub tiles: Vec<Tile>,
    pub extent: Option<Extent>,
}

impl Partition {
    pub fn merge(mut self, other: Partition) -> Partition {
        self.tiles.extend(other.tiles);
        self.extent = Extent::merge_opt(self.extent, other.extent);
        self
    }
}

/// Whether `name` can be a shard directory: `0`-`z`, or `10`-`1s`.
pub fn is_level_dir_name(name: &str) -> bool {
    match name.as_bytes() {
        [c] => c.is_ascii_digit() || c.is_ascii_lowercase(),
        [b'1', c] => c.is_ascii_digit() || (b'a'..=b's').contains(c),
        _ => false,
    }
}

/// Lists the shard directories directly below `dir`, sorted by name.
pub fn list_level_dirs(dir: &Path) -> Result<Vec<PathBuf>> {
    let mut dirs = Vec::new();
    for entry in fs::read_dir(dir)? {
        let entry = entry?;
        let is_level_dir = entry
            .file_name()
            .to_str()
            .is_some_and(is_level_dir_name);
        if is_level_dir && entry.file_type()?.is_dir() {
            dirs.push(entry.path());
        }
    }
    dirs.sort();
    Ok(dirs)
}

/// Splits `items` into `n` contiguous shares. Earlier shares are never larger
/// than later ones.
pub fn partition<T: Clone>(items: &[T], n: usize) -> Vec<Vec<T>> {
    let n = n.max(1);
    let mut shares = Vec::with_capacity(n);
    let mut start = 0;
    for i in 0..n {
        let end = items.len() * (i + 1) / n;
        shares.push(items[start..end].to_vec());
        start = end;
    }
    shares
}

/// Walks the given top-level shard directories, parsing every tile file name.
/// When `instantiate` is set a [`Tile`] is kept for each file; otherwise only
/// the extent is collected. Unreadable nested directories and unparsable file
/// names are logged and skipped.
pub fn scan_partition(dirs: &[PathBuf], instantiate: bool) -> Partition {
    let mut partition = Partition::default();

    for top in dirs {
        let inner_dirs = match list_level_dirs(top) {
            Ok(inner) => inner,
            Err(err) => {
                log(
                    format!("Skipping {}: {}", top.display(), err),
                    LogSeverity::Warning,
                );
                continue;
            }
        };

        for dir in inner_dirs {
            let entries = match fs::read_dir(&dir) {
                Ok(entries) => entries,
                Err(err) => {
                    log(
                        format!("Skipping {}: {}", dir.display(), err),
                        LogSeverity::Warning,
                    );
                    continue;
                }
            };

            for entry in entries.flatten() {
                let path = entry.path();
                if !path.is_file() {
                    continue;
                }
                let Some(name) = path.file_name().and_then(|name| name.to_str()) else {
                    continue;
                };
                if !name.starts_with("c.") || !name.ends_with(".dat") {
                    continue;
                }

                let (x, z) = match parse_tile_name(name) {
                    Ok(coords) => coords,
                    Err(err) => {
                        log(
                            format!("Ignoring {}: {}", path.display(), err),
                            LogSeverity::Warning,
                        );
                        continue;
                    }
                };

                match partition.extent.as_mut() {
                    Some(extent) => extent.include(x, z),
                    None => partition.extent = Some(Extent::at(x, z)),
                }
                if instantiate {
                    match Tile::from_path(path) {
                        Ok(tile) => partition.tiles.push(tile),
                        Err(err) => log(format!("Ignoring tile: {}", err), LogSeverity::Warning),
                    }
                }
            }
        }
    }

    partition
}

/// Computes the tile-grid bounds of the world under `root`, or `None` when it
/// holds no tiles. Only file names are inspected.
pub fn scan(root: &Path) -> Result<Option<Bounds>> {
    let dirs = list_level_dirs(root)?;
    let shares = partition(&dirs, SCAN_PARTITIONS);

    let extent = thread::scope(|scope| {
        let workers: Vec<_> = shares
            .iter()
            .map(|share| scope.spawn(move || scan_partition(share, false).extent))
            .collect();

        workers.into_iter().try_fold(None, |acc, worker| {
            let extent = worker
                .join()
                .map_err(|_| MapError::invariant("directory scan worker panicked"))?;
            Ok::<_, MapError>(Extent::merge_opt(acc, extent))
        })
    })?;

    extent.map(|extent| extent.bounds()).transpose()
}

/// Where the tile at `(x, z)` lives below `root`.
pub fn tile_path(root: &Path, x: i32, z: i32) -> PathBuf {
    root.join(shard_dir_name(x))
        .join(shard_dir_name(z))
        .join(format!("c.{}.{}.dat", to_base36(x), to_base36(z)))
}
