use serde::{Deserialize, Serialize};
use std::ffi::OsStr;
use std::fs;
use std::path::{Path, PathBuf};
use voxmap_common::{MapError, Result};

use crate::render::orientation::Orientation;
use crate::render::shading::ShadingMode;

pub const DEFAULT_OUTPUT_NAME: &str = "level.png";
pub const LEVEL_FILE_NAME: &str = "level.dat";

pub const USAGE: &str = "\
usage: voxmap <world-dir | level.dat> [options]

options:
  --orientation <NESW|WNES|SWNE|ESWN|SENW|WSEN|NWSE|ENWS>
                       compass directions at the image's up/right/down/left edge
  --shading <flat|height-cued>
  --output <file>      where to write the PNG (default: <world>/level.png)
  --config <file>      read settings from a JSON file first
  --no-open            do not open the finished image
  -h, --help           print this help";

/// Settings for one render run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct RenderConfig {
    /// World directory, or the path of its `level.dat`.
    pub world: PathBuf,
    pub orientation: Orientation,
    pub shading: ShadingMode,
    pub output: Option<PathBuf>,
    pub open_viewer: bool,
}

impl Default for RenderConfig {
    fn default() -> Self {
        RenderConfig {
            world: PathBuf::new(),
            orientation: Orientation::default(),
            shading: ShadingMode::default(),
            output: None,
            open_viewer: true,
        }
    }
}

impl RenderConfig {
    pub fn new(world: impl Into<PathBuf>) -> Self {
        RenderConfig {
            world: world.into(),
            ..RenderConfig::default()
        }
    }

    pub fn from_json_str(json: &str) -> Result<Self> {
        serde_json::from_str(json).map_err(|err| MapError::ConfigError(err.to_string()))
    }

    pub fn from_json_file(path: &Path) -> Result<Self> {
        let json = fs::read_to_string(path)?;
        Self::from_json_str(&json)
            .map_err(|err| MapError::ConfigError(format!("{}: {}", path.display(), err)))
    }

    /// Builds a configuration from command-line arguments, program name
    /// excluded. `--config` is applied first, other flags override it.
    pub fn from_args<I>(args: I) -> Result<Self>
    where
        I: IntoIterator<Item = String>,
    {
        let args: Vec<String> = args.into_iter().collect();

        let mut config = match args.iter().position(|arg| arg == "--config") {
            Some(i) => {
                let path = args
                    .get(i + 1)
                    .ok_or_else(|| MapError::ConfigError("--config needs a file".to_string()))?;
                Self::from_json_file(Path::new(path))?
            }
            None => RenderConfig::default(),
        };

        let mut iter = args.iter();
        while let Some(arg) = iter.next() {
            let mut value = |flag: &str| {
                iter.next()
                    .ok_or_else(|| MapError::ConfigError(format!("{} needs a value", flag)))
            };
            match arg.as_str() {
                "--config" => {
                    value("--config")?;
                }
                "--orientation" => config.orientation = value("--orientation")?.parse()?,
                "--shading" => config.shading = value("--shading")?.parse()?,
                "--output" => config.output = Some(PathBuf::from(value("--output")?)),
                "--no-open" => config.open_viewer = false,
                flag if flag.starts_with("--") => {
                    return Err(MapError::ConfigError(format!("unknown option {}", flag)))
                }
                world => config.world = PathBuf::from(world),
            }
        }

        if config.world.as_os_str().is_empty() {
            return Err(MapError::ConfigError("no world given".to_string()));
        }
        Ok(config)
    }

    /// Directory holding the tile tree. A path to `level.dat` (or any other
    /// file) resolves to its parent.
    pub fn world_root(&self) -> PathBuf {
        let names_level_file = self
            .world
            .file_name()
            .is_some_and(|name| name == OsStr::new(LEVEL_FILE_NAME));
        if names_level_file || self.world.is_file() {
            match self.world.parent() {
                Some(parent) if !parent.as_os_str().is_empty() => parent.to_path_buf(),
                _ => PathBuf::from("."),
            }
        } else {
            self.world.clone()
        }
    }

    pub fn output_path(&self) -> PathBuf {
        self.output
            .clone()
            .unwrap_or_else(|| self.world_root().join(DEFAULT_OUTPUT_NAME))
    }

    /// Name of the world directory, used in the image label.
    pub fn world_name(&self) -> String {
        let root = self.world_root();
        let resolved = fs::canonicalize(&root).unwrap_or(root);
        resolved
            .file_name()
            .map(|name| name.to_string_lossy().into_owned())
            .unwrap_or_else(|| "WORLD".to_string())
    }
}
