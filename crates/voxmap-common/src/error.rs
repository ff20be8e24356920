use std::error::Error;
use std::fmt;

#[derive(Debug)]
pub enum MapError {
    /// The byte source could not be read, including streams that end early.
    IoError(std::io::Error),
    /// A filename or tag stream does not have the expected shape.
    FormatError(String),
    /// Data inside a tile disagrees with the coordinates in its filename.
    ConsistencyError(String),
    /// A programming error, never expected from a correct caller.
    InvariantViolation(String),
    ImageError(String),
    ConfigError(String),
}

impl MapError {
    pub fn format(msg: impl Into<String>) -> Self {
        MapError::FormatError(msg.into())
    }

    pub fn consistency(msg: impl Into<String>) -> Self {
        MapError::ConsistencyError(msg.into())
    }

    pub fn invariant(msg: impl Into<String>) -> Self {
        MapError::InvariantViolation(msg.into())
    }

    /// Whether the error only concerns a single tile. Such errors drop the tile
    /// from the render set instead of aborting the run.
    pub fn is_tile_local(&self) -> bool {
        matches!(
            self,
            MapError::IoError(_) | MapError::FormatError(_) | MapError::ConsistencyError(_)
        )
    }
}

impl fmt::Display for MapError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MapError::IoError(err) => write!(f, "IO error: {}", err),
            MapError::FormatError(msg) => write!(f, "Format error: {}", msg),
            MapError::ConsistencyError(msg) => write!(f, "Consistency error: {}", msg),
            MapError::InvariantViolation(msg) => write!(f, "Invariant violation: {}", msg),
            MapError::ImageError(msg) => write!(f, "Image error: {}", msg),
            MapError::ConfigError(msg) => write!(f, "Config error: {}", msg),
        }
    }
}

impl Error for MapError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            MapError::IoError(err) => Some(err),
            _ => None,
        }
    }
}

impl From<std::io::Error> for MapError {
    fn from(err: std::io::Error) -> Self {
        MapError::IoError(err)
    }
}
