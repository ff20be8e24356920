pub mod config;
pub mod render;

// Re-export commonly used items
pub use config::RenderConfig;
pub use render::{Orientation, Pipeline, ShadingMode, StatusSink};
pub use voxmap_common::{MapError, Result};
