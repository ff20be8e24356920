pub mod batch;
pub mod canvas;
pub mod footer;
pub mod orientation;
pub mod output;
pub mod palette;
pub mod pipeline;
pub mod pool;
pub mod shading;

pub use orientation::Orientation;
pub use pipeline::{LogSink, Phase, Pipeline, RenderReport, StatusSink};
pub use shading::{FlatShading, HeightCuedShading, Rasterizer, ShadingMode};
