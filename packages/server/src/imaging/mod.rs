pub mod pipeline;
pub mod rendition;
pub mod srcset;

pub use pipeline::{ImagePipeline, PipelineError, RenditionSet};
pub use srcset::{ResponsiveImages, SIZES_HINT};
