pub mod pipeline;
pub mod types;

pub use pipeline::EcgPipeline;
pub use types::{EcgReport, PipelineStats};
