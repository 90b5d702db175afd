pub mod pipeline;

pub use pipeline::{run, AnalysisPipeline, PipelineConfig, PipelineOutput};
