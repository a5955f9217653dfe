pub mod estimate_pipeline;
