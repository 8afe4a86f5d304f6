pub mod spurious_pipeline;
