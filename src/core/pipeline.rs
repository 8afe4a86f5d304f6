pub use crate::app::pipelines::spurious_pipeline::{SpuriousPipeline, REPORT_ARCHIVE};
