pub mod catalog;
pub mod correlation;
pub mod etl;
pub mod flatten;
pub mod jsonstat;
pub mod merge;
pub mod pipeline;
pub mod report;
pub mod series;

pub use crate::domain::model::{Record, TransformResult};
pub use crate::domain::ports::{ConfigProvider, Pipeline, Storage};
pub use crate::utils::error::Result;
