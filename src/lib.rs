pub mod adapters;
pub mod app;
pub mod config;
pub mod core;
pub mod domain;
pub mod utils;

pub use config::{cli::LocalStorage, toml_config::TomlConfig, CliConfig};
pub use core::flatten::{flatten, flatten_cube};
pub use core::{etl::EtlEngine, pipeline::SpuriousPipeline};
pub use domain::model::{Cube, Dimension, Record};
pub use utils::error::{EtlError, Result};
