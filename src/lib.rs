pub mod config;
pub mod core;
pub mod domain;
pub mod utils;

#[cfg(feature = "cli")]
pub use crate::config::CliConfig;
pub use crate::config::{cli::LocalStorage, toml_config::TomlConfig};

pub use crate::core::{
    adequacy::{adequacy_from_results, compute_adequacy},
    catalog::{AliasTable, ReferenceCatalog},
    etl::EtlEngine,
    extractor::{extract, ExtractorSettings, SkipPolicy, ValueExtractor},
    pipeline::ReportPipeline,
    serology::SerologyInterpreter,
};
pub use utils::error::{ComputationError, EtlError, Result};
