pub mod adapters;
pub mod config;
pub mod core;
pub mod domain;
pub mod utils;

#[cfg(feature = "cli")]
pub use config::CliConfig;
pub use config::EnricherConfig;

pub use adapters::{BingImageSearch, LocalStorage, StateStore, TokioSleeper};
pub use crate::core::{
    batch::{summarize, BatchRunner},
    etl::EnrichEngine,
    query::QueryBuilder,
    resolver::{ImageResolver, ResolverSettings},
};
pub use utils::error::{EnrichError, Result};
