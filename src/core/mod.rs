pub mod batch;
pub mod etl;
pub mod query;
pub mod resolver;

pub use crate::domain::model::{Dataset, Record, ResolutionResult, RunState, RunStatus, RunSummary};
pub use crate::domain::ports::{ImageSearch, ProgressSink, SearchResponse, Sleeper, Storage};
pub use crate::utils::error::Result;
