use crate::domain::model::RunState;
use crate::utils::error::Result;
use async_trait::async_trait;
use std::time::Duration;

pub trait Storage: Send + Sync {
    fn read_file(&self, path: &str) -> impl std::future::Future<Output = Result<Vec<u8>>> + Send;
    fn write_file(
        &self,
        path: &str,
        data: &[u8],
    ) -> impl std::future::Future<Output = Result<()>> + Send;
    fn remove_file(&self, path: &str) -> impl std::future::Future<Output = Result<()>> + Send;
}

/// Raw answer from the search engine.
#[derive(Debug, Clone)]
pub struct SearchResponse {
    pub status: u16,
    pub body: String,
}

/// One GET against the image-search endpoint.
#[async_trait]
pub trait ImageSearch: Send + Sync {
    async fn fetch(&self, query: &str) -> Result<SearchResponse>;
}

#[async_trait]
pub trait Sleeper: Send + Sync {
    async fn sleep(&self, duration: Duration);
}

/// Receives the run state after every processed row.
#[async_trait]
pub trait ProgressSink: Send + Sync {
    async fn report(&self, state: &RunState);
}

#[async_trait]
impl<F> ProgressSink for F
where
    F: Fn(usize, usize) + Send + Sync,
{
    async fn report(&self, state: &RunState) {
        self(state.cursor, state.total());
    }
}
