use crate::core::query::QueryBuilder;
use crate::core::resolver::ImageResolver;
use crate::domain::model::{RunState, RunStatus, RunSummary};
use crate::domain::ports::{ImageSearch, ProgressSink, Sleeper};
use std::time::Duration;
use tracing::Instrument;

/// Drives the resolver over a dataset one row at a time.
pub struct BatchRunner<S: ImageSearch, Z: Sleeper> {
    resolver: ImageResolver<S, Z>,
    pace: Duration,
}

impl<S: ImageSearch, Z: Sleeper> BatchRunner<S, Z> {
    pub fn new(resolver: ImageResolver<S, Z>, pace: Duration) -> Self {
        Self { resolver, pace }
    }

    /// Resolves the row at `cursor` and moves past it. Rows before the
    /// cursor are left as they are; a complete state is returned unchanged.
    pub async fn advance_one(&self, mut state: RunState) -> RunState {
        if state.is_complete() {
            state.status = RunStatus::Completed;
            return state;
        }

        let index = state.cursor;
        let query = QueryBuilder::build(&state.dataset.records[index], &state.selected_columns);
        let span = tracing::info_span!("row", index = index + 1, total = state.total());
        let result = self.resolver.resolve_detailed(&query).instrument(span).await;

        match &result.url {
            Some(url) => tracing::info!(
                "Row {}/{}: '{}' -> {}",
                index + 1,
                state.total(),
                query,
                url
            ),
            None => tracing::info!(
                "Row {}/{}: '{}' -> no image after {} attempts",
                index + 1,
                state.total(),
                query,
                result.attempts_used
            ),
        }

        state.dataset.records[index].image_link = result.url;
        state.cursor += 1;
        state.refresh_elapsed();
        state.status = if state.is_complete() {
            RunStatus::Completed
        } else {
            RunStatus::Running
        };
        state
    }

    /// Runs until every row is processed or `cancel` returns true.
    /// Cancellation is checked between rows only.
    pub async fn run<C, P>(&self, mut state: RunState, cancel: C, progress: &P) -> RunState
    where
        C: Fn() -> bool,
        P: ProgressSink + ?Sized,
    {
        if state.status == RunStatus::Interrupted {
            tracing::warn!(
                "Resuming interrupted run at row {}/{}",
                state.cursor + 1,
                state.total()
            );
        }

        loop {
            if state.is_complete() {
                state.status = RunStatus::Completed;
                break;
            }
            if cancel() {
                tracing::info!("Stop requested at row {}/{}", state.cursor, state.total());
                state.refresh_elapsed();
                state.status = RunStatus::Stopped;
                break;
            }

            state = self.advance_one(state).await;
            progress.report(&state).await;

            // a stop request skips the pause and is honoured at the loop head
            if !state.is_complete() && !cancel() {
                self.resolver.sleeper().sleep(self.pace).await;
            }
        }

        state
    }
}

/// Counts of rows with and without an image, plus elapsed time.
pub fn summarize(state: &RunState) -> RunSummary {
    let with_images = state.dataset.populated_links();
    RunSummary {
        products_with_images: with_images,
        products_without_images: state.total() - with_images,
        elapsed_seconds: state.elapsed_seconds,
        status: state.status,
    }
}
