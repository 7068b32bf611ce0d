use crate::adapters::csv_io::write_dataset;
use crate::adapters::state::StateStore;
use crate::adapters::{BingImageSearch, TokioSleeper};
use crate::config::EnricherConfig;
use crate::core::batch::BatchRunner;
use crate::core::resolver::ImageResolver;
use crate::domain::model::{Dataset, RunState, RunStatus};
use crate::domain::ports::{ImageSearch, ProgressSink, Sleeper, Storage};
use crate::utils::error::{EnrichError, Result};
use crate::utils::validation::Validate;
use async_trait::async_trait;

/// Loads or resumes a run, drives it with checkpointing, and writes the
/// enriched table once every row is done.
pub struct EnrichEngine<S: ImageSearch, Z: Sleeper, St: Storage> {
    runner: BatchRunner<S, Z>,
    store: StateStore<St>,
    output_path: String,
}

impl<St: Storage> EnrichEngine<BingImageSearch, TokioSleeper, St> {
    pub fn from_config(
        config: &EnricherConfig,
        store: StateStore<St>,
        output_path: impl Into<String>,
    ) -> Result<Self> {
        config.validate()?;

        let search = BingImageSearch::new(
            config.search.endpoint.clone(),
            &config.search.user_agent,
            config.timeout(),
            config.search_params(),
        )?;
        let resolver = ImageResolver::new(search, TokioSleeper, config.resolver_settings())?;
        let runner = BatchRunner::new(resolver, config.pace());
        Ok(Self::new(runner, store, output_path))
    }
}

impl<S: ImageSearch, Z: Sleeper, St: Storage> EnrichEngine<S, Z, St> {
    pub fn new(runner: BatchRunner<S, Z>, store: StateStore<St>, output_path: impl Into<String>) -> Self {
        Self {
            runner,
            store,
            output_path: output_path.into(),
        }
    }

    pub fn output_path(&self) -> &str {
        &self.output_path
    }

    pub async fn enrich<C>(
        &self,
        dataset: &Dataset,
        selected_columns: Vec<String>,
        fresh: bool,
        cancel: C,
    ) -> Result<RunState>
    where
        C: Fn() -> bool,
    {
        // checked here too: a matching saved run skips `RunState::begin`
        if dataset.is_enriched() {
            return Err(EnrichError::AlreadyEnriched {
                populated: dataset.populated_links(),
            });
        }

        if fresh {
            tracing::info!("Discarding saved progress in {}", self.store.path());
            self.store.clear().await?;
        }

        let state = match self.saved_run(dataset, &selected_columns, fresh).await {
            Some(saved) => saved,
            None => {
                tracing::info!(
                    "Starting new run over {} rows using [{}]",
                    dataset.len(),
                    selected_columns.join(", ")
                );
                RunState::begin(dataset, selected_columns)?
            }
        };
        self.store.save(&state).await?;

        let checkpoint = Checkpoint { store: &self.store };
        let state = self.runner.run(state, cancel, &checkpoint).await;

        match state.status {
            RunStatus::Completed => {
                let csv = write_dataset(&state.dataset)?;
                self.store
                    .storage()
                    .write_file(&self.output_path, &csv)
                    .await?;
                self.store.clear().await?;
                tracing::info!("Wrote enriched dataset to {}", self.output_path);
            }
            _ => {
                self.store.save(&state).await?;
                tracing::info!(
                    "Progress saved to {} at row {}/{}; rerun to resume",
                    self.store.path(),
                    state.cursor,
                    state.total()
                );
            }
        }

        Ok(state)
    }

    /// A resumable saved run for this exact input and selection, if any.
    /// A complete one is returned as-is so only the output write is repeated.
    async fn saved_run(
        &self,
        dataset: &Dataset,
        selected_columns: &[String],
        fresh: bool,
    ) -> Option<RunState> {
        if fresh {
            return None;
        }

        let mut saved = match self.store.load().await {
            Ok(Some(saved)) => saved,
            Ok(None) => return None,
            Err(e) => {
                tracing::warn!("Ignoring unreadable saved progress: {}", e);
                return None;
            }
        };

        if !saved.dataset.same_source(dataset) || saved.selected_columns != selected_columns {
            tracing::info!("Saved progress belongs to a different dataset or column selection");
            return None;
        }
        if saved.is_complete() {
            // every row resolved but the output was never written
            tracing::info!("Saved run already covers all {} rows; writing output", saved.total());
            return Some(saved);
        }

        if saved.status == RunStatus::Running {
            saved.status = RunStatus::Interrupted;
        }
        tracing::info!(
            "Resuming saved run at row {}/{} ({:?})",
            saved.cursor + 1,
            saved.total(),
            saved.status
        );
        Some(saved)
    }
}

/// Logs progress and persists the state after every row.
struct Checkpoint<'a, St: Storage> {
    store: &'a StateStore<St>,
}

#[async_trait]
impl<'a, St: Storage> ProgressSink for Checkpoint<'a, St> {
    async fn report(&self, state: &RunState) {
        tracing::info!("Processing {}/{}", state.cursor, state.total());
        if let Err(e) = self.store.save(state).await {
            tracing::warn!("Failed to checkpoint progress: {}", e);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::csv_io::read_dataset;
    use crate::adapters::storage::LocalStorage;
    use crate::core::resolver::ResolverSettings;
    use crate::domain::ports::SearchResponse;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;
    use std::time::Duration;
    use tempfile::TempDir;

    #[derive(Clone, Default)]
    struct CountingSearch {
        calls: Arc<AtomicUsize>,
    }

    #[async_trait]
    impl ImageSearch for CountingSearch {
        async fn fetch(&self, query: &str) -> Result<SearchResponse> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            Ok(SearchResponse {
                status: 200,
                body: format!(r#"<img class="mimg" src="https://img/{}.jpg">"#, query),
            })
        }
    }

    struct NoSleep;

    #[async_trait]
    impl Sleeper for NoSleep {
        async fn sleep(&self, _duration: Duration) {}
    }

    fn engine(dir: &TempDir, search: &CountingSearch) -> EnrichEngine<CountingSearch, NoSleep, LocalStorage> {
        let resolver =
            ImageResolver::new(search.clone(), NoSleep, ResolverSettings::default()).unwrap();
        let runner = BatchRunner::new(resolver, Duration::ZERO);
        let store = StateStore::new(LocalStorage::new(dir.path()), "state.json");
        EnrichEngine::new(runner, store, "out.csv")
    }

    fn dataset(csv: &str) -> Dataset {
        read_dataset(csv.as_bytes()).unwrap()
    }

    fn name() -> Vec<String> {
        vec!["Name".to_string()]
    }

    #[tokio::test]
    async fn test_completed_run_writes_output_and_clears_state() {
        let dir = TempDir::new().unwrap();
        let search = CountingSearch::default();
        let engine = engine(&dir, &search);

        let state = engine
            .enrich(&dataset("Name\nKettle\nToaster\n"), name(), false, || false)
            .await
            .unwrap();

        assert_eq!(state.status, RunStatus::Completed);
        let output = std::fs::read_to_string(dir.path().join("out.csv")).unwrap();
        assert_eq!(
            output,
            "Name,ImageLink\nKettle,https://img/Kettle.jpg\nToaster,https://img/Toaster.jpg\n"
        );
        assert!(!dir.path().join("state.json").exists());
    }

    #[tokio::test]
    async fn test_enriched_input_is_rejected_before_any_request() {
        let dir = TempDir::new().unwrap();
        let search = CountingSearch::default();
        let engine = engine(&dir, &search);

        let input = dataset("Name,ImageLink\nKettle,https://img/a.jpg\nToaster,https://img/b.jpg\n");
        let err = engine.enrich(&input, name(), false, || false).await.unwrap_err();

        assert!(matches!(err, EnrichError::AlreadyEnriched { populated: 2 }));
        assert_eq!(search.calls.load(Ordering::SeqCst), 0);
        assert!(!dir.path().join("state.json").exists());
    }

    #[tokio::test]
    async fn test_stopped_run_keeps_state_for_resume() {
        let dir = TempDir::new().unwrap();
        let search = CountingSearch::default();
        let engine = engine(&dir, &search);
        let input = dataset("Name\nKettle\nToaster\nMixer\n");

        let calls = search.calls.clone();
        let stopped = engine
            .enrich(&input, name(), false, move || calls.load(Ordering::SeqCst) >= 1)
            .await
            .unwrap();
        assert_eq!(stopped.status, RunStatus::Stopped);
        assert_eq!(stopped.cursor, 1);
        assert!(dir.path().join("state.json").exists());
        assert!(!dir.path().join("out.csv").exists());

        let resumed = engine.enrich(&input, name(), false, || false).await.unwrap();
        assert_eq!(resumed.status, RunStatus::Completed);
        assert_eq!(search.calls.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn test_saved_state_for_other_dataset_is_ignored() {
        let dir = TempDir::new().unwrap();
        let search = CountingSearch::default();
        let engine = engine(&dir, &search);

        let mut other = RunState::begin(&dataset("Name\nLamp\nDesk\n"), name()).unwrap();
        other.cursor = 1;
        engine.store.save(&other).await.unwrap();

        let state = engine
            .enrich(&dataset("Name\nKettle\nToaster\n"), name(), false, || false)
            .await
            .unwrap();

        assert_eq!(state.status, RunStatus::Completed);
        assert_eq!(search.calls.load(Ordering::SeqCst), 2);
        assert_eq!(state.dataset.records[0].get("Name"), Some(Some("Kettle")));
    }

    #[tokio::test]
    async fn test_fresh_discards_saved_progress() {
        let dir = TempDir::new().unwrap();
        let search = CountingSearch::default();
        let engine = engine(&dir, &search);
        let input = dataset("Name\nKettle\nToaster\n");

        let mut saved = RunState::begin(&input, name()).unwrap();
        saved.cursor = 1;
        saved.status = RunStatus::Running;
        engine.store.save(&saved).await.unwrap();

        engine.enrich(&input, name(), true, || false).await.unwrap();

        assert_eq!(search.calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn test_failed_output_write_keeps_resolved_rows() {
        let dir = TempDir::new().unwrap();
        let search = CountingSearch::default();
        let engine = engine(&dir, &search);
        let input = dataset("Name\nKettle\nToaster\nMixer\n");

        std::fs::create_dir(dir.path().join("out.csv")).unwrap();
        let err = engine.enrich(&input, name(), false, || false).await.unwrap_err();
        assert!(matches!(err, EnrichError::IoError(_)));
        assert!(dir.path().join("state.json").exists());
        assert_eq!(search.calls.load(Ordering::SeqCst), 3);

        std::fs::remove_dir(dir.path().join("out.csv")).unwrap();
        let state = engine.enrich(&input, name(), false, || false).await.unwrap();

        assert_eq!(state.status, RunStatus::Completed);
        assert_eq!(search.calls.load(Ordering::SeqCst), 3);
        let output = std::fs::read_to_string(dir.path().join("out.csv")).unwrap();
        assert!(output.contains("Mixer,https://img/Mixer.jpg"));
        assert!(!dir.path().join("state.json").exists());
    }
}
