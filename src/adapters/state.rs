use crate::domain::model::RunState;
use crate::domain::ports::Storage;
use crate::utils::error::{EnrichError, Result};
use std::io::ErrorKind;

/// Persists the in-progress `RunState` as JSON.
pub struct StateStore<S: Storage> {
    storage: S,
    path: String,
}

impl<S: Storage> StateStore<S> {
    pub fn new(storage: S, path: impl Into<String>) -> Self {
        Self {
            storage,
            path: path.into(),
        }
    }

    pub fn path(&self) -> &str {
        &self.path
    }

    pub fn storage(&self) -> &S {
        &self.storage
    }

    /// `Ok(None)` when nothing has been saved yet.
    pub async fn load(&self) -> Result<Option<RunState>> {
        let data = match self.storage.read_file(&self.path).await {
            Ok(data) => data,
            Err(EnrichError::IoError(e)) if e.kind() == ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(e),
        };

        let state: RunState = serde_json::from_slice(&data)?;
        tracing::debug!(
            "Loaded saved run from {} (row {}/{}, {:?})",
            self.path,
            state.cursor,
            state.total(),
            state.status
        );
        Ok(Some(state))
    }

    pub async fn save(&self, state: &RunState) -> Result<()> {
        let json = serde_json::to_vec_pretty(state)?;
        self.storage.write_file(&self.path, &json).await
    }

    pub async fn clear(&self) -> Result<()> {
        self.storage.remove_file(&self.path).await
    }
}
