//! Load-once dataset cache.
//!
//! The statements file is read at most once per process. The cache owns the
//! dataset and hands out shared references; it is never invalidated, so a
//! changed file is only picked up by restarting the process.

use std::path::{Path, PathBuf};
use std::sync::OnceLock;

use tracing::debug;

use crate::domain::Dataset;
use crate::error::AppError;
use crate::io::ingest::{DecimalStyle, load_dataset};

/// Environment variable naming the default statements CSV.
pub const DATA_PATH_ENV: &str = "BOVESPA_CSV";

/// Fallback path when neither `--data` nor `BOVESPA_CSV` is set.
pub const DEFAULT_DATA_PATH: &str = "database.csv";

#[derive(Debug)]
pub struct DatasetCache {
    path: PathBuf,
    style: DecimalStyle,
    dataset: OnceLock<Dataset>,
}

impl DatasetCache {
    pub fn new(path: impl Into<PathBuf>, style: DecimalStyle) -> Self {
        Self {
            path: path.into(),
            style,
            dataset: OnceLock::new(),
        }
    }

    /// Resolve the data path from an explicit override, then `.env` /
    /// `BOVESPA_CSV`, then `database.csv`.
    pub fn from_env(path: Option<PathBuf>, style: DecimalStyle) -> Self {
        dotenvy::dotenv().ok();
        let path = path
            .or_else(|| std::env::var_os(DATA_PATH_ENV).map(PathBuf::from))
            .unwrap_or_else(|| PathBuf::from(DEFAULT_DATA_PATH));
        Self::new(path, style)
    }

    /// Wrap an already-loaded dataset (tests, embedding).
    pub fn preloaded(dataset: Dataset) -> Self {
        let cache = Self::new(PathBuf::new(), DecimalStyle::default());
        let _ = cache.dataset.set(dataset);
        cache
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn is_loaded(&self) -> bool {
        self.dataset.get().is_some()
    }

    /// The dataset, loading it on first use.
    pub fn get(&self) -> Result<&Dataset, AppError> {
        if let Some(dataset) = self.dataset.get() {
            return Ok(dataset);
        }
        debug!(path = %self.path.display(), "dataset cache miss");
        let loaded = load_dataset(&self.path, self.style)?;
        Ok(self.dataset.get_or_init(|| loaded))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::StatementRow;

    #[test]
    fn preloaded_cache_never_touches_disk() {
        let cache = DatasetCache::preloaded(Dataset::new(vec![StatementRow::new("Q", "ALFA", 2020)]));
        assert!(cache.is_loaded());
        assert_eq!(cache.get().unwrap().len(), 1);
    }

    #[test]
    fn missing_file_is_a_data_load_error_and_stays_unloaded() {
        let cache = DatasetCache::new("/nonexistent/bovespa.csv", DecimalStyle::Comma);
        assert!(matches!(cache.get(), Err(AppError::DataLoad(_))));
        assert!(!cache.is_loaded());
    }

    #[test]
    fn repeated_gets_return_the_same_dataset() {
        let cache = DatasetCache::preloaded(Dataset::new(vec![StatementRow::new("Q", "ALFA", 2020)]));
        let a = cache.get().unwrap() as *const Dataset;
        let b = cache.get().unwrap() as *const Dataset;
        assert_eq!(a, b);
    }
}
