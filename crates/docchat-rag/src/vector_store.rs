//! File-backed vector store

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::io::Write;
use std::path::{Path, PathBuf};
use tempfile::NamedTempFile;
use tokio::sync::RwLock;
use tracing::{debug, info};
use uuid::Uuid;

use docchat_core::{EmbeddingRecord, Error, Result, ScoredRecord, StoreStats, VectorStore};

const FORMAT_VERSION: u32 = 1;

#[derive(Debug, Clone, Serialize, Deserialize)]
struct StoredRecord {
    id: String,
    vector: Vec<f32>,
    text: String,
    #[serde(default)]
    metadata: serde_json::Value,
}

/// On-disk layout, read side
#[derive(Debug, Deserialize)]
struct StoreFile {
    version: u32,
    dimension: Option<usize>,
    records: Vec<StoredRecord>,
}

/// On-disk layout, write side; borrows so a batch can be staged without cloning the store
#[derive(Serialize)]
struct StoreFileRef<'a> {
    version: u32,
    dimension: Option<usize>,
    records: Vec<&'a StoredRecord>,
}

#[derive(Debug, Default)]
struct StoreState {
    dimension: Option<usize>,
    records: Vec<StoredRecord>,
}

/// Vector store holding every record in memory and persisting to a single JSON file.
///
/// Each `add` rewrites the whole file through a temporary file in the same directory
/// and renames it into place, then publishes the batch in memory. A failure at any
/// step leaves both the file and the visible records as they were. Writers take the
/// lock exclusively; queries share it.
pub struct FileVectorStore {
    path: Option<PathBuf>,
    state: RwLock<StoreState>,
}

impl FileVectorStore {
    /// Open the store persisted at `path`, creating it on the first write if absent
    pub async fn open(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref().to_path_buf();
        let state = match tokio::fs::read(&path).await {
            Ok(bytes) => Self::load(&path, &bytes)?,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                info!("No vector store at {}, starting empty", path.display());
                StoreState::default()
            }
            Err(e) => return Err(Error::Io(e)),
        };

        Ok(Self {
            path: Some(path),
            state: RwLock::new(state),
        })
    }

    /// Create a store that lives only as long as this handle
    pub fn in_memory() -> Self {
        Self {
            path: None,
            state: RwLock::new(StoreState::default()),
        }
    }

    fn load(path: &Path, bytes: &[u8]) -> Result<StoreState> {
        let file: StoreFile = serde_json::from_slice(bytes).map_err(|e| {
            Error::VectorStore(format!("corrupt store file {}: {}", path.display(), e))
        })?;

        if file.version != FORMAT_VERSION {
            return Err(Error::VectorStore(format!(
                "unsupported store format version {} in {}",
                file.version,
                path.display()
            )));
        }

        if let Some(record) = file
            .records
            .iter()
            .find(|r| Some(r.vector.len()) != file.dimension)
        {
            return Err(Error::VectorStore(format!(
                "corrupt store file {}: record {} has {} dimensions, expected {:?}",
                path.display(),
                record.id,
                record.vector.len(),
                file.dimension
            )));
        }

        info!(
            "Loaded {} records from {}",
            file.records.len(),
            path.display()
        );
        Ok(StoreState {
            dimension: file.dimension,
            records: file.records,
        })
    }

    /// Write the full store to `path` atomically
    async fn persist(path: &Path, contents: Vec<u8>) -> Result<()> {
        let path = path.to_path_buf();
        tokio::task::spawn_blocking(move || {
            let dir = match path.parent() {
                Some(parent) if !parent.as_os_str().is_empty() => parent.to_path_buf(),
                _ => PathBuf::from("."),
            };
            let mut staged = NamedTempFile::new_in(&dir)?;
            staged.write_all(&contents)?;
            staged.as_file().sync_all()?;
            staged.persist(&path).map_err(|e| e.error)?;
            Ok::<_, std::io::Error>(())
        })
        .await
        .map_err(|e| Error::VectorStore(format!("persist task failed: {}", e)))?
        .map_err(|e| Error::VectorStore(format!("failed to write store: {}", e)))
    }
}

/// Determine the batch dimensionality, rejecting vectors that disagree with the store
fn validate_batch(established: Option<usize>, records: &[EmbeddingRecord]) -> Result<usize> {
    let expected = match established {
        Some(dimension) => dimension,
        None => records.first().map(|r| r.vector.len()).unwrap_or_default(),
    };

    if expected == 0 {
        return Err(Error::InvalidInput("vectors must not be empty".to_string()));
    }

    for record in records {
        if record.vector.len() != expected {
            return Err(Error::DimensionMismatch {
                expected,
                actual: record.vector.len(),
            });
        }
        if record.vector.iter().any(|v| !v.is_finite()) {
            return Err(Error::InvalidInput(
                "vectors must contain only finite values".to_string(),
            ));
        }
    }

    Ok(expected)
}

/// Calculate cosine similarity between two vectors
pub fn cosine_similarity(a: &[f32], b: &[f32]) -> f32 {
    if a.len() != b.len() || a.is_empty() {
        return 0.0;
    }

    let dot_product: f32 = a.iter().zip(b.iter()).map(|(x, y)| x * y).sum();
    let norm_a: f32 = a.iter().map(|x| x * x).sum::<f32>().sqrt();
    let norm_b: f32 = b.iter().map(|x| x * x).sum::<f32>().sqrt();
    let denom = norm_a * norm_b;

    if denom <= f32::EPSILON {
        0.0
    } else {
        dot_product / denom
    }
}

#[async_trait]
impl VectorStore for FileVectorStore {
    async fn add(&self, records: Vec<EmbeddingRecord>) -> Result<usize> {
        if records.is_empty() {
            return Ok(0);
        }

        let mut state = self.state.write().await;
        let dimension = validate_batch(state.dimension, &records)?;

        let staged: Vec<StoredRecord> = records
            .into_iter()
            .map(|record| StoredRecord {
                id: Uuid::new_v4().to_string(),
                vector: record.vector,
                text: record.text,
                metadata: record.metadata,
            })
            .collect();

        if let Some(path) = &self.path {
            let file = StoreFileRef {
                version: FORMAT_VERSION,
                dimension: Some(dimension),
                records: state.records.iter().chain(staged.iter()).collect(),
            };
            let contents = serde_json::to_vec(&file)?;
            Self::persist(path, contents).await?;
        }

        let added = staged.len();
        state.records.extend(staged);
        state.dimension = Some(dimension);

        info!(
            "Committed batch of {} records ({} total)",
            added,
            state.records.len()
        );
        Ok(added)
    }

    async fn query(&self, vector: &[f32], k: usize) -> Result<Vec<ScoredRecord>> {
        if k == 0 {
            return Err(Error::InvalidQuery("k must be at least 1".to_string()));
        }

        let state = self.state.read().await;
        let Some(dimension) = state.dimension else {
            return Ok(Vec::new());
        };
        if vector.len() != dimension {
            return Err(Error::DimensionMismatch {
                expected: dimension,
                actual: vector.len(),
            });
        }

        let mut scored: Vec<(f32, &StoredRecord)> = state
            .records
            .iter()
            .map(|record| (cosine_similarity(vector, &record.vector), record))
            .collect();

        // Stable sort: equal scores keep insertion order
        scored.sort_by(|a, b| b.0.total_cmp(&a.0));
        scored.truncate(k);

        debug!("Query matched {} of {} records", scored.len(), state.records.len());

        Ok(scored
            .into_iter()
            .map(|(score, record)| ScoredRecord {
                text: record.text.clone(),
                metadata: record.metadata.clone(),
                score,
            })
            .collect())
    }

    async fn count(&self) -> Result<usize> {
        Ok(self.state.read().await.records.len())
    }

    async fn dimension(&self) -> Result<Option<usize>> {
        Ok(self.state.read().await.dimension)
    }

    async fn stats(&self) -> Result<StoreStats> {
        let state = self.state.read().await;
        Ok(StoreStats {
            records: state.records.len(),
            dimension: state.dimension,
            location: self.path.as_ref().map(|p| p.display().to_string()),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use std::sync::Arc;
    use tempfile::TempDir;

    fn record(vector: Vec<f32>, text: &str) -> EmbeddingRecord {
        EmbeddingRecord::new(vector, text)
    }

    #[test]
    fn test_cosine_similarity() {
        let vec1 = vec![1.0, 0.0, 0.0];
        let vec2 = vec![1.0, 0.0, 0.0];
        let vec3 = vec![0.0, 1.0, 0.0];

        assert!((cosine_similarity(&vec1, &vec2) - 1.0).abs() < 0.001);
        assert!((cosine_similarity(&vec1, &vec3) - 0.0).abs() < 0.001);
        assert_eq!(cosine_similarity(&[0.0, 0.0], &[1.0, 0.0]), 0.0);
    }

    #[tokio::test]
    async fn test_self_match_is_top_result() {
        let store = FileVectorStore::in_memory();
        store
            .add(vec![
                record(vec![1.0, 0.0, 0.0], "x axis"),
                record(vec![0.0, 1.0, 0.0], "y axis"),
                record(vec![0.6, 0.8, 0.0], "diagonal"),
            ])
            .await
            .unwrap();

        let results = store.query(&[0.6, 0.8, 0.0], 1).await.unwrap();
        assert_eq!(results.len(), 1);
        assert_eq!(results[0].text, "diagonal");
        assert!((results[0].score - 1.0).abs() < 1e-5);
    }

    #[tokio::test]
    async fn test_results_ordered_and_ties_keep_insertion_order() {
        let store = FileVectorStore::in_memory();
        store
            .add(vec![
                record(vec![0.0, 1.0], "orthogonal"),
                record(vec![2.0, 0.0], "first parallel"),
                record(vec![1.0, 1.0], "diagonal"),
                record(vec![5.0, 0.0], "second parallel"),
            ])
            .await
            .unwrap();

        let results = store.query(&[1.0, 0.0], 10).await.unwrap();
        let texts: Vec<&str> = results.iter().map(|r| r.text.as_str()).collect();
        assert_eq!(
            texts,
            vec!["first parallel", "second parallel", "diagonal", "orthogonal"]
        );
        assert!(results.windows(2).all(|w| w[0].score >= w[1].score));
    }

    #[tokio::test]
    async fn test_k_larger_than_store_returns_all() {
        let store = FileVectorStore::in_memory();
        store.add(vec![record(vec![1.0, 0.0], "only")]).await.unwrap();
        assert_eq!(store.query(&[1.0, 0.0], 50).await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_zero_k_is_invalid() {
        let store = FileVectorStore::in_memory();
        let result = store.query(&[1.0], 0).await;
        assert!(matches!(result, Err(Error::InvalidQuery(_))));
    }

    #[tokio::test]
    async fn test_empty_store_returns_nothing() {
        let store = FileVectorStore::in_memory();
        assert!(store.query(&[1.0, 2.0], 3).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_dimension_mismatch_rejects_whole_batch() {
        let store = FileVectorStore::in_memory();
        store.add(vec![record(vec![1.0, 0.0], "seed")]).await.unwrap();

        let result = store
            .add(vec![
                record(vec![0.0, 1.0], "ok"),
                record(vec![0.0, 1.0], "ok too"),
                record(vec![0.0, 1.0, 0.0], "wrong"),
            ])
            .await;

        assert!(matches!(
            result,
            Err(Error::DimensionMismatch { expected: 2, actual: 3 })
        ));
        assert_eq!(store.count().await.unwrap(), 1);
    }

    #[tokio::test]
    async fn test_mixed_dimensions_in_first_batch_rejected() {
        let store = FileVectorStore::in_memory();
        let result = store
            .add(vec![record(vec![1.0], "a"), record(vec![1.0, 2.0], "b")])
            .await;
        assert!(matches!(result, Err(Error::DimensionMismatch { .. })));
        assert_eq!(store.dimension().await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_query_dimension_mismatch() {
        let store = FileVectorStore::in_memory();
        store.add(vec![record(vec![1.0, 0.0], "a")]).await.unwrap();
        let result = store.query(&[1.0, 0.0, 0.0], 1).await;
        assert!(matches!(result, Err(Error::DimensionMismatch { .. })));
    }

    #[tokio::test]
    async fn test_non_finite_vectors_rejected() {
        let store = FileVectorStore::in_memory();
        let result = store.add(vec![record(vec![f32::NAN, 1.0], "nan")]).await;
        assert!(matches!(result, Err(Error::InvalidInput(_))));
        assert_eq!(store.count().await.unwrap(), 0);
    }

    #[tokio::test]
    async fn test_persistence_across_reopen() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("store.json");

        let query = [0.9, 0.1, 0.0];
        let before = {
            let store = FileVectorStore::open(&path).await.unwrap();
            store
                .add(vec![
                    record(vec![1.0, 0.0, 0.0], "one").with_metadata(json!({"source": "a"})),
                    record(vec![0.0, 1.0, 0.0], "two"),
                ])
                .await
                .unwrap();
            store
                .add(vec![record(vec![0.7, 0.7, 0.1], "three")])
                .await
                .unwrap();
            store.query(&query, 3).await.unwrap()
        };

        let reopened = FileVectorStore::open(&path).await.unwrap();
        assert_eq!(reopened.count().await.unwrap(), 3);
        assert_eq!(reopened.dimension().await.unwrap(), Some(3));
        assert_eq!(reopened.query(&query, 3).await.unwrap(), before);
    }

    #[tokio::test]
    async fn test_failed_write_leaves_store_unchanged() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("missing").join("store.json");

        let store = FileVectorStore::open(&path).await.unwrap();
        let result = store
            .add(vec![record(vec![1.0, 0.0], "a"), record(vec![0.0, 1.0], "b")])
            .await;

        assert!(matches!(result, Err(Error::VectorStore(_))));
        assert_eq!(store.count().await.unwrap(), 0);
        assert_eq!(store.dimension().await.unwrap(), None);
        assert!(!path.exists());
    }

    #[tokio::test]
    async fn test_corrupt_file_rejected() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("store.json");
        std::fs::write(
            &path,
            r#"{"version":1,"dimension":2,"records":[{"id":"x","vector":[1.0],"text":"t"}]}"#,
        )
        .unwrap();

        let result = FileVectorStore::open(&path).await;
        assert!(matches!(result, Err(Error::VectorStore(_))));
    }

    #[tokio::test]
    async fn test_concurrent_batches_are_serialized() {
        let dir = TempDir::new().unwrap();
        let store = Arc::new(FileVectorStore::open(dir.path().join("store.json")).await.unwrap());

        let mut handles = Vec::new();
        for batch in 0..8 {
            let store = store.clone();
            handles.push(tokio::spawn(async move {
                let records = (0..5)
                    .map(|i| record(vec![batch as f32 + 1.0, i as f32], "r"))
                    .collect();
                store.add(records).await
            }));
        }
        for handle in handles {
            assert_eq!(handle.await.unwrap().unwrap(), 5);
        }

        let reopened = FileVectorStore::open(dir.path().join("store.json")).await.unwrap();
        assert_eq!(reopened.count().await.unwrap(), 40);
    }
}
