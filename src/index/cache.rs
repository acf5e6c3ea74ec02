//! Process-wide memoization of the corpus index.

use super::CorpusIndex;
use crate::error::Result;
use std::future::Future;
use std::sync::Arc;
use tokio::sync::OnceCell;

/// One-time-initialized holder for a [`CorpusIndex`].
///
/// The first successful `get_or_build` stores the index; every later call
/// returns the same `Arc` without running its builder, whatever the builder
/// would have read. A failed build leaves the cache empty.
pub struct IndexCache {
    cell: OnceCell<Arc<CorpusIndex>>,
}

impl IndexCache {
    pub const fn new() -> Self {
        Self {
            cell: OnceCell::const_new(),
        }
    }

    /// Return the cached index, building it with `build` if absent.
    ///
    /// Concurrent callers wait for the single in-flight build.
    pub async fn get_or_build<F, Fut>(&self, build: F) -> Result<Arc<CorpusIndex>>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<CorpusIndex>>,
    {
        self.cell
            .get_or_try_init(move || async move { build().await.map(Arc::new) })
            .await
            .cloned()
    }

    /// The cached index, if one was built.
    pub fn get(&self) -> Option<Arc<CorpusIndex>> {
        self.cell.get().cloned()
    }
}

impl Default for IndexCache {
    fn default() -> Self {
        Self::new()
    }
}

static SHARED_INDEX: IndexCache = IndexCache::new();

/// The cache used by the binary; lives for the whole process.
pub fn shared_cache() -> &'static IndexCache {
    &SHARED_INDEX
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::VidchatError;
    use crate::index::testing::{LetterEmbedder, RecordingFetcher};
    use crate::chunking::ChunkingConfig;
    use crate::index::CorpusIndexer;
    use std::io::Write;
    use std::sync::atomic::{AtomicUsize, Ordering};

    #[tokio::test]
    async fn test_builds_once_and_returns_same_index() {
        let cache = IndexCache::new();
        let builds = AtomicUsize::new(0);
        let indexer = CorpusIndexer::new(
            Arc::new(RecordingFetcher::default()),
            Arc::new(LetterEmbedder),
            ChunkingConfig::default(),
        );
        let (builds, indexer) = (&builds, &indexer);

        let first = cache
            .get_or_build(move || async move {
                builds.fetch_add(1, Ordering::SeqCst);
                indexer.build(&["aaaaaaaaaaa\n".to_string()]).await
            })
            .await
            .unwrap();

        // A different source list must not produce a different index.
        let second = cache
            .get_or_build(move || async move {
                builds.fetch_add(1, Ordering::SeqCst);
                indexer
                    .build(&["bbbbbbbbbbb\n".to_string(), "ccccccccccc\n".to_string()])
                    .await
            })
            .await
            .unwrap();

        assert!(Arc::ptr_eq(&first, &second));
        assert_eq!(builds.load(Ordering::SeqCst), 1);
        assert_eq!(second.sources(), &["aaaaaaaaaaa".to_string()]);
        assert!(Arc::ptr_eq(&cache.get().unwrap(), &first));
    }

    #[tokio::test]
    async fn test_source_file_changes_are_ignored_after_first_build() {
        let cache = IndexCache::new();
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "https://youtu.be/aaaaaaaaaaa").unwrap();
        let path = file.path().to_path_buf();

        let indexer = CorpusIndexer::new(
            Arc::new(RecordingFetcher::default()),
            Arc::new(LetterEmbedder),
            ChunkingConfig::default(),
        );
        let (path, indexer) = (path.as_path(), &indexer);
        let build = move || async move {
            let sources = crate::sources::load_source_list(path)?;
            indexer.build(&sources).await
        };

        let first = cache.get_or_build(build).await.unwrap();
        writeln!(file, "https://youtu.be/bbbbbbbbbbb").unwrap();
        let second = cache.get_or_build(build).await.unwrap();

        assert!(Arc::ptr_eq(&first, &second));
        assert_eq!(second.sources().len(), 1);
    }

    #[tokio::test]
    async fn test_failed_build_is_not_cached() {
        let cache = IndexCache::new();

        let err = cache
            .get_or_build(|| async { Err(VidchatError::Transcript("offline".to_string())) })
            .await;
        tokio_test::assert_err!(err);
        assert!(cache.get().is_none());

        let indexer = CorpusIndexer::new(
            Arc::new(RecordingFetcher::default()),
            Arc::new(LetterEmbedder),
            ChunkingConfig::default(),
        );
        let sources = vec!["x\n".to_string()];
        let index = cache.get_or_build(|| indexer.build(&sources)).await;
        tokio_test::assert_ok!(index);
    }
}
