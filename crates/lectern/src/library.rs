use std::sync::Arc;

use tokio::task::JoinHandle;
use tracing::{debug, warn};

use lectern_cache::{WorkingSet, queue_adjacent_chapters};
use lectern_corpus::{ChapterKey, ChapterText, Corpus, chapter_key, translation_key};
use lectern_fetch::{CorpusLoader, HttpClient, LoadError, ProgressFn};
use lectern_store::DurableStore;

use crate::config::LibraryConfig;

/// One cached document: a whole translation under `bible:<id>` or a single
/// chapter under `<id>:<book>:<chapter>`.
#[derive(Clone)]
pub enum CachedDoc {
    Translation(Arc<Corpus>),
    Chapter(Arc<ChapterText>),
}

/// The application's composition root.
///
/// Owns the corpus loader and the working-set cache and exposes the read
/// surface the presentation layer consumes. Cloning is cheap and clones
/// share the same cache and loader; tests construct their own instance with
/// injected fakes instead of sharing process state.
pub struct Library<C, S> {
    loader: Arc<CorpusLoader<C, S>>,
    cache: Arc<WorkingSet<CachedDoc>>,
    config: LibraryConfig,
}

impl<C, S> Clone for Library<C, S> {
    fn clone(&self) -> Self {
        Self {
            loader: Arc::clone(&self.loader),
            cache: Arc::clone(&self.cache),
            config: self.config.clone(),
        }
    }
}

#[cfg(feature = "reqwest")]
impl Library<lectern_fetch::ReqwestClient, lectern_store::SledStore> {
    /// Production wiring: reqwest transport and an embedded sled store.
    pub fn open(config: LibraryConfig) -> Result<Self, lectern_store::StoreError> {
        let store = lectern_store::SledStore::open(&config.data_dir)?;
        Ok(Self::new(lectern_fetch::ReqwestClient::new(), store, config))
    }
}

impl<C, S> Library<C, S>
where
    C: HttpClient + 'static,
    S: DurableStore + 'static,
{
    pub fn new(client: C, store: S, config: LibraryConfig) -> Self {
        let loader = Arc::new(CorpusLoader::new(client, store, config.base_url.clone()));
        let cache = Arc::new(WorkingSet::new(config.cache_capacity, config.cache_ttl()));
        Self { loader, cache, config }
    }

    pub fn config(&self) -> &LibraryConfig {
        &self.config
    }

    pub fn cache(&self) -> &WorkingSet<CachedDoc> {
        &self.cache
    }

    /// Load a whole translation, memoizing it in the working set.
    ///
    /// Falls through to the loader (durable store, then network) on a cache
    /// miss. Progress reaches 100 exactly when the corpus is ready.
    pub async fn load_corpus(
        &self,
        translation: &str,
        on_progress: Option<&ProgressFn<'_>>,
    ) -> Result<Arc<Corpus>, LoadError> {
        let key = translation_key(translation);
        if let Some(CachedDoc::Translation(corpus)) = self.cache.get(&key) {
            debug!(translation, "translation served from working set");
            if let Some(callback) = on_progress {
                callback(100);
            }
            return Ok(corpus);
        }

        let corpus = self.loader.load(translation, on_progress).await?;
        self.cache.set(key, CachedDoc::Translation(Arc::clone(&corpus)));
        Ok(corpus)
    }

    /// Chapter lookup: working set first, loader as the ultimate fallback.
    ///
    /// `Ok(None)` means the corpus loaded but has no such book or chapter.
    pub async fn chapter(
        &self,
        translation: &str,
        book: &str,
        chapter: &str,
    ) -> Result<Option<Arc<ChapterText>>, LoadError> {
        let key = chapter_key(translation, book, chapter);
        if let Some(CachedDoc::Chapter(text)) = self.cache.get(&key) {
            return Ok(Some(text));
        }

        let corpus = self.load_corpus(translation, None).await?;
        let Some(text) = corpus.chapter(book, chapter) else {
            return Ok(None);
        };
        let text = Arc::new(text.clone());
        self.cache.set(key, CachedDoc::Chapter(Arc::clone(&text)));
        Ok(Some(text))
    }

    /// Single-verse lookup, read through the chapter cache.
    pub async fn verse(
        &self,
        translation: &str,
        book: &str,
        chapter: &str,
        verse: &str,
    ) -> Result<Option<String>, LoadError> {
        let chapter = self.chapter(translation, book, chapter).await?;
        Ok(chapter.and_then(|text| text.get(verse).cloned()))
    }

    /// Warm every given translation into the durable store and working set.
    ///
    /// Best-effort: a translation that fails to load is logged and skipped,
    /// the rest still load.
    pub async fn preload_translations(&self, translations: &[&str]) {
        for &translation in translations {
            if let Err(err) = self.load_corpus(translation, None).await {
                warn!(translation, error = %err, "preload failed");
            }
        }
    }

    /// Drop the persisted copies of `translations` and empty the working
    /// set. The next read of a cleared translation refetches it.
    pub async fn clear_translations(
        &self,
        translations: &[&str],
    ) -> Result<(), lectern_store::StoreError> {
        for &translation in translations {
            self.loader.evict(translation).await?;
        }
        self.cache.clear();
        Ok(())
    }

    /// Queue the chapters around the reader's position and drain the queue
    /// in the background. Per-key failures are logged, never surfaced.
    pub fn prefetch_adjacent(
        &self,
        translation: &str,
        book: &str,
        chapter: u32,
        total_chapters: u32,
    ) -> JoinHandle<()> {
        queue_adjacent_chapters(&self.cache, translation, book, chapter, total_chapters);
        let cache = Arc::clone(&self.cache);
        let loader = Arc::clone(&self.loader);
        tokio::spawn(async move {
            cache
                .process_prefetch_queue(move |key| {
                    let loader = Arc::clone(&loader);
                    async move { fetch_chapter(&loader, &key).await }
                })
                .await;
        })
    }

    /// Start the periodic expiry sweep; runs until the handle is aborted.
    pub fn start_sweeper(&self) -> JoinHandle<()> {
        self.cache.spawn_sweeper(self.config.sweep_period())
    }
}

/// Prefetch fetch-fn: resolve a chapter cache key through the loader, which
/// serves from the durable store once the translation is persisted.
async fn fetch_chapter<C, S>(loader: &CorpusLoader<C, S>, key: &str) -> Result<CachedDoc, String>
where
    C: HttpClient,
    S: DurableStore,
{
    let parsed = ChapterKey::parse(key).ok_or_else(|| format!("not a chapter key: {key}"))?;
    let corpus = loader
        .load(&parsed.translation, None)
        .await
        .map_err(|err| err.to_string())?;
    let text = corpus
        .chapter(&parsed.book, &parsed.chapter)
        .cloned()
        .ok_or_else(|| format!("chapter missing from corpus: {key}"))?;
    Ok(CachedDoc::Chapter(Arc::new(text)))
}
