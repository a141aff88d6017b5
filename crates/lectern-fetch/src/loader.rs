use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use futures_util::StreamExt;
use tracing::{debug, info, warn};

use lectern_corpus::{Book, Corpus, store_key};
use lectern_store::DurableStore;

use crate::error::LoadError;
use crate::http::{HttpBody, HttpClient};
use crate::progress::{ProgressFn, transfer_percent};

/// Fixed deadline for the primary corpus fetch.
pub const FETCH_TIMEOUT: Duration = Duration::from_secs(30);

/// Advertised content length is a hint, not a promise; never pre-allocate
/// more than this on its say-so.
const MAX_PREALLOC: u64 = 64 * 1024 * 1024;

/// Orchestrates corpus acquisition for whole translations.
///
/// Load order: durable store → best-effort extras patch → streaming network
/// fetch → write-through persistence. Concurrent loads of the same
/// translation are serialized through a per-translation lock; the second
/// caller re-checks the store after acquiring it and takes the offline path,
/// so the multi-megabyte fetch happens at most once.
pub struct CorpusLoader<C, S> {
    client: C,
    store: S,
    base_url: String,
    timeout: Duration,
    in_flight: Mutex<HashMap<String, Arc<tokio::sync::Mutex<()>>>>,
}

impl<C: HttpClient, S: DurableStore> CorpusLoader<C, S> {
    /// `base_url` is the origin serving `/translations/<id>.json` documents,
    /// without a trailing slash.
    pub fn new(client: C, store: S, base_url: impl Into<String>) -> Self {
        Self {
            client,
            store,
            base_url: base_url.into(),
            timeout: FETCH_TIMEOUT,
            in_flight: Mutex::new(HashMap::new()),
        }
    }

    /// Override the fetch deadline. Mainly for tests.
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Load the corpus for `translation`, reporting progress 0–100.
    ///
    /// Progress stays at or below [`crate::TRANSFER_CAP`] while bytes
    /// arrive; 100 means parsed, patched and ready. When the response
    /// carries no content length only 0 and 100 are reported.
    pub async fn load(
        &self,
        translation: &str,
        on_progress: Option<&ProgressFn<'_>>,
    ) -> Result<Arc<Corpus>, LoadError> {
        let slot = self.entry_lock(translation);
        let _held = slot.lock().await;

        let key = store_key(translation);
        let cached = match self.store.get_json::<Corpus>(&key).await {
            Ok(cached) => cached,
            Err(err) => {
                // A broken store read degrades to a network fetch.
                warn!(translation, error = %err, "durable store read failed");
                None
            }
        };

        if let Some(mut corpus) = cached {
            debug!(translation, "corpus served from durable store");
            if self.merge_extras(translation, &mut corpus).await {
                self.persist(&key, &corpus).await;
            }
            report(on_progress, 100);
            return Ok(Arc::new(corpus));
        }

        let mut corpus = self.fetch_corpus(translation, on_progress).await?;
        self.merge_extras(translation, &mut corpus).await;
        self.persist(&key, &corpus).await;
        report(on_progress, 100);
        info!(translation, books = corpus.len(), "corpus fetched and persisted");
        Ok(Arc::new(corpus))
    }

    /// Stream, decode and validate the primary corpus document.
    async fn fetch_corpus(
        &self,
        translation: &str,
        on_progress: Option<&ProgressFn<'_>>,
    ) -> Result<Corpus, LoadError> {
        let url = format!("{}/translations/{}.json", self.base_url, translation);
        let body = tokio::time::timeout(self.timeout, self.read_body(&url, on_progress))
            .await
            .map_err(|_| LoadError::Timeout(self.timeout))??;
        parse_corpus(&body)
    }

    async fn read_body(
        &self,
        url: &str,
        on_progress: Option<&ProgressFn<'_>>,
    ) -> Result<Vec<u8>, LoadError> {
        let HttpBody { content_length, mut stream } = self
            .client
            .stream(url)
            .await
            .map_err(|err| LoadError::Network(err.to_string()))?;

        report(on_progress, 0);
        let mut body = Vec::with_capacity(
            content_length.map(|len| len.min(MAX_PREALLOC) as usize).unwrap_or(0),
        );
        while let Some(chunk) = stream.next().await {
            let chunk = chunk.map_err(|err| LoadError::Network(err.to_string()))?;
            body.extend_from_slice(&chunk);
            // Without a content length there is no incremental percentage;
            // the caller sees 0 now and 100 once parsing finishes.
            if let Some(len) = content_length {
                report(on_progress, transfer_percent(body.len() as u64, len));
            }
        }
        Ok(body)
    }

    /// Best-effort fetch and merge of the supplementary extras document.
    ///
    /// A missing or malformed patch never blocks the primary corpus; the
    /// patch only ever adds new top-level books. Returns true when an extras
    /// document was fetched and parsed, whether or not it added anything.
    async fn merge_extras(&self, translation: &str, corpus: &mut Corpus) -> bool {
        let url = format!("{}/translations/{}.extras.json", self.base_url, translation);
        let body = match self.client.get(&url).await {
            Ok(body) => body,
            Err(err) => {
                debug!(translation, error = %err, "no extras document");
                return false;
            }
        };
        let extras: HashMap<String, Book> = match serde_json::from_slice(&body) {
            Ok(extras) => extras,
            Err(err) => {
                warn!(translation, error = %err, "malformed extras document ignored");
                return false;
            }
        };
        let added = corpus.merge_books(extras);
        if !added.is_empty() {
            info!(translation, books = ?added, "merged extras into corpus");
        }
        true
    }

    /// Remove the persisted corpus for `translation` from the durable store.
    ///
    /// The next load of that translation goes back to the network.
    pub async fn evict(&self, translation: &str) -> lectern_store::Result<()> {
        self.store.delete_raw(&store_key(translation)).await
    }

    /// Write-through persistence; a failed write must not fail the load.
    async fn persist(&self, key: &str, corpus: &Corpus) {
        if let Err(err) = self.store.put_json(key, corpus).await {
            warn!(key, error = %err, "durable store write failed");
        }
    }

    fn entry_lock(&self, translation: &str) -> Arc<tokio::sync::Mutex<()>> {
        let mut in_flight = self.in_flight.lock().unwrap_or_else(|poisoned| poisoned.into_inner());
        in_flight.entry(translation.to_string()).or_default().clone()
    }
}

fn report(on_progress: Option<&ProgressFn<'_>>, percent: u8) {
    if let Some(callback) = on_progress {
        callback(percent);
    }
}

/// Decode UTF-8 JSON bytes into a corpus, discriminating the failure modes
/// the caller's retry UI cares about.
fn parse_corpus(body: &[u8]) -> Result<Corpus, LoadError> {
    let text = std::str::from_utf8(body).map_err(|err| LoadError::Parse(err.to_string()))?;
    let value: serde_json::Value =
        serde_json::from_str(text).map_err(|err| LoadError::Parse(err.to_string()))?;
    let Some(object) = value.as_object() else {
        return Err(LoadError::InvalidShape);
    };
    if object.is_empty() {
        return Err(LoadError::Empty);
    }
    serde_json::from_value(value).map_err(|err| LoadError::Parse(err.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_corpus_discriminates_shapes() {
        assert!(matches!(parse_corpus(b"not json"), Err(LoadError::Parse(_))));
        assert!(matches!(parse_corpus(b"[1,2,3]"), Err(LoadError::InvalidShape)));
        assert!(matches!(parse_corpus(b"\"text\""), Err(LoadError::InvalidShape)));
        assert!(matches!(parse_corpus(b"{}"), Err(LoadError::Empty)));
        assert!(matches!(parse_corpus(&[0xff, 0xfe]), Err(LoadError::Parse(_))));

        let corpus = parse_corpus(br#"{"Genesis":{"1":{"1":"In the beginning"}}}"#).unwrap();
        assert_eq!(corpus.verse("Genesis", "1", "1"), Some("In the beginning"));
    }

    #[test]
    fn test_parse_corpus_rejects_wrong_inner_shape() {
        assert!(matches!(parse_corpus(br#"{"Genesis": 3}"#), Err(LoadError::Parse(_))));
    }
}
