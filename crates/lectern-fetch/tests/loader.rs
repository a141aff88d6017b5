//! End-to-end loader behavior against a scripted HTTP client and an
//! in-memory durable store.

use std::fmt;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use bytes::Bytes;
use futures_util::stream;
use lectern_corpus::{Corpus, store_key};
use lectern_fetch::{CorpusLoader, FETCH_TIMEOUT, HttpBody, HttpClient, LoadError, TRANSFER_CAP};
use lectern_store::{DurableStore, MemoryStore};

const GENESIS: &str =
    r#"{"Genesis":{"1":{"1":"In the beginning God created the heaven and the earth"}}}"#;
const JUBILEES_EXTRAS: &str = r#"{"Jubilees":{"1":{"1":"These are the words"}}}"#;

const CHUNK: usize = 8;

#[derive(Debug)]
struct FakeHttpError(&'static str);

impl fmt::Display for FakeHttpError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl std::error::Error for FakeHttpError {}

/// Scripted [`HttpClient`]: serves one corpus document (in small chunks) and
/// one extras document, or fails in configurable ways.
struct FakeClient {
    corpus: Option<Vec<u8>>,
    extras: Option<Vec<u8>>,
    advertise_length: bool,
    hang: bool,
    corpus_requests: Arc<AtomicUsize>,
}

impl FakeClient {
    fn new() -> Self {
        Self {
            corpus: None,
            extras: None,
            advertise_length: true,
            hang: false,
            corpus_requests: Arc::new(AtomicUsize::new(0)),
        }
    }

    fn corpus(mut self, json: &str) -> Self {
        self.corpus = Some(json.as_bytes().to_vec());
        self
    }

    fn extras(mut self, json: &str) -> Self {
        self.extras = Some(json.as_bytes().to_vec());
        self
    }

    fn without_length(mut self) -> Self {
        self.advertise_length = false;
        self
    }

    fn hanging(mut self) -> Self {
        self.hang = true;
        self
    }

    fn requests(&self) -> Arc<AtomicUsize> {
        Arc::clone(&self.corpus_requests)
    }
}

impl HttpClient for FakeClient {
    type Error = FakeHttpError;

    async fn stream(&self, _url: &str) -> Result<HttpBody<FakeHttpError>, FakeHttpError> {
        self.corpus_requests.fetch_add(1, Ordering::SeqCst);
        if self.hang {
            return Ok(HttpBody {
                content_length: Some(1),
                stream: Box::pin(stream::pending()),
            });
        }
        let Some(body) = self.corpus.clone() else {
            return Err(FakeHttpError("connection refused"));
        };
        let content_length = self.advertise_length.then(|| body.len() as u64);
        let chunks: Vec<Result<Bytes, FakeHttpError>> =
            body.chunks(CHUNK).map(|c| Ok(Bytes::copy_from_slice(c))).collect();
        Ok(HttpBody { content_length, stream: Box::pin(stream::iter(chunks)) })
    }

    async fn get(&self, _url: &str) -> Result<Bytes, FakeHttpError> {
        self.extras.clone().map(Bytes::from).ok_or(FakeHttpError("not found"))
    }
}

fn loader(client: FakeClient, store: Arc<MemoryStore>) -> CorpusLoader<FakeClient, Arc<MemoryStore>> {
    CorpusLoader::new(client, store, "https://example.test")
}

#[tokio::test]
async fn test_fresh_fetch_streams_parses_and_persists() {
    let store = Arc::new(MemoryStore::new());
    let loader = loader(FakeClient::new().corpus(GENESIS), Arc::clone(&store));

    let seen = Mutex::new(Vec::new());
    let on_progress = |p: u8| seen.lock().unwrap().push(p);
    let corpus = loader.load("kjv", Some(&on_progress)).await.unwrap();

    assert_eq!(
        corpus.verse("Genesis", "1", "1"),
        Some("In the beginning God created the heaven and the earth")
    );

    let seen = seen.into_inner().unwrap();
    assert_eq!(*seen.first().unwrap(), 0);
    assert_eq!(*seen.last().unwrap(), 100);
    let transfer = &seen[..seen.len() - 1];
    assert!(transfer.iter().all(|p| *p <= TRANSFER_CAP), "100 is reserved for parsed-and-ready");
    assert!(transfer.windows(2).all(|w| w[0] <= w[1]), "progress never goes backwards");
    assert!(transfer.len() > 2, "chunked body reports intermediate percentages");

    let persisted: Corpus = store.get_json(&store_key("kjv")).await.unwrap().unwrap();
    assert_eq!(persisted, *corpus);
}

#[tokio::test]
async fn test_store_hit_skips_network_and_merges_extras() {
    let store = Arc::new(MemoryStore::new());
    let cached: Corpus = serde_json::from_str(GENESIS).unwrap();
    store.put_json(&store_key("kjv"), &cached).await.unwrap();

    // The primary endpoint is unreachable; only the extras document exists.
    let client = FakeClient::new().extras(JUBILEES_EXTRAS);
    let requests = client.requests();
    let loader = loader(client, Arc::clone(&store));

    let seen = Mutex::new(Vec::new());
    let on_progress = |p: u8| seen.lock().unwrap().push(p);
    let corpus = loader.load("kjv", Some(&on_progress)).await.unwrap();

    assert!(corpus.contains_book("Genesis"));
    assert!(corpus.contains_book("Jubilees"));
    assert_eq!(requests.load(Ordering::SeqCst), 0, "no corpus fetch on a store hit");
    assert_eq!(seen.into_inner().unwrap(), vec![100]);

    // The merged result is persisted back.
    let persisted: Corpus = store.get_json(&store_key("kjv")).await.unwrap().unwrap();
    assert!(persisted.contains_book("Jubilees"));
}

#[tokio::test]
async fn test_extras_fetch_failure_is_swallowed() {
    let store = Arc::new(MemoryStore::new());
    let loader = loader(FakeClient::new().corpus(GENESIS), store);

    let corpus = loader.load("kjv", None).await.unwrap();
    assert_eq!(corpus.len(), 1);
}

#[tokio::test]
async fn test_malformed_extras_are_ignored() {
    let store = Arc::new(MemoryStore::new());
    let loader = loader(FakeClient::new().corpus(GENESIS).extras("[1,2,3]"), store);

    let corpus = loader.load("kjv", None).await.unwrap();
    assert_eq!(corpus.books(), vec!["Genesis"]);
}

#[tokio::test]
async fn test_empty_payload_is_rejected() {
    let store = Arc::new(MemoryStore::new());
    let loader = loader(FakeClient::new().corpus("{}"), store);
    assert_eq!(loader.load("kjv", None).await.unwrap_err(), LoadError::Empty);
}

#[tokio::test]
async fn test_non_object_payload_is_rejected() {
    let store = Arc::new(MemoryStore::new());
    let loader = loader(FakeClient::new().corpus("[]"), store);
    assert_eq!(loader.load("kjv", None).await.unwrap_err(), LoadError::InvalidShape);
}

#[tokio::test]
async fn test_invalid_json_is_a_parse_error() {
    let store = Arc::new(MemoryStore::new());
    let loader = loader(FakeClient::new().corpus("{not json"), store);
    assert!(matches!(loader.load("kjv", None).await.unwrap_err(), LoadError::Parse(_)));
}

#[tokio::test]
async fn test_unreachable_network_is_a_network_error() {
    let store = Arc::new(MemoryStore::new());
    let loader = loader(FakeClient::new(), store);
    assert!(matches!(loader.load("kjv", None).await.unwrap_err(), LoadError::Network(_)));
}

#[tokio::test(start_paused = true)]
async fn test_stalled_fetch_times_out_at_the_deadline() {
    let store = Arc::new(MemoryStore::new());
    let loader = loader(FakeClient::new().hanging(), store);

    let start = tokio::time::Instant::now();
    let err = loader.load("kjv", None).await.unwrap_err();

    assert_eq!(err, LoadError::Timeout(FETCH_TIMEOUT));
    assert_eq!(start.elapsed(), FETCH_TIMEOUT);
}

#[tokio::test]
async fn test_write_failure_does_not_fail_the_load() {
    let store = Arc::new(MemoryStore::new());
    store.reject_writes(true);
    let loader = loader(FakeClient::new().corpus(GENESIS), Arc::clone(&store));

    let corpus = loader.load("kjv", None).await.unwrap();
    assert!(corpus.contains_book("Genesis"));
    assert!(store.is_empty());
}

#[tokio::test]
async fn test_evict_drops_the_persisted_corpus() {
    let store = Arc::new(MemoryStore::new());
    let loader = loader(FakeClient::new().corpus(GENESIS), Arc::clone(&store));

    loader.load("kjv", None).await.unwrap();
    assert!(!store.is_empty());

    loader.evict("kjv").await.unwrap();
    assert!(store.is_empty());
}

#[tokio::test]
async fn test_concurrent_loads_fetch_at_most_once() {
    let store = Arc::new(MemoryStore::new());
    let client = FakeClient::new().corpus(GENESIS);
    let requests = client.requests();
    let loader = loader(client, store);

    let (a, b) = tokio::join!(loader.load("kjv", None), loader.load("kjv", None));
    assert_eq!(a.unwrap(), b.unwrap());
    assert_eq!(requests.load(Ordering::SeqCst), 1, "second caller is served from the store");
}

#[tokio::test]
async fn test_unknown_content_length_reports_only_endpoints() {
    let store = Arc::new(MemoryStore::new());
    let loader = loader(FakeClient::new().corpus(GENESIS).without_length(), store);

    let seen = Mutex::new(Vec::new());
    let on_progress = |p: u8| seen.lock().unwrap().push(p);
    let corpus = loader.load("kjv", Some(&on_progress)).await.unwrap();

    assert!(corpus.contains_book("Genesis"));
    assert_eq!(seen.into_inner().unwrap(), vec![0, 100]);
}
