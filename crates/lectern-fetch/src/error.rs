use std::time::Duration;

use thiserror::Error;

/// Fatal outcomes of a single corpus load.
///
/// Each of these surfaces to the caller so the UI can offer a retry; none is
/// retried internally. Durable-store write failures and extras-patch
/// failures are deliberately absent: both are best-effort and swallowed by
/// the loader.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum LoadError {
    #[error("corpus fetch exceeded the {0:?} deadline")]
    Timeout(Duration),

    #[error("network error: {0}")]
    Network(String),

    #[error("corpus payload is not valid JSON: {0}")]
    Parse(String),

    #[error("corpus payload parsed but is not an object")]
    InvalidShape,

    #[error("corpus payload has no books")]
    Empty,
}
