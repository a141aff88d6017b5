use std::future::Future;
use std::pin::Pin;

use bytes::Bytes;
use futures_util::Stream;

/// A boxed stream of response body chunks.
pub type BoxStream<'a, T> = Pin<Box<dyn Stream<Item = T> + Send + 'a>>;

/// One streaming HTTP response: the advertised content length, if the server
/// sent one, and the body as a chunk stream.
pub struct HttpBody<E> {
    pub content_length: Option<u64>,
    pub stream: BoxStream<'static, Result<Bytes, E>>,
}

/// Minimal asynchronous HTTP surface the loader needs.
///
/// Implementations map non-success statuses into their error type and handle
/// their own redirects and TLS. [`ReqwestClient`] is the production
/// implementation; tests provide scripted fakes.
pub trait HttpClient: Send + Sync {
    type Error: std::error::Error + Send + Sync + 'static;

    /// Open a streaming GET against `url`.
    fn stream(
        &self,
        url: &str,
    ) -> impl Future<Output = Result<HttpBody<Self::Error>, Self::Error>> + Send;

    /// GET a small document in one piece.
    fn get(&self, url: &str) -> impl Future<Output = Result<Bytes, Self::Error>> + Send;
}

impl<C: HttpClient> HttpClient for std::sync::Arc<C> {
    type Error = C::Error;

    fn stream(
        &self,
        url: &str,
    ) -> impl Future<Output = Result<HttpBody<Self::Error>, Self::Error>> + Send {
        C::stream(self, url)
    }

    fn get(&self, url: &str) -> impl Future<Output = Result<Bytes, Self::Error>> + Send {
        C::get(self, url)
    }
}

#[cfg(feature = "reqwest")]
mod reqwest_impl {
    use super::*;

    /// Production HTTP client backed by `reqwest`.
    #[derive(Debug, Clone, Default)]
    pub struct ReqwestClient {
        client: reqwest::Client,
    }

    impl ReqwestClient {
        pub fn new() -> Self {
            Self::default()
        }

        /// Wrap a pre-configured `reqwest::Client`.
        pub fn with_client(client: reqwest::Client) -> Self {
            Self { client }
        }
    }

    impl HttpClient for ReqwestClient {
        type Error = reqwest::Error;

        async fn stream(&self, url: &str) -> Result<HttpBody<Self::Error>, Self::Error> {
            let response = self.client.get(url).send().await?.error_for_status()?;
            let content_length = response.content_length();
            Ok(HttpBody { content_length, stream: Box::pin(response.bytes_stream()) })
        }

        async fn get(&self, url: &str) -> Result<Bytes, Self::Error> {
            self.client.get(url).send().await?.error_for_status()?.bytes().await
        }
    }
}

#[cfg(feature = "reqwest")]
pub use reqwest_impl::ReqwestClient;
