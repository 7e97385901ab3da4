//! HTTP client abstraction for testability

use super::error::TransferError;
use crate::config::DownloadConfig;
use bytes::Bytes;
use futures::stream::BoxStream;
use futures::StreamExt;
use std::future::Future;
use tracing::{debug, trace, warn};

/// Response body delivered chunk by chunk.
pub type ByteStream = BoxStream<'static, Result<Bytes, TransferError>>;

/// Trait for asynchronous streaming HTTP GET.
///
/// The transfer worker writes each chunk to disk as it arrives, so
/// implementations hand back the body as a stream rather than a buffer.
/// A non-success status must be reported as [`TransferError::Status`]
/// before any body is yielded.
pub trait AsyncHttpClient: Send + Sync + 'static {
    /// Starts a GET request and returns the body stream.
    ///
    /// # Arguments
    ///
    /// * `url` - The URL to request
    fn get_stream(&self, url: &str)
        -> impl Future<Output = Result<ByteStream, TransferError>> + Send;
}

/// Async HTTP client implementation using reqwest.
#[derive(Clone)]
pub struct AsyncReqwestClient {
    client: reqwest::Client,
}

impl AsyncReqwestClient {
    /// Creates a client using the timeouts and user agent from `config`.
    pub fn new(config: &DownloadConfig) -> Result<Self, TransferError> {
        let client = reqwest::Client::builder()
            .timeout(config.network_timeout())
            .connect_timeout(config.connect_timeout())
            .user_agent(config.user_agent())
            .build()
            .map_err(|e| TransferError::ClientBuild(e.to_string()))?;

        Ok(Self { client })
    }

    /// Wraps an already configured reqwest client.
    pub fn from_client(client: reqwest::Client) -> Self {
        Self { client }
    }
}

impl AsyncHttpClient for AsyncReqwestClient {
    async fn get_stream(&self, url: &str) -> Result<ByteStream, TransferError> {
        trace!(url = url, "HTTP GET request starting");

        let response = match self.client.get(url).send().await {
            Ok(resp) => {
                debug!(
                    url = url,
                    status = resp.status().as_u16(),
                    "HTTP response received"
                );
                resp
            }
            Err(e) => {
                warn!(
                    url = url,
                    error = %e,
                    is_connect = e.is_connect(),
                    is_timeout = e.is_timeout(),
                    "HTTP request failed"
                );
                return Err(TransferError::Request {
                    url: url.to_string(),
                    message: e.to_string(),
                });
            }
        };

        // Check HTTP status
        let status = response.status();
        if !status.is_success() {
            return Err(TransferError::Status {
                url: url.to_string(),
                status: status.as_u16(),
            });
        }

        let url = url.to_string();
        Ok(response
            .bytes_stream()
            .map(move |chunk| {
                chunk.map_err(|e| TransferError::Body {
                    url: url.clone(),
                    message: e.to_string(),
                })
            })
            .boxed())
    }
}
