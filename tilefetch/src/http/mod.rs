//! HTTP transport for the transfer worker.
//!
//! [`AsyncHttpClient`] is the seam between the worker and the network:
//! production code uses [`AsyncReqwestClient`], tests inject scripted
//! clients.

mod client;
mod error;

pub use client::{AsyncHttpClient, AsyncReqwestClient, ByteStream};
pub use error::TransferError;

#[cfg(test)]
pub(crate) use client::tests::MockAsyncHttpClient;
