//! Backend layer: access to the hosted relational store and its functions.
//!
//! Provides the [`Backend`] trait: every read is a [`Query`], every write is
//! a single table call, and the remote switch is a function invocation. The
//! concrete implementation, [`PostgrestBackend`], talks to the store's REST
//! interface over HTTP. [`MemoryBackend`] keeps rows in process.

pub mod memory;
pub mod postgrest;
pub mod query;

use async_trait::async_trait;
use serde_json::Value;

pub use memory::MemoryBackend;
pub use postgrest::PostgrestBackend;
pub use query::{Direction, Embed, Filter, Order, Query};

/// Failure reported by a backend call.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum BackendError {
    /// The request never produced a response.
    #[error("network error: {0}")]
    Transport(String),

    /// The store answered with a non-success status.
    #[error("{message}")]
    Rejected {
        /// HTTP status code.
        status: u16,
        /// Message reported by the store.
        message: String,
    },

    /// A remote function answered with a non-success status.
    #[error("function {name} failed with status {status}")]
    Function {
        /// Function name.
        name: String,
        /// HTTP status code.
        status: u16,
    },

    /// The response body could not be decoded.
    #[error("invalid response: {0}")]
    Decode(String),
}

/// Rows returned by [`Backend::select`].
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Selection {
    /// Matching rows (empty for head queries).
    pub rows: Vec<Value>,
    /// Exact number of matching rows when requested.
    pub total: Option<u64>,
}

/// Query/insert/update/delete/function interface of the hosted backend.
///
/// Each method is exactly one round trip; nothing is retried.
#[async_trait]
pub trait Backend: Send + Sync + std::fmt::Debug {
    /// Runs a read.
    ///
    /// # Errors
    ///
    /// Returns a [`BackendError`] on transport or store failure.
    async fn select(&self, query: &Query) -> Result<Selection, BackendError>;

    /// Inserts one row and returns it as stored.
    ///
    /// # Errors
    ///
    /// Returns a [`BackendError`] on transport or store failure, including
    /// key conflicts.
    async fn insert(&self, table: &str, row: &Value) -> Result<Value, BackendError>;

    /// Applies `patch` to every row matching `filters`; returns the number
    /// of rows changed.
    ///
    /// # Errors
    ///
    /// Returns a [`BackendError`] on transport or store failure.
    async fn update(
        &self,
        table: &str,
        filters: &[Filter],
        patch: &Value,
    ) -> Result<u64, BackendError>;

    /// Deletes every row matching `filters`; returns the number of rows
    /// removed (dependent rows removed by cascade are not counted).
    ///
    /// # Errors
    ///
    /// Returns a [`BackendError`] on transport or store failure.
    async fn delete(&self, table: &str, filters: &[Filter]) -> Result<u64, BackendError>;

    /// Invokes a remote function with query parameters and a JSON body.
    ///
    /// # Errors
    ///
    /// Returns [`BackendError::Function`] on any non-2xx answer.
    async fn invoke(
        &self,
        function: &str,
        params: &[(String, String)],
        body: &Value,
    ) -> Result<(), BackendError>;
}
