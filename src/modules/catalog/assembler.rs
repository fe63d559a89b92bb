//! Concurrent, fail-fast aggregation of independent named reads.

use std::future::Future;

use futures::future::{try_join_all, BoxFuture, FutureExt};
use indexmap::IndexMap;
use serde::Serialize;

use locallib_db::DbError;

/// Named read operations waiting to run together.
///
/// Names are expected to be distinct; a repeated name keeps the later result.
pub struct Assembler<'a, T> {
    ops: Vec<(&'static str, BoxFuture<'a, Result<T, DbError>>)>,
}

impl<'a, T: Send + 'a> Assembler<'a, T> {
    pub fn new() -> Self {
        Self { ops: Vec::new() }
    }

    pub fn with<F>(mut self, name: &'static str, op: F) -> Self
    where
        F: Future<Output = Result<T, DbError>> + Send + 'a,
    {
        self.ops.push((name, op.boxed()));
        self
    }

    /// Drive every operation concurrently. The first failure is returned and
    /// the operations still in flight are dropped.
    pub async fn run(self) -> Result<Assembled<T>, DbError> {
        let (names, ops): (Vec<_>, Vec<_>) = self.ops.into_iter().unzip();
        let results = try_join_all(ops).await?;
        Ok(Assembled {
            entries: names.into_iter().zip(results).collect(),
        })
    }
}

impl<'a, T: Send + 'a> Default for Assembler<'a, T> {
    fn default() -> Self {
        Self::new()
    }
}

/// Results of a successful assembly, keyed by operation name in the order
/// the operations were added.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(transparent)]
pub struct Assembled<T> {
    entries: IndexMap<&'static str, T>,
}

impl<T> Assembled<T> {
    pub fn get(&self, name: &str) -> Option<&T> {
        self.entries.get(name)
    }
}
