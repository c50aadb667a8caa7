//! Bounded, order-preserving write batches
//!
//! Both ingestors push every step of an import through a
//! [`ChunkedBatchWriter`] so no single statement or transaction carries more
//! than `batch_size` rows. The writer consumes its input: once a step has been
//! flushed its buffer is gone.

use std::future::Future;
use std::num::NonZeroUsize;

/// Default number of records per write operation
pub const DEFAULT_BATCH_SIZE: usize = 50_000;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ChunkedBatchWriter {
    batch_size: NonZeroUsize,
}

impl Default for ChunkedBatchWriter {
    fn default() -> Self {
        Self::new(DEFAULT_BATCH_SIZE)
    }
}

impl ChunkedBatchWriter {
    /// A batch size of zero is treated as one
    pub fn new(batch_size: usize) -> Self {
        Self {
            batch_size: NonZeroUsize::new(batch_size).unwrap_or(NonZeroUsize::MIN),
        }
    }

    pub fn batch_size(&self) -> usize {
        self.batch_size.get()
    }

    /// Split `items` into consecutive chunks of at most `batch_size`
    ///
    /// Concatenating the chunks yields the input unchanged. Empty input yields
    /// no chunks.
    pub fn chunks<T>(&self, items: Vec<T>) -> Vec<Vec<T>> {
        let mut out = Vec::with_capacity(items.len().div_ceil(self.batch_size()));
        let mut iter = items.into_iter();
        loop {
            let chunk: Vec<T> = iter.by_ref().take(self.batch_size()).collect();
            if chunk.is_empty() {
                break;
            }
            out.push(chunk);
        }
        out
    }

    /// Call `f` once per chunk, in order, stopping at the first error
    ///
    /// Returns the number of chunks written.
    pub fn try_for_each_chunk<T, E, F>(&self, items: Vec<T>, mut f: F) -> Result<usize, E>
    where
        F: FnMut(Vec<T>) -> Result<(), E>,
    {
        let mut written = 0;
        let mut iter = items.into_iter();
        loop {
            let chunk: Vec<T> = iter.by_ref().take(self.batch_size()).collect();
            if chunk.is_empty() {
                return Ok(written);
            }
            f(chunk)?;
            written += 1;
        }
    }

    /// Async form of [`try_for_each_chunk`](Self::try_for_each_chunk); chunks
    /// are awaited one at a time
    pub async fn write_all<T, E, F, Fut>(&self, items: Vec<T>, mut f: F) -> Result<usize, E>
    where
        F: FnMut(Vec<T>) -> Fut,
        Fut: Future<Output = Result<(), E>>,
    {
        let mut written = 0;
        let mut iter = items.into_iter();
        loop {
            let chunk: Vec<T> = iter.by_ref().take(self.batch_size()).collect();
            if chunk.is_empty() {
                return Ok(written);
            }
            f(chunk).await?;
            written += 1;
        }
    }
}
