//! Fixed-size partitioning of batch input

use std::iter::Enumerate;
use std::slice::Chunks;

/// Lazily split `items` into contiguous chunks of at most `batch_size`
///
/// A `batch_size` of zero is treated as one. Empty input yields no chunks.
pub fn chunks<T>(items: &[T], batch_size: usize) -> Chunks<'_, T> {
    items.chunks(batch_size.max(1))
}

/// Chunks paired with the input index of their first element
pub fn indexed_chunks<T>(items: &[T], batch_size: usize) -> IndexedChunks<'_, T> {
    let size = batch_size.max(1);
    IndexedChunks {
        inner: items.chunks(size).enumerate(),
        size,
    }
}

/// Iterator returned by [`indexed_chunks`]
pub struct IndexedChunks<'a, T> {
    inner: Enumerate<Chunks<'a, T>>,
    size: usize,
}

impl<'a, T> Iterator for IndexedChunks<'a, T> {
    type Item = (usize, &'a [T]);

    fn next(&mut self) -> Option<Self::Item> {
        self.inner
            .next()
            .map(|(position, chunk)| (position * self.size, chunk))
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        self.inner.size_hint()
    }
}
