//! Dictionary windows.
//!
//! [`DataBlock`] is the borrowed view a table is built over: bytes before
//! `start` are prefix the new positions may match against, bytes in
//! `[start, end)` are the positions that get entries. [`DictionaryBuffer`]
//! owns the bytes for streaming use, growing by append and shifting out old
//! data between builds.

use crate::error::Fl2Error;

#[derive(Debug, Clone, Copy)]
pub struct DataBlock<'a> {
    data: &'a [u8],
    start: usize,
    end: usize,
}

impl<'a> DataBlock<'a> {
    /// Window `[start, end)` over `data`.
    pub fn new(data: &'a [u8], start: usize, end: usize) -> Result<Self, Fl2Error> {
        if start > end || end > data.len() {
            return Err(Fl2Error::ParameterOutOfBound);
        }
        Ok(DataBlock { data, start, end })
    }

    /// Window covering all of `data`.
    pub fn whole(data: &'a [u8]) -> Self {
        DataBlock {
            data,
            start: 0,
            end: data.len(),
        }
    }

    #[inline]
    pub fn data(&self) -> &'a [u8] {
        self.data
    }

    #[inline]
    pub fn start(&self) -> usize {
        self.start
    }

    #[inline]
    pub fn end(&self) -> usize {
        self.end
    }

    /// Positions in the window.
    #[inline]
    pub fn len(&self) -> usize {
        self.end - self.start
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.start == self.end
    }
}

/// Owned sliding dictionary.
#[derive(Debug)]
pub struct DictionaryBuffer {
    buf: Vec<u8>,
    start: usize,
    capacity: usize,
}

impl DictionaryBuffer {
    pub fn new(capacity: usize) -> Result<Self, Fl2Error> {
        if capacity == 0 {
            return Err(Fl2Error::ParameterOutOfBound);
        }
        let mut buf = Vec::new();
        buf.try_reserve_exact(capacity)
            .map_err(|_| Fl2Error::AllocationFailure)?;
        Ok(DictionaryBuffer {
            buf,
            start: 0,
            capacity,
        })
    }

    /// Copy as much of `src` as fits and return the number of bytes taken.
    pub fn append(&mut self, src: &[u8]) -> usize {
        let n = src.len().min(self.free_space());
        self.buf.extend_from_slice(&src[..n]);
        n
    }

    pub fn free_space(&self) -> usize {
        self.capacity - self.buf.len()
    }

    pub fn is_full(&self) -> bool {
        self.buf.len() == self.capacity
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Bytes appended since the last shift.
    pub fn pending(&self) -> usize {
        self.buf.len() - self.start
    }

    /// The current window: retained prefix plus everything appended since.
    pub fn block(&self) -> DataBlock<'_> {
        DataBlock {
            data: &self.buf,
            start: self.start,
            end: self.buf.len(),
        }
    }

    /// Drop all but the last `overlap` bytes. They become the prefix of the
    /// next window and positions are rebased to 0.
    ///
    /// Any table built over the old window is stale after this.
    pub fn shift(&mut self, overlap: usize) {
        let keep = overlap.min(self.buf.len());
        self.buf.drain(..self.buf.len() - keep);
        self.start = keep;
    }

    /// Forget all data.
    pub fn clear(&mut self) {
        self.buf.clear();
        self.start = 0;
    }
}
