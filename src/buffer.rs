/*
 * SPDX-FileCopyrightText: 2021 William Swartzendruber <wswartzendruber@gmail.com>
 *
 * SPDX-License-Identifier: OSL-3.0
 */

//! Zero-copy byte storage used while parsing a stream.
//!
//! # Overview
//!
//! A PGS stream arrives in chunks whose boundaries have nothing to do with segment boundaries.
//! Rather than copying chunks into one contiguous allocation, the parser works on views that
//! may span several chunks.
//!
//! - [`ByteView`] is a random-access view over one or more fragments of shared storage.
//! - [`ViewReader`] walks a view front to back, decoding big-endian fields.
//! - [`BufferQueue`] accumulates incoming chunks and hands out views of exactly the requested
//!   length, splitting a chunk between the returned view and the queue when necessary.


use super::ErrorKind;
use byteorder::{BigEndian, ByteOrder};
use bytes::Bytes;
use std::collections::VecDeque;
use thiserror::Error as ThisError;

pub type BufferResult<T> = Result<T, BufferError>;

#[derive(ThisError, Clone, Debug, Eq, PartialEq)]
pub enum BufferError {
    #[error("index {index} is out of bounds for a view of length {length}")]
    OutOfBounds {
        index: usize,
        length: usize,
    },
    #[error("requested {requested} bytes but only {available} are queued")]
    InsufficientData {
        requested: usize,
        available: usize,
    },
}

impl BufferError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::OutOfBounds { .. } => ErrorKind::OutOfBounds,
            Self::InsufficientData { .. } => ErrorKind::InsufficientData,
        }
    }
}

/// A read-only view over a possibly fragmented byte range.
///
/// Cloning a view, taking a subrange of it, or concatenating views never copies the underlying
/// bytes; only the reference-counted [`Bytes`] handles are duplicated.
#[derive(Clone, Debug, Default)]
pub struct ByteView {
    fragments: Vec<Bytes>,
    /// Offset of each fragment's first byte within the view.
    offsets: Vec<usize>,
    length: usize,
}

impl ByteView {

    pub fn new() -> Self {
        Self::default()
    }

    /// Builds a view that resolves indexes across `views` in order, without flattening them.
    pub fn concat<I>(views: I) -> Self where
        I: IntoIterator<Item = ByteView>,
    {

        let mut out = Self::new();

        for view in views {
            for fragment in view.fragments {
                out.push_fragment(fragment);
            }
        }

        out
    }

    pub fn len(&self) -> usize {
        self.length
    }

    pub fn is_empty(&self) -> bool {
        self.length == 0
    }

    /// Returns the byte at `index`.
    pub fn at(&self, index: usize) -> BufferResult<u8> {

        if index >= self.length {
            return Err(BufferError::OutOfBounds { index, length: self.length })
        }

        let fragment = self.offsets.partition_point(|&offset| offset <= index) - 1;

        Ok(self.fragments[fragment][index - self.offsets[fragment]])
    }

    /// Returns a view of the bytes in `start..end`.
    pub fn subrange(&self, start: usize, end: usize) -> BufferResult<ByteView> {

        if end > self.length {
            return Err(BufferError::OutOfBounds { index: end, length: self.length })
        }
        if start > end {
            return Err(BufferError::OutOfBounds { index: start, length: end })
        }

        let mut out = Self::new();

        for (fragment, &offset) in self.fragments.iter().zip(self.offsets.iter()) {

            let fragment_end = offset + fragment.len();

            if fragment_end <= start {
                continue
            }
            if offset >= end {
                break
            }

            let from = start.saturating_sub(offset);
            let to = end.min(fragment_end) - offset;

            out.push_fragment(fragment.slice(from..to));
        }

        Ok(out)
    }

    /// The shared chunks backing this view, in order.
    pub fn fragments(&self) -> &[Bytes] {
        &self.fragments
    }

    pub fn iter(&self) -> impl Iterator<Item = u8> + '_ {
        self.fragments.iter().flat_map(|fragment| fragment.iter().copied())
    }

    pub fn to_vec(&self) -> Vec<u8> {
        self.iter().collect()
    }

    fn push_fragment(&mut self, fragment: Bytes) {

        if fragment.is_empty() {
            return
        }

        self.offsets.push(self.length);
        self.length += fragment.len();
        self.fragments.push(fragment);
    }
}

impl From<Bytes> for ByteView {
    fn from(bytes: Bytes) -> Self {
        let mut out = Self::new();
        out.push_fragment(bytes);
        out
    }
}

impl From<Vec<u8>> for ByteView {
    fn from(bytes: Vec<u8>) -> Self {
        Self::from(Bytes::from(bytes))
    }
}

impl From<&'static [u8]> for ByteView {
    fn from(bytes: &'static [u8]) -> Self {
        Self::from(Bytes::from_static(bytes))
    }
}

impl PartialEq for ByteView {
    fn eq(&self, other: &Self) -> bool {
        self.length == other.length && self.iter().eq(other.iter())
    }
}

impl Eq for ByteView { }

/// A forward-only cursor over a [`ByteView`].
#[derive(Clone, Debug)]
pub struct ViewReader {
    view: ByteView,
    position: usize,
}

impl ViewReader {

    pub fn new(view: ByteView) -> Self {
        Self { view, position: 0 }
    }

    /// The offset of the next byte to be read.
    pub fn position(&self) -> usize {
        self.position
    }

    pub fn has_remaining(&self) -> bool {
        self.position < self.view.len()
    }

    pub fn remaining(&self) -> usize {
        self.view.len().saturating_sub(self.position)
    }

    /// Reads `count` bytes (at most eight) as an unsigned big-endian integer.
    ///
    /// The cursor only advances when every byte was available.
    pub fn read_be(&mut self, count: usize) -> BufferResult<u64> {

        debug_assert!(count <= 8, "cannot read {} bytes into a u64", count);

        if count == 0 {
            return Ok(0)
        }

        let mut bytes = [0u8; 8];

        for (i, byte) in bytes[..count].iter_mut().enumerate() {
            *byte = self.view.at(self.position + i)?;
        }

        self.position += count;

        Ok(BigEndian::read_uint(&bytes[..count], count))
    }

    /// Like [`read_be`](Self::read_be), except that a read ending past `limit` yields zero and
    /// leaves the cursor where it is.
    pub fn read_be_bounded(&mut self, count: usize, limit: usize) -> BufferResult<u64> {

        if self.position + count > limit {
            return Ok(0)
        }

        self.read_be(count)
    }

    /// Returns the next `count` bytes as a view sharing this reader's storage.
    pub fn read_view(&mut self, count: usize) -> BufferResult<ByteView> {

        let view = self.view.subrange(self.position, self.position + count)?;

        self.position += count;

        Ok(view)
    }
}

/// Accumulates chunks of a stream until a consumer asks for an exact number of bytes.
#[derive(Clone, Debug, Default)]
pub struct BufferQueue {
    chunks: VecDeque<Bytes>,
    length: usize,
}

impl BufferQueue {

    pub fn new() -> Self {
        Self::default()
    }

    pub fn push<B: Into<Bytes>>(&mut self, chunk: B) {

        let chunk = chunk.into();

        if chunk.is_empty() {
            return
        }

        self.length += chunk.len();
        self.chunks.push_back(chunk);
    }

    /// The number of bytes currently queued.
    pub fn len(&self) -> usize {
        self.length
    }

    pub fn is_empty(&self) -> bool {
        self.length == 0
    }

    /// Removes exactly `count` bytes from the front of the queue.
    ///
    /// Nothing is consumed when fewer than `count` bytes are queued.
    pub fn read_exact(&mut self, count: usize) -> BufferResult<ByteView> {

        if count > self.length {
            return Err(
                BufferError::InsufficientData {
                    requested: count,
                    available: self.length,
                }
            )
        }

        let mut out = ByteView::new();
        let mut needed = count;

        while needed > 0 {

            let mut chunk = match self.chunks.pop_front() {
                Some(chunk) => chunk,
                None => {
                    return Err(
                        BufferError::InsufficientData {
                            requested: needed,
                            available: 0,
                        }
                    )
                }
            };

            if chunk.len() > needed {
                out.push_fragment(chunk.split_to(needed));
                self.chunks.push_front(chunk);
                needed = 0;
            } else {
                needed -= chunk.len();
                out.push_fragment(chunk);
            }
        }

        self.length -= count;

        Ok(out)
    }
}
