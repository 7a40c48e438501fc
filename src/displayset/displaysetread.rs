/*
 * SPDX-FileCopyrightText: 2021 William Swartzendruber <wswartzendruber@gmail.com>
 *
 * SPDX-License-Identifier: OSL-3.0
 */

use super::{
    DisplaySet,
    DisplaySetArena,
    super::{
        buffer::ByteView,
        segment::{
            read_header,
            read_segment,
            EndSegment,
            ObjectDefinitionSegment,
            PaletteDefinitionSegment,
            PresentationCompositionSegment,
            ReadError as SegmentReadError,
            Segment,
            SegmentHeader,
            SegmentKind,
            WindowDefinitionSegment,
            HEADER_SIZE,
        },
        ErrorKind,
    },
};
use log::debug;
use std::{
    mem,
    sync::Arc,
};
use thiserror::Error as ThisError;

pub type ReadResult<T> = Result<T, ReadError>;

#[derive(ThisError, Clone, Debug, Eq, PartialEq)]
pub enum ReadError {
    #[error("segment value error")]
    SegmentError {
        #[from]
        source: SegmentReadError,
    },
    #[error("unexpected presentation composition segment within display set")]
    UnexpectedPresentationCompositionSegment,
    #[error("{0:?} segment precedes the presentation composition segment")]
    UnexpectedSegment(SegmentKind),
    #[error("end segment precedes the presentation composition segment")]
    UnexpectedEndSegment,
    #[error("expected {expected} bytes but was given {actual}")]
    UnexpectedLength {
        expected: usize,
        actual: usize,
    },
}

impl ReadError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::SegmentError { source } => source.kind(),
            _ => ErrorKind::ProtocolSequencing,
        }
    }
}

/// What the reader expects the next call to [`DisplaySetReader::consume`] to carry.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum ReaderState {
    /// A 13-byte segment header.
    AwaitingHeader,
    /// The payload described by a header that has already been read.
    AwaitingPayload(SegmentHeader),
}

impl Default for ReaderState {
    fn default() -> Self { Self::AwaitingHeader }
}

/// Assembles display sets from a stream fed in exactly the pieces it asks for.
///
/// The caller starts by supplying [`HEADER_SIZE`] bytes. Every call to
/// [`consume`](Self::consume) returns how many bytes the next call must supply: the payload
/// size after a header, and another header after a payload. Once an end segment has been
/// consumed, [`is_ready`](Self::is_ready) reports true until [`take`](Self::take) hands out the
/// completed display set.
#[derive(Debug, Default)]
pub struct DisplaySetReader {
    state: ReaderState,
    arena: DisplaySetArena,
    presentation_composition: Option<PresentationCompositionSegment>,
    window_definitions: Vec<WindowDefinitionSegment>,
    palette_definitions: Vec<PaletteDefinitionSegment>,
    object_definitions: Vec<ObjectDefinitionSegment>,
    ready: bool,
}

impl DisplaySetReader {

    pub fn new() -> Self {
        Self::default()
    }

    pub fn state(&self) -> ReaderState {
        self.state
    }

    /// The number of bytes the next call to [`consume`](Self::consume) expects.
    pub fn needed(&self) -> usize {
        match self.state {
            ReaderState::AwaitingHeader => HEADER_SIZE,
            ReaderState::AwaitingPayload(header) => header.size as usize,
        }
    }

    pub fn is_ready(&self) -> bool {
        self.ready
    }

    /// Hands out the display set completed by the last end segment, if it has not been taken
    /// already.
    pub fn take(&mut self) -> Option<Arc<DisplaySet>> {

        if !self.ready {
            return None
        }

        self.ready = false;

        self.arena.last().cloned()
    }

    /// The display sets completed so far that later ones may fall back to.
    pub fn arena(&self) -> &DisplaySetArena {
        &self.arena
    }

    /// Feeds the bytes requested by the previous call and returns how many are needed next.
    ///
    /// Fails without changing state unless exactly [`needed`](Self::needed) bytes are given.
    pub fn consume(&mut self, bytes: ByteView) -> ReadResult<usize> {

        if bytes.len() != self.needed() {
            return Err(
                ReadError::UnexpectedLength {
                    expected: self.needed(),
                    actual: bytes.len(),
                }
            )
        }

        match self.state {
            ReaderState::AwaitingHeader => {

                let header = read_header(bytes)?;

                self.state = ReaderState::AwaitingPayload(header);

                Ok(header.size as usize)
            }
            ReaderState::AwaitingPayload(header) => {

                self.check_sequence(header.kind)?;

                match read_segment(&header, bytes)? {
                    Segment::PresentationComposition(pcs) => {
                        self.presentation_composition = Some(pcs);
                    }
                    Segment::WindowDefinition(wds) => {
                        self.window_definitions.push(wds);
                    }
                    Segment::PaletteDefinition(pds) => {
                        self.palette_definitions.push(pds);
                    }
                    Segment::ObjectDefinition(ods) => {
                        self.object_definitions.push(ods);
                    }
                    Segment::End(es) => {
                        self.finish(es)?;
                    }
                }

                self.state = ReaderState::AwaitingHeader;

                Ok(HEADER_SIZE)
            }
        }
    }

    fn check_sequence(&self, kind: SegmentKind) -> ReadResult<()> {

        let open = self.presentation_composition.is_some();

        match kind {
            SegmentKind::PresentationComposition if open => {
                Err(ReadError::UnexpectedPresentationCompositionSegment)
            }
            SegmentKind::End if !open => {
                Err(ReadError::UnexpectedEndSegment)
            }
            SegmentKind::WindowDefinition
            | SegmentKind::PaletteDefinition
            | SegmentKind::ObjectDefinition if !open => {
                Err(ReadError::UnexpectedSegment(kind))
            }
            _ => Ok(()),
        }
    }

    fn finish(&mut self, end: EndSegment) -> ReadResult<()> {

        let presentation_composition = self.presentation_composition
            .take()
            .ok_or(ReadError::UnexpectedEndSegment)?;
        let display_set = DisplaySet {
            sequence: self.arena.next_sequence(),
            previous: self.arena.last().map(|previous| previous.sequence),
            presentation_composition,
            window_definitions: mem::take(&mut self.window_definitions),
            palette_definitions: mem::take(&mut self.palette_definitions),
            object_definitions: mem::take(&mut self.object_definitions),
            end,
        };

        debug!(
            "display set {} complete at {:?}: {} windows, {} palettes, {} objects",
            display_set.sequence,
            display_set.start_time(),
            display_set.window_definitions.len(),
            display_set.palette_definitions.len(),
            display_set.object_definitions.len(),
        );

        self.arena.push(display_set);
        self.ready = true;

        Ok(())
    }
}
