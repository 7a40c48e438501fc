/*
 * SPDX-FileCopyrightText: 2021 William Swartzendruber <wswartzendruber@gmail.com>
 *
 * SPDX-License-Identifier: OSL-3.0
 */

use super::{
    CompositionState,
    Crop,
    EndSegment,
    ObjectDefinitionSegment,
    PaletteDefinitionSegment,
    PaletteEntry,
    PresentationCompositionSegment,
    Segment,
    SegmentHeader,
    SegmentKind,
    Sequence,
    WindowDefinition,
    WindowDefinitionSegment,
    super::{
        buffer::{BufferError, ByteView, ViewReader},
        ErrorKind,
    },
};
use log::trace;
use thiserror::Error as ThisError;

/// The size in bytes of every segment header.
pub const HEADER_SIZE: usize = 13;

/// `PG` in ASCII.
pub const MAGIC_NUMBER: u16 = 0x5047;

pub type SegmentReadResult<T> = Result<T, ReadError>;

#[derive(ThisError, Clone, Debug, Eq, PartialEq)]
pub enum ReadError {
    #[error("segment buffer error")]
    BufferError {
        #[from]
        source: BufferError,
    },
    #[error("segment has unrecognized magic number {0:#06x}")]
    UnrecognizedMagicNumber(u16),
    #[error("segment has unrecognized kind {0:#04x}")]
    UnrecognizedKind(u8),
    #[error("presentation composition segment has unrecognized composition state {0:#04x}")]
    UnrecognizedCompositionState(u8),
    #[error("presentation composition segment has unrecognized palette update flag {0:#04x}")]
    UnrecognizedPaletteUpdateFlag(u8),
    #[error("composition object has unrecognized cropped flag {0:#04x}")]
    UnrecognizedCropFlag(u8),
    #[error("unrecognized object definition sequence flag {0:#04x}")]
    UnrecognizedObjectSequenceFlag(u8),
}

impl ReadError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::BufferError { source } => source.kind(),
            _ => ErrorKind::MalformedHeader,
        }
    }
}

/// Parses the 13-byte segment header at the start of `view`.
pub fn read_header(view: ByteView) -> SegmentReadResult<SegmentHeader> {

    let mut input = ViewReader::new(view);
    let magic_number = input.read_be(2)? as u16;

    if magic_number != MAGIC_NUMBER {
        return Err(ReadError::UnrecognizedMagicNumber(magic_number))
    }

    let pts = input.read_be(4)? as u32;
    let dts = input.read_be(4)? as u32;
    let kind = match input.read_be(1)? as u8 {
        0x14 => SegmentKind::PaletteDefinition,
        0x15 => SegmentKind::ObjectDefinition,
        0x16 => SegmentKind::PresentationComposition,
        0x17 => SegmentKind::WindowDefinition,
        0x80 => SegmentKind::End,
        code => return Err(ReadError::UnrecognizedKind(code)),
    };
    let size = input.read_be(2)? as u16;

    trace!("segment header: {:?}, {} bytes, pts {}", kind, size, pts);

    Ok(SegmentHeader { pts, dts, kind, size })
}

/// Decodes the payload belonging to `header`.
pub fn read_segment(header: &SegmentHeader, payload: ByteView) -> SegmentReadResult<Segment> {

    let mut input = ViewReader::new(payload);

    Ok(
        match header.kind {
            SegmentKind::PaletteDefinition => {
                Segment::PaletteDefinition(parse_pds(&mut input, header)?)
            }
            SegmentKind::ObjectDefinition => {
                Segment::ObjectDefinition(parse_ods(&mut input, header)?)
            }
            SegmentKind::PresentationComposition => {
                Segment::PresentationComposition(parse_pcs(&mut input, header)?)
            }
            SegmentKind::WindowDefinition => {
                Segment::WindowDefinition(parse_wds(&mut input, header)?)
            }
            SegmentKind::End => {
                Segment::End(EndSegment { header: *header })
            }
        }
    )
}

/// Decodes a PCS.
///
/// Fields that would extend past the declared payload size read as zero, so a short segment
/// decodes as far as its payload goes.
pub fn parse_pcs(
    input: &mut ViewReader,
    header: &SegmentHeader,
) -> SegmentReadResult<PresentationCompositionSegment> {

    let limit = input.position() + header.size as usize;
    let width = input.read_be_bounded(2, limit)? as u16;
    let height = input.read_be_bounded(2, limit)? as u16;
    let frame_rate = input.read_be_bounded(1, limit)? as u8;
    let composition_number = input.read_be_bounded(2, limit)? as u16;
    let composition_state = match input.read_be_bounded(1, limit)? as u8 {
        0x00 => CompositionState::Normal,
        0x40 => CompositionState::AcquisitionPoint,
        0x80 => CompositionState::EpochStart,
        byte => return Err(ReadError::UnrecognizedCompositionState(byte)),
    };
    let palette_update = match input.read_be_bounded(1, limit)? as u8 {
        0x00 => false,
        0x80 => true,
        byte => return Err(ReadError::UnrecognizedPaletteUpdateFlag(byte)),
    };
    let palette_id = input.read_be_bounded(1, limit)? as u8;
    let object_count = input.read_be_bounded(1, limit)? as u8;
    let object_id = input.read_be_bounded(2, limit)? as u16;
    let window_id = input.read_be_bounded(1, limit)? as u8;
    let cropped = match input.read_be_bounded(1, limit)? as u8 {
        0x00 => false,
        0x40 => true,
        byte => return Err(ReadError::UnrecognizedCropFlag(byte)),
    };
    let x = input.read_be_bounded(2, limit)? as u16;
    let y = input.read_be_bounded(2, limit)? as u16;
    let crop = Crop {
        x: input.read_be_bounded(2, limit)? as u16,
        y: input.read_be_bounded(2, limit)? as u16,
        width: input.read_be_bounded(2, limit)? as u16,
        height: input.read_be_bounded(2, limit)? as u16,
    };

    Ok(
        PresentationCompositionSegment {
            header: *header,
            width,
            height,
            frame_rate,
            composition_number,
            composition_state,
            palette_update,
            palette_id,
            object_count,
            object_id,
            window_id,
            cropped,
            x,
            y,
            crop,
        }
    )
}

/// Decodes a WDS, reading as many windows as its count byte declares.
pub fn parse_wds(
    input: &mut ViewReader,
    header: &SegmentHeader,
) -> SegmentReadResult<WindowDefinitionSegment> {

    let limit = input.position() + header.size as usize;
    let count = input.read_be_bounded(1, limit)? as usize;
    let mut windows = Vec::with_capacity(count);

    for _ in 0..count {
        windows.push(
            WindowDefinition {
                id: input.read_be_bounded(1, limit)? as u8,
                x: input.read_be_bounded(2, limit)? as u16,
                y: input.read_be_bounded(2, limit)? as u16,
                width: input.read_be_bounded(2, limit)? as u16,
                height: input.read_be_bounded(2, limit)? as u16,
            }
        );
    }

    Ok(
        WindowDefinitionSegment {
            header: *header,
            windows,
        }
    )
}

/// Decodes a PDS, reading 5-byte entries until the declared payload size is used up.
pub fn parse_pds(
    input: &mut ViewReader,
    header: &SegmentHeader,
) -> SegmentReadResult<PaletteDefinitionSegment> {

    let limit = input.position() + header.size as usize;
    let id = input.read_be_bounded(1, limit)? as u8;
    let version = input.read_be_bounded(1, limit)? as u8;
    let mut entries = Vec::new();

    while input.position() < limit {

        let id = input.read_be_bounded(1, limit)? as u8;
        let y = input.read_be_bounded(1, limit)? as u8;
        let cr = input.read_be_bounded(1, limit)? as u8;
        let cb = input.read_be_bounded(1, limit)? as u8;
        let alpha = input.read_be_bounded(1, limit)? as u8;

        entries.push(PaletteEntry { id, y, cr, cb, alpha });
    }

    Ok(
        PaletteDefinitionSegment {
            header: *header,
            id,
            version,
            entries,
        }
    )
}

/// Decodes an ODS fragment.
///
/// Only fragments flagged as first carry the object's width and height, which the declared
/// data length includes. The object data is captured without copying and clamped to what
/// remains of the payload, as the declared length of a first fragment covers the whole object
/// rather than this fragment alone.
pub fn parse_ods(
    input: &mut ViewReader,
    header: &SegmentHeader,
) -> SegmentReadResult<ObjectDefinitionSegment> {

    let id = input.read_be(2)? as u16;
    let version = input.read_be(1)? as u8;
    let sequence = match input.read_be(1)? as u8 {
        0x40 => Sequence::Last,
        0x80 => Sequence::First,
        0xC0 => Sequence::FirstAndLast,
        byte => return Err(ReadError::UnrecognizedObjectSequenceFlag(byte)),
    };
    let data_length = input.read_be(3)? as u32;

    let (width, height, data_size) = if sequence.is_first() {
        let width = input.read_be(2)? as u16;
        let height = input.read_be(2)? as u16;
        (Some(width), Some(height), data_length.saturating_sub(4) as usize)
    } else {
        (None, None, data_length as usize)
    };

    let data = input.read_view(data_size.min(input.remaining()))?;

    Ok(
        ObjectDefinitionSegment {
            header: *header,
            id,
            version,
            sequence,
            data_length,
            width,
            height,
            data,
        }
    )
}
