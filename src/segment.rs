/*
 * SPDX-FileCopyrightText: 2021 William Swartzendruber <wswartzendruber@gmail.com>
 *
 * SPDX-License-Identifier: OSL-3.0
 */

//! Operates on individual segments.
//!
//! # Overview
//!
//! A segment is the most fundamental data structure within a PGS bitstream. Multiple segments
//! come together in a well-defined manner to form a display set (DS).
//!
//! There are five types that typically appear in this order:
//!
//! 1. Presentation Composition Segment (PCS)
//! 2. Window Definition Segment (WDS)
//! 3. Palette Definition Segment (PDS)
//! 4. Object Definition Segment (ODS)
//! 5. End Segment (ES)
//!
//! Every segment starts with a 13-byte header carrying the `PG` magic number, PTS and DTS
//! timestamps, the segment kind, and the payload size. The decoders in this module take the
//! header and a [`ViewReader`](crate::buffer::ViewReader) positioned at the start of the
//! payload and produce one of the typed records below.
//!
//! ## Presentation Composition Segment (PCS)
//!
//! A PCS signals the start of a new display set (DS). It also defines properties such as the
//! role of the DS within the larger epoch, the screen resolution, and which palette the
//! composition is drawn with.
//!
//! ## Window Definition Segment (WDS)
//!
//! A WDS defines the areas of the screen that will be used to show objects during the larger
//! epoch.
//!
//! ## Palette Definition Segment (PDS)
//!
//! A PDS contains a list of YCbCrA values with each one having a unique ID. A single DS can
//! have multiple PDS segments.
//!
//! ## Object Definition Segment (ODS)
//!
//! An ODS carries run-length encoded pixel data. Large objects are split across several ODS
//! fragments whose data must be joined before decoding.
//!
//! ## End Segment (ES)
//!
//! An ES signals that the current DS has come to an end.


mod segmentread;

pub use segmentread::*;

use super::buffer::ByteView;
use std::time::Duration;

/// Ticks per millisecond of the 90 kHz presentation clock.
pub const TICKS_PER_MILLISECOND: u32 = 90;

/// Represents a PGS segment.
#[derive(Clone, Debug, PartialEq)]
pub enum Segment {
    /// Represents a Presentation Composition Segment (PCS).
    PresentationComposition(PresentationCompositionSegment),
    /// Represents a Window Definition Segment (WDS).
    WindowDefinition(WindowDefinitionSegment),
    /// Represents a Palette Definition Segment (PDS).
    PaletteDefinition(PaletteDefinitionSegment),
    /// Represents an Object Definition Segment (ODS).
    ObjectDefinition(ObjectDefinitionSegment),
    /// Represents an End Segment (ES).
    End(EndSegment),
}

impl Segment {

    pub fn header(&self) -> &SegmentHeader {
        match self {
            Self::PresentationComposition(pcs) => &pcs.header,
            Self::WindowDefinition(wds) => &wds.header,
            Self::PaletteDefinition(pds) => &pds.header,
            Self::ObjectDefinition(ods) => &ods.header,
            Self::End(es) => &es.header,
        }
    }
}

/// Identifies the payload layout following a segment header.
#[derive(Clone, Copy, Debug, Eq, Hash, Ord, PartialEq, PartialOrd)]
pub enum SegmentKind {
    PaletteDefinition,
    ObjectDefinition,
    PresentationComposition,
    WindowDefinition,
    End,
}

impl SegmentKind {

    /// The byte identifying this kind on the wire.
    pub fn code(self) -> u8 {
        match self {
            Self::PaletteDefinition => 0x14,
            Self::ObjectDefinition => 0x15,
            Self::PresentationComposition => 0x16,
            Self::WindowDefinition => 0x17,
            Self::End => 0x80,
        }
    }
}

/// The fixed 13-byte prefix of every segment.
#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq)]
pub struct SegmentHeader {
    /// The timestamp indicating when composition decoding should start. In practice, this is
    /// the time at which the composition is displayed.
    pub pts: u32,
    /// The timestamp indicating when the composition should be displayed. In practice, this
    /// value is always zero.
    pub dts: u32,
    pub kind: SegmentKind,
    /// The number of payload bytes following the header.
    pub size: u16,
}

impl SegmentHeader {

    /// The PTS converted to wall-clock time, truncated to whole milliseconds.
    pub fn start_time(&self) -> Duration {
        Duration::from_millis((self.pts / TICKS_PER_MILLISECOND) as u64)
    }
}

/// Defines the role of a PCS (and thereby the associated DS) within an epoch.
#[derive(Clone, Copy, Debug, Eq, Hash, Ord, PartialEq, PartialOrd)]
pub enum CompositionState {
    /// Indicates that the associated PCS (and the DS it belongs to) defines the start of a new
    /// epoch. As such, the associated DS should contain all other segments necessary to render
    /// a composition onto the screen.
    EpochStart,
    /// Similar to `EpochStart`, except used to refresh the screen with the current composition.
    /// The associated DS is expected to redefine the palettes it uses.
    AcquisitionPoint,
    /// This updates the composition that is on the screen. Palettes not redefined here are
    /// looked up in the display sets that came before it within the epoch.
    Normal,
}

/// Defines this object's role in a possible multi-part object.
#[derive(Clone, Copy, Debug, Eq, Hash, Ord, PartialEq, PartialOrd)]
pub enum Sequence {
    /// This object is the first portion in a multi-part object.
    First,
    /// This object continues a multi-part object.
    Last,
    /// This object is discrete and stands alone.
    FirstAndLast,
}

impl Sequence {

    /// Whether a fragment with this flag carries the object's dimensions.
    pub fn is_first(self) -> bool {
        matches!(self, Self::First | Self::FirstAndLast)
    }
}

/// Defines a Presentation Composition Segment (PCS).
///
/// A PCS marks the beginning of a display set (DS). Only the first composition object is
/// described; later ones are left undecoded.
#[derive(Clone, Debug, PartialEq)]
pub struct PresentationCompositionSegment {
    pub header: SegmentHeader,
    /// The width of the display in pixels.
    pub width: u16,
    /// The height of the display in pixels.
    pub height: u16,
    /// This value should be set to `0x10` and can typically be ignored.
    pub frame_rate: u8,
    pub composition_number: u16,
    pub composition_state: CompositionState,
    pub palette_update: bool,
    /// The palette the composition is drawn with.
    pub palette_id: u8,
    pub object_count: u8,
    pub object_id: u16,
    pub window_id: u8,
    pub cropped: bool,
    pub x: u16,
    pub y: u16,
    pub crop: Crop,
}

#[derive(Clone, Debug, Default, Hash, PartialEq)]
pub struct Crop {
    pub x: u16,
    pub y: u16,
    pub width: u16,
    pub height: u16,
}

#[derive(Clone, Debug, PartialEq)]
pub struct WindowDefinitionSegment {
    pub header: SegmentHeader,
    pub windows: Vec<WindowDefinition>,
}

#[derive(Clone, Debug, Default, Hash, PartialEq)]
pub struct WindowDefinition {
    pub id: u8,
    pub x: u16,
    pub y: u16,
    pub width: u16,
    pub height: u16,
}

#[derive(Clone, Debug, PartialEq)]
pub struct PaletteDefinitionSegment {
    pub header: SegmentHeader,
    pub id: u8,
    pub version: u8,
    pub entries: Vec<PaletteEntry>,
}

#[derive(Clone, Copy, Debug, Default, Hash, PartialEq)]
pub struct PaletteEntry {
    pub id: u8,
    pub y: u8,
    pub cr: u8,
    pub cb: u8,
    pub alpha: u8,
}

#[derive(Clone, Debug, PartialEq)]
pub struct ObjectDefinitionSegment {
    pub header: SegmentHeader,
    pub id: u16,
    pub version: u8,
    pub sequence: Sequence,
    /// The object data length declared by the fragment, dimensions included.
    pub data_length: u32,
    /// Only present on the first fragment of an object.
    pub width: Option<u16>,
    /// Only present on the first fragment of an object.
    pub height: Option<u16>,
    /// Run-length encoded pixel data carried by this fragment.
    pub data: ByteView,
}

#[derive(Clone, Debug, PartialEq)]
pub struct EndSegment {
    pub header: SegmentHeader,
}
