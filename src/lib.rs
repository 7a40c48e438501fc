/*
 * SPDX-FileCopyrightText: 2021 William Swartzendruber <wswartzendruber@gmail.com>
 *
 * SPDX-License-Identifier: OSL-3.0
 */

//! Decodes Presentation Graphics Stream (PGS) subtitles into RGBA pictures.
//!
//! A PGS bitstream is a run of segments, each with a fixed 13-byte header. Segments are
//! grouped into display sets, each opened by a presentation composition segment (PCS) and
//! closed by an end segment. A display set may carry palettes and a run-length encoded object,
//! which together describe one subtitle picture. A display set in the normal composition state
//! can borrow the palette of an earlier display set within the same epoch.
//!
//! The layers, bottom to top:
//!
//! - [`buffer`] holds incoming bytes without copying them.
//! - [`segment`] decodes individual segments.
//! - [`displayset`] assembles segments into display sets and resolves palettes.
//! - [`rle`], [`rgb`], and [`bitmap`] turn a display set into a picture.
//! - [`stream`] drives all of the above from an [`std::io::Read`] or an in-memory buffer.

pub mod bitmap;
pub mod buffer;
pub mod displayset;
pub mod rgb;
pub mod rle;
pub mod segment;
pub mod stream;

#[cfg(test)]
mod testing;

use std::{
    fmt::{Display, Formatter, Result as FmtResult},
    time::Duration,
};

/// Broad classification shared by every error this crate produces.
#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq)]
pub enum ErrorKind {
    /// A segment header or payload holds a value the format does not define.
    MalformedHeader,
    /// Segments arrived in an order a display set cannot be built from.
    ProtocolSequencing,
    /// A read ran past the end of the available bytes.
    OutOfBounds,
    /// More bytes were requested than have been buffered.
    InsufficientData,
    /// A palette or object that a display set refers to cannot be found.
    MissingReference,
    /// The byte source failed.
    Io,
}

/// Formats a presentation time as `HH:MM:SS.mmm`.
///
/// Hours are not wrapped at 24.
#[derive(Clone, Copy, Debug, Eq, Hash, Ord, PartialEq, PartialOrd)]
pub struct Timecode(pub Duration);

impl Display for Timecode {

    fn fmt(&self, f: &mut Formatter) -> FmtResult {

        let millis = self.0.as_millis();

        write!(
            f,
            "{:02}:{:02}:{:02}.{:03}",
            millis / 3_600_000,
            millis / 60_000 % 60,
            millis / 1_000 % 60,
            millis % 1_000,
        )
    }
}

impl From<Duration> for Timecode {
    fn from(duration: Duration) -> Self {
        Self(duration)
    }
}
