/*
 * SPDX-FileCopyrightText: 2021 William Swartzendruber <wswartzendruber@gmail.com>
 *
 * SPDX-License-Identifier: OSL-3.0
 */

//! Decodes the run-length encoded pixel data carried by object definition segments.
//!
//! Each run starts with a lead byte. A non-zero lead byte is a single pixel of that palette
//! index. A zero lead byte is followed by a flag byte whose top two bits select the layout:
//!
//! | Flag byte | Following bytes | Run |
//! |---|---|---|
//! | `00000000` | | end of line |
//! | `00LLLLLL` | | `L` pixels of index 0 |
//! | `01LLLLLL` | `LLLLLLLL` | `L` pixels of index 0 (14-bit length) |
//! | `10LLLLLL` | `CCCCCCCC` | `L` pixels of index `C` |
//! | `11LLLLLL` | `LLLLLLLL CCCCCCCC` | `L` pixels of index `C` (14-bit length) |


use super::{
    buffer::{BufferError, ByteView},
    ErrorKind,
};
use thiserror::Error as ThisError;

/// The widest line an object can describe, as object widths are 16-bit.
pub const MAX_LINE_WIDTH: u32 = 0xFFFF;

pub type RleResult<T> = Result<T, RleError>;

#[derive(ThisError, Clone, Debug, Eq, PartialEq)]
pub enum RleError {
    #[error("run-length data buffer error")]
    BufferError {
        #[from]
        source: BufferError,
    },
    #[error("line {y} runs past {} pixels", MAX_LINE_WIDTH)]
    LineOverflow {
        y: u32,
    },
}

impl RleError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::BufferError { source } => source.kind(),
            Self::LineOverflow { .. } => ErrorKind::OutOfBounds,
        }
    }
}

/// Where decoding left off once the input was exhausted.
#[derive(Clone, Copy, Debug, Default, Eq, Hash, PartialEq)]
pub struct RlePosition {
    pub x: u32,
    pub y: u32,
}

/// Decodes `data`, calling `paint` with `(x, y, index)` for every pixel in left-to-right,
/// top-to-bottom order.
///
/// Fails if a run is cut short by the end of the input, or if a line grows wider than
/// [`MAX_LINE_WIDTH`].
pub fn decode<F>(data: &ByteView, mut paint: F) -> RleResult<RlePosition> where
    F: FnMut(u32, u32, u8),
{

    let mut index = 0;
    let mut position = RlePosition::default();

    while index < data.len() {

        let first = data.at(index)?;

        let (color, length, increment) = if first > 0 {
            (first, 1, 1)
        } else {
            let second = data.at(index + 1)?;
            match second {
                0x00 => {
                    position.x = 0;
                    position.y += 1;
                    (0, 0, 2)
                }
                0x01..=0x3F => {
                    (0, second as u32, 2)
                }
                0x40..=0x7F => {
                    let third = data.at(index + 2)?;
                    (0, ((second as u32 - 0x40) << 8) + third as u32, 3)
                }
                0x80..=0xBF => {
                    let third = data.at(index + 2)?;
                    (third, second as u32 - 0x80, 3)
                }
                _ => {
                    let third = data.at(index + 2)?;
                    let fourth = data.at(index + 3)?;
                    (fourth, ((second as u32 - 0xC0) << 8) + third as u32, 4)
                }
            }
        };

        let end = position.x + length;

        if end > MAX_LINE_WIDTH {
            return Err(RleError::LineOverflow { y: position.y })
        }

        for x in position.x..end {
            paint(x, position.y, color);
        }

        position.x = end;
        index += increment;
    }

    Ok(position)
}
