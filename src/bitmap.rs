/*
 * SPDX-FileCopyrightText: 2021 William Swartzendruber <wswartzendruber@gmail.com>
 *
 * SPDX-License-Identifier: OSL-3.0
 */

//! Reconstructs the picture a display set describes.


use super::{
    displayset::{DisplaySet, DisplaySetArena, ResolveError},
    rgb::rgba_palette,
    rle::{self, RleError},
    ErrorKind,
};
use image::{Rgba, RgbaImage};
use log::warn;
use thiserror::Error as ThisError;

pub type RenderResult<T> = Result<T, RenderError>;

#[derive(ThisError, Clone, Debug, Eq, PartialEq)]
pub enum RenderError {
    #[error("display set reference error")]
    ResolveError {
        #[from]
        source: ResolveError,
    },
    #[error("object data error")]
    RleError {
        #[from]
        source: RleError,
    },
}

impl RenderError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::ResolveError { source } => source.kind(),
            Self::RleError { source } => source.kind(),
        }
    }
}

/// What to do with a pixel whose palette index has no entry in the resolved palette.
#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq)]
pub enum UnmappedIndexPolicy {
    /// Paint the pixel at (0, 0) opaque black instead of the unmapped pixel.
    ///
    /// This reproduces the behavior of long-standing decoders and overwrites the top-left
    /// pixel of the picture.
    BlackAtOrigin,
    /// Leave the unmapped pixel untouched.
    Skip,
}

impl UnmappedIndexPolicy {

    fn substitute(self) -> Option<(u32, u32, Rgba<u8>)> {
        match self {
            Self::BlackAtOrigin => Some((0, 0, Rgba([0, 0, 0, 255]))),
            Self::Skip => None,
        }
    }
}

impl Default for UnmappedIndexPolicy {
    fn default() -> Self { Self::BlackAtOrigin }
}

#[derive(Clone, Copy, Debug, Default, Eq, Hash, PartialEq)]
pub struct RenderOptions {
    pub unmapped_index: UnmappedIndexPolicy,
}

#[derive(Clone, Debug, PartialEq)]
pub struct ImageData {
    pub image: RgbaImage,
    pub width: u32,
    pub height: u32,
}

/// Draws the object carried by `display_set`.
///
/// A display set without object definitions has nothing to draw and yields `None`. Otherwise
/// the palette named by its PCS is resolved through `arena`, the first object fragment
/// supplies the picture's dimensions, and the data of all fragments is decoded as one object.
/// Palette indexes select entries by their position within the palette definition.
pub fn render(
    arena: &DisplaySetArena,
    display_set: &DisplaySet,
    options: &RenderOptions,
) -> RenderResult<Option<ImageData>> {

    if display_set.object_definitions.is_empty() {
        return Ok(None)
    }

    let pds = arena.palette(display_set)?;
    let (width, height) = display_set.dimensions()?;
    let palette = rgba_palette(&pds.entries);
    let mut image = RgbaImage::new(width as u32, height as u32);
    let mut unmapped = 0usize;

    rle::decode(&display_set.object_data(), |x, y, index| {
        match palette.get(index as usize) {
            Some(&color) => {
                put_pixel(&mut image, x, y, color);
            }
            None => {
                unmapped += 1;
                if let Some((x, y, color)) = options.unmapped_index.substitute() {
                    put_pixel(&mut image, x, y, color);
                }
            }
        }
    })?;

    if unmapped > 0 {
        warn!(
            "display set {}: {} pixels reference entries missing from palette {}",
            display_set.sequence,
            unmapped,
            pds.id,
        );
    }

    Ok(
        Some(
            ImageData {
                image,
                width: width as u32,
                height: height as u32,
            }
        )
    )
}

/// Pixels outside the picture are dropped.
fn put_pixel(image: &mut RgbaImage, x: u32, y: u32, color: Rgba<u8>) {
    if x < image.width() && y < image.height() {
        image.put_pixel(x, y, color);
    }
}
