/*
 * SPDX-FileCopyrightText: 2021 William Swartzendruber <wswartzendruber@gmail.com>
 *
 * SPDX-License-Identifier: OSL-3.0
 */

//! Groups segments into display sets.
//!
//! # Overview
//!
//! A display set (DS) is one presentation composition segment (PCS), the window, palette, and
//! object definitions that follow it, and the end segment that closes it. Display sets are
//! assembled by [`DisplaySetReader`] and retained in a [`DisplaySetArena`] so that a DS can
//! borrow palettes defined earlier in its epoch.
//!
//! ## Palette fallback
//!
//! A PCS names the palette it is drawn with. When the DS does not define that palette itself
//! and its composition state is `Normal`, the palette is looked up in the previous DS, and so
//! on back through the epoch. Any other composition state requires the DS to be
//! self-contained.

#[cfg(test)]
mod tests;

mod displaysetread;

pub use displaysetread::*;

use super::{
    buffer::ByteView,
    segment::{
        CompositionState,
        EndSegment,
        ObjectDefinitionSegment,
        PaletteDefinitionSegment,
        PresentationCompositionSegment,
        WindowDefinition,
        WindowDefinitionSegment,
    },
    ErrorKind,
};
use std::{
    sync::Arc,
    time::Duration,
};
use thiserror::Error as ThisError;

pub type ResolveResult<T> = Result<T, ResolveError>;

#[derive(ThisError, Clone, Debug, Eq, PartialEq)]
pub enum ResolveError {
    #[error("composition references unknown palette ID {palette_id} and is not a normal case")]
    UnknownPalette {
        palette_id: u8,
    },
    #[error("palette ID {palette_id} is not defined by any earlier display set")]
    UnresolvedPalette {
        palette_id: u8,
    },
    #[error("display set has no first object definition with dimensions")]
    MissingFirstObject,
}

impl ResolveError {
    pub fn kind(&self) -> ErrorKind {
        ErrorKind::MissingReference
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct DisplaySet {
    /// Position of this DS within the stream, starting at zero.
    pub sequence: usize,
    /// Sequence number of the DS emitted immediately before this one.
    pub previous: Option<usize>,
    pub presentation_composition: PresentationCompositionSegment,
    pub window_definitions: Vec<WindowDefinitionSegment>,
    pub palette_definitions: Vec<PaletteDefinitionSegment>,
    pub object_definitions: Vec<ObjectDefinitionSegment>,
    pub end: EndSegment,
}

impl DisplaySet {

    /// When this DS should be shown, taken from its end segment.
    pub fn start_time(&self) -> Duration {
        self.end.header.start_time()
    }

    pub fn composition_state(&self) -> CompositionState {
        self.presentation_composition.composition_state
    }

    /// Every window defined by this DS, in segment order.
    pub fn windows(&self) -> impl Iterator<Item = &WindowDefinition> + '_ {
        self.window_definitions.iter().flat_map(|wds| wds.windows.iter())
    }

    /// Looks up a palette defined by this DS alone.
    pub fn palette(&self, palette_id: u8) -> Option<&PaletteDefinitionSegment> {
        self.palette_definitions.iter().find(|pds| pds.id == palette_id)
    }

    /// The first object fragment flagged as the start of an object.
    pub fn first_object(&self) -> Option<&ObjectDefinitionSegment> {
        self.object_definitions.iter().find(|ods| ods.sequence.is_first())
    }

    /// The width and height declared by the first object fragment.
    pub fn dimensions(&self) -> ResolveResult<(u16, u16)> {
        match self.first_object() {
            Some(ObjectDefinitionSegment { width: Some(width), height: Some(height), .. }) => {
                Ok((*width, *height))
            }
            _ => Err(ResolveError::MissingFirstObject),
        }
    }

    /// The object data of every fragment joined in arrival order.
    pub fn object_data(&self) -> ByteView {
        ByteView::concat(self.object_definitions.iter().map(|ods| ods.data.clone()))
    }
}

/// Holds every display set completed so far, indexed by sequence number.
///
/// Display sets refer to their predecessor by sequence number rather than by pointer, so a DS
/// handed out earlier can still resolve its palette through the arena after later display sets
/// have been added.
#[derive(Clone, Debug, Default)]
pub struct DisplaySetArena {
    sets: Vec<Arc<DisplaySet>>,
}

impl DisplaySetArena {

    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.sets.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sets.is_empty()
    }

    /// The sequence number the next pushed DS will carry.
    pub fn next_sequence(&self) -> usize {
        self.sets.len()
    }

    pub fn get(&self, sequence: usize) -> Option<&Arc<DisplaySet>> {
        self.sets.get(sequence)
    }

    pub fn last(&self) -> Option<&Arc<DisplaySet>> {
        self.sets.last()
    }

    pub(crate) fn push(&mut self, display_set: DisplaySet) -> Arc<DisplaySet> {

        debug_assert_eq!(display_set.sequence, self.next_sequence());

        let display_set = Arc::new(display_set);

        self.sets.push(display_set.clone());

        display_set
    }

    /// Resolves the palette `display_set` is drawn with.
    pub fn palette<'a>(
        &'a self,
        display_set: &'a DisplaySet,
    ) -> ResolveResult<&'a PaletteDefinitionSegment> {

        let palette_id = display_set.presentation_composition.palette_id;
        let mut current = display_set;

        loop {

            if let Some(pds) = current.palette(palette_id) {
                return Ok(pds)
            }

            if current.composition_state() != CompositionState::Normal {
                return Err(ResolveError::UnknownPalette { palette_id })
            }

            current = match current.previous.and_then(|sequence| self.get(sequence)) {
                Some(previous) => &**previous,
                None => return Err(ResolveError::UnresolvedPalette { palette_id }),
            };
        }
    }
}
