/*
 * SPDX-FileCopyrightText: 2021 William Swartzendruber <wswartzendruber@gmail.com>
 *
 * SPDX-License-Identifier: OSL-3.0
 */

//! Drives a [`DisplaySetReader`] from a source of raw bytes.
//!
//! The reader asks for exactly as many bytes as the next header or payload occupies. The
//! functions here keep a [`BufferQueue`] topped up from the source and hand the reader what it
//! asks for until the source runs dry. Each completed display set, or each picture
//! reconstructed from one, is passed to a callback. A callback returning an error stops the
//! decode and the error is handed back unchanged.


use super::{
    bitmap::{render, ImageData, RenderError, RenderOptions},
    buffer::{BufferError, BufferQueue},
    displayset::{
        DisplaySet,
        DisplaySetArena,
        DisplaySetReader,
        ReadError as DisplaySetReadError,
        ReaderState,
    },
    ErrorKind,
};
use bytes::Bytes;
use log::warn;
use std::{
    io::{Error as IoError, ErrorKind as IoErrorKind, Read},
    sync::Arc,
    time::Duration,
};
use thiserror::Error as ThisError;

pub type StreamResult<T> = Result<T, StreamError>;

#[derive(ThisError, Debug)]
pub enum StreamError {
    #[error("stream IO error")]
    IoError {
        #[from]
        source: IoError,
    },
    #[error("display set error")]
    DisplaySetError {
        #[from]
        source: DisplaySetReadError,
    },
    #[error("stream buffer error")]
    BufferError {
        #[from]
        source: BufferError,
    },
    #[error("image reconstruction error")]
    RenderError {
        #[from]
        source: RenderError,
    },
}

impl StreamError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::IoError { .. } => ErrorKind::Io,
            Self::DisplaySetError { source } => source.kind(),
            Self::BufferError { source } => source.kind(),
            Self::RenderError { source } => source.kind(),
        }
    }
}

#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq)]
pub struct StreamOptions {
    /// How many bytes to request from the source at a time. Zero is treated as one.
    pub chunk_size: usize,
    pub render: RenderOptions,
}

impl Default for StreamOptions {
    fn default() -> Self {
        Self {
            chunk_size: 0x10000,
            render: RenderOptions::default(),
        }
    }
}

pub trait ReadPgsExt {

    /// Calls `on_display_set` for every display set in the stream, along with the arena it can
    /// resolve palettes through.
    fn for_each_display_set<F, E>(
        &mut self,
        options: &StreamOptions,
        on_display_set: F,
    ) -> Result<(), E> where
        F: FnMut(&Arc<DisplaySet>, &DisplaySetArena) -> Result<(), E>,
        E: From<StreamError>;

    /// Calls `on_image` with a running index, the start time, and the picture of every display
    /// set that carries one.
    fn for_each_image<F, E>(
        &mut self,
        options: &StreamOptions,
        on_image: F,
    ) -> Result<(), E> where
        F: FnMut(usize, Duration, ImageData) -> Result<(), E>,
        E: From<StreamError>;
}

impl<T: Read> ReadPgsExt for T {

    fn for_each_display_set<F, E>(
        &mut self,
        options: &StreamOptions,
        mut on_display_set: F,
    ) -> Result<(), E> where
        F: FnMut(&Arc<DisplaySet>, &DisplaySetArena) -> Result<(), E>,
        E: From<StreamError>,
    {

        let mut pump = Pump::default();
        let mut chunk = vec![0u8; options.chunk_size.max(1)];

        loop {

            pump.drain(&mut on_display_set)?;

            let count = match self.read(&mut chunk) {
                Ok(0) => break,
                Ok(count) => count,
                Err(err) if err.kind() == IoErrorKind::Interrupted => continue,
                Err(err) => return Err(StreamError::from(err).into()),
            };

            pump.queue.push(chunk[..count].to_vec());
        }

        pump.finish();

        Ok(())
    }

    fn for_each_image<F, E>(
        &mut self,
        options: &StreamOptions,
        on_image: F,
    ) -> Result<(), E> where
        F: FnMut(usize, Duration, ImageData) -> Result<(), E>,
        E: From<StreamError>,
    {
        self.for_each_display_set(options, images(options.render, on_image))
    }
}

/// Like [`ReadPgsExt::for_each_display_set`], for a stream already held in memory.
///
/// The stream is parsed in place; display sets share its storage.
pub fn decode_display_sets<B, F, E>(bytes: B, mut on_display_set: F) -> Result<(), E> where
    B: Into<Bytes>,
    F: FnMut(&Arc<DisplaySet>, &DisplaySetArena) -> Result<(), E>,
    E: From<StreamError>,
{

    let mut pump = Pump::default();

    pump.queue.push(bytes);
    pump.drain(&mut on_display_set)?;
    pump.finish();

    Ok(())
}

/// Like [`ReadPgsExt::for_each_image`], for a stream already held in memory.
pub fn decode_images<B, F, E>(bytes: B, options: &RenderOptions, on_image: F) -> Result<(), E> where
    B: Into<Bytes>,
    F: FnMut(usize, Duration, ImageData) -> Result<(), E>,
    E: From<StreamError>,
{
    decode_display_sets(bytes, images(*options, on_image))
}

fn images<F, E>(
    options: RenderOptions,
    mut on_image: F,
) -> impl FnMut(&Arc<DisplaySet>, &DisplaySetArena) -> Result<(), E> where
    F: FnMut(usize, Duration, ImageData) -> Result<(), E>,
    E: From<StreamError>,
{

    let mut index = 0;

    move |display_set, arena| {

        let image = render(arena, display_set, &options).map_err(StreamError::from)?;

        if let Some(image) = image {
            on_image(index, display_set.start_time(), image)?;
            index += 1;
        }

        Ok(())
    }
}

#[derive(Debug, Default)]
struct Pump {
    reader: DisplaySetReader,
    queue: BufferQueue,
}

impl Pump {

    /// Feeds the reader for as long as the queue holds what it asks for.
    fn drain<F, E>(&mut self, on_display_set: &mut F) -> Result<(), E> where
        F: FnMut(&Arc<DisplaySet>, &DisplaySetArena) -> Result<(), E>,
        E: From<StreamError>,
    {

        while self.queue.len() >= self.reader.needed() {

            let bytes = self.queue
                .read_exact(self.reader.needed())
                .map_err(StreamError::from)?;

            self.reader.consume(bytes).map_err(StreamError::from)?;

            if let Some(display_set) = self.reader.take() {
                on_display_set(&display_set, self.reader.arena())?;
            }
        }

        Ok(())
    }

    fn finish(&self) {
        if !self.queue.is_empty() || self.reader.state() != ReaderState::AwaitingHeader {
            warn!(
                "stream ended inside a segment; ignoring {} trailing bytes",
                self.queue.len(),
            );
        }
    }
}
