/*
 * SPDX-FileCopyrightText: 2021 William Swartzendruber <wswartzendruber@gmail.com>
 *
 * SPDX-License-Identifier: CC0-1.0
 */

//! Builds PGS bitstreams for tests.

use super::{
    buffer::BufferQueue,
    displayset::{DisplaySet, DisplaySetReader, ReadResult},
};
use byteorder::{BigEndian, WriteBytesExt};
use std::sync::Arc;

pub const NORMAL: u8 = 0x00;
pub const ACQUISITION_POINT: u8 = 0x40;
pub const EPOCH_START: u8 = 0x80;

pub const LAST: u8 = 0x40;
pub const FIRST: u8 = 0x80;
pub const FIRST_AND_LAST: u8 = 0xC0;

#[derive(Clone, Debug, Default)]
pub struct StreamBuilder {
    bytes: Vec<u8>,
    pts: u32,
}

impl StreamBuilder {

    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the PTS of every segment appended from here on.
    pub fn pts(mut self, pts: u32) -> Self {
        self.pts = pts;
        self
    }

    pub fn segment(mut self, kind: u8, payload: &[u8]) -> Self {
        self.bytes.write_u16::<BigEndian>(0x5047).unwrap();
        self.bytes.write_u32::<BigEndian>(self.pts).unwrap();
        self.bytes.write_u32::<BigEndian>(0).unwrap();
        self.bytes.write_u8(kind).unwrap();
        self.bytes.write_u16::<BigEndian>(payload.len() as u16).unwrap();
        self.bytes.extend_from_slice(payload);
        self
    }

    /// Appends a PCS with a single uncropped composition object.
    pub fn pcs(self, state: u8, palette_id: u8) -> Self {

        let mut payload = vec![];

        payload.write_u16::<BigEndian>(1920).unwrap();
        payload.write_u16::<BigEndian>(1080).unwrap();
        payload.write_u8(0x10).unwrap();
        payload.write_u16::<BigEndian>(1).unwrap();
        payload.write_u8(state).unwrap();
        payload.write_u8(0x00).unwrap();
        payload.write_u8(palette_id).unwrap();
        payload.write_u8(1).unwrap();
        payload.write_u16::<BigEndian>(0).unwrap();
        payload.write_u8(0).unwrap();
        payload.write_u8(0x00).unwrap();
        payload.write_u16::<BigEndian>(600).unwrap();
        payload.write_u16::<BigEndian>(900).unwrap();

        self.segment(0x16, &payload)
    }

    /// Appends a WDS defining `(id, x, y, width, height)` windows.
    pub fn wds(self, windows: &[(u8, u16, u16, u16, u16)]) -> Self {

        let mut payload = vec![windows.len() as u8];

        for &(id, x, y, width, height) in windows {
            payload.write_u8(id).unwrap();
            payload.write_u16::<BigEndian>(x).unwrap();
            payload.write_u16::<BigEndian>(y).unwrap();
            payload.write_u16::<BigEndian>(width).unwrap();
            payload.write_u16::<BigEndian>(height).unwrap();
        }

        self.segment(0x17, &payload)
    }

    /// Appends a PDS with `(id, y, cr, cb, alpha)` entries.
    pub fn pds(self, id: u8, entries: &[(u8, u8, u8, u8, u8)]) -> Self {

        let mut payload = vec![id, 0];

        for &(id, y, cr, cb, alpha) in entries {
            payload.extend_from_slice(&[id, y, cr, cb, alpha]);
        }

        self.segment(0x14, &payload)
    }

    /// Appends an ODS fragment; `size` is written only for first fragments.
    pub fn ods(self, id: u16, sequence: u8, size: Option<(u16, u16)>, data: &[u8]) -> Self {

        let mut payload = vec![];

        payload.write_u16::<BigEndian>(id).unwrap();
        payload.write_u8(0).unwrap();
        payload.write_u8(sequence).unwrap();

        match size {
            Some((width, height)) => {
                payload.write_u24::<BigEndian>(data.len() as u32 + 4).unwrap();
                payload.write_u16::<BigEndian>(width).unwrap();
                payload.write_u16::<BigEndian>(height).unwrap();
            }
            None => {
                payload.write_u24::<BigEndian>(data.len() as u32).unwrap();
            }
        }

        payload.extend_from_slice(data);

        self.segment(0x15, &payload)
    }

    pub fn end(self) -> Self {
        self.segment(0x80, &[])
    }

    pub fn build(self) -> Vec<u8> {
        self.bytes
    }
}

/// Runs `bytes` through a fresh reader, collecting every display set it completes.
pub fn read_all(bytes: Vec<u8>) -> ReadResult<(DisplaySetReader, Vec<Arc<DisplaySet>>)> {

    let mut reader = DisplaySetReader::new();
    let mut queue = BufferQueue::new();
    let mut display_sets = vec![];

    queue.push(bytes);

    while queue.len() >= reader.needed() {

        let chunk = queue.read_exact(reader.needed()).unwrap();

        reader.consume(chunk)?;

        if let Some(display_set) = reader.take() {
            display_sets.push(display_set);
        }
    }

    Ok((reader, display_sets))
}
