/*
 * SPDX-FileCopyrightText: 2021 William Swartzendruber <wswartzendruber@gmail.com>
 *
 * SPDX-License-Identifier: OSL-3.0
 */

//! Converts palette entries from YCbCr to RGB.


use super::segment::PaletteEntry;
use image::Rgba;

/// Converts `entry` to RGBA, passing its alpha through unchanged.
pub fn rgba_pixel(entry: &PaletteEntry) -> Rgba<u8> {

    let y = entry.y as f64;
    let cb = entry.cb as f64 - 128.0;
    let cr = entry.cr as f64 - 128.0;

    Rgba([
        channel(y + 1.4075 * cr),
        channel(y - 0.3455 * cb - 0.7169 * cr),
        channel(y + 1.7790 * cb),
        entry.alpha,
    ])
}

/// Converts every entry of a palette, preserving order.
pub fn rgba_palette(entries: &[PaletteEntry]) -> Vec<Rgba<u8>> {
    entries.iter().map(rgba_pixel).collect()
}

fn channel(value: f64) -> u8 {
    value.floor().max(0.0).min(255.0) as u8
}
