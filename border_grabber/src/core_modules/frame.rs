// THEORY:
// The `FrameBuffer` is the hand-off point between the outside world (a screen
// grabber, a video decoder, the synthetic noise source) and the core. It owns a
// flat, row-major, interleaved byte buffer plus the one piece of metadata that is
// easy to get wrong: the channel order.
//
// Desktop capture surfaces deliver BGRA, the `image` crate hands out RGB/RGBA,
// and the hardware side only ever cares about "red, green, blue". Rather than
// letting every caller do `y * width * channels + x * channels + 2` arithmetic
// and hope the `+ 2` is red, the frame exposes:
//
// 1.  A bounds-checked accessor addressed by (row, column, channel) that returns
//     `None` or an `OutOfBounds` error instead of reading past the buffer.
// 2.  Color-level helpers (`rgb_at`, `set_rgb`) that translate through the
//     channel order, so red is always red no matter how the bytes are laid out.
//
// Alpha, when present, is carried through untouched; nothing in the core writes it.

use crate::error::{GrabberError, Result};
use image::{ImageFormat, Rgb as ImageRgb, RgbImage, RgbaImage};
use serde::{Deserialize, Serialize};
use std::path::Path;

pub type Byte = u8;

/// Byte layout of one interleaved pixel.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ChannelOrder {
    Bgr,
    #[default]
    Bgra,
    Rgb,
    Rgba,
}

impl ChannelOrder {
    pub fn channels(self) -> usize {
        match self {
            Self::Bgr | Self::Rgb => 3,
            Self::Bgra | Self::Rgba => 4,
        }
    }

    /// Byte offsets of (red, green, blue) within one pixel.
    pub fn rgb_offsets(self) -> (usize, usize, usize) {
        match self {
            Self::Bgr | Self::Bgra => (2, 1, 0),
            Self::Rgb | Self::Rgba => (0, 1, 2),
        }
    }

    pub fn has_alpha(self) -> bool {
        self.channels() == 4
    }
}

/// An interleaved, row-major pixel buffer.
#[derive(Debug, Clone, PartialEq)]
pub struct FrameBuffer {
    width: usize,
    height: usize,
    order: ChannelOrder,
    data: Vec<Byte>,
}

impl FrameBuffer {
    /// A frame filled with zeros (alpha included).
    pub fn new(width: usize, height: usize, order: ChannelOrder) -> Self {
        Self {
            width,
            height,
            order,
            data: vec![0; width * height * order.channels()],
        }
    }

    /// Wraps an existing buffer. Its length must be exactly `width * height * channels`.
    pub fn from_raw(width: usize, height: usize, order: ChannelOrder, data: Vec<Byte>) -> Result<Self> {
        let expected = width * height * order.channels();
        if data.len() != expected {
            return Err(GrabberError::FrameSizeMismatch {
                expected: format!("{expected} bytes ({width}x{height}x{})", order.channels()),
                actual: format!("{} bytes", data.len()),
            });
        }
        Ok(Self {
            width,
            height,
            order,
            data,
        })
    }

    /// A frame where every pixel holds the same color; alpha is opaque.
    pub fn solid(width: usize, height: usize, order: ChannelOrder, r: Byte, g: Byte, b: Byte) -> Self {
        let mut frame = Self::new(width, height, order);
        let (ro, go, bo) = order.rgb_offsets();
        let channels = order.channels();
        for pixel in frame.data.chunks_exact_mut(channels) {
            pixel[ro] = r;
            pixel[go] = g;
            pixel[bo] = b;
            if order.has_alpha() {
                pixel[3] = Byte::MAX;
            }
        }
        frame
    }

    pub fn width(&self) -> usize {
        self.width
    }

    pub fn height(&self) -> usize {
        self.height
    }

    pub fn channel_order(&self) -> ChannelOrder {
        self.order
    }

    pub fn channels(&self) -> usize {
        self.order.channels()
    }

    pub fn as_bytes(&self) -> &[Byte] {
        &self.data
    }

    #[inline]
    fn index_of(&self, row: usize, column: usize, channel: usize) -> Option<usize> {
        let channels = self.order.channels();
        if row >= self.height || column >= self.width || channel >= channels {
            return None;
        }
        Some((row * self.width + column) * channels + channel)
    }

    /// Raw byte at (row, column, channel) in storage order.
    pub fn channel(&self, row: usize, column: usize, channel: usize) -> Option<Byte> {
        self.index_of(row, column, channel).map(|i| self.data[i])
    }

    pub fn set_channel(&mut self, row: usize, column: usize, channel: usize, value: Byte) -> Result<()> {
        let i = self
            .index_of(row, column, channel)
            .ok_or(GrabberError::OutOfBounds { row, column, channel })?;
        self.data[i] = value;
        Ok(())
    }

    /// (red, green, blue) at a pixel, regardless of storage order.
    #[inline]
    pub fn rgb_at(&self, row: usize, column: usize) -> Option<(Byte, Byte, Byte)> {
        let base = self.index_of(row, column, 0)?;
        let (ro, go, bo) = self.order.rgb_offsets();
        Some((self.data[base + ro], self.data[base + go], self.data[base + bo]))
    }

    /// Writes (red, green, blue) at a pixel, leaving alpha alone.
    #[inline]
    pub fn set_rgb(&mut self, row: usize, column: usize, r: Byte, g: Byte, b: Byte) -> Result<()> {
        let base = self
            .index_of(row, column, 0)
            .ok_or(GrabberError::OutOfBounds { row, column, channel: 0 })?;
        let (ro, go, bo) = self.order.rgb_offsets();
        self.data[base + ro] = r;
        self.data[base + go] = g;
        self.data[base + bo] = b;
        Ok(())
    }

    /// One row of pixels in storage order.
    pub fn row(&self, row: usize) -> Option<&[Byte]> {
        if row >= self.height {
            return None;
        }
        let stride = self.width * self.order.channels();
        Some(&self.data[row * stride..(row + 1) * stride])
    }

    pub fn from_rgb_image(image: &RgbImage) -> Self {
        Self {
            width: image.width() as usize,
            height: image.height() as usize,
            order: ChannelOrder::Rgb,
            data: image.as_raw().clone(),
        }
    }

    pub fn from_rgba_image(image: &RgbaImage) -> Self {
        Self {
            width: image.width() as usize,
            height: image.height() as usize,
            order: ChannelOrder::Rgba,
            data: image.as_raw().clone(),
        }
    }

    /// Copies the frame into an `image::RgbImage`, translating channel order.
    pub fn to_rgb_image(&self) -> RgbImage {
        RgbImage::from_fn(self.width as u32, self.height as u32, |x, y| {
            let (r, g, b) = self.rgb_at(y as usize, x as usize).unwrap_or_default();
            ImageRgb([r, g, b])
        })
    }

    /// Encodes the frame as an RGB PNG at `path`. Alpha is dropped.
    pub fn save_png(&self, path: &Path) -> Result<()> {
        self.to_rgb_image().save_with_format(path, ImageFormat::Png)?;
        Ok(())
    }
}
