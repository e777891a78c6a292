// THEORY:
// A `BorderChunk` is a fixed rectangular patch of the frame's border band. Where
// a general vision grid tiles the whole image, an ambient-lighting rig only
// cares about the edges: each chunk maps to one (or a few) physical LEDs behind
// the screen, and its single averaged color is what that LED shows.
//
// Key architectural principles:
// 1.  **Fixed geometry, mutable color**: the rectangle is decided once per session
//     by `BorderLayout::build` and validated against the frame size. Only the
//     r/g/b fields change from frame to frame.
// 2.  **Stable identity**: `index` is the join key between consecutive frames and
//     between the core and the hardware transport. Indices run clockwise from the
//     top-left corner and never change while the list lives.
// 3.  **Dumb container**: a chunk does not know how to average itself or compare
//     itself to its past. `chunk_sampler` and `change_detector` do that.

use crate::core_modules::colourspace::Rgb;
use crate::error::{GrabberError, Result};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::fmt;
use tracing::info;

pub type ChunkIndex = usize;

/// Half-open pixel rectangle: columns `[x_start, x_end)`, rows `[y_start, y_end)`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ChunkBounds {
    pub x_start: usize,
    pub x_end: usize,
    pub y_start: usize,
    pub y_end: usize,
}

impl ChunkBounds {
    pub const fn new(x_start: usize, x_end: usize, y_start: usize, y_end: usize) -> Self {
        Self {
            x_start,
            x_end,
            y_start,
            y_end,
        }
    }

    pub fn width(&self) -> usize {
        self.x_end.saturating_sub(self.x_start)
    }

    pub fn height(&self) -> usize {
        self.y_end.saturating_sub(self.y_start)
    }

    pub fn area(&self) -> usize {
        self.width() * self.height()
    }

    pub fn is_empty(&self) -> bool {
        self.area() == 0
    }

    pub fn fits_within(&self, width: usize, height: usize) -> bool {
        self.x_end <= width && self.y_end <= height
    }

    pub fn overlaps(&self, other: &ChunkBounds) -> bool {
        self.x_start < other.x_end
            && other.x_start < self.x_end
            && self.y_start < other.y_end
            && other.y_start < self.y_end
    }
}

/// One sampled region of the border band and its most recent average color.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BorderChunk {
    pub index: ChunkIndex,
    pub bounds: ChunkBounds,
    pub r: u8,
    pub g: u8,
    pub b: u8,
}

impl BorderChunk {
    pub fn new(index: ChunkIndex, bounds: ChunkBounds) -> Self {
        Self {
            index,
            bounds,
            r: 0,
            g: 0,
            b: 0,
        }
    }

    pub fn color(&self) -> Rgb {
        Rgb::from_bytes(self.r, self.g, self.b)
    }

    pub fn to_update(&self) -> ChunkUpdate {
        ChunkUpdate {
            index: self.index,
            r: self.r,
            g: self.g,
            b: self.b,
        }
    }
}

/// One entry of the per-frame output handed to the hardware transport.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChunkUpdate {
    pub index: ChunkIndex,
    pub r: u8,
    pub g: u8,
    pub b: u8,
}

impl fmt::Display for ChunkUpdate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} | {} | {} | {}", self.index, self.r, self.g, self.b)
    }
}

/// How the border band is cut into chunks.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BorderLayout {
    /// Depth of the band as a fraction of the frame's width (left/right edges)
    /// and height (top/bottom edges). Must lie in (0, 0.5).
    pub border_sample_percentage: f32,
    /// Chunks along the top edge, and again along the bottom edge.
    pub horizontal_chunks: usize,
    /// Chunks along the right edge, and again along the left edge, between the corners.
    pub vertical_chunks: usize,
}

impl BorderLayout {
    pub fn total_chunks(&self) -> usize {
        2 * (self.horizontal_chunks + self.vertical_chunks)
    }

    /// Builds the clockwise chunk list for a `width × height` frame.
    ///
    /// The top and bottom strips own the corners; the side strips cover the rows
    /// between them. Strip lengths are split as evenly as integer division allows,
    /// with the remainder going to the leading chunks, so every border pixel
    /// belongs to exactly one chunk.
    pub fn build(&self, width: usize, height: usize) -> Result<Vec<BorderChunk>> {
        let pct = self.border_sample_percentage;
        if !(pct > 0.0 && pct < 0.5) {
            return Err(GrabberError::InvalidConfig {
                field: "border_sample_percentage",
                message: format!("{pct} is not in (0, 0.5)"),
            });
        }
        if self.horizontal_chunks == 0 || self.vertical_chunks == 0 {
            return Err(GrabberError::InvalidConfig {
                field: "horizontal_chunks/vertical_chunks",
                message: "both chunk counts must be positive".to_string(),
            });
        }

        let band_h = (height as f32 * pct) as usize;
        let band_w = (width as f32 * pct) as usize;
        if band_h == 0 || band_w == 0 {
            return Err(GrabberError::InvalidGeometry(format!(
                "a {pct} border on {width}x{height} is less than one pixel deep"
            )));
        }
        let inner_height = height - 2 * band_h;
        if width < self.horizontal_chunks || inner_height < self.vertical_chunks {
            return Err(GrabberError::InvalidGeometry(format!(
                "{width}x{height} cannot hold {} horizontal and {} vertical chunks",
                self.horizontal_chunks, self.vertical_chunks
            )));
        }

        let columns = split_span(0, width, self.horizontal_chunks);
        let rows = split_span(band_h, height - band_h, self.vertical_chunks);

        let mut chunks = Vec::with_capacity(self.total_chunks());
        let mut push = |bounds: ChunkBounds| {
            let index = chunks.len();
            chunks.push(BorderChunk::new(index, bounds));
        };

        for &(x_start, x_end) in &columns {
            push(ChunkBounds::new(x_start, x_end, 0, band_h));
        }
        for &(y_start, y_end) in &rows {
            push(ChunkBounds::new(width - band_w, width, y_start, y_end));
        }
        for &(x_start, x_end) in columns.iter().rev() {
            push(ChunkBounds::new(x_start, x_end, height - band_h, height));
        }
        for &(y_start, y_end) in rows.iter().rev() {
            push(ChunkBounds::new(0, band_w, y_start, y_end));
        }

        validate_geometry(&chunks, width, height)?;
        info!(
            "Built {} border chunks for {width}x{height} (band {band_w}x{band_h} px)",
            chunks.len()
        );
        Ok(chunks)
    }
}

/// Splits `[start, end)` into `count` contiguous spans whose lengths differ by at most one.
fn split_span(start: usize, end: usize, count: usize) -> Vec<(usize, usize)> {
    let length = end - start;
    let base = length / count;
    let remainder = length % count;
    let mut spans = Vec::with_capacity(count);
    let mut cursor = start;
    for i in 0..count {
        let span = base + usize::from(i < remainder);
        spans.push((cursor, cursor + span));
        cursor += span;
    }
    spans
}

/// Checks the caller contract the sampler relies on: every chunk is non-empty,
/// inside the frame, uniquely indexed and disjoint from every other chunk.
pub fn validate_geometry(chunks: &[BorderChunk], width: usize, height: usize) -> Result<()> {
    let mut seen = HashSet::with_capacity(chunks.len());
    for (i, chunk) in chunks.iter().enumerate() {
        let bounds = &chunk.bounds;
        if bounds.is_empty() {
            return Err(GrabberError::InvalidGeometry(format!(
                "chunk {} is empty: {bounds:?}",
                chunk.index
            )));
        }
        if !bounds.fits_within(width, height) {
            return Err(GrabberError::InvalidGeometry(format!(
                "chunk {} {bounds:?} exceeds the {width}x{height} frame",
                chunk.index
            )));
        }
        if !seen.insert(chunk.index) {
            return Err(GrabberError::InvalidGeometry(format!(
                "duplicate chunk index {}",
                chunk.index
            )));
        }
        if let Some(other) = chunks[..i].iter().find(|c| c.bounds.overlaps(bounds)) {
            return Err(GrabberError::InvalidGeometry(format!(
                "chunk {} overlaps chunk {}",
                chunk.index, other.index
            )));
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn layout(pct: f32, horizontal: usize, vertical: usize) -> BorderLayout {
        BorderLayout {
            border_sample_percentage: pct,
            horizontal_chunks: horizontal,
            vertical_chunks: vertical,
        }
    }

    #[test]
    fn builds_clockwise_from_top_left() {
        let chunks = layout(0.1, 4, 2).build(100, 50).unwrap();
        assert_eq!(chunks.len(), 12);
        let indices: Vec<_> = chunks.iter().map(|c| c.index).collect();
        assert_eq!(indices, (0..12).collect::<Vec<_>>());

        // Top edge, left to right.
        assert_eq!(chunks[0].bounds, ChunkBounds::new(0, 25, 0, 5));
        assert_eq!(chunks[3].bounds, ChunkBounds::new(75, 100, 0, 5));
        // Right edge, between the corner strips.
        assert_eq!(chunks[4].bounds, ChunkBounds::new(90, 100, 5, 25));
        assert_eq!(chunks[5].bounds, ChunkBounds::new(90, 100, 25, 45));
        // Bottom edge, right to left.
        assert_eq!(chunks[6].bounds, ChunkBounds::new(75, 100, 45, 50));
        assert_eq!(chunks[9].bounds, ChunkBounds::new(0, 25, 45, 50));
        // Left edge, bottom to top.
        assert_eq!(chunks[10].bounds, ChunkBounds::new(0, 10, 25, 45));
        assert_eq!(chunks[11].bounds, ChunkBounds::new(0, 10, 5, 25));
    }

    #[test]
    fn uneven_widths_cover_every_column() {
        let chunks = layout(0.1, 3, 1).build(10, 10).unwrap();
        let top: Vec<_> = chunks[..3].iter().map(|c| (c.bounds.x_start, c.bounds.x_end)).collect();
        assert_eq!(top, vec![(0, 4), (4, 7), (7, 10)]);
    }

    #[test]
    fn rejects_bad_percentages_and_counts() {
        assert!(matches!(
            layout(0.0, 4, 2).build(100, 50),
            Err(GrabberError::InvalidConfig { .. })
        ));
        assert!(matches!(
            layout(0.5, 4, 2).build(100, 50),
            Err(GrabberError::InvalidConfig { .. })
        ));
        assert!(matches!(
            layout(0.1, 0, 2).build(100, 50),
            Err(GrabberError::InvalidConfig { .. })
        ));
        assert!(matches!(
            layout(0.01, 4, 2).build(50, 50),
            Err(GrabberError::InvalidGeometry(_))
        ));
        assert!(matches!(
            layout(0.1, 4, 100).build(100, 50),
            Err(GrabberError::InvalidGeometry(_))
        ));
    }

    #[test]
    fn validation_catches_contract_violations() {
        let inside = BorderChunk::new(0, ChunkBounds::new(0, 10, 0, 10));
        let outside = BorderChunk::new(1, ChunkBounds::new(5, 25, 0, 10));
        assert!(validate_geometry(&[inside.clone(), outside], 20, 20).is_err());

        let duplicate = BorderChunk::new(0, ChunkBounds::new(10, 20, 0, 10));
        assert!(validate_geometry(&[inside.clone(), duplicate], 20, 20).is_err());

        let overlapping = BorderChunk::new(2, ChunkBounds::new(5, 15, 5, 15));
        assert!(validate_geometry(&[inside.clone(), overlapping], 20, 20).is_err());

        let empty = BorderChunk::new(3, ChunkBounds::new(4, 4, 0, 10));
        assert!(validate_geometry(&[empty], 20, 20).is_err());

        let neighbour = BorderChunk::new(4, ChunkBounds::new(10, 20, 0, 10));
        assert!(validate_geometry(&[inside, neighbour], 20, 20).is_ok());
    }

    #[test]
    fn update_display_matches_log_format() {
        let mut chunk = BorderChunk::new(7, ChunkBounds::new(0, 1, 0, 1));
        chunk.r = 1;
        chunk.g = 22;
        chunk.b = 255;
        assert_eq!(chunk.to_update().to_string(), "7 | 1 | 22 | 255");
    }
}
