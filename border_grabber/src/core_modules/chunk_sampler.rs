// THEORY:
// The chunk sampler performs the spatial pooling step: every border chunk's
// rectangle is reduced to one average color. Averaging over a whole patch
// cancels single-pixel capture noise and compression artifacts before any
// perceptual comparison happens, and it shrinks a multi-megapixel frame down to
// a few dozen colors.
//
// The sampler reads the frame strictly read-only and writes only the r/g/b fields
// of the chunks. Geometry is trusted: `chunk::validate_geometry` runs once at
// setup, so this hot path does not re-check it per frame. Cost is linear in the
// number of sampled pixels; rows are walked as contiguous byte slices.

use crate::core_modules::chunk::{BorderChunk, ChunkBounds};
use crate::core_modules::frame::FrameBuffer;
use tracing::trace;

/// Integer mean of each color channel over a rectangle.
///
/// Returns `None` for an empty rectangle. Sums are accumulated in `u64`, so a
/// full 8K frame cannot overflow them; the division truncates.
pub fn average_rgb(frame: &FrameBuffer, bounds: &ChunkBounds) -> Option<(u8, u8, u8)> {
    let channels = frame.channels();
    let (ro, go, bo) = frame.channel_order().rgb_offsets();

    let mut sum_r = 0u64;
    let mut sum_g = 0u64;
    let mut sum_b = 0u64;
    let mut count = 0u64;

    for y in bounds.y_start..bounds.y_end {
        let Some(row) = frame.row(y) else { break };
        let start = bounds.x_start * channels;
        let end = (bounds.x_end * channels).min(row.len());
        if start >= end {
            continue;
        }
        for pixel in row[start..end].chunks_exact(channels) {
            sum_r += pixel[ro] as u64;
            sum_g += pixel[go] as u64;
            sum_b += pixel[bo] as u64;
            count += 1;
        }
    }

    if count == 0 {
        return None;
    }
    Some((
        (sum_r / count) as u8,
        (sum_g / count) as u8,
        (sum_b / count) as u8,
    ))
}

/// Recomputes every chunk's color from the frame.
pub fn sample_chunks(frame: &FrameBuffer, chunks: &mut [BorderChunk]) {
    for chunk in chunks.iter_mut() {
        if let Some((r, g, b)) = average_rgb(frame, &chunk.bounds) {
            chunk.r = r;
            chunk.g = g;
            chunk.b = b;
            trace!("sampled {}", chunk.to_update());
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core_modules::chunk::BorderLayout;
    use crate::core_modules::frame::ChannelOrder;

    #[test]
    fn solid_fill_samples_exactly() {
        for order in [ChannelOrder::Bgr, ChannelOrder::Bgra, ChannelOrder::Rgb, ChannelOrder::Rgba] {
            let frame = FrameBuffer::solid(64, 36, order, 12, 200, 99);
            let mut chunks = BorderLayout {
                border_sample_percentage: 0.1,
                horizontal_chunks: 8,
                vertical_chunks: 4,
            }
            .build(64, 36)
            .unwrap();
            sample_chunks(&frame, &mut chunks);
            for chunk in &chunks {
                assert_eq!((chunk.r, chunk.g, chunk.b), (12, 200, 99), "{order:?} {chunk:?}");
            }
        }
    }

    #[test]
    fn mean_truncates() {
        let mut frame = FrameBuffer::new(2, 1, ChannelOrder::Rgb);
        frame.set_rgb(0, 0, 0, 10, 255).unwrap();
        frame.set_rgb(0, 1, 1, 11, 254).unwrap();
        assert_eq!(average_rgb(&frame, &ChunkBounds::new(0, 2, 0, 1)), Some((0, 10, 254)));
    }

    #[test]
    fn only_pixels_inside_the_rectangle_count() {
        let mut frame = FrameBuffer::solid(4, 4, ChannelOrder::Bgra, 0, 0, 0);
        for row in 0..2 {
            for column in 0..2 {
                frame.set_rgb(row, column, 100, 50, 25).unwrap();
            }
        }
        let mut chunks = vec![
            BorderChunk::new(0, ChunkBounds::new(0, 2, 0, 2)),
            BorderChunk::new(1, ChunkBounds::new(2, 4, 0, 4)),
        ];
        sample_chunks(&frame, &mut chunks);
        assert_eq!((chunks[0].r, chunks[0].g, chunks[0].b), (100, 50, 25));
        assert_eq!((chunks[1].r, chunks[1].g, chunks[1].b), (0, 0, 0));
    }

    #[test]
    fn empty_rectangle_leaves_chunk_alone() {
        let frame = FrameBuffer::solid(4, 4, ChannelOrder::Rgb, 9, 9, 9);
        let mut chunk = BorderChunk::new(0, ChunkBounds::new(1, 1, 0, 4));
        chunk.r = 42;
        sample_chunks(&frame, std::slice::from_mut(&mut chunk));
        assert_eq!(chunk.r, 42);
    }
}
