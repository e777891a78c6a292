// The compositor paints chunk averages back onto a frame. It is used for the debug
// preview and for producing the output image downstream consumers read, so it
// writes through the frame's channel order and never touches alpha.

use crate::core_modules::change_detector::SkipSet;
use crate::core_modules::chunk::BorderChunk;
use crate::core_modules::frame::FrameBuffer;

/// Drops every chunk whose index is in `skipped`, preserving the order of the rest.
pub fn remove_skipped_chunks(chunks: &mut Vec<BorderChunk>, skipped: &SkipSet) {
    if skipped.is_empty() {
        return;
    }
    chunks.retain(|chunk| !skipped.contains(&chunk.index));
}

/// Fills each chunk's rectangle with its current average color.
///
/// Rectangles are clipped to the frame, so a chunk built for a larger frame
/// paints only its visible part.
pub fn fill_chunks_with_average(chunks: &[BorderChunk], frame: &mut FrameBuffer) {
    let width = frame.width();
    let height = frame.height();
    for chunk in chunks {
        let bounds = &chunk.bounds;
        for row in bounds.y_start..bounds.y_end.min(height) {
            for column in bounds.x_start..bounds.x_end.min(width) {
                // Rows and columns are clipped to the frame, so the write cannot miss.
                let _ = frame.set_rgb(row, column, chunk.r, chunk.g, chunk.b);
            }
        }
    }
}
