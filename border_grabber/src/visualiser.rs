// THEORY:
// The debug visualiser turns one processed frame into a picture a human can check
// against the hardware: the interior is repainted with a synthetic noise pattern,
// then every chunk that was sent this frame is filled with the color that was
// sent. Chunks the change detector skipped keep whatever was underneath, so a
// stable region of the screen shows through as the captured pixels (or the noise)
// instead of a flat block.
//
// Where the picture ends up is not this module's business. `PresentationSink` is
// the seam: a window, a PNG sequence or a test recorder all implement it.

use crate::config::VisualiserConfig;
use crate::core_modules::change_detector::SkipSet;
use crate::core_modules::chunk::BorderChunk;
use crate::core_modules::compositor::{fill_chunks_with_average, remove_skipped_chunks};
use crate::core_modules::frame::FrameBuffer;
use crate::core_modules::noise::{NoiseRenderer, NoiseSettings};
use crate::error::Result;
use tracing::trace;

/// Receives finished debug frames.
pub trait PresentationSink {
    fn present(&mut self, frame: &FrameBuffer) -> Result<()>;
}

impl<F> PresentationSink for F
where
    F: FnMut(&FrameBuffer) -> Result<()>,
{
    fn present(&mut self, frame: &FrameBuffer) -> Result<()> {
        self(frame)
    }
}

pub struct DebugVisualiser {
    renderer: NoiseRenderer,
    config: VisualiserConfig,
}

impl DebugVisualiser {
    pub fn new(config: VisualiserConfig) -> Result<Self> {
        config.validate()?;
        let renderer = NoiseRenderer::new(config.seed).with_overflow(config.overflow);
        Ok(Self { renderer, config })
    }

    pub fn config(&self) -> &VisualiserConfig {
        &self.config
    }

    pub fn renderer(&self) -> &NoiseRenderer {
        &self.renderer
    }

    /// Noise settings for a frame sampled at `border_sample_percentage`.
    pub fn noise_settings(&self, border_sample_percentage: f32) -> NoiseSettings {
        NoiseSettings {
            leeway: border_sample_percentage * self.config.leeway_multiplier,
            blank_value: self.config.blank_value,
            noise_type: self.config.noise_type,
            applicator: self.config.applicator,
        }
    }

    /// Paints noise and the non-skipped chunk colors onto `frame` in place.
    ///
    /// `chunks` is not modified; skipped chunks are dropped from a working copy.
    pub fn compose(
        &mut self,
        frame: &mut FrameBuffer,
        border_sample_percentage: f32,
        chunks: &[BorderChunk],
        skipped: &SkipSet,
    ) {
        let settings = self.noise_settings(border_sample_percentage);
        self.renderer.blank(frame, &settings);

        let mut visible = chunks.to_vec();
        remove_skipped_chunks(&mut visible, skipped);
        fill_chunks_with_average(&visible, frame);
        trace!(
            "composited {} of {} chunks ({} skipped)",
            visible.len(),
            chunks.len(),
            skipped.len()
        );
    }

    /// Composes the debug frame and hands it to `sink`.
    pub fn show<S>(
        &mut self,
        frame: &mut FrameBuffer,
        border_sample_percentage: f32,
        chunks: &[BorderChunk],
        skipped: &SkipSet,
        sink: &mut S,
    ) -> Result<()>
    where
        S: PresentationSink + ?Sized,
    {
        self.compose(frame, border_sample_percentage, chunks, skipped);
        sink.present(frame)
    }
}
