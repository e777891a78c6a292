// THEORY:
// The `pipeline` module is the top-level, per-frame API of the border grabber. It
// wraps the whole core into one object that a capture loop can feed frames to and
// read hardware updates back from:
//
//   frame ─▶ ChunkSampler ─▶ ChangeDetector ─▶ FrameReport { updates, skipped }
//
// The chunk geometry is built and validated once, in `new`. After that each call
// to `process_frame` is synchronous, allocation-light and free of I/O. All state
// that must survive between frames (the previous colors, the frame counter, the
// FPS window) lives inside the pipeline instance and is written in sequence.

use crate::config::PipelineConfig;
use crate::core_modules::change_detector::{ChangeDetector, SkipSet};
use crate::core_modules::chunk::{BorderChunk, ChunkUpdate, validate_geometry};
use crate::core_modules::chunk_sampler::sample_chunks;
use crate::core_modules::frame::FrameBuffer;
use crate::core_modules::framerate::FramerateCounter;
use crate::error::{GrabberError, Result};
use std::time::Instant;
use tracing::{debug, info, trace};

/// What one frame produced for the transport layer.
#[derive(Debug, Clone, PartialEq)]
pub struct FrameReport {
    /// Zero-based sequence number of the frame.
    pub frame_index: u64,
    /// Every chunk that changed perceptibly, in chunk-list order.
    pub updates: Vec<ChunkUpdate>,
    /// Chunks left out of `updates` this frame.
    pub skipped: SkipSet,
}

impl FrameReport {
    pub fn has_updates(&self) -> bool {
        !self.updates.is_empty()
    }
}

/// The sample → detect pipeline for a fixed frame size.
pub struct BorderPipeline {
    config: PipelineConfig,
    chunks: Vec<BorderChunk>,
    detector: ChangeDetector,
    framerate: FramerateCounter,
    frames_processed: u64,
}

impl BorderPipeline {
    /// Builds the border layout from `config` and validates it against the frame size.
    pub fn new(config: PipelineConfig) -> Result<Self> {
        config.validate()?;
        let chunks = config
            .layout()
            .build(config.image_width, config.image_height)?;
        Ok(Self::assemble(config, chunks))
    }

    /// Uses an externally supplied chunk list instead of the generated layout.
    pub fn with_chunks(config: PipelineConfig, chunks: Vec<BorderChunk>) -> Result<Self> {
        config.validate()?;
        validate_geometry(&chunks, config.image_width, config.image_height)?;
        Ok(Self::assemble(config, chunks))
    }

    fn assemble(config: PipelineConfig, chunks: Vec<BorderChunk>) -> Self {
        info!(
            "Border pipeline ready: {}x{}, {} chunks, {} < {} ({:?})",
            config.image_width,
            config.image_height,
            chunks.len(),
            config.metric,
            config.threshold,
            config.boundary
        );
        let detector = ChangeDetector::new(config.metric, config.threshold, config.boundary);
        Self {
            config,
            chunks,
            detector,
            framerate: FramerateCounter::new(Instant::now()),
            frames_processed: 0,
        }
    }

    /// Samples the border of `frame`, compares against the previous frame and
    /// returns the updates worth sending.
    ///
    /// The frame must match the configured dimensions and channel order.
    pub fn process_frame(&mut self, frame: &FrameBuffer) -> Result<FrameReport> {
        let config = &self.config;
        if frame.width() != config.image_width
            || frame.height() != config.image_height
            || frame.channel_order() != config.channel_order
        {
            return Err(GrabberError::FrameSizeMismatch {
                expected: format!(
                    "{}x{} {:?}",
                    config.image_width, config.image_height, config.channel_order
                ),
                actual: format!(
                    "{}x{} {:?}",
                    frame.width(),
                    frame.height(),
                    frame.channel_order()
                ),
            });
        }

        sample_chunks(frame, &mut self.chunks);
        let skipped = self.detector.detect(&self.chunks);

        let updates: Vec<ChunkUpdate> = self
            .chunks
            .iter()
            .filter(|chunk| !skipped.contains(&chunk.index))
            .map(BorderChunk::to_update)
            .collect();
        for update in &updates {
            trace!("update {update}");
        }

        let frame_index = self.frames_processed;
        self.frames_processed += 1;
        if let Some(fps) = self.framerate.tick(Instant::now()) {
            debug!("FPS: {fps}");
        }
        debug!(
            "frame {frame_index}: {} updates, {} skipped",
            updates.len(),
            skipped.len()
        );

        Ok(FrameReport {
            frame_index,
            updates,
            skipped,
        })
    }

    /// Current chunk list with the colors sampled from the latest frame.
    pub fn chunks(&self) -> &[BorderChunk] {
        &self.chunks
    }

    pub fn config(&self) -> &PipelineConfig {
        &self.config
    }

    pub fn frames_processed(&self) -> u64 {
        self.frames_processed
    }

    pub fn last_fps(&self) -> Option<u32> {
        self.framerate.last_fps()
    }

    /// Forgets the previous frame so the next one is sent in full.
    pub fn reset(&mut self) {
        self.detector.reset();
    }
}
