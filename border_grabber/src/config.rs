//! Tunable settings for the pipeline and the debug visualiser.
//!
//! Both structs deserialize with `#[serde(default)]`, so a config file only needs
//! the fields it wants to change.

use crate::core_modules::change_detector::ThresholdBoundary;
use crate::core_modules::chunk::BorderLayout;
use crate::core_modules::delta_e::DeltaEMetric;
use crate::core_modules::frame::ChannelOrder;
use crate::core_modules::noise::{ChannelOverflow, NoiseApplicator, NoiseType};
use crate::error::{GrabberError, Result};
use serde::{Deserialize, Serialize};

/// Configuration for `BorderPipeline`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PipelineConfig {
    pub image_width: usize,
    pub image_height: usize,
    /// Byte layout the capture layer delivers. Frames in any other order are rejected.
    pub channel_order: ChannelOrder,
    /// Depth of the sampled border band as a fraction of the frame, in (0, 0.5).
    pub border_sample_percentage: f32,
    pub horizontal_chunks: usize,
    pub vertical_chunks: usize,
    pub metric: DeltaEMetric,
    /// Chunks whose DeltaE against the previous frame falls below this are skipped.
    pub threshold: f64,
    pub boundary: ThresholdBoundary,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            image_width: 1920,
            image_height: 1080,
            channel_order: ChannelOrder::Bgra,
            border_sample_percentage: 0.05,
            horizontal_chunks: 16,
            vertical_chunks: 9,
            metric: DeltaEMetric::Cie2000,
            threshold: 2.0,
            boundary: ThresholdBoundary::Exclusive,
        }
    }
}

impl PipelineConfig {
    pub fn layout(&self) -> BorderLayout {
        BorderLayout {
            border_sample_percentage: self.border_sample_percentage,
            horizontal_chunks: self.horizontal_chunks,
            vertical_chunks: self.vertical_chunks,
        }
    }

    /// Checks the scalar settings. Chunk geometry is checked when the layout is built.
    pub fn validate(&self) -> Result<()> {
        if self.image_width == 0 || self.image_height == 0 {
            return Err(GrabberError::InvalidConfig {
                field: "image_width/image_height",
                message: format!("{}x{} has no pixels", self.image_width, self.image_height),
            });
        }
        if !self.threshold.is_finite() || self.threshold < 0.0 {
            return Err(GrabberError::InvalidConfig {
                field: "threshold",
                message: format!("{} must be a finite, non-negative distance", self.threshold),
            });
        }
        Ok(())
    }
}

/// Configuration for `DebugVisualiser`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct VisualiserConfig {
    /// Base value written to every channel before the noise shift.
    pub blank_value: u8,
    pub noise_type: NoiseType,
    pub applicator: NoiseApplicator,
    /// The untouched margin is `border_sample_percentage * leeway_multiplier`.
    pub leeway_multiplier: f32,
    pub overflow: ChannelOverflow,
    pub seed: u64,
}

impl Default for VisualiserConfig {
    fn default() -> Self {
        Self {
            blank_value: 150,
            noise_type: NoiseType::None,
            applicator: NoiseApplicator::Inner,
            leeway_multiplier: 2.5,
            overflow: ChannelOverflow::Wrap,
            seed: 0,
        }
    }
}

impl VisualiserConfig {
    pub fn validate(&self) -> Result<()> {
        if !self.leeway_multiplier.is_finite() || self.leeway_multiplier < 0.0 {
            return Err(GrabberError::InvalidConfig {
                field: "leeway_multiplier",
                message: format!("{} must be finite and non-negative", self.leeway_multiplier),
            });
        }
        Ok(())
    }
}
