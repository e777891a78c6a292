// THEORY:
// This file is the entry point for the `border_grabber` library crate. It turns
// captured screen frames into the per-chunk color updates an ambient LED strip
// needs, and only those updates that a viewer could actually see change.
//
// Consumers talk to two objects:
//   - `BorderPipeline` samples the border of each frame, converts the chunk
//     averages to CIELAB and drops chunks whose DeltaE against the previous frame
//     is below the configured threshold.
//   - `DebugVisualiser` renders what was sent onto a noise-filled frame and hands
//     it to a `PresentationSink`, so the output can be inspected without hardware.
//
// The color math, geometry and rendering live in `core_modules` and are exported
// for callers that need to assemble their own loop.

pub mod config;
pub mod core_modules;
pub mod error;
pub mod pipeline;
pub mod visualiser;

pub use config::{PipelineConfig, VisualiserConfig};
pub use core_modules::change_detector::{ChangeDetector, SkipSet, ThresholdBoundary};
pub use core_modules::chunk::{BorderChunk, BorderLayout, ChunkBounds, ChunkIndex, ChunkUpdate};
pub use core_modules::colourspace::{Lab, Rgb, Xyz, rgb_to_lab, rgb_to_xyz, xyz_to_lab};
pub use core_modules::delta_e::{DeltaEMetric, delta_e};
pub use core_modules::frame::{ChannelOrder, FrameBuffer};
pub use core_modules::noise::{ChannelOverflow, NoiseApplicator, NoiseRenderer, NoiseType};
pub use error::{GrabberError, Result};
pub use pipeline::{BorderPipeline, FrameReport};
pub use visualiser::{DebugVisualiser, PresentationSink};
