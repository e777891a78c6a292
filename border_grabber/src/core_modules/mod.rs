// THEORY:
// The core modules are the building blocks the pipeline and the visualiser are
// assembled from. Each one is a pure computation over plain data:
//
//   colourspace / delta_e   perceptual color math
//   frame                   pixel buffer with checked, channel-order aware access
//   chunk / chunk_sampler   border geometry and per-chunk averaging
//   change_detector         which chunks can be skipped this frame
//   noise / compositor      synthetic debug frames
//   framerate               FPS bookkeeping
//
// None of them perform I/O or hold global state.

pub mod change_detector;
pub mod chunk;
pub mod chunk_sampler;
pub mod colourspace;
pub mod compositor;
pub mod delta_e;
pub mod frame;
pub mod framerate;
pub mod noise;
