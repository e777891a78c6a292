// THEORY:
// The visual tester drives the border grabber end to end without a screen or an
// LED strip. A noise renderer stands in for the capture source, the pipeline
// processes each synthetic frame, and the debug visualiser writes what would have
// been sent to disk as a numbered PNG sequence (or discards it when no output
// directory is given). Frames are paced by a tokio interval and the loop stops at
// the frame limit or on Ctrl-C.

use anyhow::{Context, Result};
use border_grabber::{
    BorderPipeline, DebugVisualiser, DeltaEMetric, FrameBuffer, NoiseApplicator,
    NoiseRenderer, NoiseType, PipelineConfig, PresentationSink, VisualiserConfig,
};
use clap::Parser;
use serde::Deserialize;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::{debug, info, warn};
use tracing_subscriber::EnvFilter;

/// Renders synthetic frames through the border grabber and saves the debug view.
#[derive(Parser, Debug)]
#[command(name = "visual_tester")]
#[command(author, version, about, long_about = None)]
struct Args {
    /// JSON file with optional `pipeline` and `visualiser` sections
    #[arg(long, short = 'c')]
    config: Option<PathBuf>,

    #[arg(long)]
    width: Option<usize>,

    #[arg(long)]
    height: Option<usize>,

    /// Number of frames to render; runs until Ctrl-C when omitted
    #[arg(long, short = 'n')]
    frames: Option<u64>,

    /// Frames per second, 1..=1000
    #[arg(long, default_value = "30", value_parser = clap::value_parser!(u32).range(1..=1000))]
    fps: u32,

    /// Directory for frame_00000.png, frame_00001.png, ...
    #[arg(long, short = 'o')]
    output_dir: Option<PathBuf>,

    /// Pattern used to synthesize the captured frames
    #[arg(long, default_value = "SHIFTER_2")]
    source_noise: NoiseType,

    /// Pattern painted behind the chunks in the debug view
    #[arg(long)]
    noise: Option<NoiseType>,

    #[arg(long)]
    applicator: Option<NoiseApplicator>,

    /// CIE76, CIE94, CIE2000 or 1..3
    #[arg(long)]
    metric: Option<DeltaEMetric>,

    #[arg(long)]
    threshold: Option<f64>,

    #[arg(long)]
    seed: Option<u64>,

    /// Log level when RUST_LOG is not set
    #[arg(long, short = 'l', default_value = "info")]
    log_level: String,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct TesterConfig {
    pipeline: PipelineConfig,
    visualiser: VisualiserConfig,
}

impl TesterConfig {
    fn load(path: Option<&Path>) -> Result<Self> {
        let Some(path) = path else {
            return Ok(Self::default());
        };
        let text = std::fs::read_to_string(path)
            .with_context(|| format!("reading config {}", path.display()))?;
        serde_json::from_str(&text).with_context(|| format!("parsing config {}", path.display()))
    }

    fn apply_overrides(&mut self, args: &Args) {
        if let Some(width) = args.width {
            self.pipeline.image_width = width;
        }
        if let Some(height) = args.height {
            self.pipeline.image_height = height;
        }
        if let Some(metric) = args.metric {
            self.pipeline.metric = metric;
        }
        if let Some(threshold) = args.threshold {
            self.pipeline.threshold = threshold;
        }
        if let Some(noise) = args.noise {
            self.visualiser.noise_type = noise;
        }
        if let Some(applicator) = args.applicator {
            self.visualiser.applicator = applicator;
        }
        if let Some(seed) = args.seed {
            self.visualiser.seed = seed;
        }
    }
}

/// Saves each presented frame as the next PNG in a directory.
struct PngSequenceSink {
    dir: PathBuf,
    next: usize,
}

impl PngSequenceSink {
    fn new(dir: PathBuf) -> Result<Self> {
        std::fs::create_dir_all(&dir)
            .with_context(|| format!("creating output directory {}", dir.display()))?;
        Ok(Self { dir, next: 0 })
    }
}

impl PresentationSink for PngSequenceSink {
    fn present(&mut self, frame: &FrameBuffer) -> border_grabber::Result<()> {
        let path = self.dir.join(format!("frame_{:05}.png", self.next));
        frame.save_png(&path)?;
        debug!("wrote {}", path.display());
        self.next += 1;
        Ok(())
    }
}

/// Accepts frames and drops them.
struct DiscardSink;

impl PresentationSink for DiscardSink {
    fn present(&mut self, _frame: &FrameBuffer) -> border_grabber::Result<()> {
        Ok(())
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| {
                EnvFilter::new(format!(
                    "visual_tester={0},border_grabber={0}",
                    args.log_level
                ))
            }),
        )
        .init();

    let mut config = TesterConfig::load(args.config.as_deref())?;
    config.apply_overrides(&args);

    let border_sample_percentage = config.pipeline.border_sample_percentage;
    let width = config.pipeline.image_width;
    let height = config.pipeline.image_height;
    let order = config.pipeline.channel_order;

    let mut pipeline = BorderPipeline::new(config.pipeline)?;
    let mut visualiser = DebugVisualiser::new(config.visualiser)?;
    let mut source = NoiseRenderer::new(visualiser.config().seed.wrapping_add(1));

    let mut sink: Box<dyn PresentationSink> = match args.output_dir.clone() {
        Some(dir) => Box::new(PngSequenceSink::new(dir)?),
        None => Box::new(DiscardSink),
    };

    let fps = args.fps;
    let mut ticker = tokio::time::interval(Duration::from_secs(1) / fps);
    info!(
        "Rendering {} frames of {width}x{height} {} at {fps} fps",
        args.frames.map_or_else(|| "unbounded".to_string(), |n| n.to_string()),
        args.source_noise
    );

    let mut rendered = 0u64;
    let mut sent = 0usize;
    loop {
        if args.frames.is_some_and(|limit| rendered >= limit) {
            break;
        }
        tokio::select! {
            _ = ticker.tick() => {}
            _ = tokio::signal::ctrl_c() => {
                warn!("Interrupted after {rendered} frames");
                break;
            }
        }

        let mut frame = FrameBuffer::new(width, height, order);
        source.fill_with_noise(&mut frame, 0.0, 0, args.source_noise, NoiseApplicator::Outer);

        let report = pipeline.process_frame(&frame)?;
        sent += report.updates.len();
        // PNG encoding blocks, so keep it off the runtime's worker.
        tokio::task::block_in_place(|| {
            visualiser.show(
                &mut frame,
                border_sample_percentage,
                pipeline.chunks(),
                &report.skipped,
                sink.as_mut(),
            )
        })?;
        rendered += 1;
    }

    info!(
        "Processing complete: {rendered} frames, {sent} chunk updates, last fps {:?}",
        pipeline.last_fps()
    );
    if let Some(dir) = &args.output_dir {
        info!("Output saved to {}", dir.display());
    }
    Ok(())
}
