// Frames-per-second bookkeeping for the orchestration loop. The counter is plain
// instance state; callers pass the current time in, which keeps it deterministic
// under test.

use std::time::{Duration, Instant};

const REPORT_INTERVAL: Duration = Duration::from_secs(1);

#[derive(Debug, Clone)]
pub struct FramerateCounter {
    window_start: Instant,
    frames: u32,
    last_fps: Option<u32>,
}

impl FramerateCounter {
    pub fn new(now: Instant) -> Self {
        Self {
            window_start: now,
            frames: 0,
            last_fps: None,
        }
    }

    /// Counts one frame. Once more than a second has passed since the window
    /// opened, returns the number of frames in that window and starts a new one.
    pub fn tick(&mut self, now: Instant) -> Option<u32> {
        self.frames += 1;
        if now.saturating_duration_since(self.window_start) > REPORT_INTERVAL {
            let fps = self.frames;
            self.window_start = now;
            self.frames = 0;
            self.last_fps = Some(fps);
            return Some(fps);
        }
        None
    }

    /// The most recently completed window's count.
    pub fn last_fps(&self) -> Option<u32> {
        self.last_fps
    }
}
