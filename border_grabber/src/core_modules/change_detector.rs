// THEORY:
// The change detector decides which chunks are *not* worth sending this frame.
// Raw RGB distance weights the channels the way the sensor sees them, not the way
// people do, so a small shift in a dark blue reads as large and a visible shift in
// a mid green reads as small. Converting both colors to L*a*b* and comparing with
// a DeltaE metric lets us drop updates nobody would notice (capture noise,
// compression shimmer, slow fades below perception) and still react to real
// scene changes, which cuts traffic to the lighting hardware.
//
// The comparison is keyed on chunk index. A chunk that has no previous color
// (first frame, or a chunk that just appeared) is never skipped.
//
// Boundary: with `ThresholdBoundary::Exclusive` (the default) a chunk is skipped
// when `distance < threshold`; a distance exactly equal to the threshold counts as
// a change. `Inclusive` skips on `distance <= threshold`.

use crate::core_modules::chunk::{BorderChunk, ChunkIndex};
use crate::core_modules::colourspace::{Rgb, rgb_to_lab};
use crate::core_modules::delta_e::{DeltaEMetric, Distance};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeSet, HashMap};
use tracing::{debug, trace};

/// Chunk indices excluded from the current frame's update batch.
pub type SkipSet = BTreeSet<ChunkIndex>;

/// Per-index colors from the previous frame.
pub type ColorSnapshot = HashMap<ChunkIndex, Rgb>;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ThresholdBoundary {
    /// Skip when `distance < threshold`.
    #[default]
    Exclusive,
    /// Skip when `distance <= threshold`.
    Inclusive,
}

impl ThresholdBoundary {
    #[inline]
    pub fn is_below(self, distance: Distance, threshold: Distance) -> bool {
        match self {
            Self::Exclusive => distance < threshold,
            Self::Inclusive => distance <= threshold,
        }
    }
}

/// Distance between two sRGB colors under `metric`.
pub fn color_distance(metric: DeltaEMetric, previous: Rgb, current: Rgb) -> Distance {
    metric.distance(&rgb_to_lab(previous), &rgb_to_lab(current))
}

/// Indices whose color moved less than `threshold` since `previous`.
pub fn find_skipped_chunks(
    previous: &ColorSnapshot,
    current: &[BorderChunk],
    metric: DeltaEMetric,
    threshold: Distance,
    boundary: ThresholdBoundary,
) -> SkipSet {
    current
        .iter()
        .filter_map(|chunk| {
            let before = previous.get(&chunk.index)?;
            let distance = color_distance(metric, *before, chunk.color());
            trace!("chunk {} moved {distance:.4} ({metric})", chunk.index);
            boundary
                .is_below(distance, threshold)
                .then_some(chunk.index)
        })
        .collect()
}

pub fn snapshot(chunks: &[BorderChunk]) -> ColorSnapshot {
    chunks.iter().map(|c| (c.index, c.color())).collect()
}

/// Holds the previous frame's colors so consecutive calls can be compared.
#[derive(Debug, Clone)]
pub struct ChangeDetector {
    metric: DeltaEMetric,
    threshold: Distance,
    boundary: ThresholdBoundary,
    previous: ColorSnapshot,
}

impl ChangeDetector {
    pub fn new(metric: DeltaEMetric, threshold: Distance, boundary: ThresholdBoundary) -> Self {
        Self {
            metric,
            threshold,
            boundary,
            previous: ColorSnapshot::new(),
        }
    }

    pub fn metric(&self) -> DeltaEMetric {
        self.metric
    }

    pub fn threshold(&self) -> Distance {
        self.threshold
    }

    pub fn boundary(&self) -> ThresholdBoundary {
        self.boundary
    }

    pub fn previous(&self) -> &ColorSnapshot {
        &self.previous
    }

    /// Compares `chunks` with the stored snapshot, then stores `chunks` as the new
    /// snapshot. The snapshot always holds the *sampled* colors, skipped or not, so
    /// a slow drift is measured frame to frame rather than against the last
    /// transmitted value.
    pub fn detect(&mut self, chunks: &[BorderChunk]) -> SkipSet {
        let skipped = find_skipped_chunks(
            &self.previous,
            chunks,
            self.metric,
            self.threshold,
            self.boundary,
        );
        self.previous = snapshot(chunks);
        debug!(
            "{} of {} chunks below {} {}",
            skipped.len(),
            chunks.len(),
            self.metric,
            self.threshold
        );
        skipped
    }

    pub fn reset(&mut self) {
        self.previous.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core_modules::chunk::ChunkBounds;

    fn chunk(index: ChunkIndex, r: u8, g: u8, b: u8) -> BorderChunk {
        let mut chunk = BorderChunk::new(index, ChunkBounds::new(index, index + 1, 0, 1));
        chunk.r = r;
        chunk.g = g;
        chunk.b = b;
        chunk
    }

    #[test]
    fn identical_colors_are_skipped_for_any_positive_threshold() {
        let chunks = vec![chunk(0, 10, 20, 30), chunk(1, 255, 255, 255), chunk(2, 0, 0, 0)];
        let previous = snapshot(&chunks);
        for metric in DeltaEMetric::ALL {
            for threshold in [1e-9, 0.5, 2.3, 100.0] {
                let skipped =
                    find_skipped_chunks(&previous, &chunks, metric, threshold, ThresholdBoundary::Exclusive);
                assert_eq!(skipped, SkipSet::from([0, 1, 2]));
            }
        }
    }

    #[test]
    fn zero_threshold_skips_nothing_when_exclusive() {
        let chunks = vec![chunk(0, 10, 20, 30)];
        let previous = snapshot(&chunks);
        let exclusive =
            find_skipped_chunks(&previous, &chunks, DeltaEMetric::Cie76, 0.0, ThresholdBoundary::Exclusive);
        let inclusive =
            find_skipped_chunks(&previous, &chunks, DeltaEMetric::Cie76, 0.0, ThresholdBoundary::Inclusive);
        assert!(exclusive.is_empty());
        assert_eq!(inclusive, SkipSet::from([0]));
    }

    #[test]
    fn distance_equal_to_threshold_follows_boundary() {
        let before = chunk(0, 40, 80, 120);
        let after = chunk(0, 45, 80, 118);
        let previous = snapshot(std::slice::from_ref(&before));
        for metric in DeltaEMetric::ALL {
            let exact = color_distance(metric, before.color(), after.color());
            assert!(exact > 0.0);
            let current = std::slice::from_ref(&after);

            let exclusive = find_skipped_chunks(&previous, current, metric, exact, ThresholdBoundary::Exclusive);
            assert!(exclusive.is_empty(), "{metric}: equal distance must not be skipped");

            let inclusive = find_skipped_chunks(&previous, current, metric, exact, ThresholdBoundary::Inclusive);
            assert_eq!(inclusive, SkipSet::from([0]), "{metric}: equal distance must be skipped");
        }
    }

    #[test]
    fn unmatched_indices_are_never_skipped() {
        let previous = snapshot(&[chunk(0, 1, 1, 1)]);
        let skipped = find_skipped_chunks(
            &previous,
            &[chunk(0, 1, 1, 1), chunk(5, 1, 1, 1)],
            DeltaEMetric::Cie2000,
            1.0,
            ThresholdBoundary::Exclusive,
        );
        assert_eq!(skipped, SkipSet::from([0]));
    }

    #[test]
    fn detector_carries_snapshot_between_frames() {
        let mut detector = ChangeDetector::new(DeltaEMetric::Cie2000, 2.0, ThresholdBoundary::Exclusive);

        let frame1 = vec![chunk(0, 100, 100, 100), chunk(1, 200, 0, 0)];
        assert!(detector.detect(&frame1).is_empty(), "first frame has nothing to compare");

        // Chunk 0 shifts by one level (imperceptible), chunk 1 turns blue.
        let frame2 = vec![chunk(0, 101, 100, 100), chunk(1, 0, 0, 200)];
        assert_eq!(detector.detect(&frame2), SkipSet::from([0]));
        assert_eq!(detector.previous().get(&1), Some(&Rgb::from_bytes(0, 0, 200)));

        detector.reset();
        assert!(detector.detect(&frame2).is_empty());
    }
}
