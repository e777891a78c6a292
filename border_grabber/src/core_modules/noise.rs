// THEORY:
// The noise renderer is a stand-in for a live capture source. It paints known
// synthetic patterns onto a frame so the sampling and skip logic can be watched
// and regression tested without a screen to grab.
//
// Each pattern is described by two small enums:
//
// - `NoiseType` chooses how the three per-channel shifts are derived: none,
//   one shared random value (monochrome noise), three independent random values
//   (colour noise), or one of three deterministic "shifter" sequences that walk a
//   counter forward and produce animated banding.
// - `NoiseApplicator` chooses how often the shifts are re-derived: once per pixel
//   (`Inner`, fine-grained speckle) or once per row (`Outer`, horizontal bands).
//
// Every painted channel gets `blank_value + shift`. That sum regularly leaves the
// 0..255 range (the random shifts alone cover it), so the renderer carries an
// explicit `ChannelOverflow` policy. `Wrap` keeps the low eight bits, which keeps
// random noise spread over the whole range; `Clamp` saturates.
//
// The shifter counter and the random generator belong to the renderer instance.
// They advance only when a pattern needs them, are never reset behind the
// caller's back, and can be read or seeded for reproducible sequences.

use crate::core_modules::frame::FrameBuffer;
use crate::error::GrabberError;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use tracing::trace;

pub type Shift = i64;

const SHIFTER_1_BLUE: Shift = 100;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum NoiseType {
    #[default]
    None,
    /// Reserved for drawing a logo; renders nothing.
    Logo,
    Grey,
    Colour,
    #[serde(rename = "SHIFTER_1")]
    Shifter1,
    #[serde(rename = "SHIFTER_2")]
    Shifter2,
    #[serde(rename = "SHIFTER_3")]
    Shifter3,
    /// Leaves the frame exactly as captured.
    Inception,
}

impl NoiseType {
    pub const ALL: [NoiseType; 8] = [
        Self::None,
        Self::Logo,
        Self::Grey,
        Self::Colour,
        Self::Shifter1,
        Self::Shifter2,
        Self::Shifter3,
        Self::Inception,
    ];

    /// Maps a numeric selector onto a noise type. Anything out of range falls back
    /// to `None`, so randomly chosen or stale indices still render a flat frame.
    pub fn from_index(index: usize) -> Self {
        Self::ALL.get(index).copied().unwrap_or(Self::None)
    }

    pub fn name(self) -> &'static str {
        match self {
            Self::None => "NONE",
            Self::Logo => "LOGO",
            Self::Grey => "GREY",
            Self::Colour => "COLOUR",
            Self::Shifter1 => "SHIFTER_1",
            Self::Shifter2 => "SHIFTER_2",
            Self::Shifter3 => "SHIFTER_3",
            Self::Inception => "INCEPTION",
        }
    }
}

impl fmt::Display for NoiseType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for NoiseType {
    type Err = GrabberError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.trim().to_ascii_uppercase().replace('-', "_");
        Self::ALL
            .into_iter()
            .find(|t| t.name() == wanted)
            .ok_or_else(|| GrabberError::UnknownNoiseType(s.to_string()))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum NoiseApplicator {
    /// New shifts for every pixel.
    #[default]
    Inner,
    /// New shifts once per row.
    Outer,
}

impl NoiseApplicator {
    pub const ALL: [NoiseApplicator; 2] = [Self::Inner, Self::Outer];

    pub fn from_index(index: usize) -> Self {
        Self::ALL.get(index).copied().unwrap_or(Self::Inner)
    }
}

impl fmt::Display for NoiseApplicator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Inner => "INNER",
            Self::Outer => "OUTER",
        })
    }
}

impl FromStr for NoiseApplicator {
    type Err = GrabberError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_uppercase().as_str() {
            "INNER" => Ok(Self::Inner),
            "OUTER" => Ok(Self::Outer),
            _ => Err(GrabberError::UnknownApplicator(s.to_string())),
        }
    }
}

/// What to do when `blank_value + shift` does not fit in a byte.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ChannelOverflow {
    /// Keep the value modulo 256.
    #[default]
    Wrap,
    /// Saturate to 0..=255.
    Clamp,
}

impl ChannelOverflow {
    #[inline]
    pub fn apply(self, base: u8, shift: Shift) -> u8 {
        let value = (base as Shift).wrapping_add(shift);
        match self {
            Self::Wrap => value.rem_euclid(256) as u8,
            Self::Clamp => value.clamp(0, u8::MAX as Shift) as u8,
        }
    }
}

/// Per-channel offsets added to the blank value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct NoiseShifts {
    pub red: Shift,
    pub green: Shift,
    pub blue: Shift,
}

impl NoiseShifts {
    pub const ZERO: NoiseShifts = NoiseShifts {
        red: 0,
        green: 0,
        blue: 0,
    };

    pub const fn new(red: Shift, green: Shift, blue: Shift) -> Self {
        Self { red, green, blue }
    }
}

/// Everything `NoiseRenderer::blank` needs to paint one frame.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct NoiseSettings {
    /// Fraction of the frame left untouched at every edge, clamped to [0, 0.5].
    pub leeway: f32,
    pub blank_value: u8,
    pub noise_type: NoiseType,
    pub applicator: NoiseApplicator,
}

impl Default for NoiseSettings {
    fn default() -> Self {
        Self {
            leeway: 0.0,
            blank_value: 0,
            noise_type: NoiseType::None,
            applicator: NoiseApplicator::Inner,
        }
    }
}

/// Paints synthetic test patterns and owns the state those patterns evolve.
#[derive(Debug, Clone)]
pub struct NoiseRenderer {
    shifter: Shift,
    rng: StdRng,
    overflow: ChannelOverflow,
}

impl NoiseRenderer {
    pub fn new(seed: u64) -> Self {
        Self::with_shifter(seed, 0)
    }

    /// A renderer whose shifter sequences resume from `shifter`.
    pub fn with_shifter(seed: u64, shifter: Shift) -> Self {
        Self {
            shifter,
            rng: StdRng::seed_from_u64(seed),
            overflow: ChannelOverflow::default(),
        }
    }

    pub fn with_overflow(mut self, overflow: ChannelOverflow) -> Self {
        self.overflow = overflow;
        self
    }

    pub fn shifter(&self) -> Shift {
        self.shifter
    }

    pub fn overflow(&self) -> ChannelOverflow {
        self.overflow
    }

    #[inline]
    fn advance(&mut self) -> Shift {
        self.shifter = self.shifter.wrapping_add(1);
        self.shifter
    }

    #[inline]
    fn random_shift(&mut self) -> Shift {
        self.rng.gen_range(0..=u8::MAX) as Shift
    }

    /// Derives the next set of shifts for `noise_type`, advancing the counter or
    /// the random generator as that pattern requires.
    pub fn next_shifts(&mut self, noise_type: NoiseType) -> NoiseShifts {
        match noise_type {
            NoiseType::Grey => {
                let shift = self.random_shift();
                NoiseShifts::new(shift, shift, shift)
            }
            NoiseType::Colour => {
                let red = self.random_shift();
                let green = self.random_shift();
                let blue = self.random_shift();
                NoiseShifts::new(red, green, blue)
            }
            NoiseType::Shifter1 => {
                let red = self.advance();
                let first = self.advance();
                let second = self.advance();
                NoiseShifts::new(red, first.wrapping_mul(second), SHIFTER_1_BLUE)
            }
            NoiseType::Shifter2 => {
                let s = self.shifter;
                self.advance();
                NoiseShifts::new(s, s.wrapping_mul(2), s.wrapping_mul(3))
            }
            NoiseType::Shifter3 => {
                let red = self.advance();
                let red = red.wrapping_mul(red);
                let green = self.advance();
                let green = green.wrapping_mul(green);
                let blue = self.advance();
                let blue = blue.wrapping_mul(blue);
                NoiseShifts::new(red, green, blue)
            }
            NoiseType::None | NoiseType::Logo | NoiseType::Inception => NoiseShifts::ZERO,
        }
    }

    /// Paints `blank_value + shift` over the interior of the frame, leaving a
    /// `leeway` margin on every edge untouched.
    ///
    /// Rows `[floor(h·leeway), ceil(h·(1−leeway)))` and the matching column range
    /// are painted. `Inner` re-derives the shifts for each pixel, `Outer` once at the
    /// start of each row.
    pub fn fill_with_noise(
        &mut self,
        frame: &mut FrameBuffer,
        leeway: f32,
        blank_value: u8,
        noise_type: NoiseType,
        applicator: NoiseApplicator,
    ) {
        let (row_start, row_end) = painted_span(frame.height(), leeway);
        let (column_start, column_end) = painted_span(frame.width(), leeway);
        let overflow = self.overflow;
        let mut shifts = NoiseShifts::ZERO;

        for row in row_start..row_end {
            if applicator == NoiseApplicator::Outer {
                shifts = self.next_shifts(noise_type);
            }
            for column in column_start..column_end {
                if applicator == NoiseApplicator::Inner {
                    shifts = self.next_shifts(noise_type);
                }
                // The span is clamped to the frame, so the write cannot miss.
                let _ = frame.set_rgb(
                    row,
                    column,
                    overflow.apply(blank_value, shifts.red),
                    overflow.apply(blank_value, shifts.green),
                    overflow.apply(blank_value, shifts.blue),
                );
            }
        }
        trace!(
            "painted {noise_type}/{applicator} rows {row_start}..{row_end} columns {column_start}..{column_end}, shifter now {}",
            self.shifter
        );
    }

    /// Noise-fill-or-passthrough: `Inception` keeps the frame as captured, `Logo`
    /// is reserved and draws nothing, everything else is filled.
    pub fn blank(&mut self, frame: &mut FrameBuffer, settings: &NoiseSettings) {
        match settings.noise_type {
            NoiseType::Inception | NoiseType::Logo => {}
            noise_type => self.fill_with_noise(
                frame,
                settings.leeway,
                settings.blank_value,
                noise_type,
                settings.applicator,
            ),
        }
    }
}

impl Default for NoiseRenderer {
    fn default() -> Self {
        Self::new(0)
    }
}

/// `[floor(len·leeway), ceil(len·(1−leeway)))`, clamped to `len`.
fn painted_span(len: usize, leeway: f32) -> (usize, usize) {
    let leeway = if leeway.is_nan() { 0.0 } else { leeway.clamp(0.0, 0.5) };
    let start = (len as f32 * leeway) as usize;
    let end = ((len as f32 * (1.0 - leeway)).ceil() as usize).min(len);
    (start.min(end), end)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core_modules::frame::ChannelOrder;

    fn shifter_sequence(noise_type: NoiseType, start: Shift, steps: usize) -> Vec<NoiseShifts> {
        let mut renderer = NoiseRenderer::with_shifter(7, start);
        (0..steps).map(|_| renderer.next_shifts(noise_type)).collect()
    }

    #[test]
    fn none_is_flat_for_both_applicators() {
        for applicator in NoiseApplicator::ALL {
            let mut frame = FrameBuffer::solid(8, 6, ChannelOrder::Bgra, 3, 4, 5);
            let mut renderer = NoiseRenderer::new(1);
            renderer.fill_with_noise(&mut frame, 0.0, 150, NoiseType::None, applicator);
            for row in 0..6 {
                for column in 0..8 {
                    assert_eq!(frame.rgb_at(row, column), Some((150, 150, 150)), "{applicator}");
                }
            }
            assert_eq!(renderer.shifter(), 0);
        }
    }

    #[test]
    fn shifter_1_sequence() {
        assert_eq!(
            shifter_sequence(NoiseType::Shifter1, 0, 3),
            vec![
                NoiseShifts::new(1, 6, 100),
                NoiseShifts::new(4, 30, 100),
                NoiseShifts::new(7, 72, 100),
            ]
        );
    }

    #[test]
    fn shifter_2_sequence() {
        assert_eq!(
            shifter_sequence(NoiseType::Shifter2, 0, 3),
            vec![
                NoiseShifts::new(0, 0, 0),
                NoiseShifts::new(1, 2, 3),
                NoiseShifts::new(2, 4, 6),
            ]
        );
    }

    #[test]
    fn shifter_3_sequence() {
        assert_eq!(
            shifter_sequence(NoiseType::Shifter3, 0, 2),
            vec![NoiseShifts::new(1, 4, 9), NoiseShifts::new(16, 25, 36)]
        );
    }

    #[test]
    fn shifter_sequences_resume_from_counter() {
        for noise_type in [NoiseType::Shifter1, NoiseType::Shifter2, NoiseType::Shifter3] {
            let full = shifter_sequence(noise_type, 0, 6);
            let mut renderer = NoiseRenderer::with_shifter(99, 0);
            for _ in 0..3 {
                renderer.next_shifts(noise_type);
            }
            let resumed = shifter_sequence(noise_type, renderer.shifter(), 3);
            assert_eq!(&full[3..], resumed.as_slice(), "{noise_type}");
        }
    }

    #[test]
    fn shifter_counter_advances_monotonically() {
        let mut renderer = NoiseRenderer::new(0);
        let mut last = renderer.shifter();
        for noise_type in [NoiseType::Shifter1, NoiseType::Shifter2, NoiseType::Shifter3] {
            for _ in 0..10 {
                renderer.next_shifts(noise_type);
                assert!(renderer.shifter() > last);
                last = renderer.shifter();
            }
        }
        // Non-shifter patterns leave the counter alone.
        renderer.next_shifts(NoiseType::Colour);
        renderer.next_shifts(NoiseType::None);
        assert_eq!(renderer.shifter(), last);
    }

    #[test]
    fn counter_persists_across_frames() {
        let mut renderer = NoiseRenderer::new(0);
        let mut frame = FrameBuffer::new(4, 2, ChannelOrder::Rgb);
        renderer.fill_with_noise(&mut frame, 0.0, 0, NoiseType::Shifter2, NoiseApplicator::Inner);
        assert_eq!(renderer.shifter(), 8);
        renderer.fill_with_noise(&mut frame, 0.0, 0, NoiseType::Shifter2, NoiseApplicator::Outer);
        assert_eq!(renderer.shifter(), 10);
        // Last row of the outer pass was painted with shifter 9.
        assert_eq!(frame.rgb_at(1, 3), Some((9, 18, 27)));
    }

    #[test]
    fn outer_applicator_paints_uniform_rows() {
        let mut frame = FrameBuffer::new(16, 8, ChannelOrder::Bgr);
        let mut renderer = NoiseRenderer::new(3);
        renderer.fill_with_noise(&mut frame, 0.0, 0, NoiseType::Colour, NoiseApplicator::Outer);
        for row in 0..8 {
            let first = frame.rgb_at(row, 0);
            assert!((1..16).all(|column| frame.rgb_at(row, column) == first));
        }
    }

    #[test]
    fn grey_noise_is_monochrome() {
        let mut frame = FrameBuffer::new(10, 10, ChannelOrder::Rgba);
        let mut renderer = NoiseRenderer::new(11);
        renderer.fill_with_noise(&mut frame, 0.0, 0, NoiseType::Grey, NoiseApplicator::Inner);
        for row in 0..10 {
            for column in 0..10 {
                let (r, g, b) = frame.rgb_at(row, column).unwrap();
                assert!(r == g && g == b);
            }
        }
    }

    #[test]
    fn random_patterns_are_reproducible_per_seed() {
        let render = |seed| {
            let mut frame = FrameBuffer::new(6, 6, ChannelOrder::Rgb);
            NoiseRenderer::new(seed).fill_with_noise(
                &mut frame,
                0.0,
                10,
                NoiseType::Colour,
                NoiseApplicator::Inner,
            );
            frame
        };
        assert_eq!(render(5), render(5));
    }

    #[test]
    fn leeway_margin_is_left_alone() {
        let mut frame = FrameBuffer::solid(10, 10, ChannelOrder::Bgra, 1, 2, 3);
        NoiseRenderer::new(0).fill_with_noise(&mut frame, 0.25, 150, NoiseType::None, NoiseApplicator::Inner);
        // floor(2.5) = 2 .. ceil(7.5) = 8
        for row in 0..10 {
            for column in 0..10 {
                let inside = (2..8).contains(&row) && (2..8).contains(&column);
                let expected = if inside { (150, 150, 150) } else { (1, 2, 3) };
                assert_eq!(frame.rgb_at(row, column), Some(expected), "({row}, {column})");
            }
        }
    }

    #[test]
    fn overflow_policy_is_explicit() {
        assert_eq!(ChannelOverflow::Wrap.apply(150, 106), 0);
        assert_eq!(ChannelOverflow::Wrap.apply(150, 300), 194);
        assert_eq!(ChannelOverflow::Wrap.apply(10, -20), 246);
        assert_eq!(ChannelOverflow::Clamp.apply(150, 106), 255);
        assert_eq!(ChannelOverflow::Clamp.apply(10, -20), 0);
        assert_eq!(ChannelOverflow::Clamp.apply(150, 5), 155);

        let mut frame = FrameBuffer::new(1, 1, ChannelOrder::Rgb);
        let mut renderer = NoiseRenderer::with_shifter(0, 9).with_overflow(ChannelOverflow::Clamp);
        // Shifter2 from 9: (9, 18, 27) over 240.
        renderer.fill_with_noise(&mut frame, 0.0, 240, NoiseType::Shifter2, NoiseApplicator::Inner);
        assert_eq!(frame.rgb_at(0, 0), Some((249, 255, 255)));
    }

    #[test]
    fn logo_and_inception_leave_frame_untouched() {
        for noise_type in [NoiseType::Logo, NoiseType::Inception] {
            let original = FrameBuffer::solid(5, 5, ChannelOrder::Bgra, 9, 8, 7);
            let mut frame = original.clone();
            let settings = NoiseSettings {
                noise_type,
                blank_value: 150,
                ..NoiseSettings::default()
            };
            NoiseRenderer::new(0).blank(&mut frame, &settings);
            assert_eq!(frame, original);
        }
    }

    #[test]
    fn unknown_indices_resolve_to_none() {
        assert_eq!(NoiseType::from_index(2), NoiseType::Grey);
        assert_eq!(NoiseType::from_index(8), NoiseType::None);
        assert_eq!(NoiseType::from_index(usize::MAX), NoiseType::None);
        assert_eq!(NoiseApplicator::from_index(5), NoiseApplicator::Inner);
    }

    #[test]
    fn names_parse_back() {
        for noise_type in NoiseType::ALL {
            assert_eq!(noise_type.name().parse::<NoiseType>().ok(), Some(noise_type));
        }
        assert_eq!("shifter-2".parse::<NoiseType>().ok(), Some(NoiseType::Shifter2));
        assert!("sparkle".parse::<NoiseType>().is_err());
        assert_eq!("outer".parse::<NoiseApplicator>().ok(), Some(NoiseApplicator::Outer));
    }
}
