// THEORY:
// The `delta_e` module answers one question: "would a person notice the
// difference between these two colors?" Single colors are converted in
// `colourspace`; everything in here takes a *pair* of L*a*b* values.
//
// Three generations of the CIE formula are provided, selectable at call time:
//
// - **CIE76**: straight Euclidean distance in L*a*b*. Cheap, but over-reports
//   differences between saturated colors.
// - **CIE94**: splits the difference into lightness, chroma and hue terms and
//   weights chroma/hue by the chroma of the *reference* (first) color, using the
//   graphic-arts constants. Because of that reference weighting it is not
//   symmetric: `calc_94(a, b)` and `calc_94(b, a)` differ whenever the two
//   chromas differ. The hue term is recovered as `sqrt(Δa² + Δb² − ΔC²)`, which
//   is never negative on paper but can dip a few ulps below zero through
//   cancellation, so the radicand is clamped at zero.
// - **CIE2000**: the full published formula, with the a* compensation factor G,
//   hue angles normalized into [0, 2π), wrap-around handling for the hue
//   difference and the mean hue, the empirical T weighting, the blue-region
//   rotation term R_T and the S_L/S_C/S_H scale factors. All angles are kept in
//   radians. It is symmetric in its arguments.
//
// Every function is total: no input produces a panic, and in-gamut inputs never
// produce NaN.

use crate::core_modules::colourspace::{Component, Lab};
use crate::error::{GrabberError, Result};
use serde::{Deserialize, Serialize};
use std::f64::consts::PI;
use std::fmt;

pub type Distance = f64;

const TWO_PI: Component = 2.0 * PI;
/// 25^7, used by the chroma compensation in CIE2000.
const POW_25_7: Component = 6_103_515_625.0;

// CIE94, graphic-arts application.
const CIE94_K1: Component = 0.045;
const CIE94_K2: Component = 0.015;
const CIE94_KL: Component = 1.0;
const CIE94_KC: Component = 1.0;
const CIE94_KH: Component = 1.0;

// CIE2000 parametric factors.
const CIE2000_KL: Component = 1.0;
const CIE2000_KC: Component = 1.0;
const CIE2000_KH: Component = 1.0;

/// Which color-difference formula to apply. The discriminants are the stable
/// numeric ids used by configuration files and the command line.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum DeltaEMetric {
    #[serde(rename = "CIE76")]
    Cie76 = 1,
    #[serde(rename = "CIE94")]
    Cie94 = 2,
    #[default]
    #[serde(rename = "CIE2000")]
    Cie2000 = 3,
}

impl DeltaEMetric {
    pub const ALL: [DeltaEMetric; 3] = [Self::Cie76, Self::Cie94, Self::Cie2000];

    pub fn from_id(id: u8) -> Result<Self> {
        match id {
            1 => Ok(Self::Cie76),
            2 => Ok(Self::Cie94),
            3 => Ok(Self::Cie2000),
            other => Err(GrabberError::UnknownMetric(other.to_string())),
        }
    }

    pub fn id(self) -> u8 {
        self as u8
    }

    pub fn distance(self, lab1: &Lab, lab2: &Lab) -> Distance {
        match self {
            Self::Cie76 => calc_76(lab1, lab2),
            Self::Cie94 => calc_94(lab1, lab2),
            Self::Cie2000 => calc_2000(lab1, lab2),
        }
    }
}

impl TryFrom<u8> for DeltaEMetric {
    type Error = GrabberError;

    fn try_from(id: u8) -> Result<Self> {
        Self::from_id(id)
    }
}

impl fmt::Display for DeltaEMetric {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Cie76 => "CIE76",
            Self::Cie94 => "CIE94",
            Self::Cie2000 => "CIE2000",
        };
        f.write_str(name)
    }
}

impl std::str::FromStr for DeltaEMetric {
    type Err = GrabberError;

    /// Accepts either the numeric id ("1".."3") or the name ("cie2000").
    fn from_str(s: &str) -> Result<Self> {
        if let Ok(id) = s.parse::<u8>() {
            return Self::from_id(id);
        }
        match s.to_ascii_uppercase().as_str() {
            "CIE76" => Ok(Self::Cie76),
            "CIE94" => Ok(Self::Cie94),
            "CIE2000" => Ok(Self::Cie2000),
            _ => Err(GrabberError::UnknownMetric(s.to_string())),
        }
    }
}

/// Distance between two colors with the chosen metric.
pub fn delta_e(metric: DeltaEMetric, lab1: &Lab, lab2: &Lab) -> Distance {
    metric.distance(lab1, lab2)
}

#[inline]
pub fn deg_to_rad(degrees: Component) -> Component {
    degrees * (PI / 180.0)
}

#[inline]
fn square(value: Component) -> Component {
    value * value
}

/// CIE76: Euclidean distance in L*a*b*.
pub fn calc_76(lab1: &Lab, lab2: &Lab) -> Distance {
    (square(lab2.l - lab1.l) + square(lab2.a - lab1.a) + square(lab2.b - lab1.b)).sqrt()
}

/// The CIE94 hue difference ΔH recovered from Δa, Δb and ΔC.
///
/// A negative radicand only ever comes from floating-point cancellation, so it is
/// treated as "no hue difference" instead of producing NaN.
pub fn cie94_hue_term(delta_a: Component, delta_b: Component, delta_c: Component) -> Component {
    let radicand = square(delta_a) + square(delta_b) - square(delta_c);
    if radicand > 0.0 { radicand.sqrt() } else { 0.0 }
}

/// CIE94 with graphic-arts weights. `lab1` is the reference color.
pub fn calc_94(lab1: &Lab, lab2: &Lab) -> Distance {
    let chroma1 = (square(lab1.a) + square(lab1.b)).sqrt();
    let chroma2 = (square(lab2.a) + square(lab2.b)).sqrt();

    let scale_l = 1.0;
    let scale_c = 1.0 + CIE94_K1 * chroma1;
    let scale_h = 1.0 + CIE94_K2 * chroma1;

    let delta_l = lab1.l - lab2.l;
    let delta_c = chroma1 - chroma2;
    let delta_h = cie94_hue_term(lab1.a - lab2.a, lab1.b - lab2.b, delta_c);

    let lightness = square(delta_l / (CIE94_KL * scale_l));
    let chroma = square(delta_c / (CIE94_KC * scale_c));
    let hue = square(delta_h / (CIE94_KH * scale_h));

    (lightness + chroma + hue).sqrt()
}

/// Hue angle of (a', b) in radians, normalized into [0, 2π).
/// The neutral axis has no hue and maps to zero.
#[inline]
fn hue_angle(a_prime: Component, b: Component) -> Component {
    if a_prime == 0.0 && b == 0.0 {
        return 0.0;
    }
    let angle = b.atan2(a_prime);
    if angle < 0.0 { angle + TWO_PI } else { angle }
}

/// CIEDE2000.
pub fn calc_2000(lab1: &Lab, lab2: &Lab) -> Distance {
    // Chroma compensation on the a* axis.
    let chroma1 = (square(lab1.a) + square(lab1.b)).sqrt();
    let chroma2 = (square(lab2.a) + square(lab2.b)).sqrt();
    let mean_chroma_pow7 = ((chroma1 + chroma2) / 2.0).powi(7);
    let g = 0.5 * (1.0 - (mean_chroma_pow7 / (mean_chroma_pow7 + POW_25_7)).sqrt());

    let a1_prime = (1.0 + g) * lab1.a;
    let a2_prime = (1.0 + g) * lab2.a;
    let c1_prime = (square(a1_prime) + square(lab1.b)).sqrt();
    let c2_prime = (square(a2_prime) + square(lab2.b)).sqrt();
    let h1_prime = hue_angle(a1_prime, lab1.b);
    let h2_prime = hue_angle(a2_prime, lab2.b);

    // Differences.
    let delta_l_prime = lab2.l - lab1.l;
    let delta_c_prime = c2_prime - c1_prime;
    let chroma_product = c1_prime * c2_prime;

    let delta_h_angle = if chroma_product == 0.0 {
        0.0
    } else {
        let raw = h2_prime - h1_prime;
        if raw < -PI {
            raw + TWO_PI
        } else if raw > PI {
            raw - TWO_PI
        } else {
            raw
        }
    };
    let delta_big_h_prime = 2.0 * chroma_product.sqrt() * (delta_h_angle / 2.0).sin();

    // Means.
    let mean_l_prime = (lab1.l + lab2.l) / 2.0;
    let mean_c_prime = (c1_prime + c2_prime) / 2.0;
    let hue_sum = h1_prime + h2_prime;
    let mean_h_prime = if chroma_product == 0.0 {
        hue_sum
    } else if (h1_prime - h2_prime).abs() <= PI {
        hue_sum / 2.0
    } else if hue_sum < TWO_PI {
        (hue_sum + TWO_PI) / 2.0
    } else {
        (hue_sum - TWO_PI) / 2.0
    };

    // Weighting functions.
    let t = 1.0 - 0.17 * (mean_h_prime - deg_to_rad(30.0)).cos()
        + 0.24 * (2.0 * mean_h_prime).cos()
        + 0.32 * (3.0 * mean_h_prime + deg_to_rad(6.0)).cos()
        - 0.20 * (4.0 * mean_h_prime - deg_to_rad(63.0)).cos();

    let delta_theta =
        deg_to_rad(30.0) * (-square((mean_h_prime - deg_to_rad(275.0)) / deg_to_rad(25.0))).exp();
    let mean_c_prime_pow7 = mean_c_prime.powi(7);
    let r_c = 2.0 * (mean_c_prime_pow7 / (mean_c_prime_pow7 + POW_25_7)).sqrt();

    let lightness_offset = square(mean_l_prime - 50.0);
    let s_l = 1.0 + (0.015 * lightness_offset) / (20.0 + lightness_offset).sqrt();
    let s_c = 1.0 + 0.045 * mean_c_prime;
    let s_h = 1.0 + 0.015 * mean_c_prime * t;
    let r_t = -(2.0 * delta_theta).sin() * r_c;

    let lightness = delta_l_prime / (CIE2000_KL * s_l);
    let chroma = delta_c_prime / (CIE2000_KC * s_c);
    let hue = delta_big_h_prime / (CIE2000_KH * s_h);

    (square(lightness) + square(chroma) + square(hue) + r_t * chroma * hue).sqrt()
}
