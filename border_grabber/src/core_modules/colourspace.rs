// THEORY:
// The `colourspace` module is the lowest layer of the perceptual pipeline. Raw
// sampled chunk colors arrive as gamma-encoded sRGB bytes, which are a poor space
// for measuring "how different do these look". Every distance metric in
// `delta_e` therefore works on CIE L*a*b*, and this module gets us there in two
// pure steps:
//
// 1.  **sRGB → XYZ**: undo the sRGB transfer curve (linear segment below
//     0.04045, 2.4 power above), scale to the 0..100 range and project through the
//     sRGB primaries into CIE XYZ with a D65 white point. The seven-digit matrix
//     is used so that its rows sum exactly to the reference white below, which
//     puts 255/255/255 on the neutral axis.
// 2.  **XYZ → L*a*b***: normalize by the D65 reference white, apply the CIE cube
//     root (with its linear toe near black) and form L, a and b.
//
// Both steps are total over all real inputs. Nothing here can fail, allocate or
// touch shared state, so the same input always yields bit-identical output.

use serde::{Deserialize, Serialize};

pub type Component = f64;

/// D65 reference white, scaled so Y = 100.
pub const REFERENCE_WHITE_D65: Xyz = Xyz {
    x: 95.047,
    y: 100.0,
    z: 108.883,
};

const SRGB_LINEAR_THRESHOLD: Component = 0.04045;
const LAB_EPSILON: Component = 0.008856;
const LAB_KAPPA_SLOPE: Component = 7.787;
const LAB_TOE_OFFSET: Component = 16.0 / 116.0;

/// A gamma-encoded sRGB color with channels in the nominal 0..255 range.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Rgb {
    pub r: Component,
    pub g: Component,
    pub b: Component,
}

/// CIE 1931 tristimulus values, D65 referenced, Y in 0..100.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Xyz {
    pub x: Component,
    pub y: Component,
    pub z: Component,
}

/// CIE L*a*b*. L in 0..100, a and b roughly -128..127.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Lab {
    pub l: Component,
    pub a: Component,
    pub b: Component,
}

impl Rgb {
    pub const fn new(r: Component, g: Component, b: Component) -> Self {
        Self { r, g, b }
    }

    pub fn from_bytes(r: u8, g: u8, b: u8) -> Self {
        Self::new(r as Component, g as Component, b as Component)
    }

    /// Shortcut for `xyz_to_lab(rgb_to_xyz(self))`.
    pub fn to_lab(self) -> Lab {
        rgb_to_lab(self)
    }
}

impl From<(u8, u8, u8)> for Rgb {
    fn from((r, g, b): (u8, u8, u8)) -> Self {
        Self::from_bytes(r, g, b)
    }
}

impl Lab {
    pub const fn new(l: Component, a: Component, b: Component) -> Self {
        Self { l, a, b }
    }

    /// Chroma, the distance from the neutral axis in the a/b plane.
    pub fn chroma(&self) -> Component {
        self.a.hypot(self.b)
    }
}

#[inline]
fn srgb_to_linear(channel: Component) -> Component {
    let normalized = channel / 255.0;
    if normalized > SRGB_LINEAR_THRESHOLD {
        ((normalized + 0.055) / 1.055).powf(2.4)
    } else {
        normalized / 12.92
    }
}

#[inline]
fn lab_transfer(t: Component) -> Component {
    if t > LAB_EPSILON {
        t.cbrt()
    } else {
        LAB_KAPPA_SLOPE * t + LAB_TOE_OFFSET
    }
}

/// Converts gamma-encoded sRGB (0..255) into D65 XYZ (Y in 0..100).
pub fn rgb_to_xyz(rgb: Rgb) -> Xyz {
    let r = srgb_to_linear(rgb.r) * 100.0;
    let g = srgb_to_linear(rgb.g) * 100.0;
    let b = srgb_to_linear(rgb.b) * 100.0;

    Xyz {
        x: r * 0.4124564 + g * 0.3575761 + b * 0.1804375,
        y: r * 0.2126729 + g * 0.7151522 + b * 0.0721750,
        z: r * 0.0193339 + g * 0.1191920 + b * 0.9503041,
    }
}

/// Converts D65 XYZ into CIE L*a*b*.
pub fn xyz_to_lab(xyz: Xyz) -> Lab {
    let x = lab_transfer(xyz.x / REFERENCE_WHITE_D65.x);
    let y = lab_transfer(xyz.y / REFERENCE_WHITE_D65.y);
    let z = lab_transfer(xyz.z / REFERENCE_WHITE_D65.z);

    Lab {
        l: 116.0 * y - 16.0,
        a: 500.0 * (x - y),
        b: 200.0 * (y - z),
    }
}

pub fn rgb_to_lab(rgb: Rgb) -> Lab {
    xyz_to_lab(rgb_to_xyz(rgb))
}
