use core::fmt;
use rand::prelude::*;
use serde::{Deserialize, Serialize};

/// Display color, what ends up painted on a tile.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Rgb {
    pub r: u8,
    pub g: u8,
    pub b: u8,
}

impl Rgb {
    pub const fn new(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b }
    }

    pub const fn channel(self, channel: Channel) -> u8 {
        match channel {
            Channel::Red => self.r,
            Channel::Green => self.g,
            Channel::Blue => self.b,
        }
    }

    pub const fn with_channel(self, channel: Channel, value: u8) -> Self {
        let Self { r, g, b } = self;
        match channel {
            Channel::Red => Self::new(value, g, b),
            Channel::Green => Self::new(r, value, b),
            Channel::Blue => Self::new(r, g, value),
        }
    }
}

impl fmt::Display for Rgb {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "rgb({}, {}, {})", self.r, self.g, self.b)
    }
}

#[derive(Copy, Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum Channel {
    Red,
    Green,
    Blue,
}

impl Channel {
    pub const ALL: [Channel; 3] = [Channel::Red, Channel::Green, Channel::Blue];
}

/// Hue in degrees, saturation and lightness in percent.
#[derive(Copy, Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Hsl {
    pub hue: f64,
    pub saturation: f64,
    pub lightness: f64,
}

impl Hsl {
    pub const fn new(hue: f64, saturation: f64, lightness: f64) -> Self {
        Self {
            hue,
            saturation,
            lightness,
        }
    }

    pub const fn with_hue(self, hue: f64) -> Self {
        Self { hue, ..self }
    }

    /// Standard sextant-wise conversion, hue is wrapped into `[0, 360)`.
    pub fn to_rgb(self) -> Rgb {
        let h = self.hue.rem_euclid(360.0);
        let s = (self.saturation / 100.0).clamp(0.0, 1.0);
        let l = (self.lightness / 100.0).clamp(0.0, 1.0);

        let c = (1.0 - (2.0 * l - 1.0).abs()) * s;
        let x = c * (1.0 - ((h / 60.0) % 2.0 - 1.0).abs());
        let m = l - c / 2.0;

        let (r, g, b) = match (h / 60.0) as u8 {
            0 => (c, x, 0.0),
            1 => (x, c, 0.0),
            2 => (0.0, c, x),
            3 => (0.0, x, c),
            4 => (x, 0.0, c),
            _ => (c, 0.0, x),
        };

        let to_u8 = |v: f64| ((v + m) * 255.0).round().clamp(0.0, 255.0) as u8;
        Rgb::new(to_u8(r), to_u8(g), to_u8(b))
    }
}

/// Which color space the base/target pair is derived in.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum ColorSpace {
    /// Shift a single RGB channel by the full delta.
    #[default]
    Rgb,
    /// Rotate the hue by half the delta, in degrees.
    Hsl,
}

#[derive(Copy, Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ColorPair {
    pub base: Rgb,
    pub target: Rgb,
}

/// Picks a random base color and a target that differs from it by `delta`.
///
/// For `delta > 0` the two colors are never equal.
pub fn generate_colors(space: ColorSpace, delta: u8, rng: &mut SmallRng) -> ColorPair {
    match space {
        ColorSpace::Rgb => rgb_pair(delta, rng),
        ColorSpace::Hsl => hsl_pair(delta, rng),
    }
}

fn rgb_pair(delta: u8, rng: &mut SmallRng) -> ColorPair {
    let base = Rgb::new(rng.random(), rng.random(), rng.random());
    let channel = Channel::ALL[rng.random_range(0..Channel::ALL.len())];
    let up = rng.random_bool(0.5);

    let value = base.channel(channel);
    let mut shifted = shift_channel(value, delta, up);
    if shifted == value {
        // pinned against 0 or 255, go the other way
        shifted = shift_channel(value, delta, !up);
    }

    ColorPair {
        base,
        target: base.with_channel(channel, shifted),
    }
}

fn shift_channel(value: u8, delta: u8, up: bool) -> u8 {
    if up {
        value.saturating_add(delta)
    } else {
        value.saturating_sub(delta)
    }
}

fn hsl_pair(delta: u8, rng: &mut SmallRng) -> ColorPair {
    let (base, sign) = random_hsl_base(rng);
    hue_shifted_pair(base, sign, delta)
}

/// Draws the base color and shift direction of an HSL pair.
fn random_hsl_base(rng: &mut SmallRng) -> (Hsl, f64) {
    let hue: f64 = rng.random_range(0.0..360.0);
    let saturation = f64::from(rng.random_range(40u8..=100));
    let lightness = f64::from(rng.random_range(40u8..=60));
    let sign = if rng.random_bool(0.5) { 1.0 } else { -1.0 };
    (Hsl::new(hue, saturation, lightness), sign)
}

/// Rotates the hue by `delta / 2` degrees in the direction of `sign`,
/// widening one degree at a time while the rounded RGB stays equal.
fn hue_shifted_pair(base: Hsl, sign: f64, delta: u8) -> ColorPair {
    let base_rgb = base.to_rgb();
    let rotate = |shift: f64| {
        base.with_hue((base.hue + sign * shift).rem_euclid(360.0))
            .to_rgb()
    };

    let mut shift = f64::from(delta) / 2.0;
    let mut target_rgb = rotate(shift);
    while delta > 0 && target_rgb == base_rgb && shift < 180.0 {
        log::warn!(
            "Hue shift of {} collapsed to {}, widening",
            shift,
            base_rgb
        );
        shift += 1.0;
        target_rgb = rotate(shift);
    }

    ColorPair {
        base: base_rgb,
        target: target_rgb,
    }
}
