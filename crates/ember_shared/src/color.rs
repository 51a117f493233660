//! Colors and fixed-size color gradients.

use bytemuck::{Pod, Zeroable};
use serde::{Deserialize, Serialize};

/// Number of stops in every [`ColorGradient`].
pub const GRADIENT_STOPS: usize = 4;

/// Linear RGBA color, components in `[0, 1]`.
#[repr(C)]
#[derive(Clone, Copy, Debug, PartialEq, Pod, Zeroable, Serialize, Deserialize)]
pub struct Rgba {
    /// Red
    pub r: f32,
    /// Green
    pub g: f32,
    /// Blue
    pub b: f32,
    /// Alpha
    pub a: f32,
}

impl Rgba {
    /// Creates a new color
    #[must_use]
    pub const fn new(r: f32, g: f32, b: f32, a: f32) -> Self {
        Self { r, g, b, a }
    }

    /// Opaque white
    pub const WHITE: Self = Self::new(1.0, 1.0, 1.0, 1.0);
    /// Opaque black
    pub const BLACK: Self = Self::new(0.0, 0.0, 0.0, 1.0);
    /// Opaque red
    pub const RED: Self = Self::new(1.0, 0.0, 0.0, 1.0);
    /// Opaque green
    pub const GREEN: Self = Self::new(0.0, 1.0, 0.0, 1.0);
    /// Opaque blue
    pub const BLUE: Self = Self::new(0.0, 0.0, 1.0, 1.0);

    /// Linear interpolation towards `other`.
    #[must_use]
    pub fn lerp(self, other: Self, t: f32) -> Self {
        let inv = 1.0 - t;
        Self::new(
            self.r * inv + other.r * t,
            self.g * inv + other.g * t,
            self.b * inv + other.b * t,
            self.a * inv + other.a * t,
        )
    }

    /// Converts to array
    #[must_use]
    pub const fn to_array(self) -> [f32; 4] {
        [self.r, self.g, self.b, self.a]
    }
}

impl Default for Rgba {
    fn default() -> Self {
        Self::WHITE
    }
}

/// Four-stop color gradient sampled over normalized particle age.
///
/// Stops are expected in ascending order. Sampling before the first stop or
/// after the last one clamps to the end colors.
#[repr(C)]
#[derive(Clone, Copy, Debug, PartialEq, Pod, Zeroable, Serialize, Deserialize)]
pub struct ColorGradient {
    /// Stop positions in `[0, 1]`
    pub t: [f32; GRADIENT_STOPS],
    /// Color at each stop
    pub color: [Rgba; GRADIENT_STOPS],
}

impl ColorGradient {
    /// Number of stops in a gradient.
    pub const STOPS: usize = GRADIENT_STOPS;

    /// Creates a gradient from stop positions and colors.
    #[must_use]
    pub const fn new(t: [f32; Self::STOPS], color: [Rgba; Self::STOPS]) -> Self {
        Self { t, color }
    }

    /// Gradient that stays at one color for the whole lifetime.
    #[must_use]
    pub const fn solid(color: Rgba) -> Self {
        Self::new([0.0, 0.25, 0.5, 1.0], [color; Self::STOPS])
    }

    /// Samples the gradient at `t`.
    #[must_use]
    pub fn sample(&self, t: f32) -> Rgba {
        let last = Self::STOPS - 1;
        if t <= self.t[0] {
            return self.color[0];
        }
        if t >= self.t[last] {
            return self.color[last];
        }

        for i in 0..last {
            let (start, end) = (self.t[i], self.t[i + 1]);
            if t <= end {
                let span = end - start;
                if span <= f32::EPSILON {
                    return self.color[i + 1];
                }
                return self.color[i].lerp(self.color[i + 1], (t - start) / span);
            }
        }

        self.color[last]
    }
}

impl Default for ColorGradient {
    fn default() -> Self {
        Self::solid(Rgba::WHITE)
    }
}
