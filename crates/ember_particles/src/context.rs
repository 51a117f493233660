//! Frame timing handed to the simulation by the frame driver.

/// Per-frame timing supplied by the external frame loop.
///
/// The driver clamps the frame time before building the context, so
/// `delta_s` is always positive.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct UpdateContext {
    /// Frames stepped since the loop started.
    pub frame_count: u32,
    /// Frame time in milliseconds.
    pub delta_ms: u32,
    /// Frame time in seconds.
    pub delta_s: f32,
    /// Milliseconds since the loop started.
    pub timestamp: u32,
}

impl UpdateContext {
    /// Builds a context from a millisecond frame time.
    #[must_use]
    pub fn from_delta_ms(frame_count: u32, delta_ms: u32, timestamp: u32) -> Self {
        #[allow(clippy::cast_precision_loss)]
        let delta_s = delta_ms as f32 / 1000.0;
        Self {
            frame_count,
            delta_ms,
            delta_s,
            timestamp,
        }
    }

    /// Builds a context for a single step of `delta_s` seconds.
    ///
    /// Handy for fixed-step loops and tests where only the step matters.
    #[must_use]
    pub fn from_delta_s(delta_s: f32) -> Self {
        #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
        let delta_ms = (delta_s * 1000.0) as u32;
        Self {
            frame_count: 0,
            delta_ms,
            delta_s,
            timestamp: 0,
        }
    }

    /// Returns the context for the following frame with the same step.
    #[must_use]
    pub fn next(self) -> Self {
        Self {
            frame_count: self.frame_count.wrapping_add(1),
            timestamp: self.timestamp.wrapping_add(self.delta_ms),
            ..self
        }
    }
}
