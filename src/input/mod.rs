//! Input module - paint samples and their stabilized resampling
//!
//! Raw pen observations arrive at whatever rate the tablet backend polls.
//! The sampler in this module turns them into an evenly-timed stream for
//! the brush engine.

pub mod clock;
pub mod sampler;

pub use clock::{Clock, LapTimer, ManualClock, MonotonicClock};
pub use sampler::{SampledRange, StabilizedEventsSampler};

use serde::{Deserialize, Serialize};

/// One pen observation used to drive brush rendering
///
/// Timing is deliberately absent: the sampler tracks elapsed time itself.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct PaintInfo {
    /// X position in canvas coordinates
    pub x: f32,
    /// Y position in canvas coordinates
    pub y: f32,
    /// Normalized pressure (0.0 - 1.0)
    pub pressure: f32,
    /// Tilt in X direction (-90 to 90 degrees)
    pub tilt_x: f32,
    /// Tilt in Y direction (-90 to 90 degrees)
    pub tilt_y: f32,
}

impl PaintInfo {
    /// Create a sample with no tilt
    pub fn new(x: f32, y: f32, pressure: f32) -> Self {
        Self {
            x,
            y,
            pressure: pressure.clamp(0.0, 1.0),
            tilt_x: 0.0,
            tilt_y: 0.0,
        }
    }

    /// Attach tilt angles, clamped to the device range
    pub fn with_tilt(mut self, tilt_x: f32, tilt_y: f32) -> Self {
        self.tilt_x = tilt_x.clamp(-90.0, 90.0);
        self.tilt_y = tilt_y.clamp(-90.0, 90.0);
        self
    }
}
