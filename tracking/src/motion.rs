use std::ops::RangeInclusive;

use cgmath::Zero;

use crate::{Frame, MotionParams, TimeSeries, Vec3};

/// Estimates velocity from a series of positions in real-world units, by finite differences
/// over `interval` frames, then a trailing moving average over `smoothing_window` frames.
pub struct MotionAnalyzer {
    framerate: f32,
    interval: Frame,
    window: Frame,
}

impl MotionAnalyzer {
    pub fn new(framerate: f32, params: &MotionParams) -> Self {
        Self {
            framerate,
            interval: params.interval as Frame,
            window: params.smoothing_window as Frame,
        }
    }

    /// Units per second. Frames before `interval` don't have enough history, so they all use
    /// the velocity at `interval`.
    pub fn raw_velocity(&self, positions: &TimeSeries, frame: Frame) -> Vec3 {
        let frame = frame.max(self.interval);
        let delta = positions.get(frame) - positions.get(frame - self.interval);
        delta * (self.framerate / self.interval as f32)
    }

    /// The mean raw velocity over the `smoothing_window` frames strictly before this one. Frames
    /// before `smoothing_window` aren't smoothed at all.
    pub fn velocity(&self, positions: &TimeSeries, frame: Frame) -> Vec3 {
        if frame < self.window {
            return self.raw_velocity(positions, frame);
        }
        let mut sum = Vec3::zero();
        for prev in (frame - self.window)..frame {
            sum += self.raw_velocity(positions, prev);
        }
        sum / self.window as f32
    }

    /// Velocity before this frame involves the clamped early frames, so it can depend on samples
    /// after the frame itself. From here on, it only looks backwards.
    pub fn settled_after(&self) -> Frame {
        self.interval + self.window
    }

    // Every raw velocity in this frame's window compares two frames holding the same sample
    fn is_still(&self, positions: &TimeSeries, frame: Frame) -> bool {
        frame >= self.settled_after()
            && positions
                .range((frame - self.interval - self.window + 1)..frame)
                .next()
                .is_none()
    }

    /// Smoothed velocity over the range, as `(first, last, velocity)` stretches of frames
    /// sharing one value. Only the frames near an explicit sample are calculated individually;
    /// the rest of a gap between samples is one stretch of zero velocity, however long it is.
    pub fn analyze(
        &self,
        positions: &TimeSeries,
        frames: RangeInclusive<Frame>,
    ) -> Vec<(Frame, Frame, Vec3)> {
        let (first, last) = (*frames.start(), *frames.end());
        let mut stretches = Vec::new();
        let mut frame = first;
        while frame <= last {
            if self.is_still(positions, frame) {
                // Still until the next sample, which only moves the frame after it
                let until = positions
                    .range(frame..=last)
                    .next()
                    .map(|(sample, _)| sample)
                    .unwrap_or(last);
                stretches.push((frame, until, Vec3::zero()));
                frame = until + 1;
            } else {
                stretches.push((frame, frame, self.velocity(positions, frame)));
                frame += 1;
            }
        }
        stretches
    }
}

/// The direction of travel in the ground plane, counter-clockwise from the X axis.
pub fn heading_degrees(velocity: Vec3) -> f32 {
    velocity.y.atan2(velocity.x).to_degrees()
}

/// Display rotation for a body moving with this velocity. Models face backwards along their
/// own axis, hence the half turn.
pub fn facing_rotation(velocity: Vec3) -> Vec3 {
    Vec3::new(0.0, heading_degrees(velocity) + 180.0, 0.0)
}
