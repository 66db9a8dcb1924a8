use std::collections::BTreeMap;
use std::ops::RangeBounds;

use cgmath::Zero;
use serde::{Deserialize, Serialize};

use crate::{Frame, Vec3};

/// A sparse, frame-indexed series of vectors. Frames without an explicit sample hold the most
/// recent earlier one.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct TimeSeries {
    inner: BTreeMap<Frame, Vec3>,
}

impl TimeSeries {
    pub fn new() -> Self {
        Self {
            inner: BTreeMap::new(),
        }
    }

    /// Inserts or overwrites.
    pub fn set(&mut self, frame: Frame, value: Vec3) {
        self.inner.insert(frame, value);
    }

    /// Copies over every frame of `other` that isn't present here yet. Existing frames are never
    /// overwritten; use `set` for that.
    // TODO Decide whether the receiver should really win conflicts. Live data arriving first
    // currently takes priority over any later backfill of the same frames.
    pub fn merge(&mut self, other: &TimeSeries) {
        for (frame, value) in &other.inner {
            self.inner.entry(*frame).or_insert(*value);
        }
    }

    /// Zero before frame 0. Otherwise the sample at `frame`, or the closest earlier one, or zero
    /// if there's nothing earlier.
    pub fn get(&self, frame: Frame) -> Vec3 {
        if frame < 0 {
            return Vec3::zero();
        }
        self.inner
            .range(..=frame)
            .next_back()
            .map(|(_, value)| *value)
            .unwrap_or_else(Vec3::zero)
    }

    /// Drops every sample at or after `frame`. Tracked positions only ever grow; this is for
    /// series derived from them that get recalculated.
    pub fn truncate_from(&mut self, frame: Frame) {
        self.inner.split_off(&frame);
    }

    pub fn contains(&self, frame: Frame) -> bool {
        self.inner.contains_key(&frame)
    }

    /// The first frame with an explicit sample. None if the series is empty.
    pub fn begin(&self) -> Option<Frame> {
        self.inner.keys().next().cloned()
    }

    /// The last frame with an explicit sample. None if the series is empty.
    pub fn end(&self) -> Option<Frame> {
        self.inner.keys().next_back().cloned()
    }

    pub fn len(&self) -> usize {
        self.inner.len()
    }

    pub fn is_empty(&self) -> bool {
        self.inner.is_empty()
    }

    /// Only the explicit samples, in frame order.
    pub fn iter(&self) -> impl Iterator<Item = (Frame, Vec3)> + '_ {
        self.inner.iter().map(|(frame, value)| (*frame, *value))
    }

    pub fn range<R: RangeBounds<Frame>>(
        &self,
        frames: R,
    ) -> impl Iterator<Item = (Frame, Vec3)> + '_ {
        self.inner
            .range(frames)
            .map(|(frame, value)| (*frame, *value))
    }
}
