use anyhow::Result;
use serde::{Deserialize, Serialize};

use crate::Vec3;

/// Maps between the tracking system's coordinates and the display space.
///
/// The tracking space is Z-up and the display space is Y-up, so the Y and Z axes swap along the
/// way. `scale` and `offset` are expressed per tracking axis.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct CoordinateTransform {
    scale: Vec3,
    offset: Vec3,
}

impl CoordinateTransform {
    pub fn new(scale: Vec3, offset: Vec3) -> Result<Self> {
        let transform = Self { scale, offset };
        transform.check()?;
        Ok(transform)
    }

    pub fn identity() -> Self {
        Self {
            scale: Vec3::new(1.0, 1.0, 1.0),
            offset: Vec3::new(0.0, 0.0, 0.0),
        }
    }

    /// `to_real` divides by every scale component, so none may be zero. Deserializing skips
    /// `new`, so loaded transforms must go through this.
    pub fn check(&self) -> Result<()> {
        for (axis, value) in [("x", self.scale.x), ("y", self.scale.y), ("z", self.scale.z)] {
            if value == 0.0 || !value.is_finite() {
                bail!("Transform scale.{axis} must be finite and non-zero, but is {value}");
            }
        }
        Ok(())
    }

    pub fn to_display(&self, real: Vec3) -> Vec3 {
        Vec3::new(
            real.x * self.scale.x + self.offset.x,
            real.z * self.scale.z + self.offset.z,
            real.y * self.scale.y + self.offset.y,
        )
    }

    pub fn to_real(&self, display: Vec3) -> Vec3 {
        Vec3::new(
            (display.x - self.offset.x) / self.scale.x,
            (display.z - self.offset.y) / self.scale.y,
            (display.y - self.offset.z) / self.scale.z,
        )
    }
}
