#[macro_use]
extern crate anyhow;
#[macro_use]
extern crate log;

mod animation;
mod bodies;
mod chunk;
mod config;
mod export;
mod motion;
mod scene;
mod time_series;
mod transform;

use serde::{Deserialize, Serialize};

pub use self::animation::{ActionID, ActionTier, AnimationCursor, AnimationStateMachine};
pub use self::bodies::{Ball, BodyState, Camera, Player, Replayable};
pub use self::chunk::{CameraChunk, ChunkReader, ReaderStats};
pub use self::config::{MotionParams, ReplayConfig};
pub use self::export::{FrameRow, RowWriter};
pub use self::motion::{facing_rotation, heading_degrees, MotionAnalyzer};
pub use self::scene::Scene;
pub use self::time_series::TimeSeries;
pub use self::transform::CoordinateTransform;

/// Positions, rotations and velocities, in either the tracking or the display space.
pub type Vec3 = cgmath::Vector3<f32>;

/// One tick of the recorded sequence. Signed, because lookups before the start of a series are
/// meaningful (they hold the zero vector).
pub type Frame = i64;

/// The index a player carries in the tracking feed.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct PlayerID(pub usize);

#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum BodyID {
    Camera,
    Player(PlayerID),
    Ball,
}

impl std::fmt::Display for BodyID {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        match self {
            BodyID::Camera => write!(f, "camera"),
            BodyID::Player(id) => write!(f, "player {}", id.0),
            BodyID::Ball => write!(f, "ball"),
        }
    }
}
