use std::collections::BTreeSet;

use anyhow::Result;
use serde::{Deserialize, Serialize};

use crate::{ActionTier, AnimationStateMachine, CoordinateTransform, PlayerID};

/// Everything the replay needs besides the tracking feeds themselves.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ReplayConfig {
    pub transform: CoordinateTransform,
    /// Tracking frames per second. Output frames match tracking frames one-to-one.
    pub framerate: f32,
    /// The framerate the model animation clips were authored at
    pub clip_framerate: f32,
    pub motion: MotionParams,
    /// Ordered by increasing threshold, starting from a tier with threshold 0
    pub actions: Vec<ActionTier>,
    pub roster: BTreeSet<PlayerID>,
    #[serde(default = "default_frames_per_chunk")]
    pub frames_per_chunk: usize,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct MotionParams {
    /// Finite differences look this many frames back
    pub interval: usize,
    /// Velocity is averaged over this many preceding frames
    pub smoothing_window: usize,
}

fn default_frames_per_chunk() -> usize {
    25
}

impl ReplayConfig {
    pub fn from_json(raw: &str) -> Result<Self> {
        let config: Self =
            serde_json::from_str(raw).map_err(|err| anyhow!("Bad replay config: {err}"))?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        self.transform.check()?;
        self.animation()?;
        if self.motion.interval == 0 {
            bail!("motion.interval must be at least 1");
        }
        if self.motion.smoothing_window == 0 {
            bail!("motion.smoothing_window must be at least 1");
        }
        if self.frames_per_chunk == 0 {
            bail!("frames_per_chunk must be at least 1");
        }
        if self.roster.is_empty() {
            warn!("The roster is empty, so no players will be replayed");
        }
        Ok(())
    }

    pub fn animation(&self) -> Result<AnimationStateMachine> {
        AnimationStateMachine::new(self.actions.clone(), self.framerate, self.clip_framerate)
    }
}
