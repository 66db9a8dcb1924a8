use anyhow::Result;
use serde::{Deserialize, Serialize};

use crate::Frame;

/// Index into the ordered action table. 0 is the floor tier (usually standing).
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct ActionID(pub usize);

/// A discrete kind of motion, picked from speed, and the range of model animation frames that
/// play while in it.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ActionTier {
    pub name: String,
    /// Minimum speed (real-world units per second) to be in this tier
    pub threshold: f32,
    pub begin: u32,
    pub end: u32,
}

/// Everything needed to continue a body's animation on the next frame.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct AnimationCursor {
    pub action: ActionID,
    /// How many output frames the current clip frame has been held
    pub repeat_count: u32,
    pub clip_frame: u32,
}

/// Picks a clip frame per output frame, holding each clip frame long enough that the clip plays
/// back at its own framerate.
pub struct AnimationStateMachine {
    tiers: Vec<ActionTier>,
    ratio: u32,
}

impl AnimationStateMachine {
    pub fn new(tiers: Vec<ActionTier>, output_framerate: f32, clip_framerate: f32) -> Result<Self> {
        if tiers.is_empty() {
            bail!("No action tiers defined");
        }
        if tiers[0].threshold != 0.0 {
            bail!(
                "The first action tier {} must have threshold 0, not {}",
                tiers[0].name,
                tiers[0].threshold
            );
        }
        for pair in tiers.windows(2) {
            if !(pair[0].threshold < pair[1].threshold) {
                bail!(
                    "Action tier thresholds must strictly increase: {} has {}, then {} has {}",
                    pair[0].name,
                    pair[0].threshold,
                    pair[1].name,
                    pair[1].threshold
                );
            }
        }
        for tier in &tiers {
            if tier.begin > tier.end {
                bail!(
                    "Action tier {} has clip range [{}, {}] backwards",
                    tier.name,
                    tier.begin,
                    tier.end
                );
            }
        }
        for (name, value) in [("output", output_framerate), ("clip", clip_framerate)] {
            if !(value > 0.0) || !value.is_finite() {
                bail!("The {name} framerate must be positive, not {value}");
            }
        }

        let ratio = (f64::from(output_framerate) / f64::from(clip_framerate)).ceil() as u32;
        Ok(Self {
            tiers,
            ratio: ratio.max(1),
        })
    }

    /// How many output frames each clip frame is held for.
    pub fn ratio(&self) -> u32 {
        self.ratio
    }

    pub fn tier(&self, id: ActionID) -> &ActionTier {
        &self.tiers[id.0]
    }

    /// The highest tier whose threshold this speed reaches.
    pub fn classify(&self, speed: f32) -> ActionID {
        let mut result = ActionID(0);
        for (idx, tier) in self.tiers.iter().enumerate().skip(1) {
            if tier.threshold > speed {
                break;
            }
            result = ActionID(idx);
        }
        result
    }

    /// A body seen for the first time starts at the beginning of its clip.
    pub fn start(&self, action: ActionID) -> AnimationCursor {
        AnimationCursor {
            action,
            repeat_count: 0,
            clip_frame: self.tier(action).begin,
        }
    }

    /// Advances the cursor by one output frame. Switching actions cuts straight to the start of
    /// the new clip.
    pub fn step(&self, cursor: AnimationCursor, action: ActionID) -> AnimationCursor {
        if action != cursor.action {
            return self.start(action);
        }

        let tier = self.tier(action);
        let mut next = cursor;
        next.repeat_count += 1;
        if next.repeat_count >= self.ratio {
            next.repeat_count = 0;
            next.clip_frame += 1;
            if next.clip_frame > tier.end {
                next.clip_frame = tier.begin;
            }
        }
        next
    }

    /// Holds the cursor's action for this many more output frames, without stepping through
    /// each one.
    pub fn advance(&self, cursor: AnimationCursor, frames: Frame) -> AnimationCursor {
        if frames <= 0 {
            return cursor;
        }
        let tier = self.tier(cursor.action);
        let ratio = u64::from(self.ratio);
        let held = u64::from(cursor.repeat_count) + frames as u64;
        let clip_len = u64::from(tier.end - tier.begin) + 1;
        let offset = (u64::from(cursor.clip_frame - tier.begin) + held / ratio) % clip_len;
        AnimationCursor {
            action: cursor.action,
            repeat_count: (held % ratio) as u32,
            clip_frame: tier.begin + offset as u32,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const STAND: ActionID = ActionID(0);
    const WALK: ActionID = ActionID(1);
    const RUN: ActionID = ActionID(2);

    fn tier(name: &str, threshold: f32, begin: u32, end: u32) -> ActionTier {
        ActionTier {
            name: name.to_string(),
            threshold,
            begin,
            end,
        }
    }

    fn tiers() -> Vec<ActionTier> {
        vec![
            tier("stand", 0.0, 20, 21),
            tier("walk", 1.0, 0, 3),
            tier("run", 4.0, 10, 15),
        ]
    }

    // ratio 2
    fn machine() -> AnimationStateMachine {
        AnimationStateMachine::new(tiers(), 50.0, 25.0).unwrap()
    }

    fn play(
        machine: &AnimationStateMachine,
        previous: Option<AnimationCursor>,
        actions: Vec<ActionID>,
    ) -> Vec<AnimationCursor> {
        let mut cursor = previous;
        let mut results = Vec::new();
        for action in actions {
            let next = match cursor {
                Some(cursor) => machine.step(cursor, action),
                None => machine.start(action),
            };
            results.push(next);
            cursor = Some(next);
        }
        results
    }

    #[test]
    fn ratio_rounds_up() {
        assert_eq!(machine().ratio(), 2);
        assert_eq!(AnimationStateMachine::new(tiers(), 25.0, 10.0).unwrap().ratio(), 3);
        assert_eq!(AnimationStateMachine::new(tiers(), 10.0, 25.0).unwrap().ratio(), 1);
    }

    #[test]
    fn classify() {
        let machine = machine();
        assert_eq!(machine.classify(0.0), STAND);
        assert_eq!(machine.classify(0.99), STAND);
        assert_eq!(machine.classify(1.0), WALK);
        assert_eq!(machine.classify(3.9), WALK);
        assert_eq!(machine.classify(4.0), RUN);
        assert_eq!(machine.classify(400.0), RUN);
        assert_eq!(machine.classify(f32::NAN), STAND);
    }

    #[test]
    fn holds_and_wraps() {
        let machine = machine();
        let frames: Vec<u32> = play(&machine, None, vec![WALK; 10])
            .into_iter()
            .map(|c| c.clip_frame)
            .collect();
        assert_eq!(frames, vec![0, 0, 1, 1, 2, 2, 3, 3, 0, 0]);
    }

    #[test]
    fn switching_is_a_hard_cut() {
        let machine = machine();
        let cursors = play(
            &machine,
            None,
            vec![RUN, RUN, RUN, RUN, RUN, STAND, STAND, STAND],
        );
        assert_eq!(cursors[4].clip_frame, 12);
        assert_eq!(
            cursors[5],
            AnimationCursor {
                action: STAND,
                repeat_count: 0,
                clip_frame: 20,
            }
        );
        assert_eq!(cursors[7].clip_frame, 21);
    }

    #[test]
    fn continues_across_chunks() {
        let machine = machine();
        let whole = play(&machine, None, vec![WALK; 7]);
        let first = play(&machine, None, vec![WALK; 3]);
        let second = play(&machine, first.last().cloned(), vec![WALK; 4]);
        assert_eq!(whole[..3], first[..]);
        assert_eq!(whole[3..], second[..]);
    }

    #[test]
    fn advancing_matches_stepping() {
        let machine = AnimationStateMachine::new(tiers(), 25.0, 10.0).unwrap();
        let mut stepped = machine.step(machine.start(RUN), RUN);
        let from = stepped;
        for frames in 1..=40 {
            stepped = machine.step(stepped, RUN);
            assert_eq!(machine.advance(from, frames), stepped);
        }
        assert_eq!(machine.advance(from, 0), from);
    }

    #[test]
    fn advancing_over_a_long_gap() {
        let machine = machine();
        let cursor = machine.start(WALK);
        // Two output frames per clip frame, four clip frames, so the cycle is 8 frames long
        let far = machine.advance(cursor, 1_000_000_000_003);
        assert_eq!(
            far,
            AnimationCursor {
                action: WALK,
                repeat_count: 1,
                clip_frame: 1,
            }
        );
    }

    #[test]
    fn bad_tables() {
        assert!(AnimationStateMachine::new(Vec::new(), 25.0, 25.0).is_err());
        assert!(AnimationStateMachine::new(
            vec![tier("stand", 0.0, 0, 0), tier("walk", 0.0, 1, 2)],
            25.0,
            25.0
        )
        .is_err());
        assert!(AnimationStateMachine::new(
            vec![tier("stand", 0.5, 0, 0), tier("walk", 1.0, 1, 2)],
            25.0,
            25.0
        )
        .is_err());
        assert!(AnimationStateMachine::new(vec![tier("stand", 0.0, 3, 2)], 25.0, 25.0).is_err());
        assert!(AnimationStateMachine::new(tiers(), 25.0, 0.0).is_err());
    }
}
