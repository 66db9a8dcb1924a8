use std::collections::BTreeMap;
use std::rc::Rc;

use cgmath::{InnerSpace, Zero};

use crate::{
    facing_rotation, AnimationCursor, AnimationStateMachine, BodyID, CameraChunk,
    CoordinateTransform, Frame, MotionAnalyzer, PlayerID, TimeSeries, Vec3,
};

/// What the renderer needs to draw one body at one frame.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct BodyState {
    /// Display space
    pub position: Vec3,
    /// Degrees around each display axis
    pub rotation: Vec3,
    /// Only for animated bodies
    pub clip_frame: Option<u32>,
}

/// Anything that can be put at a point in time.
pub trait Replayable {
    fn id(&self) -> BodyID;

    fn state_at(&self, frame: Frame) -> BodyState;

    /// The first and last frame with real data. None until something's been ingested.
    fn frame_range(&self) -> Option<(Frame, Frame)>;
}

pub struct Camera {
    pub positions: TimeSeries,
    pub rotations: TimeSeries,
}

impl Camera {
    pub fn new() -> Self {
        Self {
            positions: TimeSeries::new(),
            rotations: TimeSeries::new(),
        }
    }

    pub fn ingest(&mut self, chunk: &CameraChunk) {
        self.positions.merge(&chunk.positions);
        self.rotations.merge(&chunk.rotations);
    }
}

impl Replayable for Camera {
    fn id(&self) -> BodyID {
        BodyID::Camera
    }

    fn state_at(&self, frame: Frame) -> BodyState {
        BodyState {
            position: self.positions.get(frame),
            rotation: self.rotations.get(frame),
            clip_frame: None,
        }
    }

    fn frame_range(&self) -> Option<(Frame, Frame)> {
        range_of(&self.positions)
    }
}

pub struct Ball {
    pub positions: TimeSeries,
}

impl Ball {
    pub fn new() -> Self {
        Self {
            positions: TimeSeries::new(),
        }
    }

    pub fn ingest(&mut self, chunk: &TimeSeries) {
        self.positions.merge(chunk);
    }
}

impl Replayable for Ball {
    fn id(&self) -> BodyID {
        BodyID::Ball
    }

    fn state_at(&self, frame: Frame) -> BodyState {
        BodyState {
            position: self.positions.get(frame),
            rotation: Vec3::zero(),
            clip_frame: None,
        }
    }

    fn frame_range(&self) -> Option<(Frame, Frame)> {
        range_of(&self.positions)
    }
}

pub struct Player {
    pub id: PlayerID,
    /// Display space
    pub positions: TimeSeries,
    /// The same samples in real-world units, for motion analysis
    pub real_positions: TimeSeries,
    /// Facing, derived from velocity. Like velocity, only set where it changes.
    pub rotations: TimeSeries,
    /// Smoothed, in real-world units per second
    pub velocities: TimeSeries,
    /// Keyed by the first frame of a run holding one action, with the run's last frame
    animation: BTreeMap<Frame, (AnimationCursor, Frame)>,
    clips: Rc<AnimationStateMachine>,
}

impl Player {
    pub fn new(id: PlayerID, clips: Rc<AnimationStateMachine>) -> Self {
        Self {
            id,
            positions: TimeSeries::new(),
            real_positions: TimeSeries::new(),
            rotations: TimeSeries::new(),
            velocities: TimeSeries::new(),
            animation: BTreeMap::new(),
            clips,
        }
    }

    /// Merges in new positions, then works out velocity, facing and animation from the end of
    /// what's been analyzed so far through the chunk. The animation continues from whatever was
    /// computed for the frame just before. A chunk early enough to change the clamped velocity
    /// of the first frames redoes everything from the start.
    pub fn ingest(
        &mut self,
        chunk: &TimeSeries,
        transform: &CoordinateTransform,
        analyzer: &MotionAnalyzer,
    ) {
        let (first, last) = match range_of(chunk) {
            Some(pair) => pair,
            None => return,
        };

        let mut real = TimeSeries::new();
        for (frame, pos) in chunk.iter() {
            real.set(frame, transform.to_real(pos));
        }
        self.positions.merge(chunk);
        self.real_positions.merge(&real);

        let analyzed = self.analyzed_until();
        let (start, mut cursor) = match analyzed {
            Some(done) if first > analyzer.settled_after() => {
                let start = first.min(done + 1);
                (start, self.cursor_at(start - 1))
            }
            _ => (self.real_positions.begin().unwrap_or(first), None),
        };
        let end = analyzed.map_or(last, |done| last.max(done));

        self.velocities.truncate_from(start);
        self.rotations.truncate_from(start);
        self.animation.split_off(&start);
        for (from, until, velocity) in analyzer.analyze(&self.real_positions, start..=end) {
            self.velocities.set(from, velocity);
            self.rotations.set(from, facing_rotation(velocity));
            let action = self.clips.classify(velocity.magnitude());
            let next = match cursor {
                Some(cursor) => self.clips.step(cursor, action),
                None => self.clips.start(action),
            };
            self.animation.insert(from, (next, until));
            cursor = Some(self.clips.advance(next, until - from));
        }
    }

    /// The animation state at this frame, or at the last analyzed frame before it.
    pub fn cursor_at(&self, frame: Frame) -> Option<AnimationCursor> {
        let (from, (cursor, until)) = self.animation.range(..=frame).next_back()?;
        Some(self.clips.advance(*cursor, frame.min(*until) - from))
    }

    // The last frame with velocity and animation worked out
    fn analyzed_until(&self) -> Option<Frame> {
        self.animation.values().next_back().map(|(_, until)| *until)
    }
}

impl Replayable for Player {
    fn id(&self) -> BodyID {
        BodyID::Player(self.id)
    }

    fn state_at(&self, frame: Frame) -> BodyState {
        BodyState {
            position: self.positions.get(frame),
            rotation: self.rotations.get(frame),
            clip_frame: self.cursor_at(frame).map(|cursor| cursor.clip_frame),
        }
    }

    fn frame_range(&self) -> Option<(Frame, Frame)> {
        range_of(&self.positions)
    }
}

fn range_of(series: &TimeSeries) -> Option<(Frame, Frame)> {
    Some((series.begin()?, series.end()?))
}
