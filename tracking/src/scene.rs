use std::collections::BTreeMap;
use std::io::BufRead;
use std::rc::Rc;

use abstutil::prettyprint_usize;
use anyhow::Result;

use crate::{
    Ball, BodyID, BodyState, Camera, ChunkReader, Frame, MotionAnalyzer, Player, PlayerID,
    ReplayConfig, Replayable,
};

/// Every tracked body, plus the configuration needed to ingest more data for them. Callers own
/// the feeds and hand a reader in for each chunk.
pub struct Scene {
    config: ReplayConfig,
    analyzer: MotionAnalyzer,

    pub camera: Camera,
    pub ball: Ball,
    pub players: BTreeMap<PlayerID, Player>,
}

impl Scene {
    pub fn new(config: ReplayConfig) -> Result<Self> {
        config.validate()?;
        let analyzer = MotionAnalyzer::new(config.framerate, &config.motion);
        // Every player plays clips from the same table
        let animation = Rc::new(config.animation()?);
        let players = config
            .roster
            .iter()
            .map(|id| (*id, Player::new(*id, animation.clone())))
            .collect();
        Ok(Self {
            config,
            analyzer,
            camera: Camera::new(),
            ball: Ball::new(),
            players,
        })
    }

    pub fn config(&self) -> &ReplayConfig {
        &self.config
    }

    /// Returns the number of records ingested. 0 means the feed has nothing new right now.
    pub fn ingest_camera<R: BufRead>(&mut self, reader: &mut ChunkReader<R>) -> Result<usize> {
        let chunk = reader.read_camera(self.config.frames_per_chunk, &self.config.transform)?;
        self.camera.ingest(&chunk);
        let count = chunk.positions.len();
        log_ingest("camera", count, chunk.positions.begin().zip(chunk.positions.end()));
        Ok(count)
    }

    /// Returns the number of records ingested, across all players.
    pub fn ingest_players<R: BufRead>(&mut self, reader: &mut ChunkReader<R>) -> Result<usize> {
        let chunk = reader.read_players(
            self.config.frames_per_chunk,
            &self.config.roster,
            &self.config.transform,
        )?;
        let mut count = 0;
        let mut range: Option<(Frame, Frame)> = None;
        for (id, series) in &chunk {
            // read_players only returns roster members, and every one of them has a Player
            let player = match self.players.get_mut(id) {
                Some(player) => player,
                None => bail!("{:?} isn't in the scene", id),
            };
            player.ingest(series, &self.config.transform, &self.analyzer);
            count += series.len();
            if let (Some(begin), Some(end)) = (series.begin(), series.end()) {
                range = Some(match range {
                    Some((first, last)) => (first.min(begin), last.max(end)),
                    None => (begin, end),
                });
            }
        }
        log_ingest("players", count, range);
        Ok(count)
    }

    /// Returns the number of records ingested.
    pub fn ingest_ball<R: BufRead>(&mut self, reader: &mut ChunkReader<R>) -> Result<usize> {
        let chunk = reader.read_ball(self.config.frames_per_chunk, &self.config.transform)?;
        self.ball.ingest(&chunk);
        log_ingest("ball", chunk.len(), chunk.begin().zip(chunk.end()));
        Ok(chunk.len())
    }

    /// Bodies with at least some data, camera first and ball last.
    pub fn bodies(&self) -> Vec<&dyn Replayable> {
        let mut bodies: Vec<&dyn Replayable> = vec![&self.camera];
        for player in self.players.values() {
            bodies.push(player);
        }
        bodies.push(&self.ball);
        bodies.retain(|body| body.frame_range().is_some());
        bodies
    }

    /// The frames covered by anything ingested so far.
    pub fn frame_range(&self) -> Option<(Frame, Frame)> {
        self.bodies()
            .into_iter()
            .filter_map(|body| body.frame_range())
            .reduce(|(a1, b1), (a2, b2)| (a1.min(a2), b1.max(b2)))
    }

    pub fn states_at(&self, frame: Frame) -> Vec<(BodyID, BodyState)> {
        self.bodies()
            .into_iter()
            .map(|body| (body.id(), body.state_at(frame)))
            .collect()
    }

    /// Roster members that no player record has mentioned yet.
    pub fn unseen_players(&self) -> Vec<PlayerID> {
        self.players
            .values()
            .filter(|player| player.positions.is_empty())
            .map(|player| player.id)
            .collect()
    }
}

fn log_ingest(feed: &str, count: usize, range: Option<(Frame, Frame)>) {
    if let Some((first, last)) = range {
        info!(
            "Ingested {} {feed} records covering frames {first} to {last}",
            prettyprint_usize(count)
        );
    }
}
