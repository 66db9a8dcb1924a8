use std::collections::{BTreeMap, BTreeSet};
use std::io::BufRead;

use anyhow::Result;

use crate::{CoordinateTransform, Frame, PlayerID, TimeSeries, Vec3};

// Token counts per record kind
const CAMERA_FIELDS: usize = 7;
const PLAYER_FIELDS: usize = 4;
const BALL_FIELDS: usize = 4;

/// Incrementally parses one line-oriented tracking feed. The read position persists between
/// calls, so the same reader can be asked for chunk after chunk as the feed grows.
///
/// Malformed lines (empty, too few tokens, unparseable numbers) are skipped and don't count
/// towards a chunk's budget. Neither do player records for someone outside the roster.
pub struct ChunkReader<R> {
    reader: R,
    live: bool,
    // Text of the current line, possibly incomplete in live mode
    pending: String,
    stats: ReaderStats,
    // The highest frame of any well-formed record, kept or not
    last_frame: Option<Frame>,
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct ReaderStats {
    pub lines: usize,
    pub retained: usize,
    pub malformed: usize,
    pub unmatched: usize,
}

pub struct CameraChunk {
    pub positions: TimeSeries,
    pub rotations: TimeSeries,
}

impl<R: BufRead> ChunkReader<R> {
    /// For a feed that's completely written. A final line without a newline is still a record.
    pub fn new(reader: R) -> Self {
        Self {
            reader,
            live: false,
            pending: String::new(),
            stats: ReaderStats::default(),
            last_frame: None,
        }
    }

    /// For a feed that something else is still appending to. A trailing line without a newline
    /// is held back until the rest of it shows up.
    pub fn live(reader: R) -> Self {
        Self {
            live: true,
            ..Self::new(reader)
        }
    }

    pub fn stats(&self) -> ReaderStats {
        self.stats
    }

    /// Every frame up to here has been completely read, assuming the feed is in frame order. The
    /// last frame seen might still have more records on the way, especially for players, where
    /// one frame spans many lines and a chunk can stop partway through. None until a record has
    /// shown up.
    pub fn complete_through(&self) -> Option<Frame> {
        self.last_frame.map(|frame| frame - 1)
    }

    /// `frame posX posY posZ rotX rotY rotZ`. Rotation is passed through untouched.
    pub fn read_camera(
        &mut self,
        frames_to_catch: usize,
        transform: &CoordinateTransform,
    ) -> Result<CameraChunk> {
        let mut chunk = CameraChunk {
            positions: TimeSeries::new(),
            rotations: TimeSeries::new(),
        };
        let before = self.stats;
        self.read_records(CAMERA_FIELDS, frames_to_catch, |values| {
            let frame = match to_frame(values[0]) {
                Some(frame) => frame,
                None => return false,
            };
            let pos = vec3(values[1], values[2], values[3]);
            let rot = vec3(values[4], values[5], values[6]);
            chunk.positions.set(frame, transform.to_display(pos));
            chunk.rotations.set(frame, rot);
            true
        })?;
        self.log_chunk("camera", before);
        Ok(chunk)
    }

    /// `frame playerIndex posX posY`. Up to `frames_to_catch` records per roster member are
    /// consumed. Positions are on the ground, so Z is 0 before transforming.
    pub fn read_players(
        &mut self,
        frames_to_catch: usize,
        roster: &BTreeSet<PlayerID>,
        transform: &CoordinateTransform,
    ) -> Result<BTreeMap<PlayerID, TimeSeries>> {
        let mut chunk: BTreeMap<PlayerID, TimeSeries> = BTreeMap::new();
        let before = self.stats;
        let mut unmatched = 0;
        self.read_records(
            PLAYER_FIELDS,
            frames_to_catch * roster.len(),
            |values| {
                let frame = match to_frame(values[0]) {
                    Some(frame) => frame,
                    None => return false,
                };
                let id = match to_index(values[1]) {
                    Some(idx) => PlayerID(idx),
                    None => return false,
                };
                if !roster.contains(&id) {
                    unmatched += 1;
                    return false;
                }
                let pos = vec3(values[2], values[3], 0.0);
                chunk
                    .entry(id)
                    .or_insert_with(TimeSeries::new)
                    .set(frame, transform.to_display(pos));
                true
            },
        )?;
        // read_records counted these as malformed; they were fine, just not for us
        self.stats.malformed -= unmatched;
        self.stats.unmatched += unmatched;
        self.log_chunk("players", before);
        Ok(chunk)
    }

    /// `frame posX posY posZ`
    pub fn read_ball(
        &mut self,
        frames_to_catch: usize,
        transform: &CoordinateTransform,
    ) -> Result<TimeSeries> {
        let mut chunk = TimeSeries::new();
        let before = self.stats;
        self.read_records(BALL_FIELDS, frames_to_catch, |values| {
            let frame = match to_frame(values[0]) {
                Some(frame) => frame,
                None => return false,
            };
            let pos = vec3(values[1], values[2], values[3]);
            chunk.set(frame, transform.to_display(pos));
            true
        })?;
        self.log_chunk("ball", before);
        Ok(chunk)
    }

    // Reads lines until `budget` of them are retained by `keep`, or the stream runs dry. Returns
    // the number retained.
    fn read_records<F: FnMut(&[f64]) -> bool>(
        &mut self,
        fields: usize,
        budget: usize,
        mut keep: F,
    ) -> Result<usize> {
        let mut retained = 0;
        while retained < budget {
            let line = match self.next_line()? {
                Some(line) => line,
                None => break,
            };
            self.stats.lines += 1;
            let values = match parse_record(&line, fields) {
                Some(values) => values,
                None => {
                    self.stats.malformed += 1;
                    continue;
                }
            };
            if let Some(frame) = to_frame(values[0]) {
                self.last_frame = self.last_frame.max(Some(frame));
            }
            if keep(&values) {
                retained += 1;
            } else {
                self.stats.malformed += 1;
            }
        }
        self.stats.retained += retained;
        Ok(retained)
    }

    // None at the end of the stream (for now, in live mode)
    fn next_line(&mut self) -> Result<Option<String>> {
        self.reader.read_line(&mut self.pending)?;
        if self.pending.is_empty() {
            return Ok(None);
        }
        if self.live && !self.pending.ends_with('\n') {
            // Wait for the writer to finish this line
            return Ok(None);
        }
        Ok(Some(std::mem::take(&mut self.pending)))
    }

    fn log_chunk(&self, feed: &str, before: ReaderStats) {
        let malformed = self.stats.malformed - before.malformed;
        let unmatched = self.stats.unmatched - before.unmatched;
        if malformed > 0 || unmatched > 0 {
            debug!(
                "{feed}: skipped {malformed} malformed and {unmatched} unmatched lines out of {}",
                self.stats.lines - before.lines
            );
        }
    }
}

// None if there are too few tokens or any of the first `fields` isn't a number. Extra tokens
// are ignored.
fn parse_record(line: &str, fields: usize) -> Option<Vec<f64>> {
    let values: Vec<f64> = line
        .split_whitespace()
        .take(fields)
        .map(parse_token)
        .collect::<Option<Vec<f64>>>()?;
    if values.len() < fields {
        return None;
    }
    Some(values)
}

// Older feeds write "." for a missing value
fn parse_token(token: &str) -> Option<f64> {
    if token == "." {
        return Some(-1.0);
    }
    let value = token.parse::<f64>().ok()?;
    if value.is_finite() {
        Some(value)
    } else {
        None
    }
}

fn to_frame(value: f64) -> Option<Frame> {
    if value.fract() != 0.0 {
        return None;
    }
    Some(value as Frame)
}

fn to_index(value: f64) -> Option<usize> {
    if value < 0.0 || value.fract() != 0.0 {
        return None;
    }
    Some(value as usize)
}

fn vec3(x: f64, y: f64, z: f64) -> Vec3 {
    Vec3::new(x as f32, y as f32, z as f32)
}
