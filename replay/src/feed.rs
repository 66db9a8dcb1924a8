use std::io::{BufRead, BufReader};

use anyhow::Result;
use fs_err::File;

use tracking::{ChunkReader, Frame, Scene};

#[derive(Clone, Copy, Debug, PartialEq)]
pub enum FeedKind {
    Camera,
    Players,
    Ball,
}

/// One open tracking feed, and how far into it we've ingested.
pub struct Feed<R> {
    pub kind: FeedKind,
    pub path: String,
    reader: ChunkReader<R>,
    // Only for files that're completely written; a live feed might always grow
    drained: bool,
}

impl Feed<BufReader<File>> {
    pub fn open(kind: FeedKind, path: String, live: bool) -> Result<Self> {
        // fs_err puts the path in the error
        let file = BufReader::new(File::open(&path)?);
        let reader = if live {
            ChunkReader::live(file)
        } else {
            ChunkReader::new(file)
        };
        Ok(Self::new(kind, path, reader))
    }
}

impl<R: BufRead> Feed<R> {
    pub fn new(kind: FeedKind, path: String, reader: ChunkReader<R>) -> Self {
        Self {
            kind,
            path,
            reader,
            drained: false,
        }
    }

    /// Ingests one chunk into the scene. Returns the number of records.
    pub fn pull(&mut self, scene: &mut Scene, live: bool) -> Result<usize> {
        if self.drained {
            return Ok(0);
        }
        let count = match self.kind {
            FeedKind::Camera => scene.ingest_camera(&mut self.reader)?,
            FeedKind::Players => scene.ingest_players(&mut self.reader)?,
            FeedKind::Ball => scene.ingest_ball(&mut self.reader)?,
        };
        if count == 0 && !live {
            debug!("{} is drained", self.path);
            self.drained = true;
        }
        Ok(count)
    }

    pub fn is_drained(&self) -> bool {
        self.drained
    }

    /// Up to here, this feed can't add anything more to the scene. A player feed only gets
    /// through part of a frame when a chunk fills up, so this trails the last frame read.
    pub fn covered(&self) -> Option<Frame> {
        self.reader.complete_through()
    }

    pub fn describe_stats(&self) -> String {
        let stats = self.reader.stats();
        format!(
            "{}: {} lines, {} records kept, {} malformed, {} for players outside the roster",
            self.path,
            abstutil::prettyprint_usize(stats.lines),
            abstutil::prettyprint_usize(stats.retained),
            abstutil::prettyprint_usize(stats.malformed),
            abstutil::prettyprint_usize(stats.unmatched)
        )
    }
}
