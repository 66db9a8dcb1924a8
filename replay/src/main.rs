#[macro_use]
extern crate anyhow;
#[macro_use]
extern crate log;

mod feed;

use std::io::{BufRead, BufReader, Write};
use std::time::Duration;

use abstutil::{prettyprint_usize, Timer};
use anyhow::Result;
use fs_err::File;
use structopt::StructOpt;

use tracking::{Frame, FrameRow, ReplayConfig, RowWriter, Scene};

use self::feed::{Feed, FeedKind};

#[derive(StructOpt)]
struct Args {
    /// The path to a JSON file describing the coordinate transform, action tiers, and roster
    #[structopt(long)]
    config: String,
    /// The path to a camera feed: `frame x y z rot_x rot_y rot_z` per line
    #[structopt(long)]
    camera: Option<String>,
    /// The path to a player feed: `frame player x y` per line
    #[structopt(long)]
    players: Option<String>,
    /// The path to a ball feed: `frame x y z` per line
    #[structopt(long)]
    ball: Option<String>,
    /// Write per-frame CSV here instead of stdout
    #[structopt(long)]
    output: Option<String>,
    /// Overrides frames_per_chunk from the config
    #[structopt(long)]
    frames_per_chunk: Option<usize>,
    /// Keep polling the feeds while something else appends to them
    #[structopt(long)]
    live: bool,
    /// In live mode, how long to wait between polls that found nothing new
    #[structopt(long, default_value = "100")]
    poll_ms: u64,
    /// In live mode, give up after this many polls in a row find nothing new
    #[structopt(long, default_value = "50")]
    max_idle_polls: usize,
}

impl Args {
    fn load(&mut self, timer: &mut Timer) -> Result<(Scene, Vec<Feed<BufReader<File>>>)> {
        timer.start("load config");
        let mut config = ReplayConfig::from_json(&fs_err::read_to_string(&self.config)?)?;
        if let Some(n) = self.frames_per_chunk {
            config.frames_per_chunk = n;
        }
        let scene = Scene::new(config)?;
        timer.stop("load config");
        info!(
            "Replaying {} rostered players, {} frames per chunk",
            scene.config().roster.len(),
            scene.config().frames_per_chunk
        );

        let mut feeds = Vec::new();
        for (kind, path) in [
            (FeedKind::Camera, self.camera.take()),
            (FeedKind::Players, self.players.take()),
            (FeedKind::Ball, self.ball.take()),
        ] {
            if let Some(path) = path {
                feeds.push(Feed::open(kind, path, self.live)?);
            }
        }
        if feeds.is_empty() {
            bail!("No input specified; pass at least one of --camera, --players, --ball");
        }
        Ok((scene, feeds))
    }

    fn output(&self) -> Result<Box<dyn Write>> {
        let out: Box<dyn Write> = match self.output {
            Some(ref path) => Box::new(std::io::BufWriter::new(fs_err::File::create(path)?)),
            None => Box::new(std::io::stdout()),
        };
        Ok(out)
    }
}

fn main() {
    abstutil::logger::setup();

    let args = Args::from_iter(abstutil::cli_args());
    if let Err(err) = run(args) {
        error!("Replay failed: {err:#}");
        std::process::exit(1);
    }
}

fn run(mut args: Args) -> Result<()> {
    let mut timer = Timer::new("replay tracking feeds");
    let (mut scene, mut feeds) = args.load(&mut timer)?;
    let mut writer = RowWriter::new(args.output()?);

    timer.start("replay");
    // The next frame to write out
    let mut next_frame: Option<Frame> = None;
    let mut idle_polls = 0;
    loop {
        let ingested =
            replay_round(&mut scene, &mut feeds, args.live, &mut next_frame, &mut writer)?;
        if ingested > 0 {
            idle_polls = 0;
            continue;
        }
        if !args.live {
            break;
        }
        idle_polls += 1;
        if idle_polls >= args.max_idle_polls {
            info!("Nothing new after {idle_polls} polls, stopping");
            break;
        }
        std::thread::sleep(Duration::from_millis(args.poll_ms));
    }

    // Whatever's left
    if let Some((_, last)) = scene.frame_range() {
        emit(&scene, &mut next_frame, last, &mut writer)?;
    }
    writer.flush()?;
    timer.stop("replay");

    for feed in &feeds {
        info!("{}", feed.describe_stats());
    }
    for id in scene.unseen_players() {
        warn!("{:?} is in the roster, but never appeared in the player feed", id);
    }
    info!(
        "Wrote {} rows",
        prettyprint_usize(writer.rows_written())
    );
    Ok(())
}

/// Pulls one chunk from every feed, then writes out the frames that no feed can change anymore.
/// Returns the number of records ingested.
fn replay_round<R: BufRead, W: Write>(
    scene: &mut Scene,
    feeds: &mut [Feed<R>],
    live: bool,
    next_frame: &mut Option<Frame>,
    writer: &mut RowWriter<W>,
) -> Result<usize> {
    let mut ingested = 0;
    for feed in feeds.iter_mut() {
        ingested += feed.pull(scene, live)?;
    }

    // A frame is only final once every feed that might still add to it has moved past it
    let ready = feeds
        .iter()
        .filter(|feed| !feed.is_drained())
        .map(|feed| feed.covered())
        .min();
    if let Some(Some(last)) = ready {
        emit(scene, next_frame, last, writer)?;
    }
    Ok(ingested)
}

// Writes every body's state for frames up to and including `last`
fn emit<W: Write>(
    scene: &Scene,
    next_frame: &mut Option<Frame>,
    last: Frame,
    writer: &mut RowWriter<W>,
) -> Result<()> {
    let first = match next_frame {
        Some(frame) => *frame,
        None => match scene.frame_range() {
            Some((first, _)) => first,
            None => return Ok(()),
        },
    };
    for frame in first..=last {
        writer.write(&FrameRow::all_at(scene, frame))?;
    }
    if last >= first {
        *next_frame = Some(last + 1);
    }
    Ok(())
}
