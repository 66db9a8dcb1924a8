use std::io::Cursor;

use tracking::{
    ActionID, BodyID, ChunkReader, FrameRow, PlayerID, ReplayConfig, Replayable, RowWriter, Scene,
    Vec3,
};

fn config(frames_per_chunk: usize) -> ReplayConfig {
    let raw = format!(
        r#"{{
            "transform": {{
                "scale": {{"x": 0.5, "y": 0.5, "z": 1.0}},
                "offset": {{"x": 0.0, "y": 0.0, "z": 0.0}}
            }},
            "framerate": 10.0,
            "clip_framerate": 5.0,
            "motion": {{"interval": 2, "smoothing_window": 3}},
            "actions": [
                {{"name": "stand", "threshold": 0.0, "begin": 0, "end": 0}},
                {{"name": "walk", "threshold": 1.0, "begin": 10, "end": 13}},
                {{"name": "run", "threshold": 15.0, "begin": 20, "end": 25}}
            ],
            "roster": [1, 2],
            "frames_per_chunk": {frames_per_chunk}
        }}"#
    );
    ReplayConfig::from_json(&raw).unwrap()
}

// Player 1 stands still at (4, 6). Player 2 walks along X at 0.5 m per frame (5 m/s). Player
// 9 isn't in the roster. There's some junk mixed in.
fn player_feed(frames: i64) -> String {
    let mut feed = String::new();
    for frame in 0..frames {
        feed.push_str(&format!("{frame} 1 4 6\n"));
        if frame % 7 == 3 {
            feed.push_str("garbage\n");
        }
        feed.push_str(&format!("{frame} 2 {} 0\n", 0.5 * frame as f32));
        feed.push_str(&format!("{frame} 9 1 1\n"));
    }
    feed
}

fn ball_feed(frames: i64) -> String {
    let mut feed = String::new();
    for frame in (0..frames).step_by(2) {
        feed.push_str(&format!("{frame} {} 1 0.25\n", frame as f32));
    }
    feed
}

fn replay(frames_per_chunk: usize, frames: i64) -> Scene {
    let mut scene = Scene::new(config(frames_per_chunk)).unwrap();
    let mut players = ChunkReader::new(Cursor::new(player_feed(frames)));
    let mut ball = ChunkReader::new(Cursor::new(ball_feed(frames)));
    loop {
        let ingested =
            scene.ingest_players(&mut players).unwrap() + scene.ingest_ball(&mut ball).unwrap();
        if ingested == 0 {
            break;
        }
    }
    scene
}

#[test]
fn classifies_and_animates_players() {
    let scene = replay(100, 40);
    let standing = &scene.players[&PlayerID(1)];
    let walking = &scene.players[&PlayerID(2)];

    assert_eq!(standing.cursor_at(20).unwrap().action, ActionID(0));
    assert_eq!(standing.state_at(20).clip_frame, Some(0));
    assert_eq!(walking.cursor_at(20).unwrap().action, ActionID(1));
    assert!((walking.velocities.get(20).x - 5.0).abs() < 1e-3);

    // Real (4, 6, 0) lands at display (2, 0, 3)
    assert_eq!(standing.state_at(20).position, Vec3::new(2.0, 0.0, 3.0));

    // Walking from the start, two output frames per clip frame, clip 10 to 13
    let clip: Vec<u32> = (0..10)
        .map(|frame| walking.cursor_at(frame).unwrap().clip_frame)
        .collect();
    assert_eq!(clip, vec![10, 10, 11, 11, 12, 12, 13, 13, 10, 10]);
}

#[test]
fn chunk_size_doesnt_change_the_result() {
    let whole = replay(100, 40);
    // One frame per chunk is shorter than the differencing interval, so the first few chunks
    // can't know the early velocity yet
    for frames_per_chunk in [1, 2, 3] {
        let small = replay(frames_per_chunk, 40);
        for frame in 0..40 {
            assert_eq!(whole.states_at(frame), small.states_at(frame));
            for id in [PlayerID(1), PlayerID(2)] {
                assert_eq!(
                    whole.players[&id].velocities.get(frame),
                    small.players[&id].velocities.get(frame)
                );
            }
        }
    }
}

#[test]
fn scene_bookkeeping() {
    let mut scene = Scene::new(config(10)).unwrap();
    assert_eq!(scene.frame_range(), None);
    assert!(scene.states_at(0).is_empty());
    assert_eq!(scene.unseen_players(), vec![PlayerID(1), PlayerID(2)]);

    let mut players = ChunkReader::new(Cursor::new("0 1 0 0\n1 1 0 0\n"));
    assert_eq!(scene.ingest_players(&mut players).unwrap(), 2);
    assert_eq!(scene.unseen_players(), vec![PlayerID(2)]);

    let mut camera = ChunkReader::new(Cursor::new("5 0 0 10 -15 0 0\n"));
    assert_eq!(scene.ingest_camera(&mut camera).unwrap(), 1);
    assert_eq!(scene.frame_range(), Some((0, 5)));

    let bodies: Vec<BodyID> = scene.states_at(5).into_iter().map(|(id, _)| id).collect();
    assert_eq!(bodies, vec![BodyID::Camera, BodyID::Player(PlayerID(1))]);
    let (_, camera_state) = scene.states_at(5)[0];
    assert_eq!(camera_state.position, Vec3::new(0.0, 10.0, 0.0));
    assert_eq!(camera_state.rotation, Vec3::new(-15.0, 0.0, 0.0));
    // Before the camera's first sample, it sits at the origin
    assert_eq!(scene.states_at(4)[0].1.position, Vec3::new(0.0, 0.0, 0.0));
}

#[test]
fn export_rows() {
    let scene = replay(100, 10);
    let mut out = Vec::new();
    {
        let mut writer = RowWriter::new(&mut out);
        for frame in 0..10 {
            writer.write(&FrameRow::all_at(&scene, frame)).unwrap();
        }
        writer.flush().unwrap();
        // Two players and the ball per frame
        assert_eq!(writer.rows_written(), 30);
    }
    let text = String::from_utf8(out).unwrap();
    assert!(text.starts_with("frame,body,x,y,z,rot_x,rot_y,rot_z,clip_frame\n"));
    assert!(text.contains("\n4,ball,2.0,0.25,0.5,0.0,0.0,0.0,\n"));
}
