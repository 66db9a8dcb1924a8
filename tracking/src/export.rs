use std::io::Write;

use anyhow::Result;
use serde::Serialize;

use crate::{BodyID, BodyState, Frame, Scene};

/// One body at one frame, flattened for CSV.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct FrameRow {
    pub frame: Frame,
    pub body: String,
    pub x: f32,
    pub y: f32,
    pub z: f32,
    pub rot_x: f32,
    pub rot_y: f32,
    pub rot_z: f32,
    pub clip_frame: Option<u32>,
}

impl FrameRow {
    pub fn new(frame: Frame, body: BodyID, state: BodyState) -> Self {
        Self {
            frame,
            body: body.to_string(),
            x: state.position.x,
            y: state.position.y,
            z: state.position.z,
            rot_x: state.rotation.x,
            rot_y: state.rotation.y,
            rot_z: state.rotation.z,
            clip_frame: state.clip_frame,
        }
    }

    pub fn all_at(scene: &Scene, frame: Frame) -> Vec<Self> {
        scene
            .states_at(frame)
            .into_iter()
            .map(|(body, state)| Self::new(frame, body, state))
            .collect()
    }
}

/// Streams rows out as CSV. The header goes out with the first row.
pub struct RowWriter<W: Write> {
    csv: csv::Writer<W>,
    rows: usize,
}

impl<W: Write> RowWriter<W> {
    pub fn new(writer: W) -> Self {
        Self {
            csv: csv::Writer::from_writer(writer),
            rows: 0,
        }
    }

    pub fn write(&mut self, rows: &[FrameRow]) -> Result<()> {
        for row in rows {
            self.csv.serialize(row)?;
        }
        self.rows += rows.len();
        Ok(())
    }

    pub fn rows_written(&self) -> usize {
        self.rows
    }

    pub fn flush(&mut self) -> Result<()> {
        self.csv.flush()?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{PlayerID, Vec3};

    #[test]
    fn rows() {
        let rows = vec![
            FrameRow::new(
                3,
                BodyID::Player(PlayerID(7)),
                BodyState {
                    position: Vec3::new(1.0, 2.0, 3.0),
                    rotation: Vec3::new(0.0, 180.0, 0.0),
                    clip_frame: Some(12),
                },
            ),
            FrameRow::new(
                3,
                BodyID::Ball,
                BodyState {
                    position: Vec3::new(0.5, 0.0, 0.0),
                    rotation: Vec3::new(0.0, 0.0, 0.0),
                    clip_frame: None,
                },
            ),
        ];
        let mut out = Vec::new();
        {
            let mut writer = RowWriter::new(&mut out);
            writer.write(&rows[..1]).unwrap();
            writer.write(&rows[1..]).unwrap();
            assert_eq!(writer.rows_written(), 2);
            writer.flush().unwrap();
        }
        assert_eq!(
            String::from_utf8(out).unwrap(),
            "frame,body,x,y,z,rot_x,rot_y,rot_z,clip_frame\n\
             3,player 7,1.0,2.0,3.0,0.0,180.0,0.0,12\n\
             3,ball,0.5,0.0,0.0,0.0,0.0,0.0,\n"
        );
    }
}
