// src/frame_source.rs
//
// Where frames come from. Camera capture and landmark extraction live
// outside this crate; the host feeds the engine through `FrameSource`.
// `ReplaySource` plays back a JSON-lines recording of detector output:
//
//   {"hands": [{"side": "Right", "landmarks": [{"x": .., "y": ..}, ...21]}]}
//   {"hands": []}        <- frame with no hand
//   null                 <- tick where the camera produced nothing

use crate::types::DetectedHand;
use anyhow::{Context, Result};
use serde::Deserialize;
use std::fs::File;
use std::io::{BufRead, BufReader, Lines};
use std::path::{Path, PathBuf};
use tracing::info;

#[derive(Debug, Clone)]
pub enum FramePoll {
    /// Detector output for one frame (possibly zero hands).
    Ready(Vec<DetectedHand>),
    /// Nothing this tick; try again next tick.
    Pending,
    /// The source is finished.
    Exhausted,
}

pub trait FrameSource: Send {
    /// An `Err` is a transient acquisition failure: skip the tick.
    fn poll(&mut self) -> Result<FramePoll>;
}

#[derive(Debug, Deserialize)]
struct RecordedFrame {
    #[serde(default)]
    hands: Vec<DetectedHand>,
}

pub struct ReplaySource {
    path: PathBuf,
    lines: Lines<BufReader<File>>,
    line_no: usize,
    loop_playback: bool,
}

impl ReplaySource {
    pub fn open(path: impl AsRef<Path>, loop_playback: bool) -> Result<Self> {
        let path = path.as_ref().to_path_buf();
        let lines = Self::open_lines(&path)?;
        info!("Replaying frames from {}", path.display());
        Ok(Self {
            path,
            lines,
            line_no: 0,
            loop_playback,
        })
    }

    fn open_lines(path: &Path) -> Result<Lines<BufReader<File>>> {
        let file = File::open(path)
            .with_context(|| format!("opening recording {}", path.display()))?;
        Ok(BufReader::new(file).lines())
    }
}

impl FrameSource for ReplaySource {
    fn poll(&mut self) -> Result<FramePoll> {
        let line = match self.lines.next() {
            Some(line) => line.with_context(|| format!("reading {}", self.path.display()))?,
            None if self.loop_playback && self.line_no > 0 => {
                self.lines = Self::open_lines(&self.path)?;
                self.line_no = 0;
                return Ok(FramePoll::Pending);
            }
            None => return Ok(FramePoll::Exhausted),
        };
        self.line_no += 1;

        let line = line.trim();
        if line.is_empty() {
            return Ok(FramePoll::Pending);
        }

        let frame: Option<RecordedFrame> = serde_json::from_str(line).with_context(|| {
            format!("parsing {} line {}", self.path.display(), self.line_no)
        })?;

        Ok(match frame {
            Some(frame) => FramePoll::Ready(frame.hands),
            None => FramePoll::Pending,
        })
    }
}
