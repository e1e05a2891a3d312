use crate::error::AppError;
use crate::feed::DetectionSource;
use crate::pipeline::DetectionReport;
use std::collections::VecDeque;

/// Replays a fixed list of frames, optionally failing once they run out.
#[derive(Debug, Default)]
pub struct ScriptedSource {
    frames: VecDeque<DetectionReport>,
    fail_when_empty: bool,
}

impl ScriptedSource {
    pub fn new(frames: Vec<DetectionReport>) -> Self {
        Self {
            frames: frames.into(),
            fail_when_empty: false,
        }
    }

    pub fn failing_after(frames: Vec<DetectionReport>) -> Self {
        Self {
            frames: frames.into(),
            fail_when_empty: true,
        }
    }

    pub fn remaining(&self) -> usize {
        self.frames.len()
    }
}

impl DetectionSource for ScriptedSource {
    fn next_report(&mut self) -> Result<Option<DetectionReport>, AppError> {
        match self.frames.pop_front() {
            Some(frame) => Ok(Some(frame)),
            None if self.fail_when_empty => Err(AppError::Feed("scripted failure".to_string())),
            None => Ok(None),
        }
    }
}
