//! Detector output recorded as JSON lines, one frame per line:
//!
//! ```text
//! {"vehicle_count": 4, "plate_candidates": ["MH12AB1234"]}
//! ```

use crate::error::AppError;
use crate::feed::DetectionSource;
use crate::pipeline::DetectionReport;
use std::fs::File;
use std::io::{BufRead, BufReader, Lines};
use std::path::Path;
use tracing::warn;

pub struct ReplaySource<R> {
    lines: Lines<R>,
    line_number: usize,
}

impl ReplaySource<BufReader<File>> {
    pub fn open(path: impl AsRef<Path>) -> Result<Self, AppError> {
        let path = path.as_ref();
        let file = File::open(path)
            .map_err(|err| AppError::Feed(format!("open {}: {err}", path.display())))?;
        Ok(Self::from_reader(BufReader::new(file)))
    }
}

impl<R: BufRead> ReplaySource<R> {
    pub fn from_reader(reader: R) -> Self {
        Self {
            lines: reader.lines(),
            line_number: 0,
        }
    }
}

impl<R: BufRead> DetectionSource for ReplaySource<R> {
    fn next_report(&mut self) -> Result<Option<DetectionReport>, AppError> {
        for line in self.lines.by_ref() {
            self.line_number += 1;
            let line = line.map_err(|err| AppError::Feed(err.to_string()))?;
            let trimmed = line.trim();
            if trimmed.is_empty() {
                continue;
            }
            match serde_json::from_str::<DetectionReport>(trimmed) {
                Ok(report) => return Ok(Some(report)),
                Err(err) => {
                    warn!(
                        line = self.line_number,
                        error = %err,
                        "Skipping unreadable detection frame"
                    );
                }
            }
        }
        Ok(None)
    }
}
