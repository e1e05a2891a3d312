//! Traffic congestion classification.
//!
//! Two threshold policies coexist: one for single-frame/live counts and one
//! for totals aggregated over the sampled frames of a video.

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// COCO class ids the detector reports for vehicles.
pub const CLASS_CAR: u32 = 2;
pub const CLASS_BIKE: u32 = 3;
pub const CLASS_BUS: u32 = 5;
pub const CLASS_TRUCK: u32 = 7;

pub const DEFAULT_MIN_CONFIDENCE: f64 = 0.25;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
pub enum TrafficStatus {
    #[default]
    Normal,
    Moderate,
    Heavy,
}

/// Status for a live or single-frame count.
pub fn live_status(count: u32) -> TrafficStatus {
    if count < 5 {
        TrafficStatus::Normal
    } else if count <= 15 {
        TrafficStatus::Moderate
    } else {
        TrafficStatus::Heavy
    }
}

/// Status for a vehicle total summed over video frames.
pub fn aggregate_status(count: u32) -> TrafficStatus {
    if count < 10 {
        TrafficStatus::Normal
    } else if count < 30 {
        TrafficStatus::Moderate
    } else {
        TrafficStatus::Heavy
    }
}

/// One bounding box as reported by the object detector.
#[derive(Debug, Clone, Copy, PartialEq, Deserialize)]
pub struct Detection {
    pub class_id: u32,
    pub confidence: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
pub struct VehicleCounts {
    pub cars: u32,
    pub bikes: u32,
    pub buses: u32,
    pub trucks: u32,
}

impl VehicleCounts {
    pub fn total(&self) -> u32 {
        self.cars + self.bikes + self.buses + self.trucks
    }

    fn add(&mut self, other: &VehicleCounts) {
        self.cars += other.cars;
        self.bikes += other.bikes;
        self.buses += other.buses;
        self.trucks += other.trucks;
    }
}

/// Count vehicle detections above `min_confidence`; other classes are ignored.
pub fn count_vehicles(detections: &[Detection], min_confidence: f64) -> VehicleCounts {
    let mut counts = VehicleCounts::default();
    for detection in detections {
        if detection.confidence <= min_confidence {
            continue;
        }
        match detection.class_id {
            CLASS_CAR => counts.cars += 1,
            CLASS_BIKE => counts.bikes += 1,
            CLASS_BUS => counts.buses += 1,
            CLASS_TRUCK => counts.trucks += 1,
            _ => {}
        }
    }
    counts
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TrafficError {
    #[error("no readable frames to summarize")]
    NoFrames,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VideoSummary {
    pub counts: VehicleCounts,
    pub total: u32,
    pub traffic_status: TrafficStatus,
    pub processed_frames: usize,
}

pub fn summarize_frames(
    frames: &[Vec<Detection>],
    min_confidence: f64,
) -> Result<VideoSummary, TrafficError> {
    if frames.is_empty() {
        return Err(TrafficError::NoFrames);
    }

    let mut counts = VehicleCounts::default();
    for frame in frames {
        counts.add(&count_vehicles(frame, min_confidence));
    }
    let total = counts.total();

    Ok(VideoSummary {
        counts,
        total,
        traffic_status: aggregate_status(total),
        processed_frames: frames.len(),
    })
}
