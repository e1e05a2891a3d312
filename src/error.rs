use crate::plate::PlateError;
use crate::traffic::TrafficError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum AppError {
    #[error("invalid plate format: {0:?}")]
    InvalidPlateFormat(String),
    #[error("plate field missing from request")]
    MissingPlateField,
    #[error("failed to decode payload: {0}")]
    DecodeFailure(String),
    #[error("no readable frames found")]
    NoFrames,
    #[error("detection feed error: {0}")]
    Feed(String),
    #[error("state lock poisoned")]
    StateLock,
}

impl From<PlateError> for AppError {
    fn from(err: PlateError) -> Self {
        match err {
            PlateError::InvalidFormat(raw) => AppError::InvalidPlateFormat(raw),
        }
    }
}

impl From<TrafficError> for AppError {
    fn from(err: TrafficError) -> Self {
        match err {
            TrafficError::NoFrames => AppError::NoFrames,
        }
    }
}
