use crate::ledger::TransactionKind;
use crate::status::TollStatus;
use crate::traffic::TrafficStatus;
use serde::Serialize;

/// Rendered in place of a plate when none has been seen yet.
pub const NO_PLATE: &str = "none";

#[derive(Debug, Serialize, PartialEq)]
#[serde(rename_all = "snake_case")]
pub struct StatusResponse {
    pub vehicle_count: u32,
    pub traffic_status: TrafficStatus,
    pub last_plate: String,
    pub toll_status: TollStatus,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "snake_case")]
pub struct StatusUpdatedResponse {
    pub message: String,
    pub data: StatusResponse,
}

#[derive(Debug, Serialize, PartialEq)]
#[serde(rename_all = "snake_case")]
pub struct TransactionResponse {
    pub vehicle_number: String,
    pub status: TransactionKind,
    pub entry_time: String,
    pub exit_time: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub travel_time_minutes: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub toll_amount: Option<u32>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "snake_case")]
pub struct HistoryResponse {
    pub transactions: Vec<TransactionResponse>,
    pub timestamp: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "snake_case")]
pub struct DetectionResponse {
    pub confirmed_plate: Option<String>,
    pub transaction: Option<TransactionResponse>,
    pub status: StatusResponse,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "snake_case")]
pub struct AnalyzeResponse {
    pub total_vehicles: u32,
    pub cars: u32,
    pub bikes: u32,
    pub buses: u32,
    pub trucks: u32,
    pub traffic_status: TrafficStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub processed_frames: Option<usize>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "snake_case")]
pub struct ErrorResponse {
    pub error_code: ErrorCode,
    pub error_message: String,
    pub timestamp: String,
}

#[derive(Debug, Serialize, PartialEq, Eq, Clone, Copy)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ErrorCode {
    InvalidPlateFormat,
    MissingPlateField,
    DecodeFailure,
    NoFrames,
    InternalError,
}
