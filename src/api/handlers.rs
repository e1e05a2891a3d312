use crate::api::ApiContext;
use crate::api::responses::{
    AnalyzeResponse, DetectionResponse, ErrorCode, ErrorResponse, HistoryResponse, NO_PLATE,
    StatusResponse, StatusUpdatedResponse, TransactionResponse,
};
use crate::error::AppError;
use crate::ledger::TollTransaction;
use crate::notify;
use crate::pipeline::{self, DetectionReport};
use crate::plate::Plate;
use crate::state::AppState;
use crate::status::{CurrentStatus, StatusUpdate, TollStatus, shift_count};
use crate::traffic::{self, Detection, TrafficStatus};
use axum::Json;
use axum::extract::State;
use axum::extract::rejection::JsonRejection;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::{Arc, RwLock};
use std::time::SystemTime;
use time::OffsetDateTime;
use time::format_description::well_known::Rfc3339;
use tracing::{error, info};

const INTERNAL_ERROR_MESSAGE: &str = "Internal server error";

#[derive(Debug)]
enum TimestampError {
    Format(time::error::Format),
}

impl fmt::Display for TimestampError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TimestampError::Format(err) => write!(f, "timestamp format error: {err}"),
        }
    }
}

pub enum ApiResponse<T> {
    Success(T),
    Error {
        status: StatusCode,
        body: ErrorResponse,
    },
}

impl<T: Serialize> IntoResponse for ApiResponse<T> {
    fn into_response(self) -> Response {
        match self {
            ApiResponse::Success(body) => (StatusCode::OK, Json(body)).into_response(),
            ApiResponse::Error { status, body } => (status, Json(body)).into_response(),
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct TollRequest {
    #[serde(default)]
    pub plate: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
pub struct StatusUpdateRequest {
    pub vehicle_count: Option<i64>,
    pub traffic_status: Option<TrafficStatus>,
    pub last_plate: Option<String>,
    pub toll_status: Option<TollStatus>,
}

#[derive(Debug, Deserialize)]
pub struct AnalyzeRequest {
    #[serde(default)]
    pub detections: Vec<Detection>,
}

#[derive(Debug, Deserialize)]
pub struct VideoAnalyzeRequest {
    #[serde(default)]
    pub frames: Vec<Vec<Detection>>,
}

pub async fn post_detection(
    State(ctx): State<ApiContext>,
    payload: Result<Json<DetectionReport>, JsonRejection>,
) -> impl IntoResponse {
    let (response, transaction) =
        build_detection_response(&ctx.state, decode(payload), SystemTime::now());
    spawn_notification(&ctx, transaction);
    response
}

pub async fn post_toll(
    State(ctx): State<ApiContext>,
    payload: Result<Json<TollRequest>, JsonRejection>,
) -> impl IntoResponse {
    let (response, transaction) =
        build_toll_response(&ctx.state, decode(payload), SystemTime::now());
    spawn_notification(&ctx, transaction);
    response
}

pub async fn get_status(State(ctx): State<ApiContext>) -> impl IntoResponse {
    build_status_response(&ctx.state)
}

pub async fn post_status(
    State(ctx): State<ApiContext>,
    payload: Result<Json<StatusUpdateRequest>, JsonRejection>,
) -> impl IntoResponse {
    build_status_update_response(&ctx.state, decode(payload))
}

pub async fn get_history(State(ctx): State<ApiContext>) -> impl IntoResponse {
    build_history_response(&ctx.state, SystemTime::now())
}

pub async fn post_analyze(
    State(ctx): State<ApiContext>,
    payload: Result<Json<AnalyzeRequest>, JsonRejection>,
) -> impl IntoResponse {
    build_analyze_response(&ctx.state, decode(payload), ctx.min_confidence)
}

pub async fn post_analyze_video(
    State(ctx): State<ApiContext>,
    payload: Result<Json<VideoAnalyzeRequest>, JsonRejection>,
) -> impl IntoResponse {
    build_video_response(decode(payload), ctx.min_confidence)
}

fn decode<T>(payload: Result<Json<T>, JsonRejection>) -> Result<T, AppError> {
    payload
        .map(|Json(body)| body)
        .map_err(|rejection| AppError::DecodeFailure(rejection.body_text()))
}

/// Delivery blocks on the network, so it runs off the async workers and
/// after every state lock has been released.
fn spawn_notification(ctx: &ApiContext, transaction: Option<TollTransaction>) {
    let (Some(notifier), Some(transaction)) = (ctx.notifier.clone(), transaction) else {
        return;
    };
    tokio::task::spawn_blocking(move || {
        notify::dispatch(Some(notifier.as_ref()), &transaction);
    });
}

fn build_detection_response(
    state: &Arc<RwLock<AppState>>,
    payload: Result<DetectionReport, AppError>,
    now: SystemTime,
) -> (ApiResponse<DetectionResponse>, Option<TollTransaction>) {
    let result = payload.and_then(|report| pipeline::report_detection_at(state, &report, now));
    let outcome = match result {
        Ok(outcome) => outcome,
        Err(err) => return (error_response(&err, "/api/detections"), None),
    };

    let transaction = match outcome.transaction.as_ref().map(map_transaction).transpose() {
        Ok(transaction) => transaction,
        Err(_) => {
            return (
                internal_error("timestamp formatting failure", "/api/detections"),
                outcome.transaction,
            );
        }
    };

    let response = ApiResponse::Success(DetectionResponse {
        confirmed_plate: outcome.confirmed_plate.map(|plate| plate.to_string()),
        transaction,
        status: map_status(&outcome.status),
    });
    (response, outcome.transaction)
}

fn build_toll_response(
    state: &Arc<RwLock<AppState>>,
    payload: Result<TollRequest, AppError>,
    now: SystemTime,
) -> (ApiResponse<TransactionResponse>, Option<TollTransaction>) {
    let plate_text = match payload.and_then(require_plate) {
        Ok(plate_text) => plate_text,
        Err(err) => return (error_response(&err, "/api/toll"), None),
    };

    let transaction = match pipeline::record_toll_at(state, &plate_text, now) {
        Ok(transaction) => transaction,
        Err(err) => return (error_response(&err, "/api/toll"), None),
    };
    info!(
        plate = %transaction.plate,
        kind = ?transaction.kind,
        toll = ?transaction.toll_amount,
        "Toll recorded via API"
    );

    match map_transaction(&transaction) {
        Ok(body) => (ApiResponse::Success(body), Some(transaction)),
        Err(_) => (
            internal_error("timestamp formatting failure", "/api/toll"),
            Some(transaction),
        ),
    }
}

fn require_plate(request: TollRequest) -> Result<String, AppError> {
    match request.plate {
        Some(plate) if !plate.trim().is_empty() => Ok(plate),
        _ => Err(AppError::MissingPlateField),
    }
}

fn build_status_response(state: &Arc<RwLock<AppState>>) -> ApiResponse<StatusResponse> {
    match pipeline::current_status(state) {
        Ok(status) => ApiResponse::Success(map_status(&status)),
        Err(err) => error_response(&err, "/api/status"),
    }
}

fn build_status_update_response(
    state: &Arc<RwLock<AppState>>,
    payload: Result<StatusUpdateRequest, AppError>,
) -> ApiResponse<StatusUpdatedResponse> {
    let result = payload
        .and_then(StatusUpdate::try_from)
        .and_then(|update| pipeline::update_status(state, update));
    match result {
        Ok(status) => ApiResponse::Success(StatusUpdatedResponse {
            message: "Status updated".to_string(),
            data: map_status(&status),
        }),
        Err(err) => error_response(&err, "/api/status"),
    }
}

impl TryFrom<StatusUpdateRequest> for StatusUpdate {
    type Error = AppError;

    fn try_from(request: StatusUpdateRequest) -> Result<Self, Self::Error> {
        let last_plate = match request.last_plate.as_deref().map(str::trim) {
            None => None,
            Some(text) if is_plate_sentinel(text) => Some(None),
            Some(text) => Some(Some(Plate::parse(text)?)),
        };
        Ok(StatusUpdate {
            vehicle_count: request.vehicle_count.map(|count| shift_count(0, count)),
            traffic_status: request.traffic_status,
            last_plate,
            toll_status: request.toll_status,
        })
    }
}

/// Producers reset the plate with an empty string, a dash or "none".
fn is_plate_sentinel(text: &str) -> bool {
    text.is_empty() || text == "—" || text == "-" || text.eq_ignore_ascii_case(NO_PLATE)
}

fn build_history_response(
    state: &Arc<RwLock<AppState>>,
    now: SystemTime,
) -> ApiResponse<HistoryResponse> {
    let history = match pipeline::toll_history(state) {
        Ok(history) => history,
        Err(err) => return error_response(&err, "/api/toll-history"),
    };

    let mapped: Result<Vec<_>, _> = history.iter().map(map_transaction).collect();
    match (mapped, format_timestamp(now)) {
        (Ok(transactions), Ok(timestamp)) => ApiResponse::Success(HistoryResponse {
            transactions,
            timestamp,
        }),
        _ => internal_error("timestamp formatting failure", "/api/toll-history"),
    }
}

fn build_analyze_response(
    state: &Arc<RwLock<AppState>>,
    payload: Result<AnalyzeRequest, AppError>,
    min_confidence: f64,
) -> ApiResponse<AnalyzeResponse> {
    let result = payload.and_then(|request| {
        pipeline::analyze_frame(state, &request.detections, min_confidence)
    });
    match result {
        Ok(analysis) => ApiResponse::Success(AnalyzeResponse {
            total_vehicles: analysis.total,
            cars: analysis.counts.cars,
            bikes: analysis.counts.bikes,
            buses: analysis.counts.buses,
            trucks: analysis.counts.trucks,
            traffic_status: analysis.traffic_status,
            processed_frames: None,
        }),
        Err(err) => error_response(&err, "/api/analyze"),
    }
}

fn build_video_response(
    payload: Result<VideoAnalyzeRequest, AppError>,
    min_confidence: f64,
) -> ApiResponse<AnalyzeResponse> {
    let result = payload.and_then(|request| {
        traffic::summarize_frames(&request.frames, min_confidence).map_err(AppError::from)
    });
    match result {
        Ok(summary) => ApiResponse::Success(AnalyzeResponse {
            total_vehicles: summary.total,
            cars: summary.counts.cars,
            bikes: summary.counts.bikes,
            buses: summary.counts.buses,
            trucks: summary.counts.trucks,
            traffic_status: summary.traffic_status,
            processed_frames: Some(summary.processed_frames),
        }),
        Err(err) => error_response(&err, "/api/analyze/video"),
    }
}

fn map_status(status: &CurrentStatus) -> StatusResponse {
    StatusResponse {
        vehicle_count: status.vehicle_count,
        traffic_status: status.traffic_status,
        last_plate: status
            .last_plate
            .as_ref()
            .map(Plate::to_string)
            .unwrap_or_else(|| NO_PLATE.to_string()),
        toll_status: status.toll_status,
    }
}

fn map_transaction(transaction: &TollTransaction) -> Result<TransactionResponse, TimestampError> {
    let exit_time = match transaction.exit_time {
        Some(exit_time) => Some(format_timestamp(exit_time)?),
        None => None,
    };
    Ok(TransactionResponse {
        vehicle_number: transaction.plate.to_string(),
        status: transaction.kind,
        entry_time: format_timestamp(transaction.entry_time)?,
        exit_time,
        travel_time_minutes: transaction.travel_time_minutes,
        toll_amount: transaction.toll_amount,
    })
}

fn error_response<T>(err: &AppError, route: &str) -> ApiResponse<T> {
    let (status, code, message) = match err {
        AppError::InvalidPlateFormat(raw) => (
            StatusCode::BAD_REQUEST,
            ErrorCode::InvalidPlateFormat,
            format!("Invalid plate format: {raw:?}"),
        ),
        AppError::MissingPlateField => (
            StatusCode::BAD_REQUEST,
            ErrorCode::MissingPlateField,
            "Plate not provided".to_string(),
        ),
        AppError::DecodeFailure(reason) => (
            StatusCode::BAD_REQUEST,
            ErrorCode::DecodeFailure,
            format!("Unreadable request body: {reason}"),
        ),
        AppError::NoFrames => (
            StatusCode::BAD_REQUEST,
            ErrorCode::NoFrames,
            "No readable frames found".to_string(),
        ),
        AppError::StateLock | AppError::Feed(_) => {
            return internal_error(&err.to_string(), route);
        }
    };

    ApiResponse::Error {
        status,
        body: ErrorResponse {
            error_code: code,
            error_message: message,
            timestamp: now_timestamp(),
        },
    }
}

fn internal_error<T>(message: &str, route: &str) -> ApiResponse<T> {
    error!(message = message, route = route, "Internal error while handling request");
    ApiResponse::Error {
        status: StatusCode::INTERNAL_SERVER_ERROR,
        body: ErrorResponse {
            error_code: ErrorCode::InternalError,
            error_message: INTERNAL_ERROR_MESSAGE.to_string(),
            timestamp: now_timestamp(),
        },
    }
}

fn now_timestamp() -> String {
    format_timestamp(SystemTime::now()).unwrap_or_else(|err| {
        error!(error = %err, "Failed to format error timestamp");
        OffsetDateTime::now_utc()
            .format(&Rfc3339)
            .unwrap_or_else(|_| "1970-01-01T00:00:00Z".to_string())
    })
}

fn format_timestamp(timestamp: SystemTime) -> Result<String, TimestampError> {
    let datetime = OffsetDateTime::from(timestamp);
    datetime.format(&Rfc3339).map_err(TimestampError::Format)
}
