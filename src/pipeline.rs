//! Core operations shared by the detection feed and the HTTP handlers.
//!
//! Each mutating operation takes the state write lock exactly once. Callers
//! notify downstream services from the returned outcome, after the lock has
//! been released.

use crate::error::AppError;
use crate::ledger::{TollTransaction, TransactionKind};
use crate::plate::Plate;
use crate::state::AppState;
use crate::status::{CurrentStatus, StatusUpdate, TollStatus, shift_count};
use crate::traffic::{Detection, TrafficStatus, VehicleCounts, count_vehicles, live_status};
use serde::Deserialize;
use std::sync::{Arc, RwLock};
use std::time::SystemTime;
use tracing::info;

/// One processing cycle worth of detector output.
#[derive(Debug, Clone, PartialEq, Eq, Default, Deserialize)]
pub struct DetectionReport {
    pub vehicle_count: u32,
    #[serde(default)]
    pub plate_candidates: Vec<String>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct DetectionOutcome {
    pub confirmed_plate: Option<Plate>,
    pub transaction: Option<TollTransaction>,
    pub status: CurrentStatus,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FrameAnalysis {
    pub counts: VehicleCounts,
    pub total: u32,
    pub traffic_status: TrafficStatus,
}

pub fn report_detection(
    state: &Arc<RwLock<AppState>>,
    report: &DetectionReport,
) -> Result<DetectionOutcome, AppError> {
    report_detection_at(state, report, SystemTime::now())
}

pub fn report_detection_at(
    state: &Arc<RwLock<AppState>>,
    report: &DetectionReport,
    now: SystemTime,
) -> Result<DetectionOutcome, AppError> {
    let mut guard = state.write().map_err(|_| AppError::StateLock)?;
    let (debouncer, ledger, status) = guard.parts_mut();

    let confirmed_plate = debouncer.offer_cycle(report.plate_candidates.as_slice());
    let transaction = confirmed_plate
        .clone()
        .map(|plate| ledger.process(plate, now));

    let mut update = StatusUpdate {
        vehicle_count: Some(report.vehicle_count),
        traffic_status: Some(live_status(report.vehicle_count)),
        ..StatusUpdate::default()
    };
    if let Some(transaction) = &transaction {
        info!(plate = %transaction.plate, kind = ?transaction.kind, "Plate confirmed");
        update = transaction_update(update, report.vehicle_count, transaction);
    }
    let status = status.merge(update);

    Ok(DetectionOutcome {
        confirmed_plate,
        transaction,
        status,
    })
}

/// Record a toll event for an already deduplicated plate, bypassing the
/// debouncer.
pub fn record_toll(
    state: &Arc<RwLock<AppState>>,
    plate_text: &str,
) -> Result<TollTransaction, AppError> {
    record_toll_at(state, plate_text, SystemTime::now())
}

pub fn record_toll_at(
    state: &Arc<RwLock<AppState>>,
    plate_text: &str,
    now: SystemTime,
) -> Result<TollTransaction, AppError> {
    let plate = Plate::parse(plate_text)?;

    let mut guard = state.write().map_err(|_| AppError::StateLock)?;
    let (_, ledger, status) = guard.parts_mut();
    let transaction = ledger.process(plate, now);
    let base_count = status.snapshot().vehicle_count;
    status.merge(transaction_update(
        StatusUpdate::default(),
        base_count,
        &transaction,
    ));

    Ok(transaction)
}

pub fn current_status(state: &Arc<RwLock<AppState>>) -> Result<CurrentStatus, AppError> {
    let guard = state.read().map_err(|_| AppError::StateLock)?;
    Ok(guard.status().snapshot())
}

pub fn toll_history(state: &Arc<RwLock<AppState>>) -> Result<Vec<TollTransaction>, AppError> {
    let guard = state.read().map_err(|_| AppError::StateLock)?;
    Ok(guard.ledger().history().to_vec())
}

pub fn update_status(
    state: &Arc<RwLock<AppState>>,
    update: StatusUpdate,
) -> Result<CurrentStatus, AppError> {
    let mut guard = state.write().map_err(|_| AppError::StateLock)?;
    let (_, _, status) = guard.parts_mut();
    Ok(status.merge(update))
}

/// Count one frame's detections and publish the live count and status.
pub fn analyze_frame(
    state: &Arc<RwLock<AppState>>,
    detections: &[Detection],
    min_confidence: f64,
) -> Result<FrameAnalysis, AppError> {
    let counts = count_vehicles(detections, min_confidence);
    let total = counts.total();
    let traffic_status = live_status(total);

    let mut guard = state.write().map_err(|_| AppError::StateLock)?;
    let (_, _, status) = guard.parts_mut();
    status.merge(StatusUpdate {
        vehicle_count: Some(total),
        traffic_status: Some(traffic_status),
        ..StatusUpdate::default()
    });

    Ok(FrameAnalysis {
        counts,
        total,
        traffic_status,
    })
}

fn transaction_update(
    update: StatusUpdate,
    base_count: u32,
    transaction: &TollTransaction,
) -> StatusUpdate {
    let toll_status = match transaction.kind {
        TransactionKind::Entry => TollStatus::EntryRecorded,
        TransactionKind::Exit => TollStatus::ExitCompleted,
    };
    StatusUpdate {
        vehicle_count: Some(shift_count(base_count, transaction.count_delta())),
        last_plate: Some(Some(transaction.plate.clone())),
        toll_status: Some(toll_status),
        ..update
    }
}
