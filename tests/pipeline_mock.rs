use std::sync::{Arc, RwLock};
use std::time::{Duration, UNIX_EPOCH};
use traffix_flow::debounce::DebounceSettings;
use traffix_flow::error::AppError;
use traffix_flow::feed::mock::ScriptedSource;
use traffix_flow::feed::run_cycle;
use traffix_flow::ledger::{TollSchedule, TransactionKind};
use traffix_flow::pipeline::{self, DetectionReport};
use traffix_flow::state::AppState;
use traffix_flow::status::TollStatus;
use traffix_flow::traffic::TrafficStatus;

fn frame(vehicle_count: u32, candidates: &[&str]) -> DetectionReport {
    DetectionReport {
        vehicle_count,
        plate_candidates: candidates.iter().map(|c| c.to_string()).collect(),
    }
}

#[test]
fn scripted_feed_debounces_repeated_sightings() -> Result<(), AppError> {
    // The same plate seen in consecutive frames, as a detector reports it.
    let mut frames = vec![frame(2, &["XX##??", "MH 12 AB 1234"])];
    frames.extend((0..5).map(|_| frame(2, &["MH12AB1234"])));
    let mut source = ScriptedSource::new(frames);
    let state = Arc::new(RwLock::new(AppState::default()));

    let mut confirmed = Vec::new();
    while let Some(outcome) = run_cycle(&mut source, &state, None)? {
        if let Some(plate) = outcome.confirmed_plate {
            confirmed.push(plate.to_string());
        }
    }

    assert_eq!(confirmed, vec!["MH12AB1234".to_string()]);
    assert_eq!(source.remaining(), 0);
    let history = pipeline::toll_history(&state)?;
    assert_eq!(history.len(), 1);
    assert_eq!(history[0].kind, TransactionKind::Entry);
    let status = pipeline::current_status(&state)?;
    assert_eq!(status.vehicle_count, 2);
    assert_eq!(status.toll_status, TollStatus::EntryRecorded);
    Ok(())
}

#[test]
fn vehicle_exits_after_cooldown_and_eviction() -> Result<(), AppError> {
    let state = Arc::new(RwLock::new(AppState::new(
        DebounceSettings {
            cooldown_cycles: 2,
            recent_capacity: 1,
        },
        TollSchedule::default(),
    )));
    let t0 = UNIX_EPOCH + Duration::from_secs(1_700_000_000);

    let entry = pipeline::report_detection_at(&state, &frame(1, &["MH12AB1234"]), t0)?;
    assert!(entry.transaction.is_some());

    // Two cooldown cycles, then another vehicle pushes the first out of the recent set.
    for _ in 0..2 {
        let outcome = pipeline::report_detection_at(&state, &frame(1, &["KA05MH1234"]), t0)?;
        assert!(outcome.confirmed_plate.is_none());
    }
    pipeline::report_detection_at(&state, &frame(2, &["KA05MH1234"]), t0)?;
    for _ in 0..2 {
        pipeline::report_detection_at(&state, &frame(2, &[]), t0)?;
    }

    let exit = pipeline::report_detection_at(
        &state,
        &frame(1, &["MH12AB1234"]),
        t0 + Duration::from_secs(20 * 60),
    )?;

    let transaction = exit.transaction.ok_or(AppError::Feed("expected exit".to_string()))?;
    assert_eq!(transaction.kind, TransactionKind::Exit);
    assert_eq!(transaction.toll_amount, Some(50));
    assert_eq!(exit.status.toll_status, TollStatus::ExitCompleted);
    assert_eq!(exit.status.traffic_status, TrafficStatus::Normal);
    assert_eq!(pipeline::toll_history(&state)?.len(), 3);
    Ok(())
}

#[test]
fn direct_toll_and_detection_share_one_ledger() -> Result<(), AppError> {
    let state = Arc::new(RwLock::new(AppState::default()));
    let t0 = UNIX_EPOCH;

    pipeline::report_detection_at(&state, &frame(5, &["DL3CA1001"]), t0)?;
    let exit =
        pipeline::record_toll_at(&state, "dl-3c-a-1001", t0 + Duration::from_secs(5 * 60))?;

    assert_eq!(exit.kind, TransactionKind::Exit);
    assert_eq!(exit.toll_amount, Some(20));
    let status = pipeline::current_status(&state)?;
    assert_eq!(status.vehicle_count, 5);
    assert_eq!(status.traffic_status, TrafficStatus::Moderate);
    Ok(())
}
