use crate::error::AppError;
use crate::notify::{self, EventNotifier};
use crate::pipeline::{DetectionOutcome, DetectionReport, report_detection};
use crate::state::AppState;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, RwLock};
use std::time::{Duration, Instant};
use tracing::{info, warn};

pub mod mock;
pub mod replay;

pub const DEFAULT_FRAME_INTERVAL: Duration = Duration::from_millis(40);

/// Producer of per-frame detector output.
pub trait DetectionSource {
    /// Next frame, or `None` once the source is exhausted.
    fn next_report(&mut self) -> Result<Option<DetectionReport>, AppError>;
}

/// Pull one frame from `source` and run it through the pipeline.
///
/// Returns `None` when the source is exhausted. Notification happens after the
/// state lock has been released.
pub fn run_cycle<S>(
    source: &mut S,
    state: &Arc<RwLock<AppState>>,
    notifier: Option<&dyn EventNotifier>,
) -> Result<Option<DetectionOutcome>, AppError>
where
    S: DetectionSource + ?Sized,
{
    let Some(report) = source.next_report()? else {
        return Ok(None);
    };
    let outcome = report_detection(state, &report)?;
    if let Some(transaction) = &outcome.transaction {
        notify::dispatch(notifier, transaction);
    }
    Ok(Some(outcome))
}

pub fn spawn_feed_thread<S>(
    mut source: S,
    state: Arc<RwLock<AppState>>,
    interval: Duration,
    stop: Arc<AtomicBool>,
    notifier: Option<Arc<dyn EventNotifier>>,
) -> std::thread::JoinHandle<()>
where
    S: DetectionSource + Send + 'static,
{
    std::thread::spawn(move || {
        let mut frames = 0u64;
        while !stop.load(Ordering::Relaxed) {
            let cycle_start = Instant::now();

            match run_cycle(&mut source, &state, notifier.as_deref()) {
                Ok(Some(_)) => frames += 1,
                Ok(None) => {
                    info!(frames, "Detection feed exhausted");
                    break;
                }
                Err(err) => {
                    warn!(error = %err, frames, "Detection feed stopped");
                    break;
                }
            }

            sleep_with_stop(interval, &stop, cycle_start);
        }
    })
}

fn sleep_with_stop(duration: Duration, stop: &AtomicBool, start: Instant) {
    let elapsed = start.elapsed();
    if elapsed >= duration {
        return;
    }
    let remaining = duration - elapsed;
    let step = Duration::from_millis(10).min(remaining);
    let mut slept = Duration::ZERO;

    while slept < remaining {
        if stop.load(Ordering::Relaxed) {
            break;
        }
        std::thread::sleep(step);
        slept += step;
    }
}
