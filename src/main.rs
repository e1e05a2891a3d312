use std::net::SocketAddr;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, RwLock};
use traffix_flow::api::{self, ApiContext};
use traffix_flow::error::AppError;
use traffix_flow::feed::{self, replay::ReplaySource};
use traffix_flow::notify::{EventNotifier, NotifyError, RemoteNotifier};
use traffix_flow::{config, state};

fn init_tracing(level: tracing::Level) {
    let subscriber = tracing_subscriber::fmt()
        .with_target(false)
        .with_max_level(level)
        .finish();
    let _ = tracing::subscriber::set_global_default(subscriber);
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let config_path = std::env::args()
        .nth(1)
        .unwrap_or_else(|| config::DEFAULT_CONFIG_PATH.to_string());
    let config = config::load_from_path(&config_path)?;
    init_tracing(config.log_level());
    tracing::info!(
        config_path = %config_path,
        app = %config.app.name,
        "traffix-flow starting"
    );

    let state = Arc::new(RwLock::new(state::AppState::new(
        config.debounce_settings(),
        config.toll_schedule(),
    )));

    let notifier = build_notifier(&config)?;
    spawn_status_watcher(&state)?;

    // Replay recorded detector output, if configured
    let stop_flag = Arc::new(AtomicBool::new(false));
    let _feed_handle = match config.replay_path() {
        Some(path) => match ReplaySource::open(path) {
            Ok(source) => {
                tracing::info!(
                    path = %path.display(),
                    interval_ms = config.frame_interval().as_millis(),
                    "Starting detection replay feed"
                );
                Some(feed::spawn_feed_thread(
                    source,
                    Arc::clone(&state),
                    config.frame_interval(),
                    Arc::clone(&stop_flag),
                    notifier.clone(),
                ))
            }
            Err(err) => {
                tracing::warn!(error = %err, "Replay feed not started");
                None
            }
        },
        None => {
            tracing::info!("No replay path configured, waiting for detections over HTTP");
            None
        }
    };

    let app = api::router(ApiContext {
        state: Arc::clone(&state),
        notifier,
        min_confidence: config.min_confidence(),
    });
    let port = config.server_port();
    let addr = SocketAddr::from(([0, 0, 0, 0], port));
    let listener = tokio::net::TcpListener::bind(addr).await?;
    tracing::info!(%addr, "API server listening");
    axum::serve(listener, app).await?;

    // Signal feed thread to stop
    stop_flag.store(true, Ordering::Relaxed);

    Ok(())
}

fn build_notifier(
    config: &config::Config,
) -> Result<Option<Arc<dyn EventNotifier>>, NotifyError> {
    let Some(endpoint) = config.notify_endpoint() else {
        return Ok(None);
    };
    let notifier: Arc<dyn EventNotifier> =
        Arc::new(RemoteNotifier::new(endpoint, config.notify_timeout())?);
    tracing::info!(
        endpoint = endpoint,
        timeout_ms = config.notify_timeout().as_millis(),
        "Toll transactions will be forwarded"
    );
    Ok(Some(notifier))
}

/// Log every change of the traffic label published by the status store.
fn spawn_status_watcher(state: &Arc<RwLock<state::AppState>>) -> Result<(), AppError> {
    let mut receiver = {
        let guard = state.read().map_err(|_| AppError::StateLock)?;
        guard.status().subscribe()
    };
    tokio::spawn(async move {
        let mut last = receiver.borrow_and_update().traffic_status;
        while receiver.changed().await.is_ok() {
            let current = receiver.borrow_and_update().traffic_status;
            if current != last {
                tracing::info!(from = ?last, to = ?current, "Traffic status changed");
                last = current;
            }
        }
    });
    Ok(())
}
