use crate::plate::Plate;
use crate::traffic::TrafficStatus;
use serde::{Deserialize, Serialize};
use tokio::sync::watch;

/// Serialized in the same PascalCase as [`TrafficStatus`]. Producers also
/// send display labels ("Entry Recorded") and dash placeholders for "no
/// outcome yet"; those decode to the matching variant.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
pub enum TollStatus {
    #[default]
    #[serde(alias = "none", alias = "—", alias = "-", alias = "")]
    None,
    #[serde(alias = "Entry Recorded", alias = "entry_recorded")]
    EntryRecorded,
    #[serde(alias = "Exit Completed", alias = "exit_completed")]
    ExitCompleted,
    /// A producer forwarded a plate and has not seen the ledger outcome yet.
    #[serde(alias = "updated")]
    Updated,
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct CurrentStatus {
    pub vehicle_count: u32,
    pub traffic_status: TrafficStatus,
    pub last_plate: Option<Plate>,
    pub toll_status: TollStatus,
}

/// Fields a producer may overwrite. `None` keeps the stored value;
/// `last_plate: Some(None)` resets it to the sentinel.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct StatusUpdate {
    pub vehicle_count: Option<u32>,
    pub traffic_status: Option<TrafficStatus>,
    pub last_plate: Option<Option<Plate>>,
    pub toll_status: Option<TollStatus>,
}

/// Last-write-wins holder of the dashboard snapshot. Every committed change
/// is also published to watchers.
#[derive(Debug)]
pub struct StatusStore {
    current: CurrentStatus,
    current_tx: watch::Sender<CurrentStatus>,
}

impl StatusStore {
    pub fn new() -> Self {
        let (current_tx, _current_rx) = watch::channel(CurrentStatus::default());
        Self {
            current: CurrentStatus::default(),
            current_tx,
        }
    }

    pub fn snapshot(&self) -> CurrentStatus {
        self.current.clone()
    }

    pub fn subscribe(&self) -> watch::Receiver<CurrentStatus> {
        self.current_tx.subscribe()
    }

    pub fn merge(&mut self, update: StatusUpdate) -> CurrentStatus {
        if let Some(vehicle_count) = update.vehicle_count {
            self.current.vehicle_count = vehicle_count;
        }
        if let Some(traffic_status) = update.traffic_status {
            self.current.traffic_status = traffic_status;
        }
        if let Some(last_plate) = update.last_plate {
            self.current.last_plate = last_plate;
        }
        if let Some(toll_status) = update.toll_status {
            self.current.toll_status = toll_status;
        }
        self.publish()
    }

    fn publish(&self) -> CurrentStatus {
        self.current_tx.send_replace(self.current.clone());
        self.current.clone()
    }
}

/// Shift a vehicle count by a ledger delta, clamping at zero.
pub fn shift_count(count: u32, delta: i64) -> u32 {
    let shifted = i64::from(count).saturating_add(delta);
    shifted.clamp(0, i64::from(u32::MAX)) as u32
}

impl Default for StatusStore {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn plate(raw: &str) -> Plate {
        Plate::parse(raw).expect("valid plate")
    }

    #[test]
    fn toll_status_decodes_producer_labels_and_placeholders() -> serde_json::Result<()> {
        let labels = r#"["—", "-", "", "none", "Updated", "Entry Recorded", "ExitCompleted"]"#;
        let decoded: Vec<TollStatus> = serde_json::from_str(labels)?;

        assert_eq!(
            decoded,
            vec![
                TollStatus::None,
                TollStatus::None,
                TollStatus::None,
                TollStatus::None,
                TollStatus::Updated,
                TollStatus::EntryRecorded,
                TollStatus::ExitCompleted,
            ]
        );
        assert_eq!(serde_json::to_value(TollStatus::EntryRecorded)?, "EntryRecorded");
        Ok(())
    }

    #[test]
    fn merge_overwrites_only_present_fields() {
        let mut store = StatusStore::new();
        store.merge(StatusUpdate {
            vehicle_count: Some(7),
            traffic_status: Some(TrafficStatus::Moderate),
            last_plate: Some(Some(plate("MH12AB1234"))),
            toll_status: Some(TollStatus::EntryRecorded),
        });

        let merged = store.merge(StatusUpdate {
            vehicle_count: Some(2),
            ..StatusUpdate::default()
        });

        assert_eq!(
            merged,
            CurrentStatus {
                vehicle_count: 2,
                traffic_status: TrafficStatus::Moderate,
                last_plate: Some(plate("MH12AB1234")),
                toll_status: TollStatus::EntryRecorded,
            }
        );
    }

    #[test]
    fn last_plate_can_be_reset_to_sentinel() {
        let mut store = StatusStore::new();
        store.merge(StatusUpdate {
            last_plate: Some(Some(plate("MH12AB1234"))),
            ..StatusUpdate::default()
        });

        let merged = store.merge(StatusUpdate {
            last_plate: Some(None),
            ..StatusUpdate::default()
        });

        assert_eq!(merged.last_plate, None);
    }

    #[test]
    fn empty_update_keeps_snapshot() {
        let mut store = StatusStore::new();
        let before = store.merge(StatusUpdate {
            vehicle_count: Some(3),
            ..StatusUpdate::default()
        });

        assert_eq!(store.merge(StatusUpdate::default()), before);
    }

    #[test]
    fn count_shift_is_clamped() {
        assert_eq!(shift_count(0, -1), 0);
        assert_eq!(shift_count(0, 1), 1);
        assert_eq!(shift_count(3, -5), 0);
        assert_eq!(shift_count(u32::MAX, 1), u32::MAX);
    }

    #[test]
    fn merge_publishes_to_watchers() {
        let mut store = StatusStore::new();
        let receiver = store.subscribe();

        store.merge(StatusUpdate {
            traffic_status: Some(TrafficStatus::Heavy),
            ..StatusUpdate::default()
        });

        assert!(receiver.has_changed().unwrap_or(false));
        assert_eq!(receiver.borrow().traffic_status, TrafficStatus::Heavy);
    }

    #[test]
    fn merge_without_watchers_still_commits() {
        let mut store = StatusStore::new();

        store.merge(StatusUpdate {
            vehicle_count: Some(11),
            ..StatusUpdate::default()
        });

        assert_eq!(store.snapshot().vehicle_count, 11);
    }
}
