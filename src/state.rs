use crate::debounce::{DebounceSettings, PlateDebouncer};
use crate::ledger::{TollLedger, TollSchedule};
use crate::status::StatusStore;

/// Everything the detection feed and the request handlers mutate. Held behind
/// one `RwLock` so each transition is a single critical section.
#[derive(Debug, Default)]
pub struct AppState {
    debouncer: PlateDebouncer,
    ledger: TollLedger,
    status: StatusStore,
}

impl AppState {
    pub fn new(debounce: DebounceSettings, schedule: TollSchedule) -> Self {
        Self {
            debouncer: PlateDebouncer::new(debounce),
            ledger: TollLedger::new(schedule),
            status: StatusStore::new(),
        }
    }

    pub fn debouncer(&self) -> &PlateDebouncer {
        &self.debouncer
    }

    pub fn ledger(&self) -> &TollLedger {
        &self.ledger
    }

    pub fn status(&self) -> &StatusStore {
        &self.status
    }

    /// Split borrow for transitions that touch every component at once.
    pub fn parts_mut(&mut self) -> (&mut PlateDebouncer, &mut TollLedger, &mut StatusStore) {
        (&mut self.debouncer, &mut self.ledger, &mut self.status)
    }
}
