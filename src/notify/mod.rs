//! Downstream notification of toll transactions.
//!
//! Notification is best effort: ledger state is already committed when a
//! notifier runs, and a failed delivery is only logged.

use crate::ledger::TollTransaction;
use std::fmt;
use tracing::warn;

pub mod remote;

pub use remote::{NotifyError, RemoteNotifier};

pub trait EventNotifier: Send + Sync + fmt::Debug {
    fn notify(&self, transaction: &TollTransaction) -> Result<(), NotifyError>;
}

/// Deliver a transaction if a notifier is configured, logging any failure.
pub fn dispatch(notifier: Option<&dyn EventNotifier>, transaction: &TollTransaction) {
    let Some(notifier) = notifier else {
        return;
    };
    if let Err(err) = notifier.notify(transaction) {
        warn!(
            plate = %transaction.plate,
            error = %err,
            "Failed to notify toll transaction"
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ledger::TransactionKind;
    use crate::plate::Plate;
    use std::sync::Mutex;
    use std::time::UNIX_EPOCH;

    #[derive(Debug, Default)]
    struct RecordingNotifier {
        seen: Mutex<Vec<String>>,
        fail: bool,
    }

    impl EventNotifier for RecordingNotifier {
        fn notify(&self, transaction: &TollTransaction) -> Result<(), NotifyError> {
            if let Ok(mut seen) = self.seen.lock() {
                seen.push(transaction.plate.to_string());
            }
            if self.fail {
                return Err(NotifyError::Rejected(503));
            }
            Ok(())
        }
    }

    fn entry() -> TollTransaction {
        TollTransaction {
            plate: Plate::parse("MH12AB1234").expect("valid plate"),
            entry_time: UNIX_EPOCH,
            exit_time: None,
            kind: TransactionKind::Entry,
            travel_time_minutes: None,
            toll_amount: None,
        }
    }

    #[test]
    fn dispatch_without_notifier_is_noop() {
        dispatch(None, &entry());
    }

    #[test]
    fn dispatch_delivers_and_swallows_failures() {
        let ok = RecordingNotifier::default();
        let failing = RecordingNotifier {
            fail: true,
            ..RecordingNotifier::default()
        };

        dispatch(Some(&ok), &entry());
        dispatch(Some(&failing), &entry());

        assert_eq!(ok.seen.lock().map(|s| s.len()).unwrap_or(0), 1);
        assert_eq!(failing.seen.lock().map(|s| s.len()).unwrap_or(0), 1);
    }
}
