//! Toll ledger: open entries per plate and the append-only transaction log.
//!
//! Each confirmed plate toggles between outside and inside. The first sighting
//! opens an entry; the next one closes it and charges a fee by trip duration.

use crate::plate::Plate;
use serde::Serialize;
use std::collections::HashMap;
use std::time::{Duration, SystemTime};
use tracing::info;

/// Fee bands keyed by elapsed minutes. Upper bounds are inclusive.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TollSchedule {
    pub short_trip_minutes: f64,
    pub short_trip_fee: u32,
    pub medium_trip_minutes: f64,
    pub medium_trip_fee: u32,
    pub long_trip_fee: u32,
}

impl Default for TollSchedule {
    fn default() -> Self {
        Self {
            short_trip_minutes: 10.0,
            short_trip_fee: 20,
            medium_trip_minutes: 30.0,
            medium_trip_fee: 50,
            long_trip_fee: 100,
        }
    }
}

impl TollSchedule {
    pub fn fee_for(&self, elapsed_minutes: f64) -> u32 {
        if elapsed_minutes <= self.short_trip_minutes {
            self.short_trip_fee
        } else if elapsed_minutes <= self.medium_trip_minutes {
            self.medium_trip_fee
        } else {
            self.long_trip_fee
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VehicleRecord {
    pub plate: Plate,
    pub entry_time: SystemTime,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum TransactionKind {
    Entry,
    Exit,
}

#[derive(Debug, Clone, PartialEq)]
pub struct TollTransaction {
    pub plate: Plate,
    pub entry_time: SystemTime,
    pub exit_time: Option<SystemTime>,
    pub kind: TransactionKind,
    pub travel_time_minutes: Option<f64>,
    pub toll_amount: Option<u32>,
}

impl TollTransaction {
    /// Change this transaction makes to the number of vehicles inside.
    pub fn count_delta(&self) -> i64 {
        match self.kind {
            TransactionKind::Entry => 1,
            TransactionKind::Exit => -1,
        }
    }
}

#[derive(Debug, Default)]
pub struct TollLedger {
    schedule: TollSchedule,
    open: HashMap<Plate, VehicleRecord>,
    history: Vec<TollTransaction>,
}

impl TollLedger {
    pub fn new(schedule: TollSchedule) -> Self {
        Self {
            schedule,
            open: HashMap::new(),
            history: Vec::new(),
        }
    }

    pub fn process(&mut self, plate: Plate, now: SystemTime) -> TollTransaction {
        let transaction = match self.open.remove(&plate) {
            None => {
                self.open.insert(
                    plate.clone(),
                    VehicleRecord {
                        plate: plate.clone(),
                        entry_time: now,
                    },
                );
                info!(plate = %plate, "Entry recorded");
                TollTransaction {
                    plate,
                    entry_time: now,
                    exit_time: None,
                    kind: TransactionKind::Entry,
                    travel_time_minutes: None,
                    toll_amount: None,
                }
            }
            Some(record) => {
                let elapsed = now
                    .duration_since(record.entry_time)
                    .unwrap_or(Duration::ZERO);
                let minutes = elapsed.as_secs_f64() / 60.0;
                let toll = self.schedule.fee_for(minutes);
                info!(
                    plate = %plate,
                    travel_minutes = minutes,
                    toll = toll,
                    "Exit completed"
                );
                TollTransaction {
                    plate,
                    entry_time: record.entry_time,
                    exit_time: Some(now),
                    kind: TransactionKind::Exit,
                    travel_time_minutes: Some(round_to_cents(minutes)),
                    toll_amount: Some(toll),
                }
            }
        };

        self.history.push(transaction.clone());
        transaction
    }

    pub fn history(&self) -> &[TollTransaction] {
        &self.history
    }

    pub fn open_entries(&self) -> impl Iterator<Item = &VehicleRecord> {
        self.open.values()
    }

    pub fn is_inside(&self, plate: &Plate) -> bool {
        self.open.contains_key(plate)
    }
}

fn round_to_cents(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}
