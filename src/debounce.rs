//! Plate event debouncing.
//!
//! The detector sees the same vehicle in many consecutive frames. After a
//! plate is confirmed, every plate is suppressed for `cooldown_cycles`
//! processing cycles, and the last `recent_capacity` confirmed plates are
//! never confirmed again until they age out of the recent set.

use crate::plate::Plate;
use std::collections::VecDeque;
use tracing::debug;

pub const DEFAULT_COOLDOWN_CYCLES: u32 = 40;
pub const DEFAULT_RECENT_CAPACITY: usize = 10;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DebounceSettings {
    pub cooldown_cycles: u32,
    pub recent_capacity: usize,
}

impl Default for DebounceSettings {
    fn default() -> Self {
        Self {
            cooldown_cycles: DEFAULT_COOLDOWN_CYCLES,
            recent_capacity: DEFAULT_RECENT_CAPACITY,
        }
    }
}

#[derive(Debug)]
pub struct PlateDebouncer {
    settings: DebounceSettings,
    recent: VecDeque<Plate>,
    cooldown: u32,
}

impl PlateDebouncer {
    pub fn new(settings: DebounceSettings) -> Self {
        Self {
            recent: VecDeque::with_capacity(settings.recent_capacity + 1),
            settings,
            cooldown: 0,
        }
    }

    /// Run one processing cycle over the candidate texts of a frame.
    ///
    /// A cycle under cooldown only advances the counter. Otherwise the first
    /// candidate that validates and is not in the recent set is confirmed and
    /// the rest of the frame is ignored.
    pub fn offer_cycle<S: AsRef<str>>(&mut self, candidates: &[S]) -> Option<Plate> {
        if self.cooldown > 0 {
            self.cooldown -= 1;
            return None;
        }

        for candidate in candidates {
            let plate = match Plate::parse(candidate.as_ref()) {
                Ok(plate) => plate,
                Err(err) => {
                    debug!(error = %err, "Rejected plate candidate");
                    continue;
                }
            };

            if self.recent.contains(&plate) {
                debug!(plate = %plate, "Suppressed recently seen plate");
                continue;
            }

            self.remember(plate.clone());
            self.cooldown = self.settings.cooldown_cycles;
            return Some(plate);
        }

        None
    }

    pub fn offer(&mut self, candidate: &str) -> Option<Plate> {
        self.offer_cycle(&[candidate])
    }

    /// Recently confirmed plates, oldest first.
    pub fn recent(&self) -> impl Iterator<Item = &Plate> {
        self.recent.iter()
    }

    pub fn cooldown(&self) -> u32 {
        self.cooldown
    }

    fn remember(&mut self, plate: Plate) {
        self.recent.push_back(plate);
        while self.recent.len() > self.settings.recent_capacity {
            self.recent.pop_front();
        }
    }
}

impl Default for PlateDebouncer {
    fn default() -> Self {
        Self::new(DebounceSettings::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn plate(raw: &str) -> Plate {
        Plate::parse(raw).expect("valid plate")
    }

    fn no_candidates() -> [&'static str; 0] {
        []
    }

    #[test]
    fn confirms_first_valid_candidate_and_skips_noise() {
        let mut debouncer = PlateDebouncer::default();

        let confirmed = debouncer.offer_cycle(&["XX##??", "DL3CA1001"]);

        assert_eq!(confirmed, Some(plate("DL3CA1001")));
        assert_eq!(debouncer.cooldown(), DEFAULT_COOLDOWN_CYCLES);
        assert_eq!(debouncer.recent().count(), 1);
    }

    #[test]
    fn only_one_plate_is_confirmed_per_cycle() {
        let mut debouncer = PlateDebouncer::default();

        let confirmed = debouncer.offer_cycle(&["MH12AB1234", "KA05MH1234"]);

        assert_eq!(confirmed, Some(plate("MH12AB1234")));
        assert_eq!(debouncer.recent().collect::<Vec<_>>(), vec![&plate("MH12AB1234")]);
    }

    #[test]
    fn repeat_within_cooldown_is_suppressed() {
        let mut debouncer = PlateDebouncer::default();

        assert!(debouncer.offer("MH12AB1234").is_some());
        assert_eq!(debouncer.offer("MH12AB1234"), None);
        assert_eq!(debouncer.cooldown(), DEFAULT_COOLDOWN_CYCLES - 1);
    }

    #[test]
    fn cooldown_advances_once_per_cycle_even_without_candidates() {
        let mut debouncer = PlateDebouncer::new(DebounceSettings {
            cooldown_cycles: 3,
            recent_capacity: 10,
        });
        assert!(debouncer.offer("MH12AB1234").is_some());

        assert_eq!(debouncer.offer_cycle(&no_candidates()), None);
        assert_eq!(debouncer.offer_cycle(&["KA05MH1234", "DL3CA1001"]), None);
        assert_eq!(debouncer.offer_cycle(&no_candidates()), None);
        assert_eq!(debouncer.cooldown(), 0);

        assert_eq!(debouncer.offer("KA05MH1234"), Some(plate("KA05MH1234")));
    }

    #[test]
    fn plate_in_recent_set_stays_suppressed_after_cooldown() {
        let mut debouncer = PlateDebouncer::new(DebounceSettings {
            cooldown_cycles: 0,
            recent_capacity: 10,
        });

        assert!(debouncer.offer("MH12AB1234").is_some());
        assert_eq!(debouncer.offer("mh 12 ab 1234"), None);
    }

    #[test]
    fn suppressed_duplicate_does_not_block_later_candidate_in_cycle() {
        let mut debouncer = PlateDebouncer::new(DebounceSettings {
            cooldown_cycles: 0,
            recent_capacity: 10,
        });
        assert!(debouncer.offer("MH12AB1234").is_some());

        let confirmed = debouncer.offer_cycle(&["MH12AB1234", "KA05MH1234"]);

        assert_eq!(confirmed, Some(plate("KA05MH1234")));
    }

    #[test]
    fn recent_set_is_bounded_with_fifo_eviction() {
        let mut debouncer = PlateDebouncer::new(DebounceSettings {
            cooldown_cycles: 0,
            recent_capacity: 10,
        });

        for n in 0..12 {
            let raw = format!("MH12AB{:04}", 1000 + n);
            assert!(debouncer.offer(&raw).is_some());
            assert!(debouncer.recent().count() <= 10);
        }

        let recent: Vec<&str> = debouncer.recent().map(Plate::as_str).collect();
        assert_eq!(recent.len(), 10);
        assert_eq!(recent.first(), Some(&"MH12AB1002"));
        assert_eq!(recent.last(), Some(&"MH12AB1011"));

        // The evicted oldest plate can be confirmed again.
        assert_eq!(debouncer.offer("MH12AB1000"), Some(plate("MH12AB1000")));
    }

    #[test]
    fn invalid_candidates_do_not_start_cooldown() {
        let mut debouncer = PlateDebouncer::default();

        assert_eq!(debouncer.offer_cycle(&["", "???", "12345"]), None);
        assert_eq!(debouncer.cooldown(), 0);
        assert_eq!(debouncer.recent().count(), 0);
    }
}
