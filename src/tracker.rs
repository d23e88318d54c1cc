//! Control byte continuity tracking.
//!
//! Assumes a single beacon: two buttons passing the same filter interleave
//! their counters and will be reported as gaps or ignored.

use log::{info, warn};

use crate::messages::Reading;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Classification {
    /// First reading since start. Always accepted.
    Initial,
    Next,
    /// Counter moved forward by more than one without wrapping.
    Gap,
    /// 0xFF followed by 0x00.
    Wraparound,
    /// Duplicate, stale or backwards.
    Ignored,
}

impl Classification {
    pub fn emits_data(&self) -> bool {
        !matches!(self, Classification::Ignored)
    }

    pub fn emits_warning(&self) -> bool {
        matches!(self, Classification::Gap)
    }
}

pub fn classify(previous: Option<u8>, current: u8) -> Classification {
    let Some(previous) = previous else {
        return Classification::Initial;
    };

    if previous == u8::MAX {
        return if current == 0 {
            Classification::Wraparound
        } else {
            Classification::Ignored
        };
    }

    let expected = previous + 1;
    if current == expected {
        Classification::Next
    } else if current > expected {
        Classification::Gap
    } else {
        Classification::Ignored
    }
}

#[derive(Debug, Default)]
pub struct TrackerState {
    last_accepted: Option<Reading>,
}

impl TrackerState {
    pub fn initialized(&self) -> bool {
        self.last_accepted.is_some()
    }

    pub fn last_accepted(&self) -> Option<&Reading> {
        self.last_accepted.as_ref()
    }
}

#[derive(Debug, Default)]
pub struct SequenceTracker {
    state: TrackerState,
}

impl SequenceTracker {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn state(&self) -> &TrackerState {
        &self.state
    }

    /// Classifies `reading` and accepts it unless it is ignored.
    pub fn observe(&mut self, reading: &Reading) -> Classification {
        let previous = self.state.last_accepted.as_ref().map(|r| r.control_byte);
        let classification = classify(previous, reading.control_byte);

        match classification {
            Classification::Ignored => {
                info!("no new data");
                return classification;
            }
            Classification::Gap => {
                warn!(
                    "Control byte jumped from {:02X} to {:02X}, events may have been missed",
                    previous.unwrap_or_default(),
                    reading.control_byte
                );
            }
            _ => {}
        }

        self.state.last_accepted = Some(reading.clone());
        classification
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn run(sequence: &[u8]) -> Vec<Classification> {
        let mut tracker = SequenceTracker::new();
        sequence
            .iter()
            .map(|&control_byte| {
                tracker.observe(&Reading {
                    address: "C0:FF:EE:00:11:22".to_string(),
                    control_byte,
                    rssi: -40,
                })
            })
            .collect()
    }

    fn counts(classifications: &[Classification]) -> (usize, usize) {
        let data = classifications.iter().filter(|c| c.emits_data()).count();
        let warnings = classifications.iter().filter(|c| c.emits_warning()).count();
        (data, warnings)
    }

    #[test]
    fn test_consecutive() {
        let result = run(&[0x00, 0x01, 0x02]);
        assert_eq!(
            result,
            vec![Classification::Initial, Classification::Next, Classification::Next]
        );
        assert_eq!(counts(&result), (3, 0));
    }

    #[test]
    fn test_gap() {
        let result = run(&[0x00, 0x05]);
        assert_eq!(result, vec![Classification::Initial, Classification::Gap]);
        assert_eq!(counts(&result), (2, 1));
    }

    #[test]
    fn test_wraparound() {
        let result = run(&[0xFE, 0xFF, 0x00, 0x01]);
        assert_eq!(
            result,
            vec![
                Classification::Initial,
                Classification::Next,
                Classification::Wraparound,
                Classification::Next,
            ]
        );
        assert_eq!(counts(&result), (4, 0));
    }

    #[test]
    fn test_backwards_is_ignored() {
        let result = run(&[0x05, 0x03]);
        assert_eq!(result, vec![Classification::Initial, Classification::Ignored]);
        assert_eq!(counts(&result), (1, 0));
    }

    #[test]
    fn test_duplicate_is_ignored() {
        let result = run(&[0x10, 0x10, 0x10, 0x11, 0x11]);
        assert_eq!(counts(&result), (2, 0));
    }

    #[test]
    fn test_ignored_does_not_update_state() {
        let mut tracker = SequenceTracker::new();
        let reading = |control_byte| Reading {
            address: "a".to_string(),
            control_byte,
            rssi: 0,
        };
        tracker.observe(&reading(0x20));
        assert_eq!(tracker.observe(&reading(0x1F)), Classification::Ignored);
        assert_eq!(tracker.state().last_accepted().unwrap().control_byte, 0x20);
        assert_eq!(tracker.observe(&reading(0x21)), Classification::Next);
    }

    #[test]
    fn test_first_reading_any_value() {
        for value in [0x00, 0x7F, 0xFF] {
            assert_eq!(classify(None, value), Classification::Initial);
            assert!(!classify(None, value).emits_warning());
        }
    }

    #[test]
    fn test_exhaustive_table() {
        for previous in 0..=u8::MAX {
            for current in 0..=u8::MAX {
                let c = classify(Some(previous), current);
                let expected = if previous == 0xFF {
                    if current == 0 {
                        Classification::Wraparound
                    } else {
                        Classification::Ignored
                    }
                } else if u16::from(current) == u16::from(previous) + 1 {
                    Classification::Next
                } else if u16::from(current) > u16::from(previous) + 1 {
                    Classification::Gap
                } else {
                    Classification::Ignored
                };
                assert_eq!(c, expected, "{previous:02X} -> {current:02X}");
                // Never a warning without data.
                assert!(!c.emits_warning() || c.emits_data());
            }
        }
    }

    #[test]
    fn test_state_initialization() {
        let mut tracker = SequenceTracker::new();
        assert!(!tracker.state().initialized());
        tracker.observe(&Reading {
            address: "a".to_string(),
            control_byte: 9,
            rssi: 0,
        });
        assert!(tracker.state().initialized());
    }
}
