//! ISO week numbers and the backwards week countdown used by the fallback search.

use std::fmt;

use chrono::{Datelike, FixedOffset, Utc};

/// An ISO-8601 week number, 1..=53.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Week(u8);

impl Week {
    pub fn new(n: u32) -> Option<Self> {
        if (1..=53).contains(&n) {
            Some(Week(n as u8))
        } else {
            None
        }
    }

    pub fn number(self) -> u32 {
        self.0 as u32
    }

    /// The previous week, wrapping 1 -> 53.
    ///
    /// The wraparound revisits high week numbers of the same year rather than
    /// crossing into the previous year. Upstream always publishes the full
    /// week range for recent years, so the search still terminates; callers
    /// must not "correct" this to a year decrement.
    pub fn prev(self) -> Week {
        if self.0 > 1 {
            Week(self.0 - 1)
        } else {
            Week(53)
        }
    }

    /// The current ISO week in America/Sao_Paulo (fixed UTC-3).
    pub fn current_sao_paulo() -> Week {
        let offset = FixedOffset::west_opt(3 * 3600).unwrap();
        let week = Utc::now().with_timezone(&offset).iso_week().week();
        Week(week as u8)
    }
}

impl fmt::Display for Week {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        // Upstream URLs take the week number without zero padding.
        write!(f, "{}", self.0)
    }
}

/// Iterator over the weeks probed in one fallback pass: `start`, then
/// successive `prev()` values, `attempts` items in total.
pub fn countdown(start: Week, attempts: u32) -> impl Iterator<Item = Week> {
    let mut next = start;
    (0..attempts).map(move |_| {
        let current = next;
        next = next.prev();
        current
    })
}

// -- Tests -------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use std::collections::HashSet;

    use super::*;

    #[test]
    fn should_reject_out_of_range_weeks() {
        assert!(Week::new(0).is_none());
        assert!(Week::new(54).is_none());
        assert_eq!(Week::new(1).unwrap().number(), 1);
        assert_eq!(Week::new(53).unwrap().number(), 53);
    }

    #[test]
    fn should_wrap_week_one_to_fifty_three() {
        assert_eq!(Week::new(1).unwrap().prev(), Week::new(53).unwrap());
    }

    #[test]
    fn should_decrement_all_other_weeks_by_one() {
        for w in 2..=53 {
            let week = Week::new(w).unwrap();
            assert_eq!(week.prev().number(), w - 1);
        }
    }

    #[test]
    fn should_count_down_with_wraparound() {
        let probed: Vec<u32> = countdown(Week::new(2).unwrap(), 4)
            .map(Week::number)
            .collect();
        assert_eq!(probed, vec![2, 1, 53, 52]);
    }

    #[test]
    fn should_probe_distinct_weeks_until_cycling() {
        // For any start and lookback L, the first min(L + 1, 53) probed
        // weeks are distinct; only after a full cycle do values repeat.
        for start in 1..=53 {
            let start = Week::new(start).unwrap();
            for lookback in [0u32, 5, 52, 60] {
                let probed: Vec<Week> = countdown(start, lookback + 1).collect();
                let distinct: HashSet<Week> =
                    probed.iter().take(53).copied().collect();
                assert_eq!(distinct.len() as u32, (lookback + 1).min(53));
            }
        }
    }

    #[test]
    fn should_display_without_padding() {
        assert_eq!(Week::new(7).unwrap().to_string(), "7");
        assert_eq!(Week::new(53).unwrap().to_string(), "53");
    }
}
