//! Interval overlap shared by breaks, capping and surcharges.

use crate::models::Minutes;

/// Minutes shared by the half-open intervals `[s1, e1)` and `[s2, e2)`.
///
/// # Example
///
/// ```
/// use worktime_engine::calculation::overlap;
///
/// assert_eq!(overlap(480, 720, 600, 660), 60);
/// assert_eq!(overlap(480, 600, 600, 660), 0);
/// assert_eq!(overlap(700, 600, 0, 1440), 0);
/// ```
pub fn overlap(s1: Minutes, e1: Minutes, s2: Minutes, e2: Minutes) -> Minutes {
    (e1.min(e2) - s1.max(s2)).max(0)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_contained_interval() {
        assert_eq!(overlap(0, 1440, 720, 750), 30);
        assert_eq!(overlap(720, 750, 0, 1440), 30);
    }

    #[test]
    fn test_partial_overlap() {
        assert_eq!(overlap(480, 720, 690, 780), 30);
    }

    #[test]
    fn test_disjoint_and_touching_intervals() {
        assert_eq!(overlap(0, 100, 200, 300), 0);
        assert_eq!(overlap(0, 100, 100, 300), 0);
    }

    #[test]
    fn test_negative_minutes_from_previous_day() {
        assert_eq!(overlap(-120, 360, 0, 1440), 360);
    }
}
