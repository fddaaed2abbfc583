//! Minute-of-day arithmetic and clock-time parsing.
//!
//! All times of day in the engine are plain minute offsets from midnight.
//! Configuration files may write them either as integers or as `"HH:MM"`
//! strings; both deserialize to the same value.

/// Minutes from midnight.
pub type Minutes = i32;

/// Minutes in one calendar day.
pub const MINUTES_PER_DAY: Minutes = 1440;

/// Highest valid booking time (23:59).
pub const LAST_MINUTE_OF_DAY: Minutes = MINUTES_PER_DAY - 1;

/// Parses an `"HH:MM"` clock time into minutes from midnight.
///
/// `"24:00"` is accepted as the end of the day.
///
/// # Example
///
/// ```
/// use worktime_engine::models::parse_clock;
///
/// assert_eq!(parse_clock("07:30"), Some(450));
/// assert_eq!(parse_clock("24:00"), Some(1440));
/// assert_eq!(parse_clock("7h30"), None);
/// ```
pub fn parse_clock(text: &str) -> Option<Minutes> {
    let (hours, minutes) = text.trim().split_once(':')?;
    let hours: Minutes = hours.parse().ok()?;
    let minutes: Minutes = minutes.parse().ok()?;

    if !(0..60).contains(&minutes) {
        return None;
    }
    let total = hours.checked_mul(60)?.checked_add(minutes)?;
    if (0..=MINUTES_PER_DAY).contains(&total) {
        Some(total)
    } else {
        None
    }
}

/// Formats minutes from midnight as `"HH:MM"`.
///
/// Negative values and values past the end of the day are rendered with a
/// day marker, e.g. `"-1d 22:00"` or `"+1d 06:00"`.
pub fn format_clock(minutes: Minutes) -> String {
    let day = minutes.div_euclid(MINUTES_PER_DAY);
    let within = minutes.rem_euclid(MINUTES_PER_DAY);
    let clock = format!("{:02}:{:02}", within / 60, within % 60);

    match day {
        0 => clock,
        1 if within == 0 => "24:00".to_string(),
        d if d > 0 => format!("+{}d {}", d, clock),
        d => format!("{}d {}", d, clock),
    }
}

/// Serde adapter accepting integer minutes or `"HH:MM"` strings.
pub(crate) mod serde_minutes {
    use serde::{Deserialize, Deserializer, Serializer, de};

    use super::{Minutes, parse_clock};

    #[derive(Deserialize)]
    #[serde(untagged)]
    enum RawMinutes {
        Number(i64),
        Text(String),
    }

    pub fn serialize<S: Serializer>(minutes: &Minutes, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_i32(*minutes)
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Minutes, D::Error> {
        match RawMinutes::deserialize(deserializer)? {
            RawMinutes::Number(n) => Minutes::try_from(n)
                .map_err(|_| de::Error::custom(format!("minute value out of range: {}", n))),
            RawMinutes::Text(text) => parse_clock(&text).ok_or_else(|| {
                de::Error::custom(format!("invalid clock time '{}', expected HH:MM", text))
            }),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde::Deserialize;

    #[test]
    fn test_parse_clock_accepts_padded_and_unpadded_hours() {
        assert_eq!(parse_clock("00:00"), Some(0));
        assert_eq!(parse_clock("8:05"), Some(485));
        assert_eq!(parse_clock("23:59"), Some(LAST_MINUTE_OF_DAY));
    }

    #[test]
    fn test_parse_clock_rejects_out_of_range() {
        assert_eq!(parse_clock("24:01"), None);
        assert_eq!(parse_clock("12:60"), None);
        assert_eq!(parse_clock("-1:00"), None);
        assert_eq!(parse_clock("noon"), None);
    }

    #[test]
    fn test_format_clock_within_day() {
        assert_eq!(format_clock(0), "00:00");
        assert_eq!(format_clock(450), "07:30");
        assert_eq!(format_clock(1440), "24:00");
    }

    #[test]
    fn test_format_clock_neighbouring_days() {
        assert_eq!(format_clock(-120), "-1d 22:00");
        assert_eq!(format_clock(1440 + 360), "+1d 06:00");
    }

    #[derive(Debug, Deserialize)]
    struct Wrapper {
        #[serde(with = "serde_minutes")]
        at: Minutes,
    }

    #[test]
    fn test_serde_minutes_reads_numbers_and_strings() {
        let numeric: Wrapper = serde_yaml::from_str("at: 480").unwrap();
        assert_eq!(numeric.at, 480);

        let text: Wrapper = serde_yaml::from_str("at: \"16:45\"").unwrap();
        assert_eq!(text.at, 1005);
    }

    #[test]
    fn test_serde_minutes_rejects_bad_text() {
        let result: Result<Wrapper, _> = serde_yaml::from_str("at: \"25:00\"");
        assert!(result.is_err());
    }
}
