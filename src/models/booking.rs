//! Booking events and the pairs built from them.
//!
//! A [`BookingEvent`] is a single clock-in or clock-out record. Its original
//! time is fixed when the event is created; corrections go to the edited time,
//! and the engine derives a calculated time from the edited one.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::{EngineError, EngineResult};

use super::clock::{LAST_MINUTE_OF_DAY, Minutes};

/// Whether a booking starts or ends a period.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Direction {
    /// Clock-in.
    Arrival,
    /// Clock-out.
    Departure,
}

/// What kind of period a booking delimits.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BookingCategory {
    /// Working time.
    Work,
    /// A manually booked break.
    Break,
}

/// Returns the minute value if it lies within a calendar day.
pub fn validate_minutes(booking_id: Uuid, minutes: Minutes) -> EngineResult<Minutes> {
    if (0..=LAST_MINUTE_OF_DAY).contains(&minutes) {
        Ok(minutes)
    } else {
        Err(EngineError::InvalidTime {
            booking_id,
            minutes,
        })
    }
}

/// A single clock-in or clock-out record.
///
/// # Example
///
/// ```
/// use worktime_engine::models::{BookingCategory, BookingEvent, Direction};
/// use chrono::NaiveDate;
/// use uuid::Uuid;
///
/// let date = NaiveDate::from_ymd_opt(2026, 3, 2).unwrap();
/// let mut booking = BookingEvent::new(
///     Uuid::new_v4(),
///     date,
///     Direction::Arrival,
///     BookingCategory::Work,
///     482,
/// )
/// .unwrap();
///
/// booking.set_calculated_time(480).unwrap();
/// booking.set_edited_time(475).unwrap();
///
/// assert_eq!(booking.original_time(), 482);
/// assert_eq!(booking.edited_time(), 475);
/// assert_eq!(booking.calculated_time(), None);
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BookingEvent {
    /// Unique identifier of the booking.
    pub id: Uuid,
    /// The employee who made the booking.
    pub employee_id: Uuid,
    /// The calendar date the booking was recorded on.
    pub date: NaiveDate,
    /// Clock-in or clock-out.
    pub direction: Direction,
    /// Work or break.
    pub category: BookingCategory,
    original_time: Minutes,
    edited_time: Minutes,
    #[serde(default)]
    calculated_time: Option<Minutes>,
    /// Explicit link to the counterpart booking, if the terminal recorded one.
    #[serde(default)]
    pub pair_id: Option<Uuid>,
}

impl BookingEvent {
    /// Creates a booking with a fresh ID; the edited time starts equal to the original.
    pub fn new(
        employee_id: Uuid,
        date: NaiveDate,
        direction: Direction,
        category: BookingCategory,
        time: Minutes,
    ) -> EngineResult<Self> {
        Self::with_id(Uuid::new_v4(), employee_id, date, direction, category, time)
    }

    /// Creates a booking with a caller-supplied ID.
    pub fn with_id(
        id: Uuid,
        employee_id: Uuid,
        date: NaiveDate,
        direction: Direction,
        category: BookingCategory,
        time: Minutes,
    ) -> EngineResult<Self> {
        let time = validate_minutes(id, time)?;
        Ok(Self {
            id,
            employee_id,
            date,
            direction,
            category,
            original_time: time,
            edited_time: time,
            calculated_time: None,
            pair_id: None,
        })
    }

    /// Links this booking to its counterpart.
    pub fn paired_with(mut self, other: Uuid) -> Self {
        self.pair_id = Some(other);
        self
    }

    /// The time as originally recorded. Never changes after creation.
    pub fn original_time(&self) -> Minutes {
        self.original_time
    }

    /// The time after manual corrections.
    pub fn edited_time(&self) -> Minutes {
        self.edited_time
    }

    /// The time derived by the engine, if one has been written back.
    pub fn calculated_time(&self) -> Option<Minutes> {
        self.calculated_time
    }

    /// Corrects the booking time. Any previously calculated time is discarded.
    pub fn set_edited_time(&mut self, minutes: Minutes) -> EngineResult<()> {
        let minutes = validate_minutes(self.id, minutes)?;
        if minutes != self.edited_time {
            self.edited_time = minutes;
            self.calculated_time = None;
        }
        Ok(())
    }

    /// Stores the engine's calculated time for this booking.
    pub fn set_calculated_time(&mut self, minutes: Minutes) -> EngineResult<()> {
        self.calculated_time = Some(validate_minutes(self.id, minutes)?);
        Ok(())
    }
}

/// One end of a [`BookingPair`].
///
/// `minutes` is relative to midnight of the evaluated day, so a boundary on
/// the previous day is negative and one on the next day is 1440 or more.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PairBoundary {
    /// The booking this boundary comes from; `None` when synthesized at midnight.
    pub booking_id: Option<Uuid>,
    /// Minutes relative to the evaluated day.
    pub minutes: Minutes,
}

impl PairBoundary {
    /// A boundary backed by a recorded booking.
    pub fn booked(booking_id: Uuid, minutes: Minutes) -> Self {
        Self {
            booking_id: Some(booking_id),
            minutes,
        }
    }

    /// A boundary synthesized at a day edge.
    pub fn synthesized(minutes: Minutes) -> Self {
        Self {
            booking_id: None,
            minutes,
        }
    }

    /// Returns true if no recorded booking stands behind this boundary.
    pub fn is_synthesized(&self) -> bool {
        self.booking_id.is_none()
    }
}

/// An arrival matched with its departure.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BookingPair {
    /// The start of the period.
    pub arrival: PairBoundary,
    /// The end of the period; `None` while still open.
    pub departure: Option<PairBoundary>,
    /// Work or break; both ends always share it.
    pub category: BookingCategory,
    /// Length of the period in minutes (0 when open).
    pub duration: Minutes,
}

impl BookingPair {
    /// Builds a closed pair, computing its duration.
    pub fn closed(arrival: PairBoundary, departure: PairBoundary, category: BookingCategory) -> Self {
        Self {
            arrival,
            departure: Some(departure),
            category,
            duration: (departure.minutes - arrival.minutes).max(0),
        }
    }

    /// Builds a pair whose departure has not happened yet.
    pub fn open(arrival: PairBoundary, category: BookingCategory) -> Self {
        Self {
            arrival,
            departure: None,
            category,
            duration: 0,
        }
    }

    /// Start minute relative to the evaluated day.
    pub fn start(&self) -> Minutes {
        self.arrival.minutes
    }

    /// End minute relative to the evaluated day, if closed.
    pub fn end(&self) -> Option<Minutes> {
        self.departure.map(|d| d.minutes)
    }

    /// Returns true if the pair has a departure.
    pub fn is_closed(&self) -> bool {
        self.departure.is_some()
    }
}
