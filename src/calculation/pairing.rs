//! Pairing of arrivals with departures.
//!
//! Bookings are placed on a single timeline relative to midnight of the
//! evaluated day: bookings dated on the previous day get negative minutes,
//! bookings on the next day get minutes of 1440 and above. Pairs crossing a
//! midnight are then attributed according to the schedule's
//! [`DayChangeBehavior`].

use std::collections::{BTreeMap, BTreeSet};

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use tracing::debug;
use uuid::Uuid;

use crate::error::{EngineError, EngineResult};
use crate::models::{
    BookingCategory, BookingEvent, BookingPair, DayChangeBehavior, Direction, MINUTES_PER_DAY,
    Minutes, PairBoundary, WarningCode, push_unique,
};

/// The pairs built for one evaluated day.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PairingResult {
    /// Pairs and segments credited to the evaluated day, ordered by start.
    pub pairs: Vec<BookingPair>,
    /// Pairs and segments belonging to the previous or next day.
    pub carried_pairs: Vec<BookingPair>,
    /// Arrivals on the evaluated day without a departure.
    pub unpaired_arrivals: Vec<Uuid>,
    /// Departures on the evaluated day without an arrival.
    pub unpaired_departures: Vec<Uuid>,
    /// Warnings raised while pairing.
    pub warnings: Vec<WarningCode>,
}

impl PairingResult {
    /// Credited pairs of one category.
    pub fn pairs_of(&self, category: BookingCategory) -> impl Iterator<Item = &BookingPair> {
        self.pairs.iter().filter(move |p| p.category == category)
    }

    /// Total duration of credited pairs of one category.
    pub fn duration_of(&self, category: BookingCategory) -> Minutes {
        self.pairs_of(category).map(|p| p.duration).sum()
    }
}

#[derive(Debug, Clone, Copy)]
struct Stamp {
    id: Uuid,
    direction: Direction,
    category: BookingCategory,
    minutes: Minutes,
    pair_id: Option<Uuid>,
}

impl Stamp {
    fn is_today(&self) -> bool {
        (0..MINUTES_PER_DAY).contains(&self.minutes)
    }
}

#[derive(Debug, Clone, Copy)]
struct Matched {
    arrival: Stamp,
    departure: Stamp,
    end: Minutes,
}

/// Places a booking time on the evaluated day's timeline.
///
/// Returns an error for bookings more than one day away from `date`.
pub fn relative_minutes(booking: &BookingEvent, time: Minutes, date: NaiveDate) -> EngineResult<Minutes> {
    let days = (booking.date - date).num_days();
    if !(-1..=1).contains(&days) {
        return Err(EngineError::InvalidBooking {
            booking_id: booking.id,
            message: format!(
                "booking dated {} is more than one day away from {}",
                booking.date, date
            ),
        });
    }
    Ok(days as Minutes * MINUTES_PER_DAY + time)
}

/// Pairs the bookings of one day.
///
/// `calculated` supplies normalized times; bookings missing from it use their
/// edited time. Explicit pairing references are honoured first, the rest is
/// paired chronologically per category.
///
/// # Example
///
/// ```
/// use std::collections::BTreeMap;
/// use chrono::NaiveDate;
/// use uuid::Uuid;
/// use worktime_engine::calculation::pair_bookings;
/// use worktime_engine::models::{BookingCategory, BookingEvent, DayChangeBehavior, Direction};
///
/// let date = NaiveDate::from_ymd_opt(2026, 3, 2).unwrap();
/// let employee = Uuid::new_v4();
/// let bookings = vec![
///     BookingEvent::new(employee, date, Direction::Arrival, BookingCategory::Work, 480).unwrap(),
///     BookingEvent::new(employee, date, Direction::Departure, BookingCategory::Work, 990).unwrap(),
/// ];
///
/// let result = pair_bookings(&bookings, &BTreeMap::new(), date, DayChangeBehavior::None).unwrap();
/// assert_eq!(result.pairs.len(), 1);
/// assert_eq!(result.pairs[0].duration, 510);
/// ```
pub fn pair_bookings(
    bookings: &[BookingEvent],
    calculated: &BTreeMap<Uuid, Minutes>,
    date: NaiveDate,
    behavior: DayChangeBehavior,
) -> EngineResult<PairingResult> {
    let mut stamps = Vec::with_capacity(bookings.len());
    for booking in bookings {
        let time = calculated
            .get(&booking.id)
            .copied()
            .unwrap_or_else(|| booking.edited_time());
        stamps.push(Stamp {
            id: booking.id,
            direction: booking.direction,
            category: booking.category,
            minutes: relative_minutes(booking, time, date)?,
            pair_id: booking.pair_id,
        });
    }
    stamps.sort_by_key(|s| (s.minutes, s.direction, s.id));

    let mut result = PairingResult::default();
    let mut used = BTreeSet::new();
    let mut matched = match_explicit(&stamps, &mut used, &mut result.warnings);
    matched.extend(match_chronological(&stamps, &mut used));
    matched.sort_by_key(|m| (m.arrival.minutes, m.arrival.id));

    for m in &matched {
        attribute_pair(m, behavior, &mut result);
    }

    let mut open: Vec<Stamp> = stamps
        .iter()
        .filter(|s| !used.contains(&s.id))
        .copied()
        .collect();

    if behavior == DayChangeBehavior::AutoComplete {
        auto_complete(&stamps, &mut open, &mut result);
    }

    for stamp in open.iter().filter(|s| s.is_today()) {
        match stamp.direction {
            Direction::Arrival => result.unpaired_arrivals.push(stamp.id),
            Direction::Departure => result.unpaired_departures.push(stamp.id),
        }
    }

    result.pairs.sort_by_key(|p| (p.start(), p.category));
    result.carried_pairs.sort_by_key(|p| (p.start(), p.category));

    debug!(
        date = %date,
        pairs = result.pairs.len(),
        carried = result.carried_pairs.len(),
        unpaired_arrivals = result.unpaired_arrivals.len(),
        unpaired_departures = result.unpaired_departures.len(),
        "Paired bookings"
    );

    Ok(result)
}

fn match_explicit(
    stamps: &[Stamp],
    used: &mut BTreeSet<Uuid>,
    warnings: &mut Vec<WarningCode>,
) -> Vec<Matched> {
    let by_id: BTreeMap<Uuid, &Stamp> = stamps.iter().map(|s| (s.id, s)).collect();
    let mut partner: BTreeMap<Uuid, Uuid> = BTreeMap::new();
    let mut matched = Vec::new();

    for stamp in stamps {
        let Some(target_id) = stamp.pair_id else {
            continue;
        };
        if partner.get(&stamp.id) == Some(&target_id) {
            continue;
        }
        let compatible = by_id.get(&target_id).filter(|target| {
            target.direction != stamp.direction
                && target.category == stamp.category
                && !used.contains(&target.id)
                && !used.contains(&stamp.id)
        });
        let Some(target) = compatible else {
            push_unique(warnings, WarningCode::IgnoredPairReference);
            continue;
        };

        let (arrival, departure) = match stamp.direction {
            Direction::Arrival => (*stamp, **target),
            Direction::Departure => (**target, *stamp),
        };
        // A linked departure recorded before its arrival ended on the next day.
        let end = if departure.minutes < arrival.minutes {
            departure.minutes + MINUTES_PER_DAY
        } else {
            departure.minutes
        };

        used.insert(arrival.id);
        used.insert(departure.id);
        partner.insert(arrival.id, departure.id);
        partner.insert(departure.id, arrival.id);
        matched.push(Matched {
            arrival,
            departure,
            end,
        });
    }

    matched
}

fn match_chronological(stamps: &[Stamp], used: &mut BTreeSet<Uuid>) -> Vec<Matched> {
    let mut matched = Vec::new();

    for category in [BookingCategory::Work, BookingCategory::Break] {
        let arrivals: Vec<Stamp> = stamps
            .iter()
            .filter(|s| s.category == category && s.direction == Direction::Arrival)
            .copied()
            .collect();

        for arrival in arrivals {
            if used.contains(&arrival.id) {
                continue;
            }
            let departure = stamps.iter().find(|s| {
                s.category == category
                    && s.direction == Direction::Departure
                    && s.minutes >= arrival.minutes
                    && !used.contains(&s.id)
            });
            if let Some(departure) = departure {
                used.insert(arrival.id);
                used.insert(departure.id);
                matched.push(Matched {
                    arrival,
                    departure: *departure,
                    end: departure.minutes,
                });
            }
        }
    }

    matched
}

fn attribute_pair(m: &Matched, behavior: DayChangeBehavior, result: &mut PairingResult) {
    let start = m.arrival.minutes;
    let end = m.end;
    let whole = BookingPair::closed(
        PairBoundary::booked(m.arrival.id, start),
        PairBoundary::booked(m.departure.id, end),
        m.arrival.category,
    );

    if start >= 0 && end <= MINUTES_PER_DAY {
        result.pairs.push(whole);
        return;
    }
    if end <= 0 || start >= MINUTES_PER_DAY {
        result.carried_pairs.push(whole);
        return;
    }

    push_unique(&mut result.warnings, WarningCode::CrossMidnight);

    match behavior {
        DayChangeBehavior::EvaluateAtArrival => {
            if (0..MINUTES_PER_DAY).contains(&start) {
                result.pairs.push(whole);
            } else {
                result.carried_pairs.push(whole);
            }
        }
        DayChangeBehavior::EvaluateAtDeparture => {
            if end > 0 && end <= MINUTES_PER_DAY {
                result.pairs.push(whole);
            } else {
                result.carried_pairs.push(whole);
            }
        }
        DayChangeBehavior::None | DayChangeBehavior::AutoComplete => {
            split_at_midnights(m, result);
        }
    }
}

fn split_at_midnights(m: &Matched, result: &mut PairingResult) {
    let category = m.arrival.category;
    let start = m.arrival.minutes;
    let end = m.end;

    let today_start = if start < 0 {
        result.carried_pairs.push(BookingPair::closed(
            PairBoundary::booked(m.arrival.id, start),
            PairBoundary::synthesized(0),
            category,
        ));
        PairBoundary::synthesized(0)
    } else {
        PairBoundary::booked(m.arrival.id, start)
    };

    let today_end = if end > MINUTES_PER_DAY {
        result.carried_pairs.push(BookingPair::closed(
            PairBoundary::synthesized(MINUTES_PER_DAY),
            PairBoundary::booked(m.departure.id, end),
            category,
        ));
        PairBoundary::synthesized(MINUTES_PER_DAY)
    } else {
        PairBoundary::booked(m.departure.id, end)
    };

    result
        .pairs
        .push(BookingPair::closed(today_start, today_end, category));
}

fn auto_complete(stamps: &[Stamp], open: &mut Vec<Stamp>, result: &mut PairingResult) {
    let today_work: Vec<&Stamp> = stamps
        .iter()
        .filter(|s| s.category == BookingCategory::Work && s.is_today())
        .collect();
    let (Some(first), Some(last)) = (today_work.first(), today_work.last()) else {
        return;
    };

    let trailing = open
        .iter()
        .position(|s| s.id == last.id && s.direction == Direction::Arrival);
    if let Some(index) = trailing {
        let arrival = open.remove(index);
        result.pairs.push(BookingPair::closed(
            PairBoundary::booked(arrival.id, arrival.minutes),
            PairBoundary::synthesized(MINUTES_PER_DAY),
            BookingCategory::Work,
        ));
        result.carried_pairs.push(BookingPair::open(
            PairBoundary::synthesized(MINUTES_PER_DAY),
            BookingCategory::Work,
        ));
        push_unique(&mut result.warnings, WarningCode::AutoCompleted);
    }

    let leading = open
        .iter()
        .position(|s| s.id == first.id && s.direction == Direction::Departure);
    if let Some(index) = leading {
        let departure = open.remove(index);
        result.pairs.push(BookingPair::closed(
            PairBoundary::synthesized(0),
            PairBoundary::booked(departure.id, departure.minutes),
            BookingCategory::Work,
        ));
        push_unique(&mut result.warnings, WarningCode::AutoCompleted);
    }
}
