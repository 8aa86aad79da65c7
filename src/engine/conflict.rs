use std::sync::Arc;

use chrono::{Datelike, NaiveDateTime};

use crate::model::*;

use super::error::{EngineError, SourceError};

/// Read side of the booking store as the conflict and availability
/// engines see it. The engines own no data and take whatever ordering the
/// source returns; injecting the source keeps them testable against
/// stubs, including failing ones.
pub trait BookingSource: Send + Sync {
    fn fetch_all_bookings(&self) -> Result<Vec<Booking>, SourceError>;
}

/// Boundary validation for caller-supplied windows. The scan itself is
/// garbage-in garbage-out; entry points run this first.
pub(crate) fn validate_interval(interval: &TimeInterval) -> Result<(), EngineError> {
    use crate::limits::*;
    if interval.end < interval.start {
        return Err(EngineError::InvalidInterval {
            start: interval.start,
            end: interval.end,
        });
    }
    if interval.start.year() < MIN_VALID_YEAR || interval.end.year() > MAX_VALID_YEAR {
        return Err(EngineError::LimitExceeded("timestamp out of range"));
    }
    if interval.duration() > chrono::Duration::days(MAX_BOOKING_DURATION_DAYS) {
        return Err(EngineError::LimitExceeded("booking window too wide"));
    }
    Ok(())
}

/// Advisory conflict checker over an injected booking source.
///
/// Read-only by contract: it takes no locks and blocks no writer, so two
/// concurrent checks can both come back clean for the same window. Any
/// stronger guarantee is the caller's policy, not this type's.
pub struct ConflictDetector {
    source: Arc<dyn BookingSource>,
}

impl ConflictDetector {
    pub fn new(source: Arc<dyn BookingSource>) -> Self {
        Self { source }
    }

    /// Every existing booking on `venue_id` whose window overlaps
    /// `[start, end]` under the inclusive-touch rule, paired with a
    /// human-readable reason per hit. A source failure propagates; this
    /// never converts an error into "no conflicts".
    pub fn check_booking_conflict(
        &self,
        venue_id: i32,
        start: NaiveDateTime,
        end: NaiveDateTime,
        exclude_booking_id: Option<i32>,
    ) -> Result<ConflictCheck, EngineError> {
        let bookings = self.source.fetch_all_bookings()?;
        // Literal, not new(): candidate ordering is the boundary's
        // problem and must not assert here.
        let candidate = TimeInterval { start, end };
        Ok(scan_conflicts(
            &bookings,
            venue_id,
            &candidate,
            exclude_booking_id,
        ))
    }

    pub fn is_venue_available(
        &self,
        venue_id: i32,
        start: NaiveDateTime,
        end: NaiveDateTime,
        exclude_booking_id: Option<i32>,
    ) -> Result<bool, EngineError> {
        let check = self.check_booking_conflict(venue_id, start, end, exclude_booking_id)?;
        Ok(!check.has_conflicts())
    }
}

/// Scan `bookings` in the order given, collecting every same-venue
/// overlap with `candidate`. Status is deliberately not consulted: a
/// PENDING booking occupies its window for conflict purposes.
/// `exclude_booking_id` skips the booking being edited so it cannot
/// conflict with itself.
pub(crate) fn scan_conflicts(
    bookings: &[Booking],
    venue_id: i32,
    candidate: &TimeInterval,
    exclude_booking_id: Option<i32>,
) -> ConflictCheck {
    let mut result = ConflictCheck::empty();
    for existing in bookings {
        if exclude_booking_id == Some(existing.id) {
            continue;
        }
        if existing.venue_id != venue_id {
            continue;
        }
        if existing.interval().overlaps(candidate) {
            result.reasons.push(conflict_reason(existing));
            result.conflicts.push(existing.clone());
        }
    }
    result
}

/// One line per hit, e.g.
/// `Venue already booked for Wedding from Jun 15, 2:00 PM to 4:00 PM`.
fn conflict_reason(existing: &Booking) -> String {
    format!(
        "Venue already booked for {} from {} to {}",
        existing.event_type,
        existing.start_datetime.format("%b %-d, %-I:%M %p"),
        existing.end_datetime.format("%-I:%M %p")
    )
}
