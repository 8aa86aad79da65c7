use std::sync::Arc;

use chrono::{NaiveDate, NaiveTime};

use crate::model::*;

use super::conflict::BookingSource;
use super::error::EngineError;

// ── Free-slot algorithm ───────────────────────────────────────────

fn hm(h: u32, m: u32) -> NaiveTime {
    NaiveTime::from_hms_opt(h, m, 0).expect("literal time is valid")
}

/// The daily open window free slots are carved from. Default
/// 09:00-21:00; windows crossing midnight are not supported.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BusinessHours {
    pub open: NaiveTime,
    pub close: NaiveTime,
}

impl Default for BusinessHours {
    fn default() -> Self {
        Self {
            open: hm(9, 0),
            close: hm(21, 0),
        }
    }
}

impl BusinessHours {
    /// Parse `HH:MM-HH:MM`, e.g. `09:00-21:00`. None unless both ends
    /// parse and close is after open.
    pub fn parse(s: &str) -> Option<Self> {
        let (open_s, close_s) = s.split_once('-')?;
        let open = NaiveTime::parse_from_str(open_s.trim(), "%H:%M").ok()?;
        let close = NaiveTime::parse_from_str(close_s.trim(), "%H:%M").ok()?;
        if close <= open {
            return None;
        }
        Some(Self { open, close })
    }

    pub fn window_on(&self, date: NaiveDate) -> TimeSlot {
        TimeSlot::new(date.and_time(self.open), date.and_time(self.close))
    }
}

/// Free gaps for one venue on one date: the business-hours window minus
/// every CONFIRMED booking that STARTS on that date. Pending bookings do
/// not consume slots (they still matter to the conflict checker), and a
/// booking running past midnight never shrinks the following day.
///
/// Each cut maps every current slot through [`TimeInterval::subtract`],
/// so the result stays chronological and non-overlapping; boundary
/// touches produce no zero-length slots.
pub fn free_slots(
    bookings: &[Booking],
    venue_id: i32,
    date: NaiveDate,
    hours: BusinessHours,
) -> Vec<TimeSlot> {
    let mut slots = vec![hours.window_on(date)];
    for booking in bookings {
        if booking.venue_id != venue_id
            || booking.start_date() != date
            || !booking.status.blocks_availability()
        {
            continue;
        }
        let cut = booking.interval();
        slots = slots.iter().flat_map(|slot| slot.subtract(&cut)).collect();
    }
    slots
}

/// Free-slot computation over an injected booking source.
pub struct SlotCalculator {
    source: Arc<dyn BookingSource>,
    hours: BusinessHours,
}

impl SlotCalculator {
    pub fn new(source: Arc<dyn BookingSource>, hours: BusinessHours) -> Self {
        Self { source, hours }
    }

    pub fn business_hours(&self) -> BusinessHours {
        self.hours
    }

    /// All free gaps for `venue_id` on `date`. A source failure
    /// propagates; it must never read as a fully free day.
    pub fn available_time_slots(
        &self,
        venue_id: i32,
        date: NaiveDate,
    ) -> Result<Vec<TimeSlot>, EngineError> {
        let bookings = self.source.fetch_all_bookings()?;
        Ok(free_slots(&bookings, venue_id, date, self.hours))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::error::SourceError;
    use chrono::NaiveDateTime;

    struct FixedSource(Vec<Booking>);

    impl BookingSource for FixedSource {
        fn fetch_all_bookings(&self) -> Result<Vec<Booking>, SourceError> {
            Ok(self.0.clone())
        }
    }

    struct FailingSource;

    impl BookingSource for FailingSource {
        fn fetch_all_bookings(&self) -> Result<Vec<Booking>, SourceError> {
            Err(SourceError("store offline".into()))
        }
    }

    fn d(day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2025, 6, day).unwrap()
    }

    fn dt(day: u32, h: u32, m: u32) -> NaiveDateTime {
        d(day).and_hms_opt(h, m, 0).unwrap()
    }

    fn slot(day: u32, sh: u32, eh: u32) -> TimeSlot {
        TimeSlot::new(dt(day, sh, 0), dt(day, eh, 0))
    }

    fn booking(id: i32, venue_id: i32, day: u32, sh: u32, eh: u32, status: BookingStatus) -> Booking {
        Booking {
            id,
            client_id: 1,
            venue_id,
            vendor_id: None,
            event_type: "Conference".into(),
            start_datetime: dt(day, sh, 0),
            end_datetime: dt(day, eh, 0),
            guest_count: 50,
            catering_required: false,
            budget: 2_000.0,
            notes: String::new(),
            status,
        }
    }

    // ── BusinessHours ─────────────────────────────────────

    #[test]
    fn default_window_is_nine_to_nine() {
        let hours = BusinessHours::default();
        assert_eq!(hours.window_on(d(15)), slot(15, 9, 21));
    }

    #[test]
    fn parse_accepts_hh_mm_pairs() {
        let hours = BusinessHours::parse("08:30-17:00").unwrap();
        assert_eq!(hours.open, hm(8, 30));
        assert_eq!(hours.close, hm(17, 0));
        assert!(BusinessHours::parse(" 09:00 - 21:00 ").is_some());
    }

    #[test]
    fn parse_rejects_inverted_or_garbage() {
        assert!(BusinessHours::parse("21:00-09:00").is_none());
        assert!(BusinessHours::parse("09:00-09:00").is_none());
        assert!(BusinessHours::parse("open-close").is_none());
        assert!(BusinessHours::parse("09:00").is_none());
    }

    // ── free_slots ────────────────────────────────────────

    #[test]
    fn empty_day_is_one_full_window() {
        let slots = free_slots(&[], 1, d(15), BusinessHours::default());
        assert_eq!(slots, vec![slot(15, 9, 21)]);
    }

    #[test]
    fn confirmed_booking_splits_window() {
        let bookings = vec![booking(1, 1, 15, 12, 13, BookingStatus::Confirmed)];
        let slots = free_slots(&bookings, 1, d(15), BusinessHours::default());
        assert_eq!(slots, vec![slot(15, 9, 12), slot(15, 13, 21)]);
    }

    #[test]
    fn pending_booking_leaves_window_whole() {
        let bookings = vec![booking(1, 1, 15, 12, 13, BookingStatus::Pending)];
        let slots = free_slots(&bookings, 1, d(15), BusinessHours::default());
        assert_eq!(slots, vec![slot(15, 9, 21)]);
    }

    #[test]
    fn lowercase_status_does_not_block() {
        let bookings = vec![booking(1, 1, 15, 12, 13, BookingStatus::parse("confirmed"))];
        let slots = free_slots(&bookings, 1, d(15), BusinessHours::default());
        assert_eq!(slots, vec![slot(15, 9, 21)]);
    }

    #[test]
    fn multiple_bookings_stay_chronological() {
        let bookings = vec![
            booking(1, 1, 15, 15, 17, BookingStatus::Confirmed),
            booking(2, 1, 15, 10, 11, BookingStatus::Confirmed),
        ];
        let slots = free_slots(&bookings, 1, d(15), BusinessHours::default());
        assert_eq!(
            slots,
            vec![slot(15, 9, 10), slot(15, 11, 15), slot(15, 17, 21)]
        );
    }

    #[test]
    fn source_order_does_not_change_slots() {
        let a = booking(1, 1, 15, 10, 11, BookingStatus::Confirmed);
        let b = booking(2, 1, 15, 14, 16, BookingStatus::Confirmed);
        let forward = free_slots(&[a.clone(), b.clone()], 1, d(15), BusinessHours::default());
        let reverse = free_slots(&[b, a], 1, d(15), BusinessHours::default());
        assert_eq!(forward, reverse);
    }

    #[test]
    fn booking_flush_with_open_edge() {
        let bookings = vec![booking(1, 1, 15, 9, 12, BookingStatus::Confirmed)];
        let slots = free_slots(&bookings, 1, d(15), BusinessHours::default());
        assert_eq!(slots, vec![slot(15, 12, 21)]);
    }

    #[test]
    fn booking_flush_with_close_edge() {
        let bookings = vec![booking(1, 1, 15, 18, 21, BookingStatus::Confirmed)];
        let slots = free_slots(&bookings, 1, d(15), BusinessHours::default());
        assert_eq!(slots, vec![slot(15, 9, 18)]);
    }

    #[test]
    fn covering_booking_empties_the_day() {
        let bookings = vec![booking(1, 1, 15, 8, 22, BookingStatus::Confirmed)];
        let slots = free_slots(&bookings, 1, d(15), BusinessHours::default());
        assert!(slots.is_empty());
    }

    #[test]
    fn booking_outside_window_changes_nothing() {
        let before = vec![booking(1, 1, 15, 7, 8, BookingStatus::Confirmed)];
        assert_eq!(
            free_slots(&before, 1, d(15), BusinessHours::default()),
            vec![slot(15, 9, 21)]
        );
        // Touching the open edge removes nothing and leaves no
        // zero-length fragment either.
        let touching = vec![booking(1, 1, 15, 7, 9, BookingStatus::Confirmed)];
        assert_eq!(
            free_slots(&touching, 1, d(15), BusinessHours::default()),
            vec![slot(15, 9, 21)]
        );
    }

    #[test]
    fn other_venue_ignored() {
        let bookings = vec![booking(1, 2, 15, 12, 13, BookingStatus::Confirmed)];
        let slots = free_slots(&bookings, 1, d(15), BusinessHours::default());
        assert_eq!(slots, vec![slot(15, 9, 21)]);
    }

    #[test]
    fn other_start_date_ignored() {
        let bookings = vec![booking(1, 1, 14, 12, 13, BookingStatus::Confirmed)];
        let slots = free_slots(&bookings, 1, d(15), BusinessHours::default());
        assert_eq!(slots, vec![slot(15, 9, 21)]);
    }

    #[test]
    fn midnight_crossing_booking_belongs_to_start_date() {
        let mut late = booking(1, 1, 14, 22, 23, BookingStatus::Confirmed);
        late.end_datetime = dt(15, 2, 0);
        let bookings = vec![late];
        // The 15th is untouched even though the booking ends inside it.
        assert_eq!(
            free_slots(&bookings, 1, d(15), BusinessHours::default()),
            vec![slot(15, 9, 21)]
        );
        // The 14th is: no contact with 09:00-21:00 (booking starts 22:00).
        assert_eq!(
            free_slots(&bookings, 1, d(14), BusinessHours::default()),
            vec![slot(14, 9, 21)]
        );
    }

    #[test]
    fn custom_hours_are_respected() {
        let hours = BusinessHours::parse("08:00-18:00").unwrap();
        let bookings = vec![booking(1, 1, 15, 8, 10, BookingStatus::Confirmed)];
        let slots = free_slots(&bookings, 1, d(15), hours);
        assert_eq!(slots, vec![slot(15, 10, 18)]);
    }

    // ── SlotCalculator ────────────────────────────────────

    #[test]
    fn calculator_end_to_end() {
        let source = Arc::new(FixedSource(vec![
            booking(1, 1, 15, 12, 13, BookingStatus::Confirmed),
            booking(2, 1, 15, 18, 19, BookingStatus::Pending),
        ]));
        let calc = SlotCalculator::new(source, BusinessHours::default());
        let slots = calc.available_time_slots(1, d(15)).unwrap();
        assert_eq!(slots, vec![slot(15, 9, 12), slot(15, 13, 21)]);
    }

    #[test]
    fn calculator_propagates_source_failure() {
        let calc = SlotCalculator::new(Arc::new(FailingSource), BusinessHours::default());
        let err = calc.available_time_slots(1, d(15)).unwrap_err();
        assert!(matches!(err, EngineError::DataAccess(_)));
    }
}
