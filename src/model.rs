use chrono::{NaiveDate, NaiveDateTime};
use serde::{Deserialize, Deserializer, Serialize, Serializer};

/// A wall-clock time range. No time zones: the whole system runs on one
/// implicit local clock (`chrono::NaiveDateTime`).
///
/// Overlap is INCLUSIVE at the boundaries: two ranges that merely touch
/// (one ends exactly where the other starts) count as overlapping, so
/// back-to-back bookings conflict. Subtraction, by contrast, treats a pure
/// touch as no contact, which is what keeps zero-length slots from ever
/// appearing. Both behaviors are load-bearing; change neither.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TimeInterval {
    pub start: NaiveDateTime,
    pub end: NaiveDateTime,
}

impl TimeInterval {
    pub fn new(start: NaiveDateTime, end: NaiveDateTime) -> Self {
        debug_assert!(start <= end, "TimeInterval start must not be after end");
        Self { start, end }
    }

    pub fn duration(&self) -> chrono::Duration {
        self.end - self.start
    }

    /// Inclusive-boundary overlap test: `[10:00, 12:00]` overlaps
    /// `[12:00, 13:00]`.
    pub fn overlaps(&self, other: &TimeInterval) -> bool {
        !(self.end < other.start || other.end < self.start)
    }

    /// Remove `cut` from `self`, returning what is left (0, 1, or 2
    /// pieces, in chronological order). A cut that only touches a
    /// boundary leaves `self` unchanged; strict comparisons below mean no
    /// zero-length piece is ever produced.
    pub fn subtract(&self, cut: &TimeInterval) -> Vec<TimeInterval> {
        if self.end < cut.start || self.start > cut.end {
            return vec![*self];
        }
        let mut rest = Vec::with_capacity(2);
        if self.start < cut.start {
            rest.push(TimeInterval::new(self.start, cut.start));
        }
        if self.end > cut.end {
            rest.push(TimeInterval::new(cut.end, self.end));
        }
        rest
    }

    /// Human form of the range's times, e.g. `2:00 PM - 4:00 PM`.
    pub fn time_range_label(&self) -> String {
        format!(
            "{} - {}",
            self.start.format("%-I:%M %p"),
            self.end.format("%-I:%M %p")
        )
    }
}

/// A free gap in a venue's day. Same shape as any other interval.
pub type TimeSlot = TimeInterval;

/// Booking lifecycle status. Stored and compared as its exact uppercase
/// string form; matching is case-sensitive, so a lowercase "confirmed"
/// arriving over the wire is carried verbatim but does not consume
/// availability.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BookingStatus {
    Pending,
    Confirmed,
    Conflict,
    Other(String),
}

impl BookingStatus {
    pub fn parse(s: &str) -> Self {
        match s {
            "PENDING" => BookingStatus::Pending,
            "CONFIRMED" => BookingStatus::Confirmed,
            "CONFLICT" => BookingStatus::Conflict,
            other => BookingStatus::Other(other.to_string()),
        }
    }

    pub fn as_str(&self) -> &str {
        match self {
            BookingStatus::Pending => "PENDING",
            BookingStatus::Confirmed => "CONFIRMED",
            BookingStatus::Conflict => "CONFLICT",
            BookingStatus::Other(s) => s,
        }
    }

    /// Only confirmed bookings consume free slots.
    pub fn blocks_availability(&self) -> bool {
        matches!(self, BookingStatus::Confirmed)
    }
}

impl Default for BookingStatus {
    fn default() -> Self {
        BookingStatus::Pending
    }
}

impl std::fmt::Display for BookingStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

// Serialized as its string form so WAL records and JSON notifications
// carry "PENDING"/"CONFIRMED" rather than an enum encoding.
impl Serialize for BookingStatus {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

impl<'de> Deserialize<'de> for BookingStatus {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        Ok(BookingStatus::parse(&s))
    }
}

// ── Entities ─────────────────────────────────────────────────────
//
// Ids are per-table auto-increment integers assigned by the store.

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Client {
    pub id: i32,
    pub name: String,
    pub email: String,
    pub phone: String,
    pub company: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Venue {
    pub id: i32,
    pub name: String,
    pub address: String,
    pub capacity: u32,
    pub price_per_hour: f64,
    pub amenities: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Vendor {
    pub id: i32,
    pub name: String,
    pub category: String,
    pub email: String,
    pub phone: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Booking {
    pub id: i32,
    pub client_id: i32,
    pub venue_id: i32,
    pub vendor_id: Option<i32>,
    pub event_type: String,
    pub start_datetime: NaiveDateTime,
    pub end_datetime: NaiveDateTime,
    pub guest_count: u32,
    pub catering_required: bool,
    pub budget: f64,
    pub notes: String,
    pub status: BookingStatus,
}

impl Booking {
    pub fn interval(&self) -> TimeInterval {
        TimeInterval::new(self.start_datetime, self.end_datetime)
    }

    /// The calendar day a booking occupies for slot math: its START date.
    /// A booking running past midnight does not shrink the next day.
    pub fn start_date(&self) -> NaiveDate {
        self.start_datetime.date()
    }
}

/// Booking fields as they arrive from a caller, before an id exists.
#[derive(Debug, Clone, PartialEq)]
pub struct BookingDraft {
    pub client_id: i32,
    pub venue_id: i32,
    pub vendor_id: Option<i32>,
    pub event_type: String,
    pub start_datetime: NaiveDateTime,
    pub end_datetime: NaiveDateTime,
    pub guest_count: u32,
    pub catering_required: bool,
    pub budget: f64,
    pub notes: String,
    pub status: BookingStatus,
}

impl BookingDraft {
    pub fn into_booking(self, id: i32) -> Booking {
        Booking {
            id,
            client_id: self.client_id,
            venue_id: self.venue_id,
            vendor_id: self.vendor_id,
            event_type: self.event_type,
            start_datetime: self.start_datetime,
            end_datetime: self.end_datetime,
            guest_count: self.guest_count,
            catering_required: self.catering_required,
            budget: self.budget,
            notes: self.notes,
            status: self.status,
        }
    }
}

// ── Partial updates ──────────────────────────────────────────────
//
// `None` means "keep the current value". The doubled Option on
// `vendor_id` distinguishes "not mentioned" from "set to NULL".

#[derive(Debug, Clone, Default, PartialEq)]
pub struct ClientPatch {
    pub name: Option<String>,
    pub email: Option<String>,
    pub phone: Option<String>,
    pub company: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct VenuePatch {
    pub name: Option<String>,
    pub address: Option<String>,
    pub capacity: Option<u32>,
    pub price_per_hour: Option<f64>,
    pub amenities: Option<Vec<String>>,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct VendorPatch {
    pub name: Option<String>,
    pub category: Option<String>,
    pub email: Option<String>,
    pub phone: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct BookingPatch {
    pub client_id: Option<i32>,
    pub venue_id: Option<i32>,
    pub vendor_id: Option<Option<i32>>,
    pub event_type: Option<String>,
    pub start_datetime: Option<NaiveDateTime>,
    pub end_datetime: Option<NaiveDateTime>,
    pub guest_count: Option<u32>,
    pub catering_required: Option<bool>,
    pub budget: Option<f64>,
    pub notes: Option<String>,
    pub status: Option<BookingStatus>,
}

// ── WAL events ───────────────────────────────────────────────────

/// The event types — one per entity mutation. This is the WAL record
/// format; `Added`/`Updated` carry the full row so replay is a plain
/// upsert. `BookingRemoved` keeps the venue id for change-feed routing.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Event {
    ClientAdded { client: Client },
    ClientUpdated { client: Client },
    ClientRemoved { id: i32 },
    VenueAdded { venue: Venue },
    VenueUpdated { venue: Venue },
    VenueRemoved { id: i32 },
    VendorAdded { vendor: Vendor },
    VendorUpdated { vendor: Vendor },
    VendorRemoved { id: i32 },
    BookingAdded { booking: Booking },
    BookingUpdated { booking: Booking },
    BookingRemoved { id: i32, venue_id: i32 },
}

impl Event {
    /// The venue whose change feed should carry this event, if any.
    /// Non-booking events are not published.
    pub fn venue_channel(&self) -> Option<i32> {
        match self {
            Event::BookingAdded { booking } | Event::BookingUpdated { booking } => {
                Some(booking.venue_id)
            }
            Event::BookingRemoved { venue_id, .. } => Some(*venue_id),
            _ => None,
        }
    }
}

// ── Query result types ───────────────────────────────────────────

/// Outcome of a conflict check. `conflicts` and `reasons` are parallel:
/// `reasons[i]` explains `conflicts[i]`, both in the order the bookings
/// were scanned. A clean check has two empty lists.
#[derive(Debug, Clone, PartialEq)]
pub struct ConflictCheck {
    pub conflicts: Vec<Booking>,
    pub reasons: Vec<String>,
}

impl ConflictCheck {
    pub fn empty() -> Self {
        Self {
            conflicts: Vec::new(),
            reasons: Vec::new(),
        }
    }

    pub fn has_conflicts(&self) -> bool {
        !self.conflicts.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn dt(d: u32, h: u32, m: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2025, 6, d)
            .unwrap()
            .and_hms_opt(h, m, 0)
            .unwrap()
    }

    fn ti(sh: u32, sm: u32, eh: u32, em: u32) -> TimeInterval {
        TimeInterval::new(dt(15, sh, sm), dt(15, eh, em))
    }

    #[test]
    fn overlap_basic() {
        let a = ti(10, 0, 12, 0);
        assert!(a.overlaps(&ti(11, 0, 13, 0)));
        assert!(ti(11, 0, 13, 0).overlaps(&a));
        assert!(!a.overlaps(&ti(7, 0, 8, 0)));
    }

    #[test]
    fn overlap_inclusive_at_boundaries() {
        // Touching ranges conflict in both directions.
        let a = ti(10, 0, 12, 0);
        assert!(a.overlaps(&ti(12, 0, 13, 0)));
        assert!(a.overlaps(&ti(8, 0, 10, 0)));
    }

    #[test]
    fn overlap_contained() {
        let outer = ti(9, 0, 21, 0);
        let inner = ti(12, 0, 13, 0);
        assert!(outer.overlaps(&inner));
        assert!(inner.overlaps(&outer));
    }

    #[test]
    fn overlap_zero_length_candidate() {
        let a = ti(10, 0, 12, 0);
        let instant = TimeInterval::new(dt(15, 11, 0), dt(15, 11, 0));
        assert!(a.overlaps(&instant));
        // A zero-length range touching the end boundary still counts.
        let edge = TimeInterval::new(dt(15, 12, 0), dt(15, 12, 0));
        assert!(a.overlaps(&edge));
    }

    #[test]
    fn subtract_no_contact() {
        let slot = ti(9, 0, 12, 0);
        assert_eq!(slot.subtract(&ti(13, 0, 14, 0)), vec![slot]);
        assert_eq!(slot.subtract(&ti(7, 0, 8, 0)), vec![slot]);
    }

    #[test]
    fn subtract_fully_covered() {
        let slot = ti(10, 0, 11, 0);
        assert!(slot.subtract(&ti(9, 0, 12, 0)).is_empty());
        assert!(slot.subtract(&slot).is_empty());
    }

    #[test]
    fn subtract_cut_inside_splits() {
        let slot = ti(9, 0, 21, 0);
        let pieces = slot.subtract(&ti(12, 0, 13, 0));
        assert_eq!(pieces, vec![ti(9, 0, 12, 0), ti(13, 0, 21, 0)]);
    }

    #[test]
    fn subtract_overlapping_start() {
        let slot = ti(9, 0, 12, 0);
        assert_eq!(slot.subtract(&ti(8, 0, 10, 0)), vec![ti(10, 0, 12, 0)]);
    }

    #[test]
    fn subtract_overlapping_end() {
        let slot = ti(9, 0, 12, 0);
        assert_eq!(slot.subtract(&ti(11, 0, 14, 0)), vec![ti(9, 0, 11, 0)]);
    }

    #[test]
    fn subtract_touch_leaves_slot_whole() {
        // A cut ending exactly at the slot start (or starting at its end)
        // removes nothing and emits no zero-length fragment.
        let slot = ti(13, 0, 21, 0);
        assert_eq!(slot.subtract(&ti(12, 0, 13, 0)), vec![slot]);
        let earlier = ti(9, 0, 12, 0);
        assert_eq!(earlier.subtract(&ti(12, 0, 13, 0)), vec![earlier]);
    }

    #[test]
    fn subtract_aligned_edges() {
        let slot = ti(9, 0, 21, 0);
        assert_eq!(slot.subtract(&ti(9, 0, 12, 0)), vec![ti(12, 0, 21, 0)]);
        assert_eq!(slot.subtract(&ti(18, 0, 21, 0)), vec![ti(9, 0, 18, 0)]);
    }

    #[test]
    fn status_parse_exact() {
        assert_eq!(BookingStatus::parse("PENDING"), BookingStatus::Pending);
        assert_eq!(BookingStatus::parse("CONFIRMED"), BookingStatus::Confirmed);
        assert_eq!(BookingStatus::parse("CONFLICT"), BookingStatus::Conflict);
        assert_eq!(
            BookingStatus::parse("cancelled"),
            BookingStatus::Other("cancelled".into())
        );
    }

    #[test]
    fn status_matching_is_case_sensitive() {
        let lower = BookingStatus::parse("confirmed");
        assert!(!lower.blocks_availability());
        assert!(BookingStatus::Confirmed.blocks_availability());
        assert!(!BookingStatus::Pending.blocks_availability());
    }

    #[test]
    fn status_string_roundtrip() {
        for s in ["PENDING", "CONFIRMED", "CONFLICT", "weird"] {
            assert_eq!(BookingStatus::parse(s).as_str(), s);
        }
    }

    #[test]
    fn time_range_label_format() {
        let slot = ti(14, 0, 16, 30);
        assert_eq!(slot.time_range_label(), "2:00 PM - 4:30 PM");
        let morning = ti(9, 5, 11, 0);
        assert_eq!(morning.time_range_label(), "9:05 AM - 11:00 AM");
    }

    #[test]
    fn booking_interval_and_start_date() {
        let b = Booking {
            id: 1,
            client_id: 1,
            venue_id: 1,
            vendor_id: None,
            event_type: "Wedding".into(),
            start_datetime: dt(15, 22, 0),
            end_datetime: dt(16, 2, 0),
            guest_count: 120,
            catering_required: true,
            budget: 15000.0,
            notes: String::new(),
            status: BookingStatus::Confirmed,
        };
        assert_eq!(b.interval(), TimeInterval::new(dt(15, 22, 0), dt(16, 2, 0)));
        // Crosses midnight but belongs to the 15th.
        assert_eq!(b.start_date(), NaiveDate::from_ymd_opt(2025, 6, 15).unwrap());
    }

    #[test]
    fn event_serialization_roundtrip() {
        let event = Event::BookingAdded {
            booking: Booking {
                id: 7,
                client_id: 2,
                venue_id: 3,
                vendor_id: Some(4),
                event_type: "Conference".into(),
                start_datetime: dt(20, 9, 0),
                end_datetime: dt(20, 17, 0),
                guest_count: 300,
                catering_required: false,
                budget: 5000.5,
                notes: "AV setup at 8".into(),
                status: BookingStatus::Pending,
            },
        };
        let bytes = bincode::serialize(&event).unwrap();
        let decoded: Event = bincode::deserialize(&bytes).unwrap();
        assert_eq!(event, decoded);
    }

    #[test]
    fn event_venue_channel_routing() {
        let removed = Event::BookingRemoved { id: 9, venue_id: 3 };
        assert_eq!(removed.venue_channel(), Some(3));
        let client = Event::ClientRemoved { id: 1 };
        assert_eq!(client.venue_channel(), None);
    }
}
