use chrono::{Datelike, NaiveDate, NaiveDateTime};

use crate::limits::{MAX_VALID_YEAR, MIN_VALID_YEAR};
use crate::model::*;

use super::conflict::validate_interval;
use super::{Engine, EngineError};

impl Engine {
    pub fn list_clients(&self) -> Vec<Client> {
        self.directory.clients_sorted()
    }

    pub fn get_client(&self, id: i32) -> Option<Client> {
        self.directory.get_client(id)
    }

    pub fn list_venues(&self) -> Vec<Venue> {
        self.directory.venues_sorted()
    }

    pub fn get_venue(&self, id: i32) -> Option<Venue> {
        self.directory.get_venue(id)
    }

    pub fn list_vendors(&self) -> Vec<Vendor> {
        self.directory.vendors_sorted()
    }

    pub fn get_vendor(&self, id: i32) -> Option<Vendor> {
        self.directory.get_vendor(id)
    }

    /// Bookings newest-start first, optionally narrowed to one venue.
    pub fn list_bookings(&self, venue_id: Option<i32>) -> Vec<Booking> {
        let mut bookings = self.directory.bookings_sorted();
        if let Some(vid) = venue_id {
            bookings.retain(|b| b.venue_id == vid);
        }
        bookings
    }

    pub fn get_booking(&self, id: i32) -> Option<Booking> {
        self.directory.get_booking(id)
    }

    /// Advisory scan: every existing booking on the venue whose window
    /// overlaps the proposed one, with a reason line per hit. Rejects
    /// inverted or out-of-range windows before scanning; an unknown
    /// venue scans clean.
    pub fn check_booking_conflict(
        &self,
        venue_id: i32,
        start: NaiveDateTime,
        end: NaiveDateTime,
        exclude_booking_id: Option<i32>,
    ) -> Result<ConflictCheck, EngineError> {
        let window = TimeInterval { start, end };
        validate_interval(&window)?;
        self.detector
            .check_booking_conflict(venue_id, start, end, exclude_booking_id)
    }

    pub fn is_venue_available(
        &self,
        venue_id: i32,
        start: NaiveDateTime,
        end: NaiveDateTime,
        exclude_booking_id: Option<i32>,
    ) -> Result<bool, EngineError> {
        let window = TimeInterval { start, end };
        validate_interval(&window)?;
        self.detector
            .is_venue_available(venue_id, start, end, exclude_booking_id)
    }

    /// Free gaps within business hours for one venue on one date.
    pub fn available_time_slots(
        &self,
        venue_id: i32,
        date: NaiveDate,
    ) -> Result<Vec<TimeSlot>, EngineError> {
        if date.year() < MIN_VALID_YEAR || date.year() > MAX_VALID_YEAR {
            return Err(EngineError::LimitExceeded("date out of range"));
        }
        self.slots.available_time_slots(venue_id, date)
    }
}
