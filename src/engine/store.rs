use std::sync::atomic::{AtomicI32, Ordering};

use dashmap::DashMap;

use crate::model::*;

use super::conflict::BookingSource;
use super::error::SourceError;

/// In-memory entity tables plus the per-table id sequences. WAL replay
/// and live mutations both go through [`Directory::apply_event`], so the
/// store never diverges from the log.
pub struct Directory {
    clients: DashMap<i32, Client>,
    venues: DashMap<i32, Venue>,
    vendors: DashMap<i32, Vendor>,
    bookings: DashMap<i32, Booking>,
    next_client_id: AtomicI32,
    next_venue_id: AtomicI32,
    next_vendor_id: AtomicI32,
    next_booking_id: AtomicI32,
}

impl Default for Directory {
    fn default() -> Self {
        Self::new()
    }
}

fn bump_sequence(seq: &AtomicI32, seen_id: i32) {
    seq.fetch_max(seen_id.saturating_add(1), Ordering::Relaxed);
}

impl Directory {
    pub fn new() -> Self {
        Self {
            clients: DashMap::new(),
            venues: DashMap::new(),
            vendors: DashMap::new(),
            bookings: DashMap::new(),
            next_client_id: AtomicI32::new(1),
            next_venue_id: AtomicI32::new(1),
            next_vendor_id: AtomicI32::new(1),
            next_booking_id: AtomicI32::new(1),
        }
    }

    // ── Id sequences ─────────────────────────────────────────

    pub fn allocate_client_id(&self) -> i32 {
        self.next_client_id.fetch_add(1, Ordering::Relaxed)
    }

    pub fn allocate_venue_id(&self) -> i32 {
        self.next_venue_id.fetch_add(1, Ordering::Relaxed)
    }

    pub fn allocate_vendor_id(&self) -> i32 {
        self.next_vendor_id.fetch_add(1, Ordering::Relaxed)
    }

    pub fn allocate_booking_id(&self) -> i32 {
        self.next_booking_id.fetch_add(1, Ordering::Relaxed)
    }

    // ── Row access ───────────────────────────────────────────

    pub fn client_count(&self) -> usize {
        self.clients.len()
    }

    pub fn venue_count(&self) -> usize {
        self.venues.len()
    }

    pub fn vendor_count(&self) -> usize {
        self.vendors.len()
    }

    pub fn booking_count(&self) -> usize {
        self.bookings.len()
    }

    pub fn contains_client(&self, id: i32) -> bool {
        self.clients.contains_key(&id)
    }

    pub fn contains_venue(&self, id: i32) -> bool {
        self.venues.contains_key(&id)
    }

    pub fn contains_vendor(&self, id: i32) -> bool {
        self.vendors.contains_key(&id)
    }

    pub fn get_client(&self, id: i32) -> Option<Client> {
        self.clients.get(&id).map(|e| e.value().clone())
    }

    pub fn get_venue(&self, id: i32) -> Option<Venue> {
        self.venues.get(&id).map(|e| e.value().clone())
    }

    pub fn get_vendor(&self, id: i32) -> Option<Vendor> {
        self.vendors.get(&id).map(|e| e.value().clone())
    }

    pub fn get_booking(&self, id: i32) -> Option<Booking> {
        self.bookings.get(&id).map(|e| e.value().clone())
    }

    // ── Ordered listings ─────────────────────────────────────
    //
    // Ordering is a data-layer contract: name ascending for entities,
    // newest start first for bookings, id as tiebreak everywhere.

    pub fn clients_sorted(&self) -> Vec<Client> {
        let mut rows: Vec<Client> = self.clients.iter().map(|e| e.value().clone()).collect();
        rows.sort_by(|a, b| a.name.cmp(&b.name).then(a.id.cmp(&b.id)));
        rows
    }

    pub fn venues_sorted(&self) -> Vec<Venue> {
        let mut rows: Vec<Venue> = self.venues.iter().map(|e| e.value().clone()).collect();
        rows.sort_by(|a, b| a.name.cmp(&b.name).then(a.id.cmp(&b.id)));
        rows
    }

    pub fn vendors_sorted(&self) -> Vec<Vendor> {
        let mut rows: Vec<Vendor> = self.vendors.iter().map(|e| e.value().clone()).collect();
        rows.sort_by(|a, b| a.name.cmp(&b.name).then(a.id.cmp(&b.id)));
        rows
    }

    pub fn bookings_sorted(&self) -> Vec<Booking> {
        let mut rows: Vec<Booking> = self.bookings.iter().map(|e| e.value().clone()).collect();
        rows.sort_by(|a, b| {
            b.start_datetime
                .cmp(&a.start_datetime)
                .then(a.id.cmp(&b.id))
        });
        rows
    }

    // ── Referential queries ──────────────────────────────────

    pub fn bookings_for_client(&self, client_id: i32) -> usize {
        self.bookings
            .iter()
            .filter(|e| e.value().client_id == client_id)
            .count()
    }

    pub fn bookings_for_venue(&self, venue_id: i32) -> usize {
        self.bookings
            .iter()
            .filter(|e| e.value().venue_id == venue_id)
            .count()
    }

    pub fn bookings_for_vendor(&self, vendor_id: i32) -> usize {
        self.bookings
            .iter()
            .filter(|e| e.value().vendor_id == Some(vendor_id))
            .count()
    }

    // ── Event application ────────────────────────────────────

    /// Upsert or remove the row an event describes. Added/Updated are
    /// both plain upserts since events carry full rows; the id sequence
    /// is pulled forward past any id seen, which is what restores the
    /// sequences on replay.
    pub fn apply_event(&self, event: &Event) {
        match event {
            Event::ClientAdded { client } | Event::ClientUpdated { client } => {
                bump_sequence(&self.next_client_id, client.id);
                self.clients.insert(client.id, client.clone());
            }
            Event::ClientRemoved { id } => {
                self.clients.remove(id);
            }
            Event::VenueAdded { venue } | Event::VenueUpdated { venue } => {
                bump_sequence(&self.next_venue_id, venue.id);
                self.venues.insert(venue.id, venue.clone());
            }
            Event::VenueRemoved { id } => {
                self.venues.remove(id);
            }
            Event::VendorAdded { vendor } | Event::VendorUpdated { vendor } => {
                bump_sequence(&self.next_vendor_id, vendor.id);
                self.vendors.insert(vendor.id, vendor.clone());
            }
            Event::VendorRemoved { id } => {
                self.vendors.remove(id);
            }
            Event::BookingAdded { booking } | Event::BookingUpdated { booking } => {
                bump_sequence(&self.next_booking_id, booking.id);
                self.bookings.insert(booking.id, booking.clone());
            }
            Event::BookingRemoved { id, .. } => {
                self.bookings.remove(id);
            }
        }
    }

    /// Minimal event sequence that reconstructs the current state: one
    /// `Added` per live row, ids ascending, entities before bookings so
    /// replay never sees a dangling reference. This is what compaction
    /// writes.
    pub fn snapshot_events(&self) -> Vec<Event> {
        let mut events = Vec::with_capacity(
            self.client_count() + self.venue_count() + self.vendor_count() + self.booking_count(),
        );

        let mut clients: Vec<Client> = self.clients.iter().map(|e| e.value().clone()).collect();
        clients.sort_by_key(|c| c.id);
        events.extend(clients.into_iter().map(|client| Event::ClientAdded { client }));

        let mut venues: Vec<Venue> = self.venues.iter().map(|e| e.value().clone()).collect();
        venues.sort_by_key(|v| v.id);
        events.extend(venues.into_iter().map(|venue| Event::VenueAdded { venue }));

        let mut vendors: Vec<Vendor> = self.vendors.iter().map(|e| e.value().clone()).collect();
        vendors.sort_by_key(|v| v.id);
        events.extend(vendors.into_iter().map(|vendor| Event::VendorAdded { vendor }));

        let mut bookings: Vec<Booking> = self.bookings.iter().map(|e| e.value().clone()).collect();
        bookings.sort_by_key(|b| b.id);
        events.extend(bookings.into_iter().map(|booking| Event::BookingAdded { booking }));

        events
    }
}

impl BookingSource for Directory {
    /// Newest start first, id ascending as tiebreak. Deterministic, so
    /// repeated conflict checks against unchanged data scan in the same
    /// order and return identical results.
    fn fetch_all_bookings(&self) -> Result<Vec<Booking>, SourceError> {
        Ok(self.bookings_sorted())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{NaiveDate, NaiveDateTime};

    fn dt(day: u32, h: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2025, 6, day)
            .unwrap()
            .and_hms_opt(h, 0, 0)
            .unwrap()
    }

    fn client(id: i32, name: &str) -> Client {
        Client {
            id,
            name: name.into(),
            email: format!("{name}@example.com"),
            phone: "555-0100".into(),
            company: "Acme".into(),
        }
    }

    fn booking(id: i32, venue_id: i32, day: u32, h: u32) -> Booking {
        Booking {
            id,
            client_id: 1,
            venue_id,
            vendor_id: None,
            event_type: "Gala".into(),
            start_datetime: dt(day, h),
            end_datetime: dt(day, h + 2),
            guest_count: 80,
            catering_required: true,
            budget: 4_000.0,
            notes: String::new(),
            status: BookingStatus::Pending,
        }
    }

    #[test]
    fn id_sequences_start_at_one() {
        let dir = Directory::new();
        assert_eq!(dir.allocate_client_id(), 1);
        assert_eq!(dir.allocate_client_id(), 2);
        assert_eq!(dir.allocate_booking_id(), 1);
    }

    #[test]
    fn apply_upserts_and_removes() {
        let dir = Directory::new();
        dir.apply_event(&Event::ClientAdded { client: client(1, "Ada") });
        assert_eq!(dir.get_client(1).unwrap().name, "Ada");

        dir.apply_event(&Event::ClientUpdated { client: client(1, "Ada L") });
        assert_eq!(dir.get_client(1).unwrap().name, "Ada L");
        assert_eq!(dir.client_count(), 1);

        dir.apply_event(&Event::ClientRemoved { id: 1 });
        assert!(dir.get_client(1).is_none());
    }

    #[test]
    fn replayed_ids_pull_sequence_forward() {
        let dir = Directory::new();
        dir.apply_event(&Event::ClientAdded { client: client(7, "G") });
        assert_eq!(dir.allocate_client_id(), 8);
        // Other tables are unaffected.
        assert_eq!(dir.allocate_venue_id(), 1);
    }

    #[test]
    fn fetch_all_bookings_newest_start_first() {
        let dir = Directory::new();
        dir.apply_event(&Event::BookingAdded { booking: booking(1, 1, 10, 9) });
        dir.apply_event(&Event::BookingAdded { booking: booking(2, 1, 12, 9) });
        dir.apply_event(&Event::BookingAdded { booking: booking(3, 1, 10, 9) });

        let all = dir.fetch_all_bookings().unwrap();
        let ids: Vec<i32> = all.iter().map(|b| b.id).collect();
        // Day 12 first, then the two day-10 rows in id order.
        assert_eq!(ids, vec![2, 1, 3]);
    }

    #[test]
    fn listings_sort_by_name() {
        let dir = Directory::new();
        dir.apply_event(&Event::ClientAdded { client: client(1, "Zoe") });
        dir.apply_event(&Event::ClientAdded { client: client(2, "Ada") });
        let names: Vec<String> = dir.clients_sorted().into_iter().map(|c| c.name).collect();
        assert_eq!(names, vec!["Ada".to_string(), "Zoe".to_string()]);
    }

    #[test]
    fn reference_counts() {
        let dir = Directory::new();
        let mut b = booking(1, 3, 10, 9);
        b.client_id = 5;
        b.vendor_id = Some(9);
        dir.apply_event(&Event::BookingAdded { booking: b });

        assert_eq!(dir.bookings_for_client(5), 1);
        assert_eq!(dir.bookings_for_venue(3), 1);
        assert_eq!(dir.bookings_for_vendor(9), 1);
        assert_eq!(dir.bookings_for_vendor(8), 0);
        assert_eq!(dir.bookings_for_client(1), 0);
    }

    #[test]
    fn snapshot_orders_entities_before_bookings() {
        let dir = Directory::new();
        dir.apply_event(&Event::BookingAdded { booking: booking(2, 1, 10, 9) });
        dir.apply_event(&Event::BookingAdded { booking: booking(1, 1, 11, 9) });
        dir.apply_event(&Event::ClientAdded { client: client(1, "Ada") });

        let events = dir.snapshot_events();
        assert_eq!(events.len(), 3);
        assert!(matches!(events[0], Event::ClientAdded { .. }));
        assert!(matches!(&events[1], Event::BookingAdded { booking } if booking.id == 1));
        assert!(matches!(&events[2], Event::BookingAdded { booking } if booking.id == 2));

        // Replaying the snapshot into a fresh directory reproduces state.
        let rebuilt = Directory::new();
        for e in &events {
            rebuilt.apply_event(e);
        }
        assert_eq!(rebuilt.booking_count(), 2);
        assert_eq!(rebuilt.allocate_booking_id(), 3);
    }
}
