use tokio::sync::oneshot;

use crate::limits::*;
use crate::model::*;

use super::conflict::validate_interval;
use super::{Engine, EngineError, WalCommand};

fn check_len(value: &str, max: usize, what: &'static str) -> Result<(), EngineError> {
    if value.len() > max {
        return Err(EngineError::LimitExceeded(what));
    }
    Ok(())
}

fn check_money(value: f64, what: &'static str) -> Result<(), EngineError> {
    if !value.is_finite() || value < 0.0 {
        return Err(EngineError::LimitExceeded(what));
    }
    Ok(())
}

fn check_amenities(amenities: &[String]) -> Result<(), EngineError> {
    if amenities.len() > MAX_AMENITIES {
        return Err(EngineError::LimitExceeded("too many amenities"));
    }
    for a in amenities {
        check_len(a, MAX_NAME_LEN, "amenity too long")?;
    }
    Ok(())
}

impl Engine {
    // ── Clients ──────────────────────────────────────────────

    pub async fn add_client(
        &self,
        name: String,
        email: String,
        phone: String,
        company: String,
    ) -> Result<i32, EngineError> {
        if self.directory.client_count() >= MAX_ROWS_PER_TABLE {
            return Err(EngineError::LimitExceeded("too many clients"));
        }
        check_len(&name, MAX_NAME_LEN, "client name too long")?;
        check_len(&email, MAX_NAME_LEN, "client email too long")?;
        check_len(&phone, MAX_NAME_LEN, "client phone too long")?;
        check_len(&company, MAX_NAME_LEN, "client company too long")?;

        let id = self.directory.allocate_client_id();
        let client = Client {
            id,
            name,
            email,
            phone,
            company,
        };
        self.persist_and_apply(Event::ClientAdded { client }).await?;
        Ok(id)
    }

    pub async fn update_client(&self, id: i32, patch: ClientPatch) -> Result<(), EngineError> {
        let mut client = self
            .directory
            .get_client(id)
            .ok_or(EngineError::NotFound { entity: "client", id })?;
        if let Some(name) = patch.name {
            check_len(&name, MAX_NAME_LEN, "client name too long")?;
            client.name = name;
        }
        if let Some(email) = patch.email {
            check_len(&email, MAX_NAME_LEN, "client email too long")?;
            client.email = email;
        }
        if let Some(phone) = patch.phone {
            check_len(&phone, MAX_NAME_LEN, "client phone too long")?;
            client.phone = phone;
        }
        if let Some(company) = patch.company {
            check_len(&company, MAX_NAME_LEN, "client company too long")?;
            client.company = company;
        }
        self.persist_and_apply(Event::ClientUpdated { client }).await
    }

    pub async fn delete_client(&self, id: i32) -> Result<(), EngineError> {
        if !self.directory.contains_client(id) {
            return Err(EngineError::NotFound { entity: "client", id });
        }
        let bookings = self.directory.bookings_for_client(id);
        if bookings > 0 {
            return Err(EngineError::InUse {
                entity: "client",
                id,
                bookings,
            });
        }
        self.persist_and_apply(Event::ClientRemoved { id }).await
    }

    // ── Venues ───────────────────────────────────────────────

    pub async fn add_venue(
        &self,
        name: String,
        address: String,
        capacity: u32,
        price_per_hour: f64,
        amenities: Vec<String>,
    ) -> Result<i32, EngineError> {
        if self.directory.venue_count() >= MAX_ROWS_PER_TABLE {
            return Err(EngineError::LimitExceeded("too many venues"));
        }
        check_len(&name, MAX_NAME_LEN, "venue name too long")?;
        check_len(&address, MAX_ADDRESS_LEN, "venue address too long")?;
        check_money(price_per_hour, "venue price out of range")?;
        check_amenities(&amenities)?;

        let id = self.directory.allocate_venue_id();
        let venue = Venue {
            id,
            name,
            address,
            capacity,
            price_per_hour,
            amenities,
        };
        self.persist_and_apply(Event::VenueAdded { venue }).await?;
        Ok(id)
    }

    pub async fn update_venue(&self, id: i32, patch: VenuePatch) -> Result<(), EngineError> {
        let mut venue = self
            .directory
            .get_venue(id)
            .ok_or(EngineError::NotFound { entity: "venue", id })?;
        if let Some(name) = patch.name {
            check_len(&name, MAX_NAME_LEN, "venue name too long")?;
            venue.name = name;
        }
        if let Some(address) = patch.address {
            check_len(&address, MAX_ADDRESS_LEN, "venue address too long")?;
            venue.address = address;
        }
        if let Some(capacity) = patch.capacity {
            venue.capacity = capacity;
        }
        if let Some(price) = patch.price_per_hour {
            check_money(price, "venue price out of range")?;
            venue.price_per_hour = price;
        }
        if let Some(amenities) = patch.amenities {
            check_amenities(&amenities)?;
            venue.amenities = amenities;
        }
        self.persist_and_apply(Event::VenueUpdated { venue }).await
    }

    pub async fn delete_venue(&self, id: i32) -> Result<(), EngineError> {
        if !self.directory.contains_venue(id) {
            return Err(EngineError::NotFound { entity: "venue", id });
        }
        let bookings = self.directory.bookings_for_venue(id);
        if bookings > 0 {
            return Err(EngineError::InUse {
                entity: "venue",
                id,
                bookings,
            });
        }
        self.persist_and_apply(Event::VenueRemoved { id }).await?;
        self.notify.remove(id);
        Ok(())
    }

    // ── Vendors ──────────────────────────────────────────────

    pub async fn add_vendor(
        &self,
        name: String,
        category: String,
        email: String,
        phone: String,
    ) -> Result<i32, EngineError> {
        if self.directory.vendor_count() >= MAX_ROWS_PER_TABLE {
            return Err(EngineError::LimitExceeded("too many vendors"));
        }
        check_len(&name, MAX_NAME_LEN, "vendor name too long")?;
        check_len(&category, MAX_NAME_LEN, "vendor category too long")?;
        check_len(&email, MAX_NAME_LEN, "vendor email too long")?;
        check_len(&phone, MAX_NAME_LEN, "vendor phone too long")?;

        let id = self.directory.allocate_vendor_id();
        let vendor = Vendor {
            id,
            name,
            category,
            email,
            phone,
        };
        self.persist_and_apply(Event::VendorAdded { vendor }).await?;
        Ok(id)
    }

    pub async fn update_vendor(&self, id: i32, patch: VendorPatch) -> Result<(), EngineError> {
        let mut vendor = self
            .directory
            .get_vendor(id)
            .ok_or(EngineError::NotFound { entity: "vendor", id })?;
        if let Some(name) = patch.name {
            check_len(&name, MAX_NAME_LEN, "vendor name too long")?;
            vendor.name = name;
        }
        if let Some(category) = patch.category {
            check_len(&category, MAX_NAME_LEN, "vendor category too long")?;
            vendor.category = category;
        }
        if let Some(email) = patch.email {
            check_len(&email, MAX_NAME_LEN, "vendor email too long")?;
            vendor.email = email;
        }
        if let Some(phone) = patch.phone {
            check_len(&phone, MAX_NAME_LEN, "vendor phone too long")?;
            vendor.phone = phone;
        }
        self.persist_and_apply(Event::VendorUpdated { vendor }).await
    }

    pub async fn delete_vendor(&self, id: i32) -> Result<(), EngineError> {
        if !self.directory.contains_vendor(id) {
            return Err(EngineError::NotFound { entity: "vendor", id });
        }
        let bookings = self.directory.bookings_for_vendor(id);
        if bookings > 0 {
            return Err(EngineError::InUse {
                entity: "vendor",
                id,
                bookings,
            });
        }
        self.persist_and_apply(Event::VendorRemoved { id }).await
    }

    // ── Bookings ─────────────────────────────────────────────

    /// Insert a booking. Deliberately no conflict gate: conflict checks
    /// are advisory reads, and a caller who skips them gets the
    /// double-booking they asked for.
    pub async fn add_booking(&self, draft: BookingDraft) -> Result<i32, EngineError> {
        if self.directory.booking_count() >= MAX_ROWS_PER_TABLE {
            return Err(EngineError::LimitExceeded("too many bookings"));
        }
        self.validate_booking_fields(&draft)?;
        self.check_booking_references(draft.client_id, draft.venue_id, draft.vendor_id)?;

        let id = self.directory.allocate_booking_id();
        let booking = draft.into_booking(id);
        self.persist_and_apply(Event::BookingAdded { booking }).await?;
        Ok(id)
    }

    pub async fn update_booking(&self, id: i32, patch: BookingPatch) -> Result<(), EngineError> {
        let mut booking = self
            .directory
            .get_booking(id)
            .ok_or(EngineError::NotFound { entity: "booking", id })?;
        let previous_venue = booking.venue_id;

        if let Some(client_id) = patch.client_id {
            booking.client_id = client_id;
        }
        if let Some(venue_id) = patch.venue_id {
            booking.venue_id = venue_id;
        }
        if let Some(vendor_id) = patch.vendor_id {
            booking.vendor_id = vendor_id;
        }
        if let Some(event_type) = patch.event_type {
            booking.event_type = event_type;
        }
        if let Some(start) = patch.start_datetime {
            booking.start_datetime = start;
        }
        if let Some(end) = patch.end_datetime {
            booking.end_datetime = end;
        }
        if let Some(guest_count) = patch.guest_count {
            booking.guest_count = guest_count;
        }
        if let Some(catering) = patch.catering_required {
            booking.catering_required = catering;
        }
        if let Some(budget) = patch.budget {
            booking.budget = budget;
        }
        if let Some(notes) = patch.notes {
            booking.notes = notes;
        }
        if let Some(status) = patch.status {
            booking.status = status;
        }

        let draft = BookingDraft {
            client_id: booking.client_id,
            venue_id: booking.venue_id,
            vendor_id: booking.vendor_id,
            event_type: booking.event_type.clone(),
            start_datetime: booking.start_datetime,
            end_datetime: booking.end_datetime,
            guest_count: booking.guest_count,
            catering_required: booking.catering_required,
            budget: booking.budget,
            notes: booking.notes.clone(),
            status: booking.status.clone(),
        };
        self.validate_booking_fields(&draft)?;
        self.check_booking_references(booking.client_id, booking.venue_id, booking.vendor_id)?;

        let venue_after = booking.venue_id;
        let event = Event::BookingUpdated { booking };
        self.persist_and_apply(event.clone()).await?;
        // A moved booking is news on both calendars.
        if previous_venue != venue_after {
            self.notify.send(previous_venue, &event);
        }
        Ok(())
    }

    pub async fn delete_booking(&self, id: i32) -> Result<(), EngineError> {
        let booking = self
            .directory
            .get_booking(id)
            .ok_or(EngineError::NotFound { entity: "booking", id })?;
        self.persist_and_apply(Event::BookingRemoved {
            id,
            venue_id: booking.venue_id,
        })
        .await
    }

    fn validate_booking_fields(&self, draft: &BookingDraft) -> Result<(), EngineError> {
        // Literal, not new(): the window has not been validated yet.
        let window = TimeInterval {
            start: draft.start_datetime,
            end: draft.end_datetime,
        };
        validate_interval(&window)?;
        check_len(&draft.event_type, MAX_EVENT_TYPE_LEN, "event type too long")?;
        check_len(&draft.notes, MAX_NOTES_LEN, "notes too long")?;
        check_len(draft.status.as_str(), MAX_STATUS_LEN, "status too long")?;
        check_money(draft.budget, "budget out of range")?;
        if draft.guest_count > MAX_GUEST_COUNT {
            return Err(EngineError::LimitExceeded("guest count too large"));
        }
        Ok(())
    }

    fn check_booking_references(
        &self,
        client_id: i32,
        venue_id: i32,
        vendor_id: Option<i32>,
    ) -> Result<(), EngineError> {
        if !self.directory.contains_client(client_id) {
            return Err(EngineError::NotFound {
                entity: "client",
                id: client_id,
            });
        }
        if !self.directory.contains_venue(venue_id) {
            return Err(EngineError::NotFound {
                entity: "venue",
                id: venue_id,
            });
        }
        if let Some(vid) = vendor_id {
            if !self.directory.contains_vendor(vid) {
                return Err(EngineError::NotFound {
                    entity: "vendor",
                    id: vid,
                });
            }
        }
        Ok(())
    }

    // ── WAL maintenance ──────────────────────────────────────

    /// Rewrite the WAL down to the events reconstructing current state.
    pub async fn compact_wal(&self) -> Result<(), EngineError> {
        let events = self.directory.snapshot_events();
        let (tx, rx) = oneshot::channel();
        self.wal_tx
            .send(WalCommand::Compact {
                events,
                response: tx,
            })
            .await
            .map_err(|_| EngineError::WalError("WAL writer shut down".into()))?;
        rx.await
            .map_err(|_| EngineError::WalError("WAL writer dropped response".into()))?
            .map_err(|e| EngineError::WalError(e.to_string()))
    }

    pub async fn wal_appends_since_compact(&self) -> u64 {
        let (tx, rx) = oneshot::channel();
        if self
            .wal_tx
            .send(WalCommand::AppendsSinceCompact { response: tx })
            .await
            .is_err()
        {
            return 0;
        }
        rx.await.unwrap_or(0)
    }
}
