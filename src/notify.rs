use dashmap::DashMap;
use tokio::sync::broadcast;

use crate::model::Event;

const CHANNEL_CAPACITY: usize = 256;

/// `LISTEN venue_{id}` channel name for a venue.
pub fn channel_name(venue_id: i32) -> String {
    format!("venue_{venue_id}")
}

/// Parse `venue_{id}` back to the venue id.
pub fn parse_channel(channel: &str) -> Option<i32> {
    channel.strip_prefix("venue_")?.parse().ok()
}

/// JSON payload delivered with a NOTIFY, or None for events that do not
/// belong on a venue channel.
pub fn payload(event: &Event) -> Option<String> {
    let (op, booking_id, venue_id) = match event {
        Event::BookingAdded { booking } => ("booking_added", booking.id, booking.venue_id),
        Event::BookingUpdated { booking } => ("booking_updated", booking.id, booking.venue_id),
        Event::BookingRemoved { id, venue_id } => ("booking_removed", *id, *venue_id),
        _ => return None,
    };
    Some(
        serde_json::json!({
            "op": op,
            "booking_id": booking_id,
            "venue_id": venue_id,
        })
        .to_string(),
    )
}

/// Broadcast hub for LISTEN/NOTIFY per venue calendar.
pub struct NotifyHub {
    channels: DashMap<i32, broadcast::Sender<Event>>,
}

impl NotifyHub {
    pub fn new() -> Self {
        Self {
            channels: DashMap::new(),
        }
    }

    /// Subscribe to booking traffic on one venue. Creates the channel if needed.
    pub fn subscribe(&self, venue_id: i32) -> broadcast::Receiver<Event> {
        let sender = self
            .channels
            .entry(venue_id)
            .or_insert_with(|| broadcast::channel(CHANNEL_CAPACITY).0);
        sender.subscribe()
    }

    /// Send a notification. No-op if nobody is listening.
    pub fn send(&self, venue_id: i32, event: &Event) {
        if let Some(sender) = self.channels.get(&venue_id) {
            let _ = sender.send(event.clone());
        }
    }

    /// Remove a channel (e.g. when the venue is deleted).
    pub fn remove(&self, venue_id: i32) {
        self.channels.remove(&venue_id);
    }
}

impl Default for NotifyHub {
    fn default() -> Self {
        Self::new()
    }
}
