//! venuebook is an event-booking database speaking the PostgreSQL wire
//! protocol. Clients, venues, vendors and bookings live in an in-memory
//! directory backed by a write-ahead log; conflict probes and free-slot
//! queries are served as virtual read-only tables.

pub mod auth;
pub mod compactor;
pub mod engine;
pub mod limits;
pub mod model;
pub mod notify;
pub mod observability;
pub mod sql;
pub mod tenant;
pub mod tls;
pub mod wal;
pub mod wire;
