//! Hard caps on input sizes and state growth. Every unbounded input the
//! wire surface accepts is checked against one of these before it reaches
//! the store or the WAL.

/// Upper bound on concurrently materialized tenants per process.
pub const MAX_TENANTS: usize = 32;

/// Tenant names become WAL filenames; keep them well under OS limits.
pub const MAX_TENANT_NAME_LEN: usize = 64;

/// Per-table row cap per tenant.
pub const MAX_ROWS_PER_TABLE: usize = 100_000;

/// Client, venue, and vendor names, emails, phones, categories, companies.
pub const MAX_NAME_LEN: usize = 256;

/// Venue street addresses.
pub const MAX_ADDRESS_LEN: usize = 512;

/// Booking event type ("Wedding", "Conference", ...).
pub const MAX_EVENT_TYPE_LEN: usize = 128;

/// Free-form booking notes.
pub const MAX_NOTES_LEN: usize = 4096;

/// Status strings arriving over the wire.
pub const MAX_STATUS_LEN: usize = 64;

/// Amenity entries per venue.
pub const MAX_AMENITIES: usize = 64;

pub const MAX_GUEST_COUNT: u32 = 100_000;

/// A single booking may not span more than this many days.
pub const MAX_BOOKING_DURATION_DAYS: i64 = 30;

/// Timestamps outside this year range are rejected as garbage input.
pub const MIN_VALID_YEAR: i32 = 1970;
pub const MAX_VALID_YEAR: i32 = 2100;

/// A WAL frame longer than this is treated as corruption, not an
/// allocation request.
pub const MAX_WAL_FRAME_BYTES: usize = 1 << 24;
