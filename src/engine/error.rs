use chrono::NaiveDateTime;

/// Failure reported by a [`BookingSource`](super::conflict::BookingSource)
/// when it cannot produce the booking set. Carried inside
/// [`EngineError::DataAccess`] so conflict checks and slot queries surface
/// data-layer trouble instead of quietly reporting "available".
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceError(pub String);

impl std::fmt::Display for SourceError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "booking source failure: {}", self.0)
    }
}

impl std::error::Error for SourceError {}

#[derive(Debug)]
pub enum EngineError {
    NotFound { entity: &'static str, id: i32 },
    /// Refusal to delete a row other bookings still reference.
    InUse {
        entity: &'static str,
        id: i32,
        bookings: usize,
    },
    InvalidInterval {
        start: NaiveDateTime,
        end: NaiveDateTime,
    },
    DataAccess(SourceError),
    LimitExceeded(&'static str),
    WalError(String),
}

impl std::fmt::Display for EngineError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            EngineError::NotFound { entity, id } => write!(f, "{entity} not found: {id}"),
            EngineError::InUse {
                entity,
                id,
                bookings,
            } => {
                write!(
                    f,
                    "cannot delete {entity} {id}: referenced by {bookings} booking(s)"
                )
            }
            EngineError::InvalidInterval { start, end } => {
                write!(f, "invalid interval: end {end} is before start {start}")
            }
            EngineError::DataAccess(e) => write!(f, "data access failure: {}", e.0),
            EngineError::LimitExceeded(msg) => write!(f, "limit exceeded: {msg}"),
            EngineError::WalError(e) => write!(f, "WAL error: {e}"),
        }
    }
}

impl std::error::Error for EngineError {}

impl From<SourceError> for EngineError {
    fn from(e: SourceError) -> Self {
        EngineError::DataAccess(e)
    }
}
