use chrono::{DateTime, Utc};

/// Transport-agnostic domain event.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UserDomainEvent {
    Created { id: i64, at: DateTime<Utc> },
    Updated { id: i64, at: DateTime<Utc> },
    Deleted { id: i64, at: DateTime<Utc> },
}
