//! Event record types.
//!
//! `EventRecord` is the raw row as it arrives from storage: timestamps may be
//! RFC 3339 text or epoch milliseconds, `duration` may be missing, and the
//! cached `next_start_at` may be stale. `NormalizedEvent` is the resolved
//! schedule produced by `recurrence::normalize`.

use chrono::{DateTime, Duration, TimeZone, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::{PlazaError, PlazaResult};

/// A timestamp as stored: epoch milliseconds or RFC 3339 text.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum RawTimestamp {
    Millis(i64),
    Text(String),
}

impl RawTimestamp {
    /// Coerce to UTC, naming the offending field on failure.
    pub fn to_utc(&self, field: &str) -> PlazaResult<DateTime<Utc>> {
        match self {
            RawTimestamp::Millis(ms) => {
                Utc.timestamp_millis_opt(*ms)
                    .single()
                    .ok_or_else(|| PlazaError::InvalidTimestamp {
                        field: field.to_string(),
                        value: ms.to_string(),
                    })
            }
            RawTimestamp::Text(s) => DateTime::parse_from_rfc3339(s)
                .map(|dt| dt.with_timezone(&Utc))
                .map_err(|_| PlazaError::InvalidTimestamp {
                    field: field.to_string(),
                    value: s.clone(),
                }),
        }
    }
}

impl From<DateTime<Utc>> for RawTimestamp {
    fn from(dt: DateTime<Utc>) -> Self {
        RawTimestamp::Millis(dt.timestamp_millis())
    }
}

/// An event row as stored (pre-normalization).
///
/// `start_at`/`finish_at` are authoritative for non-recurring events;
/// `recurrent_dates` lists the start of each occurrence for recurring ones.
/// `attending`/`notify` come from an attendee join and are absent when the
/// row was fetched without a viewer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EventRecord {
    pub id: Uuid,
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub start_at: Option<RawTimestamp>,
    #[serde(default)]
    pub finish_at: Option<RawTimestamp>,
    /// Milliseconds; derived from `finish_at - start_at` when absent.
    #[serde(default)]
    pub duration: Option<i64>,
    #[serde(default)]
    pub recurrent: bool,
    /// Occurrence starts, ascending in storage order.
    #[serde(default)]
    pub recurrent_dates: Option<Vec<RawTimestamp>>,
    /// Cached next occurrence, possibly stale.
    #[serde(default)]
    pub next_start_at: Option<RawTimestamp>,
    #[serde(default)]
    pub approved: bool,
    #[serde(default)]
    pub rejected: bool,
    /// Owner address, already lowercased.
    pub user: String,
    pub x: i32,
    pub y: i32,
    #[serde(default)]
    pub estate_id: Option<String>,
    #[serde(default)]
    pub estate_name: Option<String>,
    #[serde(default)]
    pub contact: Option<String>,
    #[serde(default)]
    pub details: Option<String>,
    #[serde(default)]
    pub total_attendees: i64,
    #[serde(default)]
    pub attending: Option<bool>,
    #[serde(default)]
    pub notify: Option<bool>,
}

/// An event with its schedule fully resolved.
///
/// Invariants (upheld by `recurrence::normalize`):
/// - `duration` is non-negative milliseconds
/// - `recurrent_dates` is non-empty and starts with `start_at`
/// - `next_start_at` is an element of `recurrent_dates` (the last one once
///   every occurrence has elapsed), except when a stored cache value whose
///   occurrence is still running was trusted over the list
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NormalizedEvent {
    pub id: Uuid,
    pub name: String,
    pub description: Option<String>,
    pub start_at: DateTime<Utc>,
    pub finish_at: DateTime<Utc>,
    /// Milliseconds.
    pub duration: i64,
    pub recurrent: bool,
    pub recurrent_dates: Vec<DateTime<Utc>>,
    pub next_start_at: DateTime<Utc>,
    pub approved: bool,
    pub rejected: bool,
    pub user: String,
    pub x: i32,
    pub y: i32,
    pub estate_id: Option<String>,
    /// Renamed alias of the stored `estate_name`.
    pub scene_name: Option<String>,
    pub coordinates: [i32; 2],
    pub contact: Option<String>,
    pub details: Option<String>,
    pub total_attendees: i64,
    pub attending: Option<bool>,
    pub notify: Option<bool>,
}

impl NormalizedEvent {
    /// End of the current/next occurrence. Saturates at the latest
    /// representable instant when the sum leaves chrono's range.
    pub fn ends_at(&self) -> DateTime<Utc> {
        self.next_start_at
            .checked_add_signed(Duration::milliseconds(self.duration))
            .unwrap_or(DateTime::<Utc>::MAX_UTC)
    }

    /// True iff `now` falls within `[next_start_at, next_start_at + duration)`.
    pub fn is_live(&self, now: DateTime<Utc>) -> bool {
        now >= self.next_start_at && now < self.ends_at()
    }

    /// Convert back to the stored shape (with the resolved `next_start_at`
    /// as the cache value). Normalizing the result is a no-op.
    pub fn to_record(&self) -> EventRecord {
        EventRecord {
            id: self.id,
            name: self.name.clone(),
            description: self.description.clone(),
            start_at: Some(self.start_at.into()),
            finish_at: Some(self.finish_at.into()),
            duration: Some(self.duration),
            recurrent: self.recurrent,
            recurrent_dates: Some(
                self.recurrent_dates
                    .iter()
                    .copied()
                    .map(RawTimestamp::from)
                    .collect(),
            ),
            next_start_at: Some(self.next_start_at.into()),
            approved: self.approved,
            rejected: self.rejected,
            user: self.user.clone(),
            x: self.x,
            y: self.y,
            estate_id: self.estate_id.clone(),
            estate_name: self.scene_name.clone(),
            contact: self.contact.clone(),
            details: self.details.clone(),
            total_attendees: self.total_attendees,
            attending: self.attending,
            notify: self.notify,
        }
    }
}
