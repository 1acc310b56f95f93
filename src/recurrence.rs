//! Occurrence selection and schedule normalization.
//!
//! Normalizes a raw event row into a canonical schedule: resolved duration,
//! a non-empty occurrence list starting at `start_at`, and the next relevant
//! occurrence. Pure functions; `now` is always caller-supplied.

use chrono::{DateTime, Duration, Utc};

use crate::error::{PlazaError, PlazaResult};
use crate::event::{EventRecord, NormalizedEvent};

/// Pick the next relevant occurrence.
///
/// A cached value is trusted as long as its occurrence has not fully elapsed,
/// even if an earlier listed occurrence would also qualify. Otherwise the
/// first occurrence whose end is still in the future wins; once every
/// occurrence has elapsed, the last one is returned so callers can still
/// compute "this event has ended". `None` only for an empty list.
pub fn select_next_start(
    duration: Duration,
    cached: Option<DateTime<Utc>>,
    dates: &[DateTime<Utc>],
    now: DateTime<Utc>,
) -> Option<DateTime<Utc>> {
    if let Some(cached) = cached {
        if ends_after(cached, duration, now) {
            return Some(cached);
        }
    }

    dates
        .iter()
        .copied()
        .find(|date| ends_after(*date, duration, now))
        .or_else(|| dates.last().copied())
}

/// True when a stored `next_start_at` no longer points at a current or
/// future occurrence and should be recomputed and re-persisted.
pub fn cache_is_stale(cached: DateTime<Utc>, duration: Duration, now: DateTime<Utc>) -> bool {
    !ends_after(cached, duration, now)
}

/// Whether the occurrence starting at `start` ends after `instant`. An end
/// that falls outside the representable range counts as after every instant
/// when the duration points forward, and before every instant otherwise.
fn ends_after(start: DateTime<Utc>, duration: Duration, instant: DateTime<Utc>) -> bool {
    match start.checked_add_signed(duration) {
        Some(end) => end > instant,
        None => duration > Duration::zero(),
    }
}

/// Resolve a raw row into its canonical schedule.
///
/// - `duration` uses the stored value when present and non-zero, otherwise
///   `finish_at - start_at` (clamped non-negative). A stored zero is
///   recomputed, matching the historical behavior.
/// - `recurrent_dates` defaults to `[start_at]`; `start_at` is prepended when
///   the first element differs. Input order is trusted, no re-sorting.
/// - `next_start_at` comes from `select_next_start`, fed with the stored
///   cache value.
///
/// The input is not mutated; failures are `InvalidTimestamp` naming the bad
/// field, `EmptyRecurrence` when neither `start_at` nor any recurrence date
/// is present, or `OutOfRangeDuration` when a stored duration pushes an
/// occurrence end past the representable range.
pub fn normalize(record: &EventRecord, now: DateTime<Utc>) -> PlazaResult<NormalizedEvent> {
    let start_at = match &record.start_at {
        Some(raw) => Some(raw.to_utc("start_at")?),
        None => None,
    };

    let mut recurrent_dates = Vec::new();
    if let Some(raw_dates) = &record.recurrent_dates {
        for (index, raw) in raw_dates.iter().enumerate() {
            recurrent_dates.push(raw.to_utc(&format!("recurrent_dates[{index}]"))?);
        }
    }

    let start_at = match (start_at, recurrent_dates.first()) {
        (Some(start), _) => start,
        (None, Some(first)) => *first,
        (None, None) => return Err(PlazaError::EmptyRecurrence(record.id.to_string())),
    };

    let finish_at = match &record.finish_at {
        Some(raw) => Some(raw.to_utc("finish_at")?),
        None => None,
    };

    let duration = match record.duration.filter(|ms| *ms != 0) {
        Some(ms) => ms,
        None => finish_at
            .map(|finish| (finish - start_at).num_milliseconds())
            .unwrap_or(0),
    }
    .max(0);

    if recurrent_dates.is_empty() {
        recurrent_dates.push(start_at);
    } else if recurrent_dates[0] != start_at {
        recurrent_dates.insert(0, start_at);
    }

    let span = Duration::milliseconds(duration);
    let out_of_range = || PlazaError::OutOfRangeDuration {
        id: record.id.to_string(),
        value: duration,
    };
    if recurrent_dates
        .iter()
        .any(|date| date.checked_add_signed(span).is_none())
    {
        return Err(out_of_range());
    }

    let finish_at = match finish_at {
        Some(finish) => finish,
        None => start_at.checked_add_signed(span).ok_or_else(out_of_range)?,
    };

    let cached = match &record.next_start_at {
        Some(raw) => Some(raw.to_utc("next_start_at")?),
        None => None,
    };

    let next_start_at = select_next_start(span, cached, &recurrent_dates, now).unwrap_or(start_at);

    Ok(NormalizedEvent {
        id: record.id,
        name: record.name.clone(),
        description: record.description.clone(),
        start_at,
        finish_at,
        duration,
        recurrent: record.recurrent,
        recurrent_dates,
        next_start_at,
        approved: record.approved,
        rejected: record.rejected,
        user: record.user.clone(),
        x: record.x,
        y: record.y,
        estate_id: record.estate_id.clone(),
        scene_name: record.estate_name.clone(),
        coordinates: [record.x, record.y],
        contact: record.contact.clone(),
        details: record.details.clone(),
        total_attendees: record.total_attendees,
        attending: record.attending,
        notify: record.notify,
    })
}

/// Normalize a batch, isolating per-row failures.
///
/// A row that fails normalization is logged and dropped so one bad row does
/// not poison a whole listing.
pub fn normalize_all(records: &[EventRecord], now: DateTime<Utc>) -> Vec<NormalizedEvent> {
    records
        .iter()
        .filter_map(|record| match normalize(record, now) {
            Ok(event) => Some(event),
            Err(err) => {
                tracing::warn!(event_id = %record.id, error = %err, "skipping unnormalizable event");
                None
            }
        })
        .collect()
}
