//! Visibility filters and listing over normalized events.
//!
//! Each optional filter is a self-contained predicate rather than a SQL
//! fragment; a storage adapter can map the same variants onto parameterized
//! conditions, and listings can be evaluated in memory for tests and small
//! result sets.

use chrono::{DateTime, Duration, Utc};

use crate::event::NormalizedEvent;

/// One visibility condition over a normalized event at a given instant.
#[derive(Debug, Clone, PartialEq)]
pub enum EventPredicate {
    NotRejected,
    /// `finish_at` is still in the future.
    NotFinished,
    Approved,
    /// Approved, or owned by the given (lowercased) address.
    ApprovedOrOwnedBy(String),
    /// `next_start_at` is still in the future.
    Upcoming,
    OwnedBy(String),
    /// `next_start_at` is within the next N milliseconds.
    StartsWithin(i64),
    PositionX(i32),
    PositionY(i32),
    Estate(String),
    /// The viewer's attendee join matched.
    Attending,
}

impl EventPredicate {
    pub fn matches(&self, event: &NormalizedEvent, now: DateTime<Utc>) -> bool {
        match self {
            EventPredicate::NotRejected => !event.rejected,
            EventPredicate::NotFinished => event.finish_at > now,
            EventPredicate::Approved => event.approved,
            EventPredicate::ApprovedOrOwnedBy(user) => event.approved || event.user == *user,
            EventPredicate::Upcoming => event.next_start_at > now,
            EventPredicate::OwnedBy(user) => event.user == *user,
            EventPredicate::StartsWithin(ms) => {
                match now.checked_add_signed(Duration::milliseconds(*ms)) {
                    Some(window_end) => event.next_start_at < window_end,
                    None => *ms > 0,
                }
            }
            EventPredicate::PositionX(x) => event.x == *x,
            EventPredicate::PositionY(y) => event.y == *y,
            EventPredicate::Estate(id) => event.estate_id.as_deref() == Some(id.as_str()),
            EventPredicate::Attending => event.attending == Some(true),
        }
    }
}

/// Options for a listing request. Addresses must be lowercased by the caller.
#[derive(Debug, Clone, Default)]
pub struct EventListOptions {
    /// The signed-in viewer, if any. Widens visibility to their own
    /// unapproved events.
    pub current_user: Option<String>,
    /// Restrict to events owned by this address.
    pub user: Option<String>,
    /// Only events whose next occurrence has not started yet.
    pub only_upcoming: bool,
    /// Only events the viewer is attending.
    pub only_attendee: bool,
    /// Only events starting within this many milliseconds.
    pub start_in: Option<i64>,
    pub x: Option<i32>,
    pub y: Option<i32>,
    pub estate_id: Option<String>,
    pub limit: Option<usize>,
    pub offset: Option<usize>,
}

impl EventListOptions {
    /// Expand into the predicate list for this request.
    ///
    /// Rejected and already-finished events are always excluded. Anonymous
    /// viewers see approved events only; signed-in non-admins additionally
    /// see their own unapproved events; admins see everything not rejected.
    pub fn predicates(&self, admin: bool) -> Vec<EventPredicate> {
        let mut predicates = vec![EventPredicate::NotRejected, EventPredicate::NotFinished];

        if self.only_upcoming {
            predicates.push(EventPredicate::Upcoming);
        }
        if let Some(user) = &self.user {
            predicates.push(EventPredicate::OwnedBy(user.clone()));
        }
        match &self.current_user {
            None => predicates.push(EventPredicate::Approved),
            Some(current) if !admin => {
                predicates.push(EventPredicate::ApprovedOrOwnedBy(current.clone()));
            }
            Some(_) => {}
        }
        if self.only_attendee {
            predicates.push(EventPredicate::Attending);
        }
        if let Some(ms) = self.start_in.filter(|ms| *ms > 0) {
            predicates.push(EventPredicate::StartsWithin(ms));
        }
        if let Some(x) = self.x {
            predicates.push(EventPredicate::PositionX(x));
        }
        if let Some(y) = self.y {
            predicates.push(EventPredicate::PositionY(y));
        }
        if let Some(id) = &self.estate_id {
            predicates.push(EventPredicate::Estate(id.clone()));
        }

        predicates
    }
}

/// Filter, order by `next_start_at` ascending, then paginate.
pub fn list_events(
    events: &[NormalizedEvent],
    options: &EventListOptions,
    admin: bool,
    now: DateTime<Utc>,
) -> Vec<NormalizedEvent> {
    let predicates = options.predicates(admin);
    let mut selected: Vec<NormalizedEvent> = events
        .iter()
        .filter(|event| predicates.iter().all(|p| p.matches(event, now)))
        .cloned()
        .collect();
    selected.sort_by_key(|event| event.next_start_at);

    let mut page: Vec<NormalizedEvent> = selected
        .into_iter()
        .skip(options.offset.unwrap_or(0))
        .collect();
    if let Some(limit) = options.limit {
        page.truncate(limit);
    }
    page
}

/// Predicates for the notification sweep: public events whose next occurrence
/// starts strictly within `(now, now + window)`.
pub fn notification_window(window: Duration) -> Vec<EventPredicate> {
    vec![
        EventPredicate::NotRejected,
        EventPredicate::Approved,
        EventPredicate::Upcoming,
        EventPredicate::StartsWithin(window.num_milliseconds()),
    ]
}
