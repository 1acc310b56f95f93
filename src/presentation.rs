//! Viewer-facing event output.
//!
//! Strips private fields for non-owners and derives the per-viewer flags
//! (`live`, `owned`, `editable`, attendance) the listing API exposes.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::event::NormalizedEvent;

/// The requesting viewer. `address` must already be lowercased.
#[derive(Debug, Clone, Default)]
pub struct Viewer {
    pub address: Option<String>,
    pub admin: bool,
}

impl Viewer {
    pub fn anonymous() -> Self {
        Viewer::default()
    }

    pub fn user(address: impl Into<String>) -> Self {
        Viewer {
            address: Some(address.into()),
            admin: false,
        }
    }

    pub fn admin(address: impl Into<String>) -> Self {
        Viewer {
            address: Some(address.into()),
            admin: true,
        }
    }

    /// Case-sensitive comparison on already-lowercased addresses.
    pub fn owns(&self, event: &NormalizedEvent) -> bool {
        self.address.as_deref() == Some(event.user.as_str())
    }
}

/// An event as served to a viewer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PublicEvent {
    pub id: Uuid,
    pub name: String,
    pub description: Option<String>,
    pub start_at: DateTime<Utc>,
    pub finish_at: DateTime<Utc>,
    pub duration: i64,
    pub recurrent: bool,
    pub recurrent_dates: Vec<DateTime<Utc>>,
    pub next_start_at: DateTime<Utc>,
    pub approved: bool,
    pub rejected: bool,
    pub user: String,
    pub estate_id: Option<String>,
    pub estate_name: Option<String>,
    pub scene_name: Option<String>,
    pub coordinates: [i32; 2],
    pub position: [i32; 2],
    /// Owner/admin only; `None` for everyone else.
    pub contact: Option<String>,
    /// Owner/admin only; `None` for everyone else.
    pub details: Option<String>,
    pub total_attendees: i64,
    pub attending: bool,
    pub notify: bool,
    pub live: bool,
    pub editable: bool,
    pub owned: bool,
}

/// Strip the private fields unless the viewer owns the event or is an admin.
pub fn redact(mut event: NormalizedEvent, viewer: &Viewer) -> NormalizedEvent {
    if !viewer.owns(&event) && !viewer.admin {
        event.contact = None;
        event.details = None;
    }
    event
}

/// Build the viewer-facing shape: redacted private fields plus the derived
/// `live`/`owned`/`editable` flags and coerced attendance booleans.
pub fn to_public(event: &NormalizedEvent, viewer: &Viewer, now: DateTime<Utc>) -> PublicEvent {
    let owned = viewer.owns(event);
    let editable = viewer.admin;
    let sees_private = owned || viewer.admin;

    PublicEvent {
        id: event.id,
        name: event.name.clone(),
        description: event.description.clone(),
        start_at: event.start_at,
        finish_at: event.finish_at,
        duration: event.duration,
        recurrent: event.recurrent,
        recurrent_dates: event.recurrent_dates.clone(),
        next_start_at: event.next_start_at,
        approved: event.approved,
        rejected: event.rejected,
        user: event.user.clone(),
        estate_id: event.estate_id.clone(),
        estate_name: event.scene_name.clone(),
        scene_name: event.scene_name.clone(),
        coordinates: event.coordinates,
        position: [event.x, event.y],
        contact: if sees_private {
            event.contact.clone()
        } else {
            None
        },
        details: if sees_private {
            event.details.clone()
        } else {
            None
        },
        total_attendees: event.total_attendees,
        attending: event.attending.unwrap_or(false),
        notify: event.notify.unwrap_or(false),
        live: event.is_live(now),
        editable,
        owned,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, TimeZone};

    const HOUR_MS: i64 = 3_600_000;

    fn t0() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 3, 20, 15, 0, 0).unwrap()
    }

    fn event() -> NormalizedEvent {
        NormalizedEvent {
            id: Uuid::new_v4(),
            name: "Plaza party".to_string(),
            description: Some("Music at the plaza".to_string()),
            start_at: t0(),
            finish_at: t0() + Duration::milliseconds(HOUR_MS),
            duration: HOUR_MS,
            recurrent: false,
            recurrent_dates: vec![t0()],
            next_start_at: t0(),
            approved: true,
            rejected: false,
            user: "0xabc".to_string(),
            x: -10,
            y: 42,
            estate_id: None,
            scene_name: Some("Central plaza".to_string()),
            coordinates: [-10, 42],
            contact: Some("owner@example.com".to_string()),
            details: Some("backstage door code 4321".to_string()),
            total_attendees: 12,
            attending: Some(true),
            notify: None,
        }
    }

    #[test]
    fn test_owner_sees_private_fields() {
        let public = to_public(&event(), &Viewer::user("0xabc"), t0());
        assert_eq!(public.contact.as_deref(), Some("owner@example.com"));
        assert!(public.owned);
        assert!(!public.editable);
    }

    #[test]
    fn test_other_viewer_is_redacted() {
        let public = to_public(&event(), &Viewer::user("0xdef"), t0());
        assert_eq!(public.contact, None);
        assert_eq!(public.details, None);
        assert!(!public.owned);
    }

    #[test]
    fn test_admin_sees_private_fields_and_can_edit() {
        let public = to_public(&event(), &Viewer::admin("0xdef"), t0());
        assert_eq!(public.details.as_deref(), Some("backstage door code 4321"));
        assert!(public.editable);
        assert!(!public.owned);
    }

    #[test]
    fn test_redact_keeps_other_fields() {
        let redacted = redact(event(), &Viewer::anonymous());
        assert_eq!(redacted.contact, None);
        assert_eq!(redacted.details, None);
        assert_eq!(redacted.name, "Plaza party");
        assert_eq!(redacted.next_start_at, t0());
    }

    #[test]
    fn test_live_flag_tracks_now() {
        let during = to_public(&event(), &Viewer::anonymous(), t0() + Duration::seconds(1));
        assert!(during.live);

        let after = to_public(
            &event(),
            &Viewer::anonymous(),
            t0() + Duration::milliseconds(HOUR_MS),
        );
        assert!(!after.live);
    }

    #[test]
    fn test_attendance_flags_are_coerced() {
        let public = to_public(&event(), &Viewer::anonymous(), t0());
        assert!(public.attending);
        assert!(!public.notify);
    }

    #[test]
    fn test_position_mirrors_coordinates() {
        let public = to_public(&event(), &Viewer::anonymous(), t0());
        assert_eq!(public.position, [-10, 42]);
        assert_eq!(public.coordinates, [-10, 42]);
    }
}
