use crate::bounded::{BoundedString, APP_NAME_MAX, BODY_MAX, SUMMARY_MAX};
use chrono::{DateTime, Duration, Utc};

/// Why a notification left the store, as reported by the `NotificationClosed` signal.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CloseReason {
    /// The notification ran out of time.
    Expired,
    /// A client asked for it with `CloseNotification`.
    Closed,
}

impl CloseReason {
    /// The reason code used on the bus.
    pub fn code(self) -> u32 {
        match self {
            CloseReason::Expired => 1,
            CloseReason::Closed => 3,
        }
    }
}

/// A notification that was removed from the store and still needs its `NotificationClosed`
/// signal.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Closed {
    pub id: u32,
    pub reason: CloseReason,
}

/// The fields of a `Notify` call that we care about.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewNotification {
    pub app_name: String,
    pub replaces_id: u32,
    pub summary: String,
    pub body: String,
    /// Seconds. Negative means "use the default", `0` means "never expire".
    pub expire_timeout: i32,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notification {
    pub(crate) id: u32,
    pub(crate) app_name: BoundedString<APP_NAME_MAX>,
    pub(crate) summary: BoundedString<SUMMARY_MAX>,
    pub(crate) body: BoundedString<BODY_MAX>,
    pub(crate) created_at: DateTime<Utc>,
    /// Seconds after `created_at`; `0` never expires.
    pub(crate) expires_after: u64,
    pub(crate) closed: bool,
}

impl Notification {
    pub fn id(&self) -> u32 {
        self.id
    }

    pub fn app_name(&self) -> &str {
        &self.app_name
    }

    pub fn summary(&self) -> &str {
        &self.summary
    }

    pub fn body(&self) -> &str {
        &self.body
    }

    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    pub fn expires_after(&self) -> u64 {
        self.expires_after
    }

    pub fn is_closed(&self) -> bool {
        self.closed
    }

    /// The instant after which the notification is gone, or `None` if it never expires.
    pub fn expires_at(&self) -> Option<DateTime<Utc>> {
        if self.expires_after == 0 {
            return None;
        }
        // out of range lifetimes saturate to "never"
        let secs = i64::try_from(self.expires_after).ok()?;
        self.created_at.checked_add_signed(Duration::try_seconds(secs)?)
    }

    pub fn is_expired(&self, now: DateTime<Utc>) -> bool {
        self.expires_at().is_some_and(|expires_at| expires_at < now)
    }

    /// Whole seconds left before expiry. `None` if it never expires or there is no time left.
    pub fn remaining_secs(&self, now: DateTime<Utc>) -> Option<i64> {
        let remaining = (self.expires_at()? - now).num_seconds();
        (remaining > 0).then_some(remaining)
    }

    pub fn reason(&self) -> CloseReason {
        if self.closed {
            CloseReason::Closed
        } else {
            CloseReason::Expired
        }
    }
}
