//! Well-known names of the `org.freedesktop.Notifications` service.

pub const NOTIFICATIONS_BUS: &str = "org.freedesktop.Notifications";
pub const NOTIFICATIONS_OBJECT: &str = "/org/freedesktop/Notifications";
pub const NOTIFICATIONS_INTERFACE: &str = "org.freedesktop.Notifications";

pub const NOTIFICATION_CLOSED: &str = "NotificationClosed";

pub const PEER_INTERFACE: &str = "org.freedesktop.DBus.Peer";
pub const UNKNOWN_METHOD_ERROR: &str = "org.freedesktop.DBus.Error.UnknownMethod";
