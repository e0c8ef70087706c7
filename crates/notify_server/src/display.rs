use crate::notification::Notification;
use chrono::{DateTime, Utc};
use smart_default::SmartDefault;

#[derive(Debug, Clone, Copy, PartialEq, Eq, SmartDefault)]
pub struct MarqueeConfig {
    /// Bodies of at least this many characters scroll through a window of this width.
    #[default = 30]
    pub width: usize,
    /// Characters to scroll per second.
    #[default = 3]
    pub shift: usize,
}

/// Start of the visible marquee window, `elapsed_secs` after the notification appeared.
///
/// The window stands still for the first second, then moves `shift` characters per second until
/// it hits the end of the text.
pub fn marquee_offset(elapsed_secs: i64, text_len: usize, width: usize, shift: usize) -> usize {
    let max_offset = text_len.saturating_sub(width);
    let steps = usize::try_from(elapsed_secs.saturating_sub(1)).unwrap_or(0);
    steps.saturating_mul(shift).min(max_offset)
}

/// Render a notification as `"<remaining> <app>: <summary> [<body>]"`.
///
/// The remaining seconds are left out when the notification never expires or is already due, and
/// the brackets are left out for an empty body.
pub fn render(notification: &Notification, now: DateTime<Utc>, marquee: &MarqueeConfig) -> String {
    let mut out = String::new();
    if let Some(remaining) = notification.remaining_secs(now) {
        out.push_str(&format!("{} ", remaining));
    }
    out.push_str(&format!("{}: {}", notification.app_name(), notification.summary()));

    let body = notification.body();
    if !body.is_empty() {
        let len = body.chars().count();
        if len < marquee.width {
            out.push_str(&format!(" [{}]", body));
        } else {
            let elapsed = (now - notification.created_at()).num_seconds();
            let offset = marquee_offset(elapsed, len, marquee.width, marquee.shift);
            let window: String = body.chars().skip(offset).take(marquee.width).collect();
            out.push_str(&format!(" [{}]", window));
        }
    }
    out
}
