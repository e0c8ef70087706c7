use crate::{
    config::StoreConfig,
    notification::{Closed, NewNotification, Notification},
    sanitize::strip_body,
};
use chrono::{DateTime, Utc};

/// Result of [`Store::sweep_and_peek`].
#[derive(Debug)]
pub struct Sweep<'a> {
    /// Notifications that were evicted, in store order. Each needs a `NotificationClosed` signal.
    pub closed: Vec<Closed>,
    /// The oldest surviving notification.
    pub head: Option<&'a Notification>,
    pub count: usize,
}

/// The active notifications, in the order they were created.
///
/// New notifications are appended, updates happen in place, and nothing is ever reordered, so
/// the head is always the oldest notification that is still alive. There is at most one entry
/// per id.
#[derive(Debug, Default)]
pub struct Store {
    notifications: Vec<Notification>,
    last_id: u32,
    config: StoreConfig,
}

impl Store {
    pub fn new(config: StoreConfig) -> Self {
        Self { notifications: Vec::new(), last_id: 0, config }
    }

    pub fn len(&self) -> usize {
        self.notifications.len()
    }

    pub fn is_empty(&self) -> bool {
        self.notifications.is_empty()
    }

    pub fn get(&self, id: u32) -> Option<&Notification> {
        self.notifications.iter().find(|n| n.id == id)
    }

    pub fn iter(&self) -> impl Iterator<Item = &Notification> {
        self.notifications.iter()
    }

    /// Handle the data of a `Notify` call and return the id of the resulting notification.
    ///
    /// A non-zero `replaces_id` that matches a live notification updates it in place, keeping
    /// its creation time. A non-zero `replaces_id` that matches nothing creates a new
    /// notification under that id. Otherwise a fresh id is allocated.
    pub fn create_or_update(&mut self, new: NewNotification, now: DateTime<Utc>) -> u32 {
        let expires_after = self.lifetime_for(new.expire_timeout);

        if new.replaces_id != 0 {
            if let Some(existing) = self.notifications.iter_mut().find(|n| n.id == new.replaces_id) {
                existing.app_name.set(new.app_name);
                existing.summary.set(new.summary);
                existing.body.set(new.body);
                existing.body.map(strip_body);
                existing.expires_after = expires_after;
                existing.closed = false;
                return existing.id;
            }
            log::debug!("notification {} does not exist, creating it under that id", new.replaces_id);
        }

        let id = if new.replaces_id != 0 { new.replaces_id } else { self.allocate_id() };
        let mut notification = Notification {
            id,
            app_name: new.app_name.into(),
            summary: new.summary.into(),
            body: new.body.into(),
            created_at: now,
            expires_after,
            closed: false,
        };
        notification.body.map(strip_body);
        self.notifications.push(notification);
        id
    }

    /// Mark a notification as closed. It is evicted (with reason [`CloseReason::Closed`]) by the
    /// next sweep rather than right away, so closing and expiring share one signal path.
    ///
    /// Returns `false` if there is no notification with that id.
    ///
    /// [`CloseReason::Closed`]: crate::CloseReason::Closed
    pub fn close(&mut self, id: u32, now: DateTime<Utc>) -> bool {
        let multiplier = u64::from(self.config.expire_multiplier);
        match self.notifications.iter_mut().find(|n| n.id == id) {
            Some(notification) => {
                let elapsed = (now - notification.created_at).num_seconds().max(0).unsigned_abs();
                notification.expires_after = elapsed.saturating_mul(multiplier);
                notification.closed = true;
                true
            }
            None => false,
        }
    }

    /// Evict every closed or expired notification and return what is left at the head.
    pub fn sweep_and_peek(&mut self, now: DateTime<Utc>) -> Sweep<'_> {
        let closed = self.sweep(now);
        Sweep { closed, head: self.notifications.first(), count: self.notifications.len() }
    }

    /// Evict every closed or expired notification, keeping the order of the rest.
    fn sweep(&mut self, now: DateTime<Utc>) -> Vec<Closed> {
        let mut closed = Vec::new();
        self.notifications.retain(|n| {
            if n.closed || n.is_expired(now) {
                closed.push(Closed { id: n.id, reason: n.reason() });
                false
            } else {
                true
            }
        });
        closed
    }

    fn lifetime_for(&self, expire_timeout: i32) -> u64 {
        let multiplier = u64::from(self.config.expire_multiplier);
        match u64::try_from(expire_timeout) {
            Ok(timeout) => timeout.saturating_mul(multiplier),
            Err(_) => u64::from(self.config.default_timeout).saturating_mul(multiplier),
        }
    }

    /// Next id from the counter, skipping 0 and ids that a client already claimed through
    /// `replaces_id`.
    fn allocate_id(&mut self) -> u32 {
        loop {
            self.last_id = self.last_id.wrapping_add(1);
            if self.last_id != 0 && self.get(self.last_id).is_none() {
                return self.last_id;
            }
        }
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::notification::CloseReason;
    use chrono::{Duration, TimeZone};
    use pretty_assertions::assert_eq;

    fn t0() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 3, 1, 12, 0, 0).unwrap()
    }

    fn secs(n: i64) -> Duration {
        Duration::seconds(n)
    }

    fn note(replaces_id: u32, summary: &str, expire_timeout: i32) -> NewNotification {
        NewNotification {
            app_name: "app".to_string(),
            replaces_id,
            summary: summary.to_string(),
            body: String::new(),
            expire_timeout,
        }
    }

    #[test]
    fn test_fresh_ids_are_increasing() {
        let mut store = Store::default();
        let ids: Vec<u32> = (0..5).map(|i| store.create_or_update(note(0, &i.to_string(), 5), t0())).collect();
        assert_eq!(vec![1, 2, 3, 4, 5], ids);
        assert_eq!(5, store.len());
    }

    #[test]
    fn test_update_keeps_created_at_and_position() {
        let mut store = Store::default();
        let first = store.create_or_update(note(0, "first", 5), t0());
        store.create_or_update(note(0, "second", 5), t0() + secs(1));

        let id = store.create_or_update(note(first, "first, updated", 7), t0() + secs(3));
        assert_eq!(first, id);
        assert_eq!(2, store.len());

        let updated = store.get(first).unwrap();
        assert_eq!("first, updated", updated.summary());
        assert_eq!(t0(), updated.created_at());
        assert_eq!(14, updated.expires_after());
        assert_eq!(Some(first), store.iter().next().map(Notification::id));
    }

    #[test]
    fn test_update_of_unknown_id_keeps_that_id() {
        let mut store = Store::default();
        let id = store.create_or_update(note(42, "x", 5), t0());
        assert_eq!(42, id);
        assert_eq!(t0(), store.get(42).unwrap().created_at());
    }

    #[test]
    fn test_allocation_skips_claimed_ids() {
        let mut store = Store::default();
        store.create_or_update(note(2, "claimed", 0), t0());
        assert_eq!(1, store.create_or_update(note(0, "a", 0), t0()));
        assert_eq!(3, store.create_or_update(note(0, "b", 0), t0()));
    }

    #[test]
    fn test_lifetimes() {
        let mut store = Store::new(StoreConfig { default_timeout: 10, expire_multiplier: 2 });
        let default = store.create_or_update(note(0, "default", -1), t0());
        let never = store.create_or_update(note(0, "never", 0), t0());
        let five = store.create_or_update(note(0, "five", 5), t0());

        assert_eq!(20, store.get(default).unwrap().expires_after());
        assert_eq!(0, store.get(never).unwrap().expires_after());
        assert_eq!(10, store.get(five).unwrap().expires_after());
    }

    #[test]
    fn test_body_is_truncated_then_stripped() {
        let mut store = Store::default();
        let mut new = note(0, "s", 1);
        new.body = format!("<b>bold</b>\n{}", "z".repeat(300));
        let id = store.create_or_update(new, t0());
        let body = store.get(id).unwrap().body();
        assert!(body.starts_with("bold z"));
        assert_eq!(256 - "<b></b>".len(), body.len());
    }

    #[test]
    fn test_long_fields_are_truncated() {
        let mut store = Store::default();
        let mut new = note(0, &"s".repeat(100), 1);
        new.app_name = "a".repeat(50);
        let id = store.create_or_update(new, t0());
        let n = store.get(id).unwrap();
        assert_eq!(20, n.app_name().len());
        assert_eq!(64, n.summary().len());
    }

    #[test]
    fn test_expiry_emits_expired() {
        let mut store = Store::default();
        let id = store.create_or_update(note(0, "x", 1), t0());

        let sweep = store.sweep_and_peek(t0() + secs(2));
        assert_eq!(Vec::<Closed>::new(), sweep.closed);
        assert_eq!(1, sweep.count);

        let sweep = store.sweep_and_peek(t0() + secs(3));
        assert_eq!(vec![Closed { id, reason: CloseReason::Expired }], sweep.closed);
        assert!(sweep.head.is_none());
        assert_eq!(0, sweep.count);
    }

    #[test]
    fn test_close_then_sweep_emits_closed() {
        let mut store = Store::default();
        let id = store.create_or_update(note(0, "x", 0), t0());
        assert!(store.close(id, t0() + secs(4)));
        assert_eq!(8, store.get(id).unwrap().expires_after());
        assert!(store.get(id).unwrap().is_closed());

        let sweep = store.sweep_and_peek(t0() + secs(4));
        assert_eq!(vec![Closed { id, reason: CloseReason::Closed }], sweep.closed);
        assert_eq!(0, sweep.count);
    }

    #[test]
    fn test_close_right_after_creation_still_evicts() {
        let mut store = Store::default();
        let id = store.create_or_update(note(0, "x", 5), t0());
        assert!(store.close(id, t0()));
        let sweep = store.sweep_and_peek(t0());
        assert_eq!(vec![Closed { id, reason: CloseReason::Closed }], sweep.closed);
    }

    #[test]
    fn test_close_unknown_id() {
        let mut store = Store::default();
        store.create_or_update(note(0, "x", 5), t0());
        assert!(!store.close(99, t0()));
        assert_eq!(1, store.len());
    }

    #[test]
    fn test_update_reopens_closed_notification() {
        let mut store = Store::default();
        let id = store.create_or_update(note(0, "x", 0), t0());
        store.close(id, t0());
        store.create_or_update(note(id, "y", 0), t0());
        assert!(!store.get(id).unwrap().is_closed());
        assert!(store.sweep_and_peek(t0() + secs(100)).closed.is_empty());
    }

    #[test]
    fn test_empty_sweep_is_idempotent() {
        let mut store = Store::default();
        for _ in 0..3 {
            let sweep = store.sweep_and_peek(t0());
            assert!(sweep.closed.is_empty());
            assert!(sweep.head.is_none());
            assert_eq!(0, sweep.count);
        }
    }

    #[test]
    fn test_sweep_counts_everything() {
        let mut store = Store::default();
        let first = store.create_or_update(note(0, "a", 0), t0());
        store.create_or_update(note(0, "b", 0), t0());
        let sweep = store.sweep_and_peek(t0());
        assert_eq!(Some(first), sweep.head.map(Notification::id));
        assert_eq!(2, sweep.count);
    }

    #[test]
    fn test_never_expiring_survives() {
        let mut store = Store::default();
        let id = store.create_or_update(note(0, "x", 0), t0());
        let sweep = store.sweep_and_peek(t0() + secs(1_000_000));
        assert_eq!(Some(id), sweep.head.map(Notification::id));
    }

    #[test]
    fn test_head_is_oldest_survivor() {
        let mut store = Store::default();
        let short = store.create_or_update(note(0, "short", 1), t0());
        let long = store.create_or_update(note(0, "long", 10), t0());
        let newest = store.create_or_update(note(0, "newest", 10), t0());

        let sweep = store.sweep_and_peek(t0() + secs(1));
        assert_eq!(Some(short), sweep.head.map(Notification::id));
        assert_eq!(3, sweep.count);

        let sweep = store.sweep_and_peek(t0() + secs(5));
        assert_eq!(vec![Closed { id: short, reason: CloseReason::Expired }], sweep.closed);
        assert_eq!(Some(long), sweep.head.map(Notification::id));
        assert_eq!(2, sweep.count);
        assert_eq!(vec![long, newest], store.iter().map(Notification::id).collect::<Vec<_>>());
    }
}
