use crate::{
    bus::BusConnection,
    config::NotifyConfig,
    display::{self, MarqueeConfig},
    error::Result,
    names,
    notification::{Closed, Notification},
    protocol::{self, Reply, Request},
    store::Store,
};
use chrono::{DateTime, Utc};
use zbus::Message;

/// A running `org.freedesktop.Notifications` service.
///
/// This is meant to be driven from a single loop: call [`check`] on every iteration to handle at
/// most one incoming call, and [`poll_current_message`] once per redraw to get the text to show.
/// The store is only ever touched from that loop, so no locking is needed.
///
/// [`check`]: NotifyServer::check
/// [`poll_current_message`]: NotifyServer::poll_current_message
#[derive(Debug)]
pub struct NotifyServer {
    bus: BusConnection,
    store: Store,
    debug: bool,
}

/// What the bar should show, and which notifications were evicted to get there.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Frame {
    /// Each of these still needs a `NotificationClosed` signal.
    pub closed: Vec<Closed>,
    pub text: Option<String>,
}

/// Sweep the store and render whatever is left at its head.
pub fn sweep_and_render(store: &mut Store, now: DateTime<Utc>, marquee: &MarqueeConfig) -> Frame {
    let sweep = store.sweep_and_peek(now);
    let text = sweep.head.map(|head| display::render(head, now, marquee));
    Frame { closed: sweep.closed, text }
}

impl NotifyServer {
    /// Connect to the session bus and claim `org.freedesktop.Notifications`.
    pub async fn init(config: NotifyConfig) -> Result<Self> {
        let bus = BusConnection::connect_and_claim(names::NOTIFICATIONS_BUS).await?;
        Ok(Self { bus, store: Store::new(config.store), debug: config.debug })
    }

    /// Handle one pending method call, if any. Returns whether there was one.
    ///
    /// Malformed calls are dropped without a reply; failed replies are logged and not retried.
    pub async fn check(&mut self) -> bool {
        let Some(msg) = self.bus.poll_once() else {
            return false;
        };

        match Request::from_message(&msg) {
            Ok(Some(request)) => {
                trace(self.debug, format_args!("{:?}", request));
                let reply = protocol::handle(&mut self.store, request, Utc::now());
                trace(self.debug, format_args!("  -> {:?}", reply));
                if let Err(e) = self.send_reply(&msg, reply).await {
                    log::warn!("Failed to reply to {:?}: {:?}", msg.header().member(), e);
                }
            }
            Ok(None) => {}
            Err(e) => log::warn!("Dropping message: {:?}", e),
        }
        true
    }

    /// Evict expired and closed notifications, announce them on the bus, and return the oldest
    /// one still alive together with the number of notifications left.
    pub async fn current_message(&mut self) -> Option<(&Notification, usize)> {
        let sweep = self.store.sweep_and_peek(Utc::now());
        for event in &sweep.closed {
            announce_closed(&self.bus, self.debug, *event).await;
        }
        sweep.head.map(|head| (head, sweep.count))
    }

    /// The text to show for the current notification, or `None` if there is nothing to show and
    /// the bar should display its usual content.
    pub async fn poll_current_message(&mut self, marquee: &MarqueeConfig) -> Option<String> {
        let frame = sweep_and_render(&mut self.store, Utc::now(), marquee);
        for event in frame.closed {
            announce_closed(&self.bus, self.debug, event).await;
        }
        frame.text
    }

    /// Give up the bus name.
    pub async fn shutdown(self) -> Result<()> {
        self.bus.disconnect().await
    }

    async fn send_reply(&self, call: &Message, reply: Reply) -> Result<()> {
        match reply {
            Reply::Id(id) => self.bus.reply(call, &id).await,
            Reply::Capabilities(capabilities) => self.bus.reply(call, &capabilities).await,
            Reply::ServerInformation(info) => {
                self.bus.reply(call, &(info.name, info.vendor, info.version, info.spec_version)).await
            }
            Reply::Empty => self.bus.reply(call, &()).await,
            Reply::UnknownMethod(message) => self.bus.reply_error(call, names::UNKNOWN_METHOD_ERROR, &message).await,
        }
    }
}

async fn announce_closed(bus: &BusConnection, debug: bool, event: Closed) {
    trace(debug, format_args!("NotificationClosed({}, {})", event.id, event.reason.code()));
    let body = (event.id, event.reason.code());
    let sent =
        bus.signal(names::NOTIFICATIONS_OBJECT, names::NOTIFICATIONS_INTERFACE, names::NOTIFICATION_CLOSED, &body).await;
    if let Err(e) = sent {
        log::warn!("Could not announce closing of notification {}: {:?}", event.id, e);
    }
}

fn trace(debug: bool, args: std::fmt::Arguments<'_>) {
    if debug {
        log::info!("{}", args);
    } else {
        log::debug!("{}", args);
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::{
        config::StoreConfig,
        notification::{CloseReason, NewNotification},
    };
    use chrono::{Duration, TimeZone};
    use pretty_assertions::assert_eq;

    fn t0() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 3, 1, 12, 0, 0).unwrap()
    }

    fn notify(store: &mut Store, summary: &str, body: &str, expire_timeout: i32) -> u32 {
        let new = NewNotification {
            app_name: "app".to_string(),
            replaces_id: 0,
            summary: summary.to_string(),
            body: body.to_string(),
            expire_timeout,
        };
        store.create_or_update(new, t0())
    }

    #[test]
    fn test_empty_store_shows_nothing() {
        let mut store = Store::new(StoreConfig::default());
        for _ in 0..2 {
            let frame = sweep_and_render(&mut store, t0(), &MarqueeConfig::default());
            assert_eq!(Frame { closed: Vec::new(), text: None }, frame);
        }
    }

    #[test]
    fn test_all_expired_shows_nothing() {
        let mut store = Store::new(StoreConfig::default());
        let first = notify(&mut store, "first", "", 1);
        let second = notify(&mut store, "second", "", 2);

        let frame = sweep_and_render(&mut store, t0() + Duration::seconds(5), &MarqueeConfig::default());
        assert_eq!(
            Frame {
                closed: vec![
                    Closed { id: first, reason: CloseReason::Expired },
                    Closed { id: second, reason: CloseReason::Expired },
                ],
                text: None,
            },
            frame
        );
        assert!(store.is_empty());
    }

    #[test]
    fn test_next_survivor_is_shown_after_head_expires() {
        let mut store = Store::new(StoreConfig::default());
        let head = notify(&mut store, "short", "", 1);
        notify(&mut store, "Sum", "a<b>c</b>&amp;d", 5);

        let frame = sweep_and_render(&mut store, t0(), &MarqueeConfig::default());
        assert_eq!(Frame { closed: Vec::new(), text: Some("2 app: short".to_string()) }, frame);

        let frame = sweep_and_render(&mut store, t0() + Duration::seconds(7), &MarqueeConfig::default());
        assert_eq!(
            Frame {
                closed: vec![Closed { id: head, reason: CloseReason::Expired }],
                text: Some("3 app: Sum [ac d]".to_string()),
            },
            frame
        );
    }

    #[test]
    fn test_closed_head_is_announced_as_closed() {
        let mut store = Store::new(StoreConfig::default());
        let id = notify(&mut store, "x", "", 0);
        store.close(id, t0());

        let frame = sweep_and_render(&mut store, t0(), &MarqueeConfig::default());
        assert_eq!(Frame { closed: vec![Closed { id, reason: CloseReason::Closed }], text: None }, frame);
    }
}
