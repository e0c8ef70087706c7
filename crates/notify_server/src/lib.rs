//! A minimal `org.freedesktop.Notifications` server for status bars that can only show one line
//! of text.
//!
//! Notifications are kept in a [`Store`] in the order they arrive. The bar asks
//! [`NotifyServer::poll_current_message`] for the oldest one on every redraw; expired and closed
//! notifications are evicted (and announced with `NotificationClosed`) at that point.

pub mod bounded;
pub mod names;
pub mod protocol;
pub mod sanitize;

mod bus;
pub use bus::*;

mod config;
pub use config::*;

mod display;
pub use display::*;

mod error;
pub use error::*;

mod notification;
pub use notification::*;

mod server;
pub use server::*;

mod store;
pub use store::*;
