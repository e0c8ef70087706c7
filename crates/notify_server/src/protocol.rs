//! Decoding of `org.freedesktop.Notifications` method calls and their effect on the [`Store`].
//!
//! Supported calls:
//!
//! | method                 | arguments                                                        | reply              |
//! |------------------------|------------------------------------------------------------------|--------------------|
//! | `Notify`               | `app_name, replaces_id, icon, summary, body, actions, hints, timeout` | the id       |
//! | `GetCapabilities`      |                                                                  | `["body"]`         |
//! | `GetServerInformation` |                                                                  | four strings       |
//! | `CloseNotification`    | `id`                                                             | nothing            |
//!
//! Icons, actions and hints are accepted and thrown away. `org.freedesktop.DBus.Peer.Ping` gets an
//! empty reply, and every other method call an `UnknownMethod` error.

use crate::{
    error::{Error, Result},
    names,
    notification::NewNotification,
    store::Store,
};
use chrono::{DateTime, Utc};
use std::collections::HashMap;
use zbus::{message, zvariant::OwnedValue, Message};

/// We only render plain text bodies.
pub const CAPABILITIES: &[&str] = &["body"];

pub const SERVER_INFORMATION: ServerInformation =
    ServerInformation { name: "statusd", vendor: "statusd", version: env!("CARGO_PKG_VERSION"), spec_version: "1.0" };

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ServerInformation {
    pub name: &'static str,
    pub vendor: &'static str,
    pub version: &'static str,
    pub spec_version: &'static str,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Request {
    Notify(NewNotification),
    GetCapabilities,
    GetServerInformation,
    CloseNotification(u32),
    /// `org.freedesktop.DBus.Peer.Ping`
    Ping,
    /// Any other method call. Answered with an `UnknownMethod` error so that callers (and tools
    /// like `gdbus` that introspect first) don't sit waiting for a timeout.
    Unsupported { interface: Option<String>, member: String },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Reply {
    Id(u32),
    Capabilities(&'static [&'static str]),
    ServerInformation(ServerInformation),
    Empty,
    /// An `org.freedesktop.DBus.Error.UnknownMethod` error with this message.
    UnknownMethod(String),
}

type NotifyArgs = (String, u32, String, String, String, Vec<String>, HashMap<String, OwnedValue>, i32);

impl Request {
    /// Decode a message received on the bus.
    ///
    /// Returns `Ok(None)` for anything that is not a method call. A call to one of our methods
    /// with the wrong arguments is an [`Error::ProtocolDecode`].
    pub fn from_message(msg: &Message) -> Result<Option<Request>> {
        let header = msg.header();
        if header.message_type() != message::Type::MethodCall {
            return Ok(None);
        }
        let Some(member) = header.member() else {
            return Ok(None);
        };
        let interface = header.interface().map(|i| i.as_str());

        let body = msg.body();
        let decode_err = |source| Error::ProtocolDecode { member: member.to_string(), source };
        let request = match (interface, member.as_str()) {
            (None | Some(names::NOTIFICATIONS_INTERFACE), "Notify") => {
                let (app_name, replaces_id, _icon, summary, body, _actions, _hints, expire_timeout): NotifyArgs =
                    body.deserialize().map_err(decode_err)?;
                Request::Notify(NewNotification { app_name, replaces_id, summary, body, expire_timeout })
            }
            (None | Some(names::NOTIFICATIONS_INTERFACE), "GetCapabilities") => Request::GetCapabilities,
            (None | Some(names::NOTIFICATIONS_INTERFACE), "GetServerInformation") => Request::GetServerInformation,
            (None | Some(names::NOTIFICATIONS_INTERFACE), "CloseNotification") => {
                Request::CloseNotification(body.deserialize::<u32>().map_err(decode_err)?)
            }
            (Some(names::PEER_INTERFACE), "Ping") => Request::Ping,
            (interface, member) => {
                Request::Unsupported { interface: interface.map(str::to_string), member: member.to_string() }
            }
        };
        Ok(Some(request))
    }
}

/// Apply a request to the store and build the reply for it.
///
/// This never emits `NotificationClosed` itself: closing only shortens the lifetime, and the
/// signal goes out on the next sweep.
pub fn handle(store: &mut Store, request: Request, now: DateTime<Utc>) -> Reply {
    match request {
        Request::Notify(new) => Reply::Id(store.create_or_update(new, now)),
        Request::GetCapabilities => Reply::Capabilities(CAPABILITIES),
        Request::GetServerInformation => Reply::ServerInformation(SERVER_INFORMATION),
        Request::CloseNotification(id) => {
            if !store.close(id, now) {
                log::debug!("CloseNotification for unknown id {}", id);
            }
            Reply::Empty
        }
        Request::Ping => Reply::Empty,
        Request::Unsupported { interface, member } => {
            log::debug!("Unsupported method {:?}.{}", interface, member);
            Reply::UnknownMethod(match interface {
                Some(interface) => format!("No such method '{}' on interface '{}'", member, interface),
                None => format!("No such method '{}'", member),
            })
        }
    }
}
