use crate::error::{Error, Result};
use futures::StreamExt;
use tokio::sync::mpsc::{self, error::TryRecvError};
use zbus::{fdo::RequestNameFlags, message, names::BusName, zvariant::DynamicType, Connection, Message, MessageStream};

/// Our end of the session bus, owning a well-known name.
///
/// Incoming method calls are read by a background task and queued, so that [`poll_once`] never
/// has to wait. Everything else (replies, signals) goes straight out on the connection.
///
/// [`poll_once`]: BusConnection::poll_once
#[derive(Debug)]
pub struct BusConnection {
    con: Connection,
    service_name: String,
    incoming: mpsc::UnboundedReceiver<Message>,
    reader: tokio::task::JoinHandle<()>,
    reader_gone: bool,
}

impl BusConnection {
    /// Connect to the session bus and become the primary owner of `service_name`.
    ///
    /// Must be called from within a tokio runtime.
    pub async fn connect_and_claim(service_name: &str) -> Result<Self> {
        let con = Connection::session().await.map_err(Error::BusUnavailable)?;

        // start listening before the name is ours, so that no early call is missed
        let (send, incoming) = mpsc::unbounded_channel();
        let reader = tokio::spawn(forward_method_calls(MessageStream::from(&con), send));

        let flags = [RequestNameFlags::ReplaceExisting, RequestNameFlags::DoNotQueue];
        let claimed = match con.request_name_with_flags(service_name, flags.into_iter().collect()).await {
            Ok(zbus::fdo::RequestNameReply::PrimaryOwner | zbus::fdo::RequestNameReply::AlreadyOwner) => Ok(()),
            Ok(_) | Err(zbus::Error::NameTaken) => Err(Error::NameAlreadyOwned(service_name.to_string())),
            Err(e) => Err(Error::BusUnavailable(e)),
        };
        if let Err(e) = claimed {
            reader.abort();
            return Err(e);
        }

        log::info!("Acquired {} on the session bus as {:?}", service_name, con.unique_name());
        Ok(Self { con, service_name: service_name.to_string(), incoming, reader, reader_gone: false })
    }

    /// Take the next queued method call, if there is one. Never blocks.
    pub fn poll_once(&mut self) -> Option<Message> {
        match self.incoming.try_recv() {
            Ok(msg) => Some(msg),
            Err(TryRecvError::Empty) => None,
            Err(TryRecvError::Disconnected) => {
                if !self.reader_gone {
                    self.reader_gone = true;
                    log::error!("Lost the bus reader, no more notifications will be received");
                }
                None
            }
        }
    }

    /// Send a method return for `call`.
    pub async fn reply<B>(&self, call: &Message, body: &B) -> Result<()>
    where
        B: serde::Serialize + DynamicType,
    {
        self.con.reply(call, body).await.map(|_| ()).map_err(Error::SendFailed)
    }

    /// Send an error reply for `call`, with `message` as its description.
    pub async fn reply_error(&self, call: &Message, error_name: &str, message: &str) -> Result<()> {
        self.con.reply_error(call, error_name, &message).await.map(|_| ()).map_err(Error::SendFailed)
    }

    /// Broadcast a signal.
    pub async fn signal<B>(&self, path: &str, interface: &str, member: &str, body: &B) -> Result<()>
    where
        B: serde::Serialize + DynamicType,
    {
        self.con.emit_signal(None::<BusName<'_>>, path, interface, member, body).await.map_err(Error::SendFailed)
    }

    /// Give up the service name and stop reading from the bus.
    pub async fn disconnect(self) -> Result<()> {
        self.con.release_name(self.service_name.as_str()).await.map_err(Error::SendFailed)?;
        log::info!("Released {}", self.service_name);
        Ok(())
    }
}

impl Drop for BusConnection {
    fn drop(&mut self) {
        self.reader.abort();
    }
}

async fn forward_method_calls(mut stream: MessageStream, send: mpsc::UnboundedSender<Message>) {
    while let Some(msg) = stream.next().await {
        match msg {
            Ok(msg) if msg.header().message_type() == message::Type::MethodCall => {
                if send.send(msg).is_err() {
                    // receiver dropped, nobody is listening anymore
                    break;
                }
            }
            Ok(_) => {}
            Err(e) => log::warn!("Failed to read message from the bus: {}", e),
        }
    }
    log::debug!("bus reader finished");
}
