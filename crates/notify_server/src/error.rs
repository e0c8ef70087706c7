use thiserror::Error;

#[derive(Error, Debug)]
pub enum Error {
    #[error("Could not connect to the session bus")]
    BusUnavailable(#[source] zbus::Error),
    #[error("Bus name {0} is already owned by another notification daemon")]
    NameAlreadyOwned(String),
    #[error("Failed to send message on the bus")]
    SendFailed(#[source] zbus::Error),
    #[error("Malformed {member} call")]
    ProtocolDecode {
        member: String,
        #[source]
        source: zbus::Error,
    },
}

pub type Result<T> = std::result::Result<T, Error>;
