use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
    /// The request options do not have a recognized shape.
    #[error("Invalid request options: {0}")]
    InvalidOptions(String),

    /// The host reported that no Bluetooth capability is available.
    #[error("Not ready to connect to a device.")]
    NotReady,

    /// Failure reported by the host Bluetooth capability.
    #[error(transparent)]
    Host(#[from] btleplug::Error),
}

impl From<serde_json::Error> for Error {
    fn from(e: serde_json::Error) -> Self {
        Error::InvalidOptions(e.to_string())
    }
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
