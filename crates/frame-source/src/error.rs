use thiserror::Error;

pub type Result<T, E = Error> = core::result::Result<T, E>;

#[derive(Debug, Error)]
pub enum Error {
    #[error("device unavailable: {0}")]
    DeviceUnavailable(String),
    #[error("mode '{0}' not recognised; supported modes: 'R', 'G', 'B', or 'RGB'")]
    UnrecognizedMode(String),
    #[error("not connected to a capture device")]
    NotConnected,
    #[error("invalid frame: {0}")]
    InvalidFrame(String),
    #[error("I/O error: {0}")]
    Io(String),
    #[error("backend error: {0}")]
    Backend(String),
}
