use thiserror::Error;

/// Reasons a capture device can refuse to hand out frames.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum DeviceError {
    #[error("Permission to use the camera was denied")]
    PermissionDenied,

    #[error("No camera matching the requested facing was found")]
    NotFound,

    #[error("The camera is already in use by another application")]
    Busy,

    #[error("The device handle is no longer active")]
    Inactive,

    #[error("Frame source could not be read: {reason}")]
    Unreadable { reason: String },
}

#[derive(Error, Debug)]
pub enum RollcallError {
    #[error("Device error: {0}")]
    Device(#[from] DeviceError),

    #[error("Transport error: {0}")]
    Transport(String),

    /// The server answered with `success=false`.
    #[error("Server rejected request: {0}")]
    ServerRejection(String),

    #[error("Frame encoding error: {0}")]
    Encoding(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[cfg(feature = "network")]
    #[error("HTTP request error: {0}")]
    HttpError(#[from] reqwest::Error),
}

pub type Result<T> = std::result::Result<T, RollcallError>;
