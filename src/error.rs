use thiserror::Error;
use xcb::Window;

/// Failures raised while talking to the X server or resolving the active window.
#[derive(Debug, Error)]
pub enum TrackerError {
    /// The window vanished (BadWindow / BadDrawable) while we were querying it
    #[error("window {0:#x} not found")]
    NotFound(Window),

    /// _NET_ACTIVE_WINDOW is unset, zero or points at the root
    #[error("no active window")]
    NoActiveWindow,

    /// The parent chain is cyclic or deeper than we are willing to walk
    #[error("ancestor chain of window {window:#x} exceeds {max_depth} levels")]
    DepthExceeded { window: Window, max_depth: usize },

    /// The X connection is gone; nothing more can be done on it
    #[error("lost connection to X server: {0}")]
    ConnectionLost(String),

    /// Any other X protocol error
    #[error("{request} failed with X error code {code}")]
    Request { request: &'static str, code: u8 },
}

impl TrackerError {
    /// Whether the tracker may carry on waiting for the next event after this error.
    pub fn is_recoverable(&self) -> bool {
        !matches!(self, TrackerError::ConnectionLost(_))
    }
}

pub type Result<T> = std::result::Result<T, TrackerError>;
