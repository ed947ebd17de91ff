// #![warn(missing_docs)]

#[macro_use]
extern crate log;

pub mod config;
pub mod error;
pub mod sink;
pub mod tracker;
pub mod window;
pub mod xconnection;

#[cfg(test)]
mod mock;

pub use config::Config;
pub use error::TrackerError;
pub use sink::{GeometryChange, GeometryField, GeometrySink};
pub use tracker::WindowTracker;
pub use window::{Rectangle, WindowGeometry};
pub use xconnection::{XConn, XEvent, XcbConnection};
