#![no_std]
#![forbid(unsafe_code)]

//! # isrtick core
//!
//! Time base for the isrtick periodic scheduler: microsecond time types,
//! the interrupt-safe monotonic clock, the hardware tick-source abstraction
//! and the build/construction-time configuration shared by every port.

#[cfg(feature = "std")]
extern crate std;

use core::fmt;

pub mod clock;
pub mod config;
pub mod source;
pub mod time;

pub use clock::*;
pub use config::*;
pub use source::*;
pub use time::*;

/// isrtick version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Result type used throughout isrtick
pub type Result<T> = core::result::Result<T, Error>;

/// Errors reported by registry operations
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Error {
    /// Every registry slot is occupied
    RegistryFull,
    /// The task period is zero or exceeds `Duration::MAX_PERIOD`
    InvalidPeriod,
    /// The task handle does not refer to a registered task
    UnknownTask,
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Error::RegistryFull => write!(f, "Task registry is full"),
            Error::InvalidPeriod => write!(f, "Task period is out of range"),
            Error::UnknownTask => write!(f, "Task is not registered"),
        }
    }
}

#[cfg(feature = "std")]
impl std::error::Error for Error {}

#[cfg(feature = "defmt")]
impl defmt::Format for Error {
    fn format(&self, fmt: defmt::Formatter) {
        match self {
            Error::RegistryFull => defmt::write!(fmt, "RegistryFull"),
            Error::InvalidPeriod => defmt::write!(fmt, "InvalidPeriod"),
            Error::UnknownTask => defmt::write!(fmt, "UnknownTask"),
        }
    }
}
