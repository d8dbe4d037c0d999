//! Common types shared across the crate

pub mod error;

pub use error::{FlywheelError, FlywheelResult};
