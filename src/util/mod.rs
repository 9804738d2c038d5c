//! Shared utilities: geometry, id types, clock and tracing setup.

pub mod clock;
pub mod geometry;
pub mod serde;
pub mod telemetry;

pub use self::serde::*;
pub use clock::*;
pub use geometry::*;
pub use telemetry::*;
