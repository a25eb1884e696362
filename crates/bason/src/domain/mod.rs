//! Domain layer: what a configuration type has to provide.
//!
//! Nothing here performs I/O.  The storage layer drives these traits.

pub mod configuration;

pub use configuration::{Configuration, FieldDesc, Persist};
