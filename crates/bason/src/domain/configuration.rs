//! Capability traits implemented by every configuration type.
//!
//! A configuration type is a plain struct that:
//!
//! - derives `Serialize`/`Deserialize` so it can be written as a JSON object,
//! - derives [`Persist`] so the storage layer knows which fields are persisted
//!   and can copy them from a freshly decoded value onto the live one,
//! - implements [`Configuration::init`] to assign its defaults.
//!
//! Fields marked `#[serde(skip)]` are transient: they never reach the file and
//! are never overwritten by a load.

use std::fmt;

use serde::de::DeserializeOwned;
use serde::Serialize;

/// Describes one persisted field: its JSON key and its Rust type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct FieldDesc {
    /// Key of the field in the backing JSON object.
    pub name: &'static str,
    /// Rust type of the field as written in the struct declaration.
    pub type_name: &'static str,
}

impl FieldDesc {
    pub const fn new(name: &'static str, type_name: &'static str) -> Self {
        Self { name, type_name }
    }
}

impl fmt::Display for FieldDesc {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.type_name, self.name)
    }
}

/// Field-level access generated by `#[derive(Persist)]`.
pub trait Persist: Sized {
    /// The eligible (non-transient) fields in declaration order.
    ///
    /// Flattened components contribute their own fields at the position where
    /// they are declared.
    fn fields() -> Vec<FieldDesc>;

    /// Moves every eligible field of `decoded` into `self`.
    ///
    /// Transient fields of `self` are left as they are.
    fn absorb(&mut self, decoded: Self);
}

/// A persisted settings object.
///
/// `Default` only has to produce some value; a [`crate::ConfigFile`] calls
/// `init` on it before the first load, so keys missing from an existing file
/// come out as the `init` defaults.
pub trait Configuration: Persist + Serialize + DeserializeOwned + Default {
    /// Assigns every eligible field its default value.
    ///
    /// Called whenever the persisted state cannot be read or written, so it
    /// must not panic.
    fn init(&mut self);
}
