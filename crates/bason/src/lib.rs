//! # bason
//!
//! JSON-backed configuration persistence.  A configuration type describes its
//! settings as a plain struct, supplies its defaults through
//! [`Configuration::init`], and is wrapped in a [`ConfigFile`] which loads it
//! from `<config_dir>/<path>.json` on construction and saves it on request.
//!
//! I/O failures never escape [`ConfigFile::read`] or [`ConfigFile::write`]:
//! they are logged through `tracing` and the value falls back to its defaults.
//!
//! ```no_run
//! use bason::{ConfigFile, Configuration, Persist};
//! use serde::{Deserialize, Serialize};
//!
//! #[derive(Debug, Default, Serialize, Deserialize, Persist)]
//! struct ExampleConfig {
//!     enabled: bool,
//!     retries: u32,
//! }
//!
//! impl Configuration for ExampleConfig {
//!     fn init(&mut self) {
//!         self.enabled = true;
//!         self.retries = 3;
//!     }
//! }
//!
//! let mut config = ConfigFile::<ExampleConfig>::open("example", "example", std::path::Path::new("config"));
//! config.retries = 10;
//! config.write();
//! ```
//!
//! # Layout
//!
//! - **`domain`** – the capability traits a configuration type implements.
//! - **`codec`** – the JSON codec and the merge-decode used on load.
//! - **`storage`** – config directory resolution and the file-backed driver.

// Lets `#[derive(Persist)]` output, which names `::bason`, resolve inside this crate's own tests.
extern crate self as bason;

pub mod codec;
pub mod domain;
pub mod storage;

pub use bason_derive::Persist;
pub use codec::json::{CodecError, JsonCodec};
pub use domain::configuration::{Configuration, FieldDesc, Persist};
pub use storage::config_dir::{ConfigDirProvider, PlatformConfigDir};
pub use storage::config_file::{
    ConfigError, ConfigFile, ConfigFileBuilder, ReadOutcome, WriteOutcome,
};
