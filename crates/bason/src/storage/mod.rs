//! Storage: where configuration files live and how they are read and written.
//!
//! - [`config_dir`] answers "which directory holds configuration files".
//! - [`config_file`] owns one backing file and the value persisted in it.
//!
//! File-system failures stop here.  Callers of [`config_file::ConfigFile::read`]
//! and [`config_file::ConfigFile::write`] only ever observe a value holding
//! either the persisted state or its defaults.

pub mod config_dir;
pub mod config_file;
