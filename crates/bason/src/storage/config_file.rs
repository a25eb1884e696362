//! File-backed persistence driver.
//!
//! [`ConfigFile<T>`] owns one backing file at `<config_dir>/<path>.json` and the
//! configuration value `T` stored in it.  Opening a `ConfigFile` immediately
//! loads it:
//!
//! ```text
//! open ─► read ─┬─ file missing ──► create ─► init() ─► write ─► Created
//!               ├─ file present ──► parse ─► merge-decode ────► Loaded
//!               └─ any failure ───► log error ─► init() ──────► Defaulted
//! ```
//!
//! Saving is explicit through [`ConfigFile::write`].  Neither operation
//! returns an error: failures are logged inside the configuration's span and
//! the value falls back to [`Configuration::init`].  The returned
//! [`ReadOutcome`] / [`WriteOutcome`] tells which path was taken.
//!
//! There is no locking.  Two `ConfigFile`s pointed at the same path simply
//! race; the last writer wins.

use std::fmt;
use std::fs::{self, File, OpenOptions};
use std::io::{self, Read, Write};
use std::marker::PhantomData;
use std::ops::{Deref, DerefMut};
use std::path::{Path, PathBuf};

use serde_json::Value;
use thiserror::Error;
use tracing::{debug, error, info, info_span, Span};

use super::config_dir::ConfigDirProvider;
use crate::codec::json::{CodecError, JsonCodec};
use crate::codec::merge::merge_decode;
use crate::domain::configuration::{Configuration, FieldDesc};

/// Extension appended to every backing file name.
pub const FILE_EXTENSION: &str = "json";

/// Error type for backing-file operations.
///
/// These never leave [`ConfigFile::read`] or [`ConfigFile::write`]; they are
/// logged there.  [`ConfigFile::serialize`] and [`ConfigFile::deserialize`]
/// return them directly.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// The backing file (or its directory) could not be created.
    #[error("could not create config file {}: {source}", path.display())]
    Create {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    /// The file existed when checked but was gone when opened.
    #[error("config file {} was not found despite existing", path.display())]
    Vanished { path: PathBuf },

    /// The file could not be opened.
    #[error("I/O error opening config at {}: {source}", path.display())]
    Open {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    /// Reading the file contents failed.
    #[error("failed to read config at {}: {source}", path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    /// Writing the file contents failed.
    #[error("failed to write config at {}: {source}", path.display())]
    Write {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    /// The file contents are not valid JSON.
    #[error("failed to parse config at {}: {source}", path.display())]
    Parse {
        path: PathBuf,
        #[source]
        source: CodecError,
    },

    /// The JSON document does not have the shape of the configuration.
    #[error("config document does not match the configuration: {0}")]
    Decode(#[source] CodecError),

    /// The configuration could not be encoded.
    #[error("failed to encode config: {0}")]
    Encode(#[source] CodecError),
}

/// Which path [`ConfigFile::read`] took.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReadOutcome {
    /// The backing file was parsed and merged into the value.
    Loaded,
    /// No backing file existed; defaults were assigned and persisted.
    Created,
    /// Something failed; the value holds its defaults.
    Defaulted,
}

/// Which path [`ConfigFile::write`] took.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WriteOutcome {
    /// The current value was written over the existing file.
    Written,
    /// No backing file existed; defaults were assigned and persisted instead
    /// of the current value.
    Created,
    /// Something failed; the value holds its defaults.
    Defaulted,
}

/// Optional overrides for [`ConfigFile`] construction.
#[derive(Debug)]
pub struct ConfigFileBuilder<T> {
    namespace: String,
    path: String,
    codec: JsonCodec,
    span: Option<Span>,
    _config: PhantomData<fn() -> T>,
}

impl<T: Configuration> ConfigFileBuilder<T> {
    /// Replaces the default codec (explicit nulls, pretty, no HTML escaping).
    pub fn codec(mut self, codec: JsonCodec) -> Self {
        self.codec = codec;
        self
    }

    /// Replaces the default `config` span used for every log event.
    pub fn span(mut self, span: Span) -> Self {
        self.span = Some(span);
        self
    }

    /// Resolves the backing file from `dirs` and loads it.
    pub fn open<P: ConfigDirProvider>(self, dirs: P) -> ConfigFile<T> {
        let file = dirs
            .config_dir()
            .join(format!("{}.{FILE_EXTENSION}", self.path));
        let span = self.span.unwrap_or_else(|| {
            let name = logger_name(&self.namespace, &self.path);
            info_span!("config", name = %name)
        });

        // Start from the defaults so keys absent from an existing file load as defaults.
        let mut value = T::default();
        value.init();

        let mut config = ConfigFile {
            namespace: self.namespace,
            file,
            codec: self.codec,
            span,
            value,
        };
        config.read();
        config
    }
}

/// A configuration value together with its backing JSON file.
///
/// Dereferences to `T`, so fields can be read and assigned directly:
///
/// ```no_run
/// # use bason::{ConfigFile, Configuration, Persist};
/// # use serde::{Deserialize, Serialize};
/// # #[derive(Default, Serialize, Deserialize, Persist)]
/// # struct ExampleConfig { retries: u32 }
/// # impl Configuration for ExampleConfig { fn init(&mut self) { self.retries = 3; } }
/// let mut config = ConfigFile::<ExampleConfig>::open("example", "example", std::path::Path::new("config"));
/// config.retries = 10;
/// config.write();
/// ```
pub struct ConfigFile<T> {
    namespace: String,
    file: PathBuf,
    codec: JsonCodec,
    span: Span,
    value: T,
}

impl<T: Configuration> ConfigFile<T> {
    /// Opens `<config_dir>/<path>.json` with the default codec and logger.
    pub fn open<P: ConfigDirProvider>(
        namespace: impl Into<String>,
        path: impl Into<String>,
        dirs: P,
    ) -> Self {
        Self::builder(namespace, path).open(dirs)
    }

    /// Starts building a `ConfigFile` with a custom codec or span.
    pub fn builder(namespace: impl Into<String>, path: impl Into<String>) -> ConfigFileBuilder<T> {
        ConfigFileBuilder {
            namespace: namespace.into(),
            path: path.into(),
            codec: JsonCodec::default(),
            span: None,
            _config: PhantomData,
        }
    }

    /// Loads the backing file into the value.
    ///
    /// Creates the file with defaults if it does not exist.  Any failure is
    /// logged and leaves the value at its defaults; an unreadable or malformed
    /// file is left untouched on disk.
    pub fn read(&mut self) -> ReadOutcome {
        let span = self.span.clone();
        let _entered = span.enter();

        match create_new(&self.file) {
            Ok(true) => {
                info!(path = %self.file.display(), "generating a new configuration file");
                self.value.init();
                match self.write() {
                    WriteOutcome::Defaulted => ReadOutcome::Defaulted,
                    WriteOutcome::Written | WriteOutcome::Created => ReadOutcome::Created,
                }
            }
            Ok(false) => match self.load() {
                Ok(()) => {
                    debug!(path = %self.file.display(), "configuration loaded");
                    ReadOutcome::Loaded
                }
                Err(e) => {
                    error!(error = %e, "loading the configuration failed; initializing default values");
                    self.value.init();
                    ReadOutcome::Defaulted
                }
            },
            Err(e) => {
                error!(error = %e, "the file could not be made; initializing default values");
                self.value.init();
                ReadOutcome::Defaulted
            }
        }
    }

    /// Persists the current value to the backing file.
    ///
    /// If the file no longer exists it is recreated holding the defaults, and
    /// the value is reset to them.  Any failure is logged and leaves the value
    /// at its defaults.
    pub fn write(&mut self) -> WriteOutcome {
        let span = self.span.clone();
        let _entered = span.enter();

        match create_new(&self.file) {
            Ok(true) => {
                info!(path = %self.file.display(), "making a new configuration file");
                self.value.init();
                match self.store() {
                    Ok(()) => WriteOutcome::Created,
                    Err(e) => {
                        error!(error = %e, "unable to write default values to the new file");
                        WriteOutcome::Defaulted
                    }
                }
            }
            Ok(false) => match self.store() {
                Ok(()) => WriteOutcome::Written,
                Err(e) => {
                    error!(error = %e, "unable to write to the file; initializing default values");
                    self.value.init();
                    WriteOutcome::Defaulted
                }
            },
            Err(e) => {
                error!(error = %e, "the file could not be made; initializing default values");
                self.value.init();
                WriteOutcome::Defaulted
            }
        }
    }

    /// Merges a parsed JSON document into the value.
    ///
    /// Only eligible fields are taken from `document`; unknown keys are
    /// ignored and missing keys keep their current value.  A field whose value
    /// cannot be decoded is logged and skipped without affecting the others.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Decode`] if `document` is not an object or the
    /// merged result cannot be decoded.  The value is unchanged in that case.
    pub fn deserialize(&mut self, document: Value) -> Result<(), ConfigError> {
        let report = merge_decode(&mut self.value, document).map_err(ConfigError::Decode)?;

        for rejected in &report.rejected {
            error!(
                field = rejected.field.name,
                field_type = rejected.field.type_name,
                found = rejected.found,
                error = %rejected.error,
                "deserialization of field {} {} failed",
                rejected.field.type_name,
                rejected.field.name
            );
        }
        if !report.missing.is_empty() {
            let missing: Vec<_> = report.missing.iter().map(|f| f.name).collect();
            debug!(?missing, "fields absent from the file keep their current value");
        }
        Ok(())
    }

    /// Encodes the eligible fields of the value with this file's codec.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Encode`] if the value cannot be represented as JSON.
    pub fn serialize(&self) -> Result<String, ConfigError> {
        self.codec.to_string(&self.value).map_err(ConfigError::Encode)
    }

    /// The eligible fields of `T`, in the order they are written.
    ///
    /// Fields marked `#[serde(skip_deserializing)]` are still written by
    /// serde but are never loaded back, so they are not listed here.
    pub fn fields(&self) -> Vec<FieldDesc> {
        T::fields()
    }

    fn load(&mut self) -> Result<(), ConfigError> {
        let text = read_file(&self.file)?;
        let document = self.codec.parse(&text).map_err(|source| ConfigError::Parse {
            path: self.file.clone(),
            source,
        })?;
        self.deserialize(document)
    }

    fn store(&self) -> Result<(), ConfigError> {
        // Encode before truncating so an encoding failure leaves the file intact.
        let text = self.serialize()?;
        let mut file = OpenOptions::new()
            .write(true)
            .truncate(true)
            .open(&self.file)
            .map_err(|source| open_error(&self.file, source))?;
        file.write_all(text.as_bytes())
            .map_err(|source| ConfigError::Write {
                path: self.file.clone(),
                source,
            })
    }
}

impl<T> ConfigFile<T> {
    /// The namespace this configuration was opened under.
    pub fn namespace(&self) -> &str {
        &self.namespace
    }

    /// Full path of the backing file.  Fixed for the lifetime of the value.
    pub fn path(&self) -> &Path {
        &self.file
    }

    pub fn codec(&self) -> &JsonCodec {
        &self.codec
    }

    /// The span every log event of this configuration is emitted in.
    pub fn span(&self) -> &Span {
        &self.span
    }

    pub fn get(&self) -> &T {
        &self.value
    }

    pub fn get_mut(&mut self) -> &mut T {
        &mut self.value
    }

    pub fn into_inner(self) -> T {
        self.value
    }
}

impl<T> Deref for ConfigFile<T> {
    type Target = T;

    fn deref(&self) -> &T {
        &self.value
    }
}

impl<T> DerefMut for ConfigFile<T> {
    fn deref_mut(&mut self) -> &mut T {
        &mut self.value
    }
}

impl<T: fmt::Debug> fmt::Debug for ConfigFile<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ConfigFile")
            .field("namespace", &self.namespace)
            .field("file", &self.file)
            .field("codec", &self.codec)
            .field("value", &self.value)
            .finish()
    }
}

/// `"<namespace>/<path>"` with everything from the first `.` of `path` removed.
fn logger_name(namespace: &str, path: &str) -> String {
    let stem = path.split_once('.').map_or(path, |(stem, _)| stem);
    format!("{namespace}/{stem}")
}

/// Atomically creates `path` if it does not exist.
///
/// Returns `Ok(true)` if the file was created and `Ok(false)` if it was
/// already there.  Missing parent directories are created first.
fn create_new(path: &Path) -> Result<bool, ConfigError> {
    let create_error = |source| ConfigError::Create {
        path: path.to_path_buf(),
        source,
    };

    if let Some(dir) = path.parent().filter(|d| !d.as_os_str().is_empty()) {
        fs::create_dir_all(dir).map_err(create_error)?;
    }

    match OpenOptions::new().write(true).create_new(true).open(path) {
        Ok(_) => Ok(true),
        Err(e) if e.kind() == io::ErrorKind::AlreadyExists => Ok(false),
        Err(e) => Err(create_error(e)),
    }
}

fn read_file(path: &Path) -> Result<String, ConfigError> {
    let mut file = File::open(path).map_err(|source| open_error(path, source))?;
    let mut text = String::new();
    file.read_to_string(&mut text)
        .map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
    Ok(text)
}

fn open_error(path: &Path, source: io::Error) -> ConfigError {
    if source.kind() == io::ErrorKind::NotFound {
        ConfigError::Vanished {
            path: path.to_path_buf(),
        }
    } else {
        ConfigError::Open {
            path: path.to_path_buf(),
            source,
        }
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
