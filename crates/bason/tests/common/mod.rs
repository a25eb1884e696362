//! Shared fixtures for the bason integration tests.

#![allow(dead_code)]

use std::io;
use std::path::PathBuf;
use std::sync::{Arc, Mutex};

use bason::{Configuration, Persist};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Two-field configuration used throughout the tests.
#[derive(Debug, Default, Clone, PartialEq, Serialize, Deserialize, Persist)]
pub struct ExampleConfig {
    pub enabled: bool,
    pub retries: i32,
}

impl Configuration for ExampleConfig {
    fn init(&mut self) {
        self.enabled = true;
        self.retries = 3;
    }
}

pub const EXAMPLE_DEFAULTS: &str = "{\n  \"enabled\": true,\n  \"retries\": 3\n}";

/// Temporary config directory removed on drop.
pub struct TempConfigDir {
    pub path: PathBuf,
}

impl TempConfigDir {
    pub fn new() -> Self {
        let path = std::env::temp_dir().join(format!("bason_test_{}", Uuid::new_v4()));
        std::fs::create_dir_all(&path).expect("create temp dir");
        Self { path }
    }

    pub fn file(&self, name: &str) -> PathBuf {
        self.path.join(format!("{name}.json"))
    }

    pub fn contents(&self, name: &str) -> String {
        std::fs::read_to_string(self.file(name)).expect("read backing file")
    }
}

impl Drop for TempConfigDir {
    fn drop(&mut self) {
        std::fs::remove_dir_all(&self.path).ok();
    }
}

/// In-memory sink for `tracing` output.
#[derive(Clone, Default)]
pub struct LogBuffer(Arc<Mutex<Vec<u8>>>);

impl LogBuffer {
    pub fn contents(&self) -> String {
        let bytes = self.0.lock().expect("lock poisoned");
        String::from_utf8_lossy(&bytes).into_owned()
    }
}

impl io::Write for LogBuffer {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.0.lock().expect("lock poisoned").extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

/// Runs `f` with a scoped subscriber and returns its result plus the log text.
pub fn capture_logs<R>(f: impl FnOnce() -> R) -> (R, String) {
    let buffer = LogBuffer::default();
    let writer = buffer.clone();
    let subscriber = tracing_subscriber::fmt()
        .with_writer(move || writer.clone())
        .with_ansi(false)
        .with_max_level(tracing::Level::DEBUG)
        .finish();

    let result = tracing::subscriber::with_default(subscriber, f);
    (result, buffer.contents())
}
