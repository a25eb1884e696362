//! JSON codec for backing files.
//!
//! [`JsonCodec`] wraps `serde_json` with three switches:
//!
//! | Option            | Default | Effect when enabled                                   |
//! |-------------------|---------|-------------------------------------------------------|
//! | `serialize_nulls` | `true`  | `null` object members are written instead of dropped  |
//! | `pretty`          | `true`  | two-space indented, one member per line               |
//! | `escape_html`     | `false` | `<`, `>`, `&`, `=`, `'` are written as `\uXXXX`       |
//!
//! Key order is the order in which serde visits the fields, i.e. declaration
//! order (the workspace enables `serde_json/preserve_order`).

use std::io;
use std::string::FromUtf8Error;

use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::ser::{CompactFormatter, Formatter, PrettyFormatter};
use serde_json::Value;
use thiserror::Error;

/// Errors produced while encoding or decoding JSON.
#[derive(Debug, Error)]
pub enum CodecError {
    /// `serde_json` rejected the input or the value.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// The top-level document is not a JSON object.
    #[error("expected a JSON object, found {found}")]
    NotAnObject { found: &'static str },

    /// Formatter output was not valid UTF-8.
    #[error("encoded JSON is not valid UTF-8: {0}")]
    Utf8(#[from] FromUtf8Error),
}

/// Encoding options used when writing a configuration to disk.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct JsonCodec {
    serialize_nulls: bool,
    pretty: bool,
    escape_html: bool,
}

impl Default for JsonCodec {
    /// Explicit nulls, pretty-printed, no HTML escaping.
    fn default() -> Self {
        Self {
            serialize_nulls: true,
            pretty: true,
            escape_html: false,
        }
    }
}

impl JsonCodec {
    pub fn new() -> Self {
        Self::default()
    }

    /// Whether `null` object members are written (`true`) or omitted.
    pub fn serialize_nulls(mut self, enabled: bool) -> Self {
        self.serialize_nulls = enabled;
        self
    }

    /// Whether output is indented (`true`) or compact.
    pub fn pretty(mut self, enabled: bool) -> Self {
        self.pretty = enabled;
        self
    }

    /// Whether HTML-sensitive characters in strings are escaped.
    pub fn escape_html(mut self, enabled: bool) -> Self {
        self.escape_html = enabled;
        self
    }

    pub fn serializes_nulls(&self) -> bool {
        self.serialize_nulls
    }

    pub fn is_pretty(&self) -> bool {
        self.pretty
    }

    pub fn escapes_html(&self) -> bool {
        self.escape_html
    }

    /// Converts `value` into a JSON tree, dropping `null` members when
    /// `serialize_nulls` is off.
    ///
    /// # Errors
    ///
    /// Returns [`CodecError::Json`] if `value` cannot be represented as JSON
    /// (e.g. a map with non-string keys).
    pub fn to_value<T: Serialize + ?Sized>(&self, value: &T) -> Result<Value, CodecError> {
        let mut tree = serde_json::to_value(value)?;
        if !self.serialize_nulls {
            strip_nulls(&mut tree);
        }
        Ok(tree)
    }

    /// Encodes `value` as the text written to a backing file.
    ///
    /// Numbers keep their shortest form for their declared width (an `f32`
    /// of `0.1` is written as `0.1`, not widened to `f64` first).
    ///
    /// # Errors
    ///
    /// See [`JsonCodec::to_value`].
    pub fn to_string<T: Serialize + ?Sized>(&self, value: &T) -> Result<String, CodecError> {
        if self.serialize_nulls {
            return self.render(value);
        }
        // Re-parse the text rather than calling `to_value` to keep number text.
        let mut tree: Value = serde_json::from_str(&serde_json::to_string(value)?)?;
        strip_nulls(&mut tree);
        self.format(&tree)
    }

    /// Renders an already-built JSON tree with this codec's formatting.
    ///
    /// Null stripping is not applied here; use [`JsonCodec::to_value`] for that.
    ///
    /// # Errors
    ///
    /// Returns [`CodecError`] if the formatter fails.
    pub fn format(&self, tree: &Value) -> Result<String, CodecError> {
        self.render(tree)
    }

    fn render<T: Serialize + ?Sized>(&self, tree: &T) -> Result<String, CodecError> {
        match (self.pretty, self.escape_html) {
            (true, true) => write_with(tree, HtmlSafe(PrettyFormatter::new())),
            (true, false) => write_with(tree, PrettyFormatter::new()),
            (false, true) => write_with(tree, HtmlSafe(CompactFormatter)),
            (false, false) => write_with(tree, CompactFormatter),
        }
    }

    /// Parses backing-file text into a JSON tree.
    ///
    /// # Errors
    ///
    /// Returns [`CodecError::Json`] for malformed input.
    pub fn parse(&self, text: &str) -> Result<Value, CodecError> {
        Ok(serde_json::from_str(text)?)
    }

    /// Decodes a JSON tree into `T`.
    ///
    /// # Errors
    ///
    /// Returns [`CodecError::Json`] if the tree does not match `T`.
    pub fn decode<T: DeserializeOwned>(&self, tree: Value) -> Result<T, CodecError> {
        Ok(serde_json::from_value(tree)?)
    }
}

/// Name of the JSON type of `value`, for error messages.
pub(crate) fn kind_of(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

fn write_with<T, F>(tree: &T, formatter: F) -> Result<String, CodecError>
where
    T: Serialize + ?Sized,
    F: Formatter,
{
    let mut buf = Vec::with_capacity(128);
    let mut ser = serde_json::Serializer::with_formatter(&mut buf, formatter);
    tree.serialize(&mut ser)?;
    Ok(String::from_utf8(buf)?)
}

/// Removes `null` members from every object in the tree.  Array elements are kept.
fn strip_nulls(tree: &mut Value) {
    match tree {
        Value::Object(map) => {
            map.retain(|_, v| !v.is_null());
            map.values_mut().for_each(strip_nulls);
        }
        Value::Array(items) => items.iter_mut().for_each(strip_nulls),
        _ => {}
    }
}

/// Formatter adapter that escapes HTML-sensitive characters inside strings.
///
/// Layout methods are forwarded so the wrapped formatter keeps control of
/// indentation.
struct HtmlSafe<F>(F);

impl<F: Formatter> Formatter for HtmlSafe<F> {
    fn write_string_fragment<W: ?Sized + io::Write>(
        &mut self,
        writer: &mut W,
        fragment: &str,
    ) -> io::Result<()> {
        let mut start = 0;
        for (i, c) in fragment.char_indices() {
            let escaped = match c {
                '<' => "\\u003c",
                '>' => "\\u003e",
                '&' => "\\u0026",
                '=' => "\\u003d",
                '\'' => "\\u0027",
                _ => continue,
            };
            if start < i {
                self.0.write_string_fragment(writer, &fragment[start..i])?;
            }
            writer.write_all(escaped.as_bytes())?;
            // Every escaped character is a single ASCII byte.
            start = i + 1;
        }
        if start < fragment.len() {
            self.0.write_string_fragment(writer, &fragment[start..])?;
        }
        Ok(())
    }

    fn begin_array<W: ?Sized + io::Write>(&mut self, writer: &mut W) -> io::Result<()> {
        self.0.begin_array(writer)
    }

    fn end_array<W: ?Sized + io::Write>(&mut self, writer: &mut W) -> io::Result<()> {
        self.0.end_array(writer)
    }

    fn begin_array_value<W: ?Sized + io::Write>(
        &mut self,
        writer: &mut W,
        first: bool,
    ) -> io::Result<()> {
        self.0.begin_array_value(writer, first)
    }

    fn end_array_value<W: ?Sized + io::Write>(&mut self, writer: &mut W) -> io::Result<()> {
        self.0.end_array_value(writer)
    }

    fn begin_object<W: ?Sized + io::Write>(&mut self, writer: &mut W) -> io::Result<()> {
        self.0.begin_object(writer)
    }

    fn end_object<W: ?Sized + io::Write>(&mut self, writer: &mut W) -> io::Result<()> {
        self.0.end_object(writer)
    }

    fn begin_object_key<W: ?Sized + io::Write>(
        &mut self,
        writer: &mut W,
        first: bool,
    ) -> io::Result<()> {
        self.0.begin_object_key(writer, first)
    }

    fn end_object_key<W: ?Sized + io::Write>(&mut self, writer: &mut W) -> io::Result<()> {
        self.0.end_object_key(writer)
    }

    fn begin_object_value<W: ?Sized + io::Write>(&mut self, writer: &mut W) -> io::Result<()> {
        self.0.begin_object_value(writer)
    }

    fn end_object_value<W: ?Sized + io::Write>(&mut self, writer: &mut W) -> io::Result<()> {
        self.0.end_object_value(writer)
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
