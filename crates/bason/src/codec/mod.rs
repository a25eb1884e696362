//! JSON codec and merge-decode.
//!
//! - [`json`] turns values into the text stored in a backing file and back,
//!   honouring the null, pretty-printing and HTML-escaping options.
//! - [`merge`] applies a parsed document onto a live configuration value
//!   field by field.

pub mod json;
pub mod merge;

pub use json::{CodecError, JsonCodec};
pub use merge::{merge_decode, FieldRejection, MergeReport};
