//! Merge-decode: apply a parsed JSON document onto a live value.
//!
//! The document is never decoded on its own.  Instead the live value is
//! serialized, each eligible key found in the document is swapped in one at a
//! time, and the candidate is test-decoded after every swap.  A key whose value
//! does not fit its field is put back and reported; the others stay.  The
//! final candidate is decoded into a sibling instance whose eligible fields are
//! then moved onto the live value with [`Persist::absorb`].
//!
//! As a result:
//!
//! - keys that are not eligible fields are ignored,
//! - fields missing from the document keep their current value,
//! - one bad field never prevents the rest from loading,
//! - transient fields are never touched.

use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::{Map, Value};

use super::json::{kind_of, CodecError};
use crate::domain::configuration::{FieldDesc, Persist};

/// A field whose incoming value could not be decoded.
#[derive(Debug)]
pub struct FieldRejection {
    pub field: FieldDesc,
    /// JSON type of the rejected value.
    pub found: &'static str,
    pub error: serde_json::Error,
}

/// Which eligible fields were taken from the document.
#[derive(Debug, Default)]
pub struct MergeReport {
    pub applied: Vec<FieldDesc>,
    pub rejected: Vec<FieldRejection>,
    /// Eligible fields the document did not mention.
    pub missing: Vec<FieldDesc>,
}

impl MergeReport {
    pub fn is_clean(&self) -> bool {
        self.rejected.is_empty()
    }
}

/// Applies `document` onto `live`.
///
/// # Errors
///
/// Returns [`CodecError::NotAnObject`] if `document` (or the serialized form
/// of `live`) is not a JSON object, and [`CodecError::Json`] if `live` cannot
/// be serialized or the merged candidate cannot be decoded.  `live` is left
/// unchanged on error.
pub fn merge_decode<T>(live: &mut T, document: Value) -> Result<MergeReport, CodecError>
where
    T: Persist + Serialize + DeserializeOwned,
{
    let mut incoming = into_object(document)?;
    let mut candidate = into_object(serde_json::to_value(&*live)?)?;
    let mut report = MergeReport::default();

    for field in T::fields() {
        let Some(value) = incoming.remove(field.name) else {
            report.missing.push(field);
            continue;
        };

        let found = kind_of(&value);
        let previous = candidate.insert(field.name.to_string(), value);

        match serde_json::from_value::<T>(Value::Object(candidate.clone())) {
            Ok(_) => report.applied.push(field),
            Err(error) => {
                match previous {
                    Some(previous) => candidate.insert(field.name.to_string(), previous),
                    None => candidate.remove(field.name),
                };
                report.rejected.push(FieldRejection {
                    field,
                    found,
                    error,
                });
            }
        }
    }

    let decoded: T = serde_json::from_value(Value::Object(candidate))?;
    live.absorb(decoded);
    Ok(report)
}

fn into_object(value: Value) -> Result<Map<String, Value>, CodecError> {
    match value {
        Value::Object(map) => Ok(map),
        other => Err(CodecError::NotAnObject {
            found: kind_of(&other),
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Persist;
    use serde::Deserialize;
    use serde_json::json;

    #[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
    struct Window {
        width: u32,
        height: u32,
    }

    #[derive(Debug, Default, Serialize, Deserialize, Persist)]
    struct Settings {
        enabled: bool,
        retries: i64,
        ratio: f64,
        initial: char,
        name: String,
        window: Window,
        #[serde(skip)]
        session: u64,
    }

    fn live() -> Settings {
        Settings {
            enabled: true,
            retries: 3,
            ratio: 0.5,
            initial: 'a',
            name: "default".to_string(),
            window: Window {
                width: 800,
                height: 600,
            },
            session: 99,
        }
    }

    #[test]
    fn test_merge_applies_every_present_field() {
        // Arrange
        let mut settings = live();
        let document = json!({
            "enabled": false,
            "retries": 10,
            "ratio": 1.25,
            "initial": "z",
            "name": "custom",
            "window": { "width": 1920, "height": 1080 }
        });

        // Act
        let report = merge_decode(&mut settings, document).expect("merge");

        // Assert
        assert!(report.is_clean());
        assert_eq!(report.applied.len(), 6);
        assert!(!settings.enabled);
        assert_eq!(settings.retries, 10);
        assert_eq!(settings.ratio, 1.25);
        assert_eq!(settings.initial, 'z');
        assert_eq!(settings.name, "custom");
        assert_eq!(
            settings.window,
            Window {
                width: 1920,
                height: 1080
            }
        );
    }

    #[test]
    fn test_merge_keeps_current_value_for_missing_fields() {
        // Arrange
        let mut settings = live();

        // Act
        let report = merge_decode(&mut settings, json!({ "retries": 7 })).expect("merge");

        // Assert
        assert_eq!(settings.retries, 7);
        assert_eq!(settings.name, "default");
        assert!(settings.enabled);
        let missing: Vec<_> = report.missing.iter().map(|f| f.name).collect();
        assert_eq!(
            missing,
            vec!["enabled", "ratio", "initial", "name", "window"]
        );
    }

    #[test]
    fn test_merge_ignores_unknown_keys() {
        let mut settings = live();

        let report = merge_decode(&mut settings, json!({ "obsolete": 1, "name": "kept" }))
            .expect("merge");

        assert!(report.is_clean());
        assert_eq!(settings.name, "kept");
    }

    #[test]
    fn test_merge_skips_badly_typed_field_and_applies_the_rest() {
        // Arrange
        let mut settings = live();
        let document = json!({ "retries": "many", "name": "still applied" });

        // Act
        let report = merge_decode(&mut settings, document).expect("merge");

        // Assert
        assert_eq!(settings.retries, 3, "rejected field keeps its value");
        assert_eq!(settings.name, "still applied");
        assert_eq!(report.rejected.len(), 1);
        assert_eq!(report.rejected[0].field.name, "retries");
        assert_eq!(report.rejected[0].field.type_name, "i64");
        assert_eq!(report.rejected[0].found, "string");
    }

    #[test]
    fn test_merge_rejects_null_for_non_optional_field() {
        let mut settings = live();

        let report = merge_decode(&mut settings, json!({ "window": null })).expect("merge");

        assert_eq!(report.rejected.len(), 1);
        assert_eq!(settings.window.width, 800);
    }

    #[test]
    fn test_merge_never_touches_transient_fields() {
        let mut settings = live();

        merge_decode(&mut settings, json!({ "session": 1, "retries": 4 })).expect("merge");

        assert_eq!(settings.session, 99);
        assert_eq!(settings.retries, 4);
    }

    #[test]
    fn test_merge_rejects_non_object_document_and_leaves_value_unchanged() {
        // Arrange
        let mut settings = live();

        // Act
        let result = merge_decode(&mut settings, json!([1, 2, 3]));

        // Assert
        assert!(matches!(
            result,
            Err(CodecError::NotAnObject { found: "array" })
        ));
        assert_eq!(settings.retries, 3);
    }
}
