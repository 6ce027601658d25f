//! Change and drift detection
//!
//! Pure helpers comparing a "have" value with a "want" value. The reconciler
//! uses them to decide whether a request must be issued at all.

use crate::data::Attributes;
use crate::schema::FieldKind;
use serde::Serialize;
use serde_json::Value;

/// Whether an optional integer relation changed.
///
/// Two absent values are equal, absence against presence is a change, and
/// two present values change when they differ.
pub fn detect_optional_int_change(have: Option<i64>, want: Option<i64>) -> bool {
    detect_optional_change(have.as_ref(), want.as_ref())
}

/// Generic form of [`detect_optional_int_change`]
pub fn detect_optional_change<T: PartialEq + ?Sized>(have: Option<&T>, want: Option<&T>) -> bool {
    match (have, want) {
        (None, None) => false,
        (Some(_), None) | (None, Some(_)) => true,
        (Some(have), Some(want)) => have != want,
    }
}

/// Map a nullable foreign key stored with a zero sentinel to an `Option`
pub fn non_zero(id: i64) -> Option<i64> {
    (id != 0).then_some(id)
}

fn zero_value(kind: FieldKind) -> Value {
    match kind {
        FieldKind::String => Value::String(String::new()),
        FieldKind::Int => Value::from(0),
        FieldKind::Bool => Value::Bool(false),
        FieldKind::List => Value::Array(Vec::new()),
    }
}

/// Compare two attribute values of the given kind, treating null as the
/// kind's zero value.
pub fn values_equal(kind: FieldKind, have: &Value, want: &Value) -> bool {
    let zero = zero_value(kind);
    let have = if have.is_null() { &zero } else { have };
    let want = if want.is_null() { &zero } else { want };
    have == want
}

/// Difference between the last-known and the freshly read attributes of a
/// resource.
#[derive(Debug, Clone, Default, Serialize)]
pub struct DriftReport {
    pub key: String,
    pub added: Vec<String>,
    pub modified: Vec<String>,
    pub removed: Vec<String>,
    pub vanished: bool,
    pub has_drift: bool,
}

impl DriftReport {
    /// Report for a resource that no longer exists remotely
    pub fn vanished(key: impl Into<String>) -> Self {
        Self {
            key: key.into(),
            vanished: true,
            has_drift: true,
            ..Default::default()
        }
    }
}

/// Compare two attribute bags key by key.
pub fn detect_drift(key: impl Into<String>, before: &Attributes, after: &Attributes) -> DriftReport {
    let mut added = Vec::new();
    let mut modified = Vec::new();
    let mut removed = Vec::new();

    for (name, value) in after {
        match before.get(name) {
            None => added.push(name.clone()),
            Some(old) if old != value => modified.push(name.clone()),
            Some(_) => {}
        }
    }
    for name in before.keys() {
        if !after.contains_key(name) {
            removed.push(name.clone());
        }
    }

    added.sort();
    modified.sort();
    removed.sort();

    let has_drift = !added.is_empty() || !modified.is_empty() || !removed.is_empty();

    DriftReport {
        key: key.into(),
        added,
        modified,
        removed,
        vanished: false,
        has_drift,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_detect_optional_int_change() {
        assert!(!detect_optional_int_change(None, None));
        assert!(detect_optional_int_change(None, Some(1)));
        assert!(detect_optional_int_change(Some(1), None));
        assert!(detect_optional_int_change(Some(1), Some(2)));
        assert!(!detect_optional_int_change(Some(2), Some(2)));
    }

    #[test]
    fn test_detect_optional_change_is_symmetric() {
        let values = [None, Some(0), Some(1), Some(-7)];
        for have in values {
            for want in values {
                assert_eq!(
                    detect_optional_int_change(have, want),
                    detect_optional_int_change(want, have)
                );
            }
        }
        assert!(detect_optional_change(Some("a"), Some("b")));
        assert!(!detect_optional_change::<str>(None, None));
    }

    #[test]
    fn test_non_zero() {
        assert_eq!(non_zero(0), None);
        assert_eq!(non_zero(200), Some(200));
    }

    #[test]
    fn test_values_equal_zero_normalisation() {
        assert!(values_equal(FieldKind::Int, &json!(0), &Value::Null));
        assert!(values_equal(FieldKind::String, &Value::Null, &json!("")));
        assert!(!values_equal(FieldKind::String, &json!("a"), &Value::Null));
        assert!(!values_equal(FieldKind::Int, &json!(1), &json!(2)));
    }

    #[test]
    fn test_detect_drift() {
        let before: Attributes = [
            ("label".to_string(), json!("v1")),
            ("linode_id".to_string(), json!(0)),
            ("status".to_string(), json!("active")),
        ]
        .into_iter()
        .collect();
        let after: Attributes = [
            ("label".to_string(), json!("v1")),
            ("linode_id".to_string(), json!(200)),
            ("filesystem_path".to_string(), json!("/dev/disk/by-id/v1")),
        ]
        .into_iter()
        .collect();

        let report = detect_drift("linode:volume:data", &before, &after);
        assert!(report.has_drift);
        assert_eq!(report.added, vec!["filesystem_path"]);
        assert_eq!(report.modified, vec!["linode_id"]);
        assert_eq!(report.removed, vec!["status"]);

        let same = detect_drift("linode:volume:data", &before, &before);
        assert!(!same.has_drift);
    }
}
