//! Projection of typed overlay fields back into a generic document.
//!
//! Every overlay shape publishes an explicit table of its fields through
//! [`Overlay::fields`]. [`reconcile`] walks that table depth-first and
//! writes, recurses into, or removes the matching keys of the target
//! mapping. Keys the table does not name are never touched.

use serde_json::{Map, Value};

/// How a single overlay field lands in the document.
pub enum Projection<'a> {
    /// Zero or absent value; never projected.
    Zero,
    /// Scalar or opaque value that overwrites the key.
    Value(Value),
    /// Flattened sub-shape, projected into the same mapping.
    Embedded(&'a dyn Overlay, Suppression),
    /// Named sub-shape, projected into the child mapping under the field's key.
    Nested(&'a dyn Overlay, Suppression),
}

impl<'a> Projection<'a> {
    /// Named sub-shape, or `Zero` when all of its fields are zero.
    pub fn nested(inner: &'a dyn Overlay, suppression: Suppression) -> Self {
        if inner.is_zero() {
            Projection::Zero
        } else {
            Projection::Nested(inner, suppression)
        }
    }

    /// Flattened sub-shape, or `Zero` when all of its fields are zero.
    pub fn embedded(inner: &'a dyn Overlay, suppression: Suppression) -> Self {
        if inner.is_zero() {
            Projection::Zero
        } else {
            Projection::Embedded(inner, suppression)
        }
    }
}

/// One row of an overlay's projection table.
pub struct Field<'a> {
    /// Serialized key in the document.
    pub key: &'static str,
    pub projection: Projection<'a>,
}

impl<'a> Field<'a> {
    pub fn new(key: &'static str, projection: Projection<'a>) -> Self {
        Self { key, projection }
    }

    /// A string field; empty means zero.
    pub fn string(key: &'static str, value: &str) -> Self {
        let projection = if value.is_empty() {
            Projection::Zero
        } else {
            Projection::Value(Value::String(value.to_owned()))
        };
        Self { key, projection }
    }
}

/// A typed view over part of a document.
pub trait Overlay {
    /// The projection table, in declaration order.
    fn fields(&self) -> Vec<Field<'_>>;

    /// True when every field is zero.
    fn is_zero(&self) -> bool {
        self.fields()
            .iter()
            .all(|f| matches!(f.projection, Projection::Zero))
    }
}

/// Keys that are removed from the document instead of written.
///
/// Used where the canonical value of a field lives elsewhere, so writing it
/// would leave a duplicate or contradictory key behind.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Suppression(&'static [&'static str]);

impl Suppression {
    pub const NONE: Suppression = Suppression(&[]);

    /// Discovery fields of an upstream. They are consumed by the seed itself
    /// and replaced with resolved nodes, so the gateway never sees them.
    pub const UPSTREAM: Suppression =
        Suppression(&["discovery_type", "service_name", "discovery_args"]);

    pub fn contains(&self, key: &str) -> bool {
        self.0.contains(&key)
    }

    pub fn keys(&self) -> &'static [&'static str] {
        self.0
    }
}

/// Overlay the non-zero fields of `overlay` onto `target`.
pub fn reconcile(overlay: &dyn Overlay, suppression: Suppression, target: &mut Map<String, Value>) {
    for field in overlay.fields() {
        if matches!(field.projection, Projection::Zero) {
            continue;
        }

        if suppression.contains(field.key) {
            target.remove(field.key);
            continue;
        }

        match field.projection {
            Projection::Zero => {}
            Projection::Value(value) => {
                target.insert(field.key.to_owned(), value);
            }
            Projection::Embedded(inner, inner_suppression) => {
                reconcile(inner, inner_suppression, target);
            }
            Projection::Nested(inner, inner_suppression) => {
                let child = target
                    .entry(field.key)
                    .or_insert_with(|| Value::Object(Map::new()));
                if !child.is_object() {
                    *child = Value::Object(Map::new());
                }
                if let Value::Object(map) = child {
                    reconcile(inner, inner_suppression, map);
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    struct Inner {
        name: String,
    }

    impl Overlay for Inner {
        fn fields(&self) -> Vec<Field<'_>> {
            vec![Field::string("name", &self.name)]
        }
    }

    struct Outer {
        label: String,
        secret: String,
        flat: Inner,
        child: Inner,
    }

    impl Overlay for Outer {
        fn fields(&self) -> Vec<Field<'_>> {
            vec![
                Field::string("label", &self.label),
                Field::string("secret", &self.secret),
                Field::new("", Projection::embedded(&self.flat, Suppression::NONE)),
                Field::new("child", Projection::nested(&self.child, Suppression::NONE)),
            ]
        }
    }

    fn outer(label: &str, secret: &str, flat: &str, child: &str) -> Outer {
        Outer {
            label: label.into(),
            secret: secret.into(),
            flat: Inner { name: flat.into() },
            child: Inner { name: child.into() },
        }
    }

    fn map(value: Value) -> Map<String, Value> {
        match value {
            Value::Object(m) => m,
            _ => unreachable!(),
        }
    }

    #[test]
    fn zero_fields_leave_document_untouched() {
        let mut doc = map(json!({"label": "keep", "other": 1}));
        reconcile(&outer("", "", "", ""), Suppression::NONE, &mut doc);
        assert_eq!(Value::Object(doc), json!({"label": "keep", "other": 1}));
    }

    #[test]
    fn values_overwrite_and_unknown_keys_survive() {
        let mut doc = map(json!({"label": "old", "other": [1, 2]}));
        reconcile(&outer("new", "", "", ""), Suppression::NONE, &mut doc);
        assert_eq!(Value::Object(doc), json!({"label": "new", "other": [1, 2]}));
    }

    #[test]
    fn suppressed_non_zero_field_is_removed() {
        const SECRET: Suppression = Suppression(&["secret"]);
        let mut doc = map(json!({"secret": "leak", "other": true}));
        reconcile(&outer("", "x", "", ""), SECRET, &mut doc);
        assert_eq!(Value::Object(doc), json!({"other": true}));
    }

    #[test]
    fn suppressed_zero_field_is_left_alone() {
        const SECRET: Suppression = Suppression(&["secret"]);
        let mut doc = map(json!({"secret": "stays"}));
        reconcile(&outer("", "", "", ""), SECRET, &mut doc);
        assert_eq!(Value::Object(doc), json!({"secret": "stays"}));
    }

    #[test]
    fn embedded_shape_writes_into_same_mapping() {
        let mut doc = map(json!({}));
        reconcile(&outer("", "", "flat", ""), Suppression::NONE, &mut doc);
        assert_eq!(Value::Object(doc), json!({"name": "flat"}));
    }

    #[test]
    fn nested_shape_creates_child_mapping() {
        let mut doc = map(json!({"label": "l"}));
        reconcile(&outer("", "", "", "c"), Suppression::NONE, &mut doc);
        assert_eq!(Value::Object(doc), json!({"label": "l", "child": {"name": "c"}}));
    }

    #[test]
    fn nested_shape_merges_into_existing_child() {
        let mut doc = map(json!({"child": {"name": "old", "extra": 7}}));
        reconcile(&outer("", "", "", "new"), Suppression::NONE, &mut doc);
        assert_eq!(Value::Object(doc), json!({"child": {"name": "new", "extra": 7}}));
    }

    #[test]
    fn nested_shape_replaces_non_object_child() {
        let mut doc = map(json!({"child": null}));
        reconcile(&outer("", "", "", "c"), Suppression::NONE, &mut doc);
        assert_eq!(Value::Object(doc), json!({"child": {"name": "c"}}));
    }

    #[test]
    fn zero_sub_shapes_make_a_zero_overlay() {
        assert!(outer("", "", "", "").is_zero());
        assert!(!outer("", "", "", "c").is_zero());
        assert!(!outer("", "", "f", "").is_zero());
    }

    #[test]
    fn upstream_suppression_lists_discovery_keys() {
        assert!(Suppression::UPSTREAM.contains("discovery_args"));
        assert!(!Suppression::UPSTREAM.contains("nodes"));
        assert!(Suppression::NONE.keys().is_empty());
    }
}
