//! Feature encoding: turning a referent into a numeric vector.
//!
//! Every referent is described by its shape (a categorical attribute) and eight numeric
//! attributes. The shape is expanded into one indicator column per known shape name, so the
//! encoded vector looks like:
//!
//! ```text
//! [shape=a, shape=b, ..., size, red, green, blue, posx, posy, midx, midy]
//! ```
//!
//! The set of shape names is fixed when the [`FeatureSchema`] is built. Encoding a referent
//! with any other shape is rejected with a [`SchemaViolation`] rather than silently mapped to
//! an all-zero indicator block.
//!
//! # Examples
//!
//! ```
//! use tangrams_data::Referent;
//! use tangrams_model::feature::FeatureSchema;
//!
//! let schema = FeatureSchema::new(["bird", "cat"]);
//! assert_eq!(schema.len(), 2 + 8);
//!
//! let referent = Referent::new(1, 1, "cat").with_size(0.4).with_pos(0.5, 0.0);
//! let features = schema.encode(&referent).unwrap();
//! assert_eq!(&features.as_slice()[..3], &[0.0, 1.0, 0.4]);
//! assert_eq!(features.as_slice()[9], 0.0); // midy
//!
//! assert!(schema.encode(&Referent::new(2, 1, "dog")).is_err());
//! ```

use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};
use tangrams_data::Referent;

/// Names of the numeric columns, in encoding order.
pub const NUMERIC_FEATURES: [&str; 8] = [
    "size", "red", "green", "blue", "posx", "posy", "midx", "midy",
];

#[derive(Debug, Clone, PartialEq, Eq, derive_more::Display, derive_more::Error)]
#[display("Shape '{shape}' is not part of the feature schema")]
pub struct SchemaViolation {
    pub shape: String,
}

/// Encoded attributes of one referent.
#[derive(Debug, Clone, PartialEq, derive_more::From)]
pub struct FeatureVector(Vec<f64>);

impl FeatureVector {
    #[must_use]
    pub fn as_slice(&self) -> &[f64] {
        &self.0
    }
}

/// The fixed column layout shared by every classifier of a model.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FeatureSchema {
    shapes: Vec<String>,
}

impl FeatureSchema {
    /// Builds a schema from shape names; duplicates are removed and the order is sorted.
    #[must_use]
    pub fn new<I, S>(shapes: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let shapes = shapes
            .into_iter()
            .map(Into::into)
            .collect::<BTreeSet<_>>()
            .into_iter()
            .collect();
        Self { shapes }
    }

    #[must_use]
    pub fn shapes(&self) -> &[String] {
        &self.shapes
    }

    /// Number of encoded columns.
    #[must_use]
    pub fn len(&self) -> usize {
        self.shapes.len() + NUMERIC_FEATURES.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Column names in encoding order (`shape=<name>` for the indicator block).
    #[must_use]
    pub fn column_names(&self) -> Vec<String> {
        self.shapes
            .iter()
            .map(|shape| format!("shape={shape}"))
            .chain(NUMERIC_FEATURES.iter().map(|name| (*name).to_owned()))
            .collect()
    }

    pub fn encode(&self, referent: &Referent) -> Result<FeatureVector, SchemaViolation> {
        let shape_index = self
            .shapes
            .binary_search(&referent.shape)
            .map_err(|_| SchemaViolation {
                shape: referent.shape.clone(),
            })?;

        let mut values = vec![0.0; self.len()];
        values[shape_index] = 1.0;
        let numeric = [
            referent.size,
            referent.red,
            referent.green,
            referent.blue,
            referent.posx(),
            referent.posy(),
            referent.midx(),
            referent.midy(),
        ];
        values[self.shapes.len()..].copy_from_slice(&numeric);
        Ok(FeatureVector(values))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_shapes_sorted_and_deduplicated() {
        let schema = FeatureSchema::new(["c", "a", "b", "a"]);
        assert_eq!(schema.shapes(), ["a", "b", "c"]);
        assert_eq!(schema.len(), 11);
        assert_eq!(schema.column_names()[0], "shape=a");
        assert_eq!(schema.column_names()[10], "midy");
    }

    #[test]
    fn test_encode_full_vector() {
        let schema = FeatureSchema::new(["a", "b"]);
        let referent = Referent::new(7, 3, "b")
            .with_size(0.25)
            .with_color(1.0, 0.5, 0.0)
            .with_pos(0.0, 1.0);
        let features = schema.encode(&referent).unwrap();
        assert_eq!(
            features.as_slice(),
            &[0.0, 1.0, 0.25, 1.0, 0.5, 0.0, 0.0, 1.0, 0.0, 0.0]
        );
    }

    #[test]
    fn test_unknown_shape_is_rejected() {
        let schema = FeatureSchema::new(["a"]);
        let err = schema.encode(&Referent::new(1, 1, "z")).unwrap_err();
        assert_eq!(err.shape, "z");
        assert_eq!(
            err.to_string(),
            "Shape 'z' is not part of the feature schema"
        );
    }

    #[test]
    fn test_empty_schema_still_has_numeric_columns() {
        let schema = FeatureSchema::new(Vec::<String>::new());
        assert_eq!(schema.len(), NUMERIC_FEATURES.len());
        assert!(!schema.is_empty());
        assert!(schema.encode(&Referent::new(1, 1, "a")).is_err());
    }
}
