//! Rows of numeric field values

use ahash::AHashMap;
use std::collections::{BTreeMap, HashMap};
use std::hash::BuildHasher;

/// Read access to the numeric values of one record
///
/// The formula evaluator looks up field references through this trait at
/// evaluation time, so any map-like row representation can be evaluated
/// without first being copied into a [`Row`].
pub trait FieldValues {
    /// Value of the named field, if the record has one
    fn value(&self, name: &str) -> Option<f64>;
}

/// One record mapping field names to numeric values
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Row {
    values: AHashMap<String, f64>,
}

impl Row {
    /// Create an empty row
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a row from `(name, value)` pairs
    ///
    /// # Example
    /// ```rust
    /// use custom_metrics_core::{FieldValues, Row};
    ///
    /// let row = Row::from_pairs([("spend", 100.0), ("results", 20.0)]);
    /// assert_eq!(row.value("results"), Some(20.0));
    /// ```
    pub fn from_pairs<I, S>(pairs: I) -> Self
    where
        I: IntoIterator<Item = (S, f64)>,
        S: Into<String>,
    {
        let mut row = Self::new();
        for (name, value) in pairs {
            row.set(name, value);
        }
        row
    }

    /// Set a field value, returning the previous one
    pub fn set(&mut self, name: impl Into<String>, value: f64) -> Option<f64> {
        self.values.insert(name.into(), value)
    }

    /// Get a field value
    pub fn get(&self, name: &str) -> Option<f64> {
        self.values.get(name).copied()
    }

    /// Iterate over `(name, value)` pairs in unspecified order
    pub fn iter(&self) -> impl Iterator<Item = (&str, f64)> + '_ {
        self.values.iter().map(|(name, value)| (name.as_str(), *value))
    }

    /// Number of fields in the row
    pub fn len(&self) -> usize {
        self.values.len()
    }

    /// Check if the row is empty
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}

impl FromIterator<(String, f64)> for Row {
    fn from_iter<T: IntoIterator<Item = (String, f64)>>(iter: T) -> Self {
        Self {
            values: iter.into_iter().collect(),
        }
    }
}

impl FieldValues for Row {
    fn value(&self, name: &str) -> Option<f64> {
        self.get(name)
    }
}

impl<S: BuildHasher> FieldValues for HashMap<String, f64, S> {
    fn value(&self, name: &str) -> Option<f64> {
        self.get(name).copied()
    }
}

impl<S: BuildHasher> FieldValues for HashMap<&str, f64, S> {
    fn value(&self, name: &str) -> Option<f64> {
        self.get(name).copied()
    }
}

impl FieldValues for BTreeMap<String, f64> {
    fn value(&self, name: &str) -> Option<f64> {
        self.get(name).copied()
    }
}

impl<T: FieldValues + ?Sized> FieldValues for &T {
    fn value(&self, name: &str) -> Option<f64> {
        (**self).value(name)
    }
}
