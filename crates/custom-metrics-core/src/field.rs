//! Field sets
//!
//! A [`FieldSet`] is the vocabulary of identifiers a formula may reference.
//! It keeps the caller's ordering (used for display and for building probe
//! rows) alongside a hash index for membership tests during compilation.

use crate::error::{Error, Result};
use crate::row::Row;
use ahash::AHashMap;
use lazy_regex::regex_is_match;

/// Check whether `name` is shaped like a formula identifier
///
/// Identifiers start with a letter or underscore and continue with letters,
/// digits or underscores.
pub fn is_field_name(name: &str) -> bool {
    regex_is_match!(r"^[\p{Alphabetic}_][\p{Alphabetic}\p{N}_]*$", name)
}

/// Ordered set of unique field names
#[derive(Debug, Clone, Default)]
pub struct FieldSet {
    names: Vec<String>,
    index: AHashMap<String, usize>,
}

impl FieldSet {
    /// Create a field set, validating every name
    ///
    /// # Example
    /// ```rust
    /// use custom_metrics_core::FieldSet;
    ///
    /// let fields = FieldSet::new(["spend", "results"]).unwrap();
    /// assert!(fields.contains("spend"));
    /// assert!(FieldSet::new(["spend", "spend"]).is_err());
    /// ```
    pub fn new<I, S>(names: I) -> Result<Self>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let mut set = Self::empty();
        for name in names {
            set.push(name.into())?;
        }
        Ok(set)
    }

    /// Create an empty field set (only literal formulas compile against it)
    pub fn empty() -> Self {
        Self::default()
    }

    /// Build a field set, skipping names that are malformed or repeated
    ///
    /// Returns the set together with the names that were skipped, in input order.
    pub fn from_iter_lossy<I, S>(names: I) -> (Self, Vec<String>)
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let mut set = Self::empty();
        let mut skipped = Vec::new();
        for name in names {
            let name = name.into();
            if let Err(err) = set.push(name) {
                skipped.push(match err {
                    Error::InvalidFieldName(n) | Error::DuplicateField(n) => n,
                });
            }
        }
        (set, skipped)
    }

    fn push(&mut self, name: String) -> Result<()> {
        if !is_field_name(&name) {
            return Err(Error::InvalidFieldName(name));
        }
        if self.index.contains_key(&name) {
            return Err(Error::DuplicateField(name));
        }
        self.index.insert(name.clone(), self.names.len());
        self.names.push(name);
        Ok(())
    }

    /// Check whether a name belongs to the set
    pub fn contains(&self, name: &str) -> bool {
        self.index.contains_key(name)
    }

    /// Position of a name in caller order
    pub fn position(&self, name: &str) -> Option<usize> {
        self.index.get(name).copied()
    }

    /// Iterate over the names in caller order
    pub fn iter(&self) -> impl Iterator<Item = &str> + '_ {
        self.names.iter().map(String::as_str)
    }

    /// Names in caller order
    pub fn names(&self) -> &[String] {
        &self.names
    }

    /// Number of fields
    pub fn len(&self) -> usize {
        self.names.len()
    }

    /// Check if the set has no fields
    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }

    /// Build a row mapping every field to `value`
    pub fn sample_row(&self, value: f64) -> Row {
        self.iter().map(|name| (name.to_string(), value)).collect()
    }
}

impl PartialEq for FieldSet {
    fn eq(&self, other: &Self) -> bool {
        self.names == other.names
    }
}

impl Eq for FieldSet {}

impl<'a> IntoIterator for &'a FieldSet {
    type Item = &'a String;
    type IntoIter = std::slice::Iter<'a, String>;

    fn into_iter(self) -> Self::IntoIter {
        self.names.iter()
    }
}
