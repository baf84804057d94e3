//! Named metric payloads

use serde::{Deserialize, Serialize};

/// Name given to a metric saved without one
pub const DEFAULT_METRIC_NAME: &str = "Custom Metric";

/// Formula offered to a user starting a new metric
pub const DEFAULT_FORMULA: &str = "(results * 15) / spend";

/// A named formula, as handed to whatever persists saved metrics
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Metric {
    pub name: String,
    pub formula: String,
}

impl Metric {
    /// Create a new metric
    pub fn new(name: impl Into<String>, formula: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            formula: formula.into(),
        }
    }
}
