//! Label model for series identification.
//!
//! A series is identified by its label set. Label sets are kept sorted by
//! label name so that comparison, fingerprinting, and deduplication all
//! operate on a canonical form.

use blake3::Hasher;
use serde::{Deserialize, Serialize};

/// Reserved label name carrying the metric name of a series.
pub const METRIC_NAME_LABEL: &str = "__name__";

/// A single label name/value pair.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct Label {
    pub name: String,
    pub value: String,
}

impl Label {
    /// Creates a new label.
    pub fn new(name: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            value: value.into(),
        }
    }
}

/// A canonically sorted set of labels identifying a series.
///
/// Labels are ordered by name. The derived `Ord` therefore compares label
/// sets lexicographically over their (name, value) pairs, which is the total
/// order used when sorting query results.
#[derive(Debug, Clone, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Labels(Vec<Label>);

impl Labels {
    /// Creates a label set, sorting the input into canonical order.
    pub fn new(mut labels: Vec<Label>) -> Self {
        labels.sort();
        Self(labels)
    }

    /// Creates a label set from name/value string pairs.
    pub fn from_pairs(pairs: &[(&str, &str)]) -> Self {
        Self::new(
            pairs
                .iter()
                .map(|(name, value)| Label::new(*name, *value))
                .collect(),
        )
    }

    /// Returns the value of the named label, or `None` if absent.
    pub fn get(&self, name: &str) -> Option<&str> {
        self.0
            .binary_search_by(|label| label.name.as_str().cmp(name))
            .ok()
            .map(|idx| self.0[idx].value.as_str())
    }

    /// Returns a copy of this label set with the named label removed.
    pub fn without(&self, name: &str) -> Labels {
        Labels(
            self.0
                .iter()
                .filter(|label| label.name != name)
                .cloned()
                .collect(),
        )
    }

    /// Iterates over the labels in canonical order.
    pub fn iter(&self) -> impl Iterator<Item = &Label> {
        self.0.iter()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Computes the 64-bit fingerprint of this label set.
    ///
    /// The fingerprint is a blake3 digest over the label names and values in
    /// canonical order, truncated to the first 8 little-endian bytes. Equal
    /// label sets always produce equal fingerprints.
    pub fn fingerprint(&self) -> u64 {
        let mut hasher = Hasher::new();
        for label in &self.0 {
            hasher.update(label.name.as_bytes());
            hasher.update(label.value.as_bytes());
        }
        let digest = hasher.finalize();
        let mut first8 = [0u8; 8];
        first8.copy_from_slice(&digest.as_bytes()[..8]);
        u64::from_le_bytes(first8)
    }
}

impl FromIterator<Label> for Labels {
    fn from_iter<T: IntoIterator<Item = Label>>(iter: T) -> Self {
        Labels::new(iter.into_iter().collect())
    }
}
