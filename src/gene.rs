//! Reference gene records.

use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

/// One reference gene of a screening database.
///
/// Genes are plain values: once placed in a [`crate::database::Database`]
/// they are only ever handed out by shared reference.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Gene {
    /// Display name, unique within its database (e.g. `blaTEM-1`).
    pub name: String,
    pub accession: String,
    pub description: String,
    /// Resistance or virulence categories, stored as given.
    pub resistance: BTreeSet<String>,
    /// Nucleotide sequence in whatever case the source used.
    pub sequence: String,
}

impl Gene {
    pub fn new<I, S>(
        name: impl Into<String>,
        accession: impl Into<String>,
        description: impl Into<String>,
        resistance: I,
        sequence: impl Into<String>,
    ) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            name: name.into(),
            accession: accession.into(),
            description: description.into(),
            resistance: resistance.into_iter().map(Into::into).collect(),
            sequence: sequence.into(),
        }
    }

    /// Gene length in bases.
    pub fn length(&self) -> usize {
        self.sequence.chars().count()
    }

    /// Resistance tags as printed in reports: upper-cased, sorted, `;`-joined.
    pub fn resistance_label(&self) -> String {
        let mut tags: Vec<String> = self.resistance.iter().map(|t| t.to_uppercase()).collect();
        tags.sort();
        tags.join(";")
    }
}
