//! Gene Database Module
//!
//! Ordered, index-addressable collection of reference genes. The position
//! of a gene is the key used to correlate aligner results back to it: every
//! gene is encoded once at construction and tagged with a target id derived
//! from its index, and the database keeps the id → index table.
//!
//! # Serialized form
//! ```text
//! { "name": "ncbi",
//!   "genes": [ { "name": "blaTEM-1", "accession": "NG_050145.1",
//!                "description": "...", "resistance": ["BETA-LACTAM"],
//!                "sequence": "ATG..." } ] }
//! ```
//!
//! # Example
//! ```no_run
//! use abricate::database::Database;
//! use std::path::Path;
//!
//! let db = Database::from_name("ncbi", Path::new("./db")).unwrap();
//! println!("{}: {} genes", db.name(), db.len());
//! ```

use crate::error::{Error, Result};
use crate::gene::Gene;
use crate::seqio::{FastaReader, NucleotideSequence};
use flate2::read::MultiGzDecoder;
use flate2::write::GzEncoder;
use flate2::Compression;
use rustc_hash::FxHashMap;
use serde::{Deserialize, Serialize};
use std::fs::File;
use std::io::{BufRead, BufReader, BufWriter, Read, Write};
use std::ops::{Bound, RangeBounds};
use std::path::{Path, PathBuf};

/// Field separator of ABRICATE `sequences` FASTA headers.
const ABRICATE_SEP: &str = "~~~";

// ============================================================================
// Target Sequences
// ============================================================================

/// A gene sequence as registered with an aligner.
#[derive(Debug, Clone)]
pub struct TargetSequence {
    /// Identifier written into aligner input files.
    pub id: String,
    pub sequence: NucleotideSequence,
}

/// Target id of the gene at `index`.
fn target_id(index: usize) -> String {
    format!("gene_{}", index)
}

// ============================================================================
// Database
// ============================================================================

/// Serialized database layout, shared by `load` and `dump`.
#[derive(Serialize)]
struct DatabaseRef<'a> {
    name: &'a str,
    genes: &'a [Gene],
}

#[derive(Deserialize)]
struct DatabaseOwned {
    name: String,
    genes: Vec<Gene>,
}

/// Reference gene database.
#[derive(Debug, Clone)]
pub struct Database {
    name: String,
    genes: Vec<Gene>,
    targets: Vec<TargetSequence>,
    target_index: FxHashMap<String, usize>,
}

impl Database {
    /// Builds a database, encoding every gene as an alignment target.
    ///
    /// # Errors
    /// `Error::Construction` if a gene has an empty sequence or characters
    /// outside the IUPAC nucleotide alphabet.
    pub fn new<I>(name: impl Into<String>, genes: I) -> Result<Self>
    where
        I: IntoIterator<Item = Gene>,
    {
        let genes: Vec<Gene> = genes.into_iter().collect();
        let mut targets = Vec::with_capacity(genes.len());
        let mut target_index = FxHashMap::default();

        for (i, gene) in genes.iter().enumerate() {
            if gene.sequence.is_empty() {
                return Err(Error::Construction(format!(
                    "gene {:?} (index {}) has an empty sequence",
                    gene.name, i
                )));
            }
            let sequence = NucleotideSequence::encode(&gene.name, &gene.sequence)
                .map_err(|e| Error::Construction(e.to_string()))?;

            let id = target_id(i);
            target_index.insert(id.clone(), i);
            targets.push(TargetSequence { id, sequence });
        }

        Ok(Self {
            name: name.into(),
            genes,
            targets,
            target_index,
        })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn len(&self) -> usize {
        self.genes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.genes.is_empty()
    }

    pub fn genes(&self) -> &[Gene] {
        &self.genes
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Gene> {
        self.genes.iter()
    }

    /// Gene at `index`.
    pub fn get(&self, index: usize) -> Result<&Gene> {
        self.genes.get(index).ok_or(Error::Index {
            index,
            len: self.genes.len(),
        })
    }

    /// New database holding the selected genes, renumbered from 0.
    ///
    /// Bounds are clamped to the database length, so an out-of-range slice
    /// yields an empty database rather than an error.
    pub fn slice<R: RangeBounds<usize>>(&self, range: R) -> Database {
        let len = self.genes.len();
        let start = match range.start_bound() {
            Bound::Included(&s) => s,
            Bound::Excluded(&s) => s.saturating_add(1),
            Bound::Unbounded => 0,
        }
        .min(len);
        let end = match range.end_bound() {
            Bound::Included(&e) => e.saturating_add(1),
            Bound::Excluded(&e) => e,
            Bound::Unbounded => len,
        }
        .clamp(start, len);

        // Genes were validated when this database was built
        let genes = self.genes[start..end].to_vec();
        let targets = self.targets[start..end]
            .iter()
            .enumerate()
            .map(|(i, t)| TargetSequence {
                id: target_id(i),
                sequence: t.sequence.clone(),
            })
            .collect::<Vec<_>>();
        let target_index = targets
            .iter()
            .enumerate()
            .map(|(i, t)| (t.id.clone(), i))
            .collect();

        Database {
            name: self.name.clone(),
            genes,
            targets,
            target_index,
        }
    }

    /// Encoded target sequences, in gene order.
    pub fn targets(&self) -> &[TargetSequence] {
        &self.targets
    }

    pub fn target(&self, index: usize) -> Result<&TargetSequence> {
        self.targets.get(index).ok_or(Error::Index {
            index,
            len: self.targets.len(),
        })
    }

    /// Maps an aligner target id back to the gene index.
    pub fn resolve_target(&self, id: &str) -> Result<usize> {
        self.target_index.get(id).copied().ok_or_else(|| {
            Error::AlignmentEngine(format!(
                "aligner reported unknown target {:?} for database {:?}",
                id, self.name
            ))
        })
    }

    // --- Serialization ------------------------------------------------------

    /// Reads a JSON database record.
    pub fn load<R: Read>(reader: R) -> Result<Self> {
        let data: DatabaseOwned = serde_json::from_reader(reader)?;
        Self::new(data.name, data.genes)
    }

    /// Writes the JSON database record.
    pub fn dump<W: Write>(&self, writer: W) -> Result<()> {
        let record = DatabaseRef {
            name: &self.name,
            genes: &self.genes,
        };
        serde_json::to_writer(writer, &record)?;
        Ok(())
    }

    /// Loads a `.json` or gzipped `.json.gz` database file.
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let file = File::open(path)?;
        if path.extension().and_then(|e| e.to_str()) == Some("gz") {
            Self::load(BufReader::new(MultiGzDecoder::new(file)))
        } else {
            Self::load(BufReader::new(file))
        }
    }

    /// Saves the database, gzip-compressing when the name ends in `.gz`.
    pub fn save<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let path = path.as_ref();
        let file = BufWriter::new(File::create(path)?);
        if path.extension().and_then(|e| e.to_str()) == Some("gz") {
            let mut encoder = GzEncoder::new(file, Compression::default());
            self.dump(&mut encoder)?;
            encoder.finish()?.flush()?;
        } else {
            let mut file = file;
            self.dump(&mut file)?;
            file.flush()?;
        }
        Ok(())
    }

    /// Finds and loads database `name` from `datadir`.
    ///
    /// Looks for `<name>.json`, then `<name>.json.gz`.
    pub fn from_name(name: &str, datadir: &Path) -> Result<Self> {
        let candidates: Vec<PathBuf> = ["json", "json.gz"]
            .iter()
            .map(|ext| datadir.join(format!("{}.{}", name, ext)))
            .collect();

        for path in &candidates {
            if path.is_file() {
                tracing::debug!(path = %path.display(), "loading database");
                return Self::open(path);
            }
        }

        Err(Error::Configuration(format!(
            "database {:?} not found in {} (expected {}.json or {}.json.gz)",
            name,
            datadir.display(),
            name,
            name
        )))
    }

    /// Imports an ABRICATE `sequences` FASTA.
    ///
    /// Headers read `>DB~~~GENE~~~ACCESSION~~~RES1;RES2 description`. Other
    /// headers fall back to the first word as the gene name.
    pub fn from_fasta<R: BufRead>(name: impl Into<String>, reader: R) -> Result<Self> {
        let mut genes = Vec::new();
        for record in FastaReader::new(reader)? {
            let record = record?;
            let fields: Vec<&str> = record.name.split(ABRICATE_SEP).collect();

            let gene = if fields.len() >= 3 {
                let resistance = fields
                    .get(3)
                    .map(|r| {
                        r.split(';')
                            .filter(|t| !t.is_empty())
                            .map(str::to_string)
                            .collect::<Vec<_>>()
                    })
                    .unwrap_or_default();
                Gene::new(fields[1], fields[2], record.description, resistance, record.seq)
            } else {
                Gene::new(record.name, "", record.description, Vec::<String>::new(), record.seq)
            };
            genes.push(gene);
        }
        Self::new(name, genes)
    }
}

impl<'a> IntoIterator for &'a Database {
    type Item = &'a Gene;
    type IntoIter = std::slice::Iter<'a, Gene>;

    fn into_iter(self) -> Self::IntoIter {
        self.genes.iter()
    }
}
