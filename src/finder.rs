//! Resistance Gene Finder
//!
//! Runs one aligner search of a query against every gene of a database and
//! turns the alignments into [`Hit`]s, keeping those that cover enough of
//! their gene.
//!
//! # Example
//! ```no_run
//! use abricate::blastn::BlastN;
//! use abricate::database::Database;
//! use abricate::finder::ResistanceGeneFinder;
//! use std::path::Path;
//!
//! let db = Database::from_name("ncbi", Path::new("./db")).unwrap();
//! let finder = ResistanceGeneFinder::new(db, BlastN::new().unwrap())
//!     .with_thresholds(90.0, 60.0)
//!     .unwrap();
//! for hit in finder.find_genes("ACGT...").unwrap() {
//!     let hit = hit.unwrap();
//!     println!("{} {:.2}%", hit.gene.name, hit.percent_coverage());
//! }
//! ```

use crate::alignment::{Aligner, AlignmentRecord, SearchConfig};
use crate::database::Database;
use crate::error::{Error, Result};
use crate::hit::Hit;
use crate::scope::Scope;
use crate::seqio::NucleotideSequence;
use rustc_hash::FxHashSet;

/// Identifier the query is registered under in the search scope.
pub const QUERY_ID: &str = "query";

pub const DEFAULT_MIN_IDENTITY: f64 = 80.0;
pub const DEFAULT_MIN_COVERAGE: f64 = 80.0;

/// A query sequence, raw or already encoded.
#[derive(Debug, Clone, Copy)]
pub enum Query<'q> {
    Raw(&'q str),
    Encoded(&'q NucleotideSequence),
}

impl<'q> From<&'q str> for Query<'q> {
    fn from(seq: &'q str) -> Self {
        Query::Raw(seq)
    }
}

impl<'q> From<&'q String> for Query<'q> {
    fn from(seq: &'q String) -> Self {
        Query::Raw(seq)
    }
}

impl<'q> From<&'q NucleotideSequence> for Query<'q> {
    fn from(seq: &'q NucleotideSequence) -> Self {
        Query::Encoded(seq)
    }
}

fn check_percent(what: &str, value: f64) -> Result<f64> {
    if !value.is_finite() || !(0.0..=100.0).contains(&value) {
        return Err(Error::Configuration(format!(
            "{} must be between 0 and 100, got {}",
            what, value
        )));
    }
    Ok(value)
}

pub struct ResistanceGeneFinder<A> {
    database: Database,
    aligner: A,
    min_identity: f64,
    min_coverage: f64,
    config: SearchConfig,
    deduplicate: bool,
}

impl<A: Aligner> ResistanceGeneFinder<A> {
    /// Finder with 80% identity and 80% coverage thresholds.
    pub fn new(database: Database, aligner: A) -> Self {
        let config = SearchConfig {
            percent_identity: DEFAULT_MIN_IDENTITY,
            ..SearchConfig::default()
        };
        Self {
            database,
            aligner,
            min_identity: DEFAULT_MIN_IDENTITY,
            min_coverage: DEFAULT_MIN_COVERAGE,
            config,
            deduplicate: false,
        }
    }

    /// Sets both thresholds, as percentages in 0-100.
    pub fn with_thresholds(self, min_identity: f64, min_coverage: f64) -> Result<Self> {
        self.with_min_identity(min_identity)?
            .with_min_coverage(min_coverage)
    }

    /// Identity threshold, also passed to the aligner.
    pub fn with_min_identity(mut self, min_identity: f64) -> Result<Self> {
        self.min_identity = check_percent("minimum identity", min_identity)?;
        self.config.percent_identity = self.min_identity;
        Ok(self)
    }

    pub fn with_min_coverage(mut self, min_coverage: f64) -> Result<Self> {
        self.min_coverage = check_percent("minimum coverage", min_coverage)?;
        Ok(self)
    }

    /// Threads handed to the aligner, 0 lets it decide.
    pub fn with_threads(mut self, threads: usize) -> Self {
        self.config.threads = threads;
        self
    }

    /// Skips hits repeating an earlier (gene, query start, query stop).
    pub fn with_deduplication(mut self, deduplicate: bool) -> Self {
        self.deduplicate = deduplicate;
        self
    }

    pub fn database(&self) -> &Database {
        &self.database
    }

    pub fn min_identity(&self) -> f64 {
        self.min_identity
    }

    pub fn min_coverage(&self) -> f64 {
        self.min_coverage
    }

    pub fn search_config(&self) -> &SearchConfig {
        &self.config
    }

    /// Searches `query` against every gene.
    ///
    /// The aligner runs before this returns; hits are then built and
    /// filtered as the returned iterator is consumed. The search scope lives
    /// inside the iterator and is released when it is dropped.
    pub fn find_genes<'q>(&self, query: impl Into<Query<'q>>) -> Result<Hits<'_>> {
        let query = match query.into() {
            Query::Raw(seq) => NucleotideSequence::encode(QUERY_ID, seq)?,
            Query::Encoded(seq) => seq.clone(),
        };

        let mut scope = Scope::new();
        for target in self.database.targets() {
            scope.add(&target.id, &target.sequence)?;
        }
        let target_ids: Vec<&str> = self.database.targets().iter().map(|t| t.id.as_str()).collect();

        let records = if query.is_empty() {
            tracing::debug!("empty query, skipping search");
            Vec::new()
        } else {
            scope.add_owned(QUERY_ID, query)?;
            self.aligner.search(&mut scope, &[QUERY_ID], &target_ids, &self.config)?
        };
        tracing::debug!(
            database = self.database.name(),
            genes = self.database.len(),
            alignments = records.len(),
            "search finished"
        );

        Ok(Hits {
            database: &self.database,
            min_coverage: self.min_coverage,
            seen: self.deduplicate.then(FxHashSet::default),
            records: records.into_iter(),
            _scope: scope,
        })
    }
}

/// Lazy sequence of hits from one [`ResistanceGeneFinder::find_genes`] call.
pub struct Hits<'f> {
    database: &'f Database,
    min_coverage: f64,
    seen: Option<FxHashSet<(usize, usize, usize)>>,
    records: std::vec::IntoIter<AlignmentRecord>,
    _scope: Scope<'f>,
}

impl<'f> Hits<'f> {
    fn evaluate(&mut self, alignment: AlignmentRecord) -> Result<Option<Hit<'f>>> {
        let database: &'f Database = self.database;
        let index = database.resolve_target(&alignment.target_id)?;
        let gene = database.get(index)?;

        if let Some(seen) = &mut self.seen {
            let key = (index, alignment.query().start, alignment.query().stop);
            if !seen.insert(key) {
                return Ok(None);
            }
        }

        let hit = Hit::new(gene, database, alignment);
        if hit.percent_coverage() >= self.min_coverage {
            Ok(Some(hit))
        } else {
            Ok(None)
        }
    }

    /// Alignments not yet examined.
    pub fn remaining(&self) -> usize {
        self.records.len()
    }
}

impl<'f> Iterator for Hits<'f> {
    type Item = Result<Hit<'f>>;

    fn next(&mut self) -> Option<Self::Item> {
        while let Some(alignment) = self.records.next() {
            if alignment.query_id != QUERY_ID {
                continue;
            }
            match self.evaluate(alignment) {
                Ok(Some(hit)) => return Some(Ok(hit)),
                Ok(None) => continue,
                Err(e) => return Some(Err(e)),
            }
        }
        None
    }
}
