//! Alignment Result Adapter
//!
//! Engine-neutral view of one pairwise alignment between a query and a
//! gene, and the [`Aligner`] seam through which engines are plugged in.
//!
//! Coordinates are 0-based and inclusive (`start <= stop`). Segment 0 is the
//! query side, segment 1 the gene side. The query strand records the
//! orientation of the query relative to the gene; gene segments are always
//! reported on the plus strand.

use crate::error::{Error, Result};
use crate::scope::Scope;
use std::env;
use std::fmt;
use std::path::{Path, PathBuf};

// ============================================================================
// Strand & Segments
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Strand {
    Plus,
    Minus,
    Unknown,
}

impl Strand {
    /// Report symbol: `+`, `-` or `?`.
    pub fn sign(self) -> char {
        match self {
            Strand::Plus => '+',
            Strand::Minus => '-',
            Strand::Unknown => '?',
        }
    }

    pub fn from_sign(c: char) -> Self {
        match c {
            '+' => Strand::Plus,
            '-' => Strand::Minus,
            _ => Strand::Unknown,
        }
    }
}

impl fmt::Display for Strand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.sign())
    }
}

/// One side of a pairwise alignment.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Segment {
    pub start: usize,
    pub stop: usize,
    pub strand: Strand,
}

impl Segment {
    /// Builds a segment from two 0-based inclusive coordinates in any order.
    pub fn new(a: usize, b: usize, strand: Strand) -> Self {
        Self {
            start: a.min(b),
            stop: a.max(b),
            strand,
        }
    }

    /// Number of sequence positions covered.
    pub fn span(&self) -> usize {
        self.stop - self.start + 1
    }
}

// ============================================================================
// Alignment Record
// ============================================================================

/// A raw alignment as produced by an aligner back-end.
#[derive(Debug, Clone, PartialEq)]
pub struct AlignmentRecord {
    /// Identifier of the query sequence as registered in the scope.
    pub query_id: String,
    /// Identifier of the target (gene) sequence as registered in the scope.
    pub target_id: String,
    /// `[query, target]` segments.
    pub segments: [Segment; 2],
    /// Alignment columns, gaps included.
    pub alignment_length: usize,
    pub total_gap_count: usize,
    pub num_gap_openings: usize,
    /// Percentage of identical columns, 0-100.
    pub percent_identity: f64,
    /// Expect value, when the engine computes one.
    pub evalue: Option<f64>,
}

impl AlignmentRecord {
    pub fn query(&self) -> &Segment {
        &self.segments[0]
    }

    pub fn target(&self) -> &Segment {
        &self.segments[1]
    }

    pub fn has_gaps(&self) -> bool {
        self.total_gap_count > 0
    }
}

/// Positional and strand map over the rows of an alignment.
#[derive(Debug, Clone, PartialEq)]
pub struct AlignMap {
    rows: Vec<Segment>,
}

impl AlignMap {
    pub fn new(segments: &[Segment]) -> Self {
        Self {
            rows: segments.to_vec(),
        }
    }

    pub fn num_rows(&self) -> usize {
        self.rows.len()
    }

    pub fn row(&self, row: usize) -> Option<&Segment> {
        self.rows.get(row)
    }

    pub fn sequence_start(&self, row: usize) -> Option<usize> {
        self.row(row).map(|s| s.start)
    }

    pub fn sequence_stop(&self, row: usize) -> Option<usize> {
        self.row(row).map(|s| s.stop)
    }

    /// Strand of `row`, `Unknown` when the row does not exist.
    pub fn strand(&self, row: usize) -> Strand {
        self.row(row).map(|s| s.strand).unwrap_or(Strand::Unknown)
    }
}

// ============================================================================
// Search Configuration
// ============================================================================

/// Settings passed to an aligner for one search.
#[derive(Debug, Clone, PartialEq)]
pub struct SearchConfig {
    /// Minimum percent identity; the engine drops anything below it.
    pub percent_identity: f64,
    /// Low-complexity (DUST) masking.
    pub dust_filtering: bool,
    pub evalue: f64,
    pub max_target_sequences: usize,
    /// Alignments retained per query/target region.
    pub culling_limit: usize,
    /// Engine threads, 0 lets the engine decide.
    pub threads: usize,
}

impl Default for SearchConfig {
    fn default() -> Self {
        Self {
            percent_identity: 80.0,
            dust_filtering: false,
            evalue: 1e-20,
            max_target_sequences: 10000,
            culling_limit: 1,
            threads: 0,
        }
    }
}

// ============================================================================
// Aligner Interface
// ============================================================================

/// An external nucleotide alignment engine.
///
/// `queries` and `targets` are ids of sequences registered in `scope`.
/// Implementations return every alignment found, in their own order, and
/// report failures as [`Error::AlignmentEngine`].
pub trait Aligner {
    fn search(
        &self,
        scope: &mut Scope<'_>,
        queries: &[&str],
        targets: &[&str],
        config: &SearchConfig,
    ) -> Result<Vec<AlignmentRecord>>;
}

impl<A: Aligner + ?Sized> Aligner for &A {
    fn search(
        &self,
        scope: &mut Scope<'_>,
        queries: &[&str],
        targets: &[&str],
        config: &SearchConfig,
    ) -> Result<Vec<AlignmentRecord>> {
        (**self).search(scope, queries, targets, config)
    }
}

impl<A: Aligner + ?Sized> Aligner for Box<A> {
    fn search(
        &self,
        scope: &mut Scope<'_>,
        queries: &[&str],
        targets: &[&str],
        config: &SearchConfig,
    ) -> Result<Vec<AlignmentRecord>> {
        (**self).search(scope, queries, targets, config)
    }
}

/// Locates an executable, either as given or on `$PATH`.
pub fn find_executable(name: &str) -> Result<PathBuf> {
    let path = Path::new(name);
    if path.is_absolute() && path.is_file() {
        return Ok(path.to_path_buf());
    }

    if let Ok(paths) = env::var("PATH") {
        for dir in env::split_paths(&paths) {
            let full_path = dir.join(name);
            if full_path.is_file() {
                return Ok(full_path);
            }
        }
    }

    Err(Error::AlignmentEngine(format!(
        "{} not found in PATH. Please install it or add it to your PATH.",
        name
    )))
}

/// Counts gap columns and gap openings in a CIGAR string.
///
/// Insertions and deletions both count as gaps; clipping and skips do not.
pub fn cigar_gaps(cigar: &str) -> Result<(usize, usize)> {
    let mut gaps = 0;
    let mut openings = 0;
    let mut len = 0usize;
    let mut have_len = false;

    for c in cigar.chars() {
        if let Some(d) = c.to_digit(10) {
            len = len * 10 + d as usize;
            have_len = true;
            continue;
        }
        if !have_len {
            return Err(Error::AlignmentEngine(format!("malformed CIGAR {:?}", cigar)));
        }
        match c {
            'I' | 'D' => {
                gaps += len;
                openings += 1;
            }
            'M' | '=' | 'X' | 'S' | 'H' | 'N' | 'P' => {}
            _ => return Err(Error::AlignmentEngine(format!("unknown CIGAR op {:?} in {:?}", c, cigar))),
        }
        len = 0;
        have_len = false;
    }

    if have_len {
        return Err(Error::AlignmentEngine(format!("truncated CIGAR {:?}", cigar)));
    }
    Ok((gaps, openings))
}
