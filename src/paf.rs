//! PAF (Pairwise mApping Format) Parser Module
//!
//! Parses minimap2 PAF output and adapts it into [`AlignmentRecord`]s.
//!
//! # PAF Format (12 mandatory columns, then SAM-like tags)
//! ```text
//! Col  Type    Description
//! 1    string  Query sequence name
//! 2    int     Query sequence length
//! 3    int     Query start (0-based)
//! 4    int     Query end (exclusive)
//! 5    char    Relative strand: '+' or '-'
//! 6    string  Target sequence name
//! 7    int     Target sequence length
//! 8    int     Target start
//! 9    int     Target end (exclusive)
//! 10   int     Number of matching bases
//! 11   int     Alignment block length
//! 12   int     Mapping quality (0-255; 255 for missing)
//! 13+  tags    e.g. cg:Z:<CIGAR>, NM:i:<edit distance>
//! ```

use crate::alignment::{cigar_gaps, AlignmentRecord, Segment, Strand};
use crate::error::{Error, Result};
use std::io::BufRead;

// ============================================================================
// PAF Record
// ============================================================================

/// A single PAF alignment record.
#[derive(Debug, Clone)]
pub struct PafRecord {
    pub query_name: String,
    pub query_len: usize,
    pub query_start: usize,
    pub query_end: usize,
    /// Relative strand: '+' or '-'.
    pub strand: char,
    pub target_name: String,
    pub target_len: usize,
    pub target_start: usize,
    pub target_end: usize,
    /// Number of matching bases (column 10).
    pub matches: usize,
    /// Alignment block length, gaps included (column 11).
    pub block_len: usize,
    pub mapq: u8,
    /// CIGAR from the `cg:Z:` tag, present when minimap2 ran with `-c`.
    pub cigar: Option<String>,
}

fn field<T: std::str::FromStr>(fields: &[&str], i: usize, what: &str) -> Result<T> {
    fields[i]
        .parse()
        .map_err(|_| Error::AlignmentEngine(format!("Invalid {} in PAF: {:?}", what, fields[i])))
}

impl PafRecord {
    /// Parses a PAF record from a tab-separated line.
    ///
    /// # Errors
    /// Fails if the line has fewer than 12 fields or a numeric field does
    /// not parse.
    pub fn parse_line(line: &str) -> Result<Self> {
        let fields: Vec<&str> = line.split('\t').collect();
        if fields.len() < 12 {
            return Err(Error::AlignmentEngine(
                "Invalid PAF line: fewer than 12 fields".to_string(),
            ));
        }

        let cigar = fields[12..]
            .iter()
            .find_map(|tag| tag.strip_prefix("cg:Z:"))
            .map(str::to_string);

        Ok(Self {
            query_name: fields[0].to_string(),
            query_len: field(&fields, 1, "query length")?,
            query_start: field(&fields, 2, "query start")?,
            query_end: field(&fields, 3, "query end")?,
            strand: fields[4].chars().next().unwrap_or('+'),
            target_name: fields[5].to_string(),
            target_len: field(&fields, 6, "target length")?,
            target_start: field(&fields, 7, "target start")?,
            target_end: field(&fields, 8, "target end")?,
            matches: field(&fields, 9, "matches count")?,
            block_len: field(&fields, 10, "block length")?,
            mapq: field(&fields, 11, "mapping quality")?,
            cigar,
        })
    }

    /// Identity = matching bases / alignment block length × 100.
    pub fn calculate_identity(&self) -> f64 {
        if self.block_len == 0 {
            return 0.0;
        }
        (self.matches as f64 / self.block_len as f64) * 100.0
    }

    /// Converts to the engine-neutral record.
    ///
    /// Gap statistics come from the CIGAR; without one they are derived
    /// from the length difference between the block and the longer span,
    /// which undercounts gaps that cancel out.
    pub fn to_alignment(&self) -> Result<AlignmentRecord> {
        if self.query_end <= self.query_start || self.target_end <= self.target_start {
            return Err(Error::AlignmentEngine(format!(
                "empty PAF alignment between {} and {}",
                self.query_name, self.target_name
            )));
        }

        let (total_gap_count, num_gap_openings) = match &self.cigar {
            Some(cigar) => cigar_gaps(cigar)?,
            None => {
                let qspan = self.query_end - self.query_start;
                let tspan = self.target_end - self.target_start;
                let gaps = self.block_len.saturating_sub(qspan.min(tspan));
                (gaps, usize::from(gaps > 0))
            }
        };

        Ok(AlignmentRecord {
            query_id: self.query_name.clone(),
            target_id: self.target_name.clone(),
            segments: [
                Segment::new(self.query_start, self.query_end - 1, Strand::from_sign(self.strand)),
                Segment::new(self.target_start, self.target_end - 1, Strand::Plus),
            ],
            alignment_length: self.block_len,
            total_gap_count,
            num_gap_openings,
            percent_identity: self.calculate_identity(),
            evalue: None,
        })
    }
}

// ============================================================================
// PAF Reader
// ============================================================================

/// Sequential reader over PAF lines from any buffered source.
pub struct PafReader<R> {
    reader: R,
    line_buf: String,
}

impl<R: BufRead> PafReader<R> {
    pub fn new(reader: R) -> Self {
        Self {
            reader,
            line_buf: String::with_capacity(512),
        }
    }

    /// Reads the next record, skipping empty lines.
    pub fn read_next(&mut self) -> Result<Option<PafRecord>> {
        loop {
            self.line_buf.clear();
            if self.reader.read_line(&mut self.line_buf)? == 0 {
                return Ok(None);
            }

            let line = self.line_buf.trim_end();
            if !line.is_empty() {
                return Ok(Some(PafRecord::parse_line(line)?));
            }
        }
    }
}

impl<R: BufRead> Iterator for PafReader<R> {
    type Item = Result<PafRecord>;

    fn next(&mut self) -> Option<Self::Item> {
        self.read_next().transpose()
    }
}

// ============================================================================
// Tests
// ============================================================================
