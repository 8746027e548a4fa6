//! Sequence I/O Module
//!
//! FASTA reading for query files and database imports, and the encoded
//! nucleotide buffer handed to aligners.
//!
//! # Examples
//! ```no_run
//! use abricate::seqio::FastaReader;
//!
//! // Plain or gzipped FASTA (detected from the extension)
//! let mut reader = FastaReader::open("contigs.fa.gz").unwrap();
//! while let Some(record) = reader.read_next().unwrap() {
//!     println!("{}: {} bp", record.name, record.seq.len());
//! }
//! ```

use crate::error::{Error, Result};
use flate2::read::MultiGzDecoder;
use std::fs::File;
use std::io::{BufRead, BufReader, Write};
use std::path::Path;

/// IUPAC nucleotide codes accepted in encoded sequences (upper case only,
/// input is upper-cased before the check).
const VALID_NUCLEOTIDES: &[u8] = b"ACGTUNRYSWKMBDHV";

// ============================================================================
// FASTA Format
// ============================================================================

/// A FASTA record.
#[derive(Debug, Clone, PartialEq)]
pub struct FastaRecord {
    /// Sequence identifier (header text up to the first whitespace).
    pub name: String,
    /// Remainder of the header line after the identifier, trimmed.
    pub description: String,
    /// Sequence, concatenated from all sequence lines.
    pub seq: String,
}

/// Sequential reader for FASTA data.
///
/// Handles multi-line sequences and strips line endings. Blank lines and
/// anything before the first header are ignored.
pub struct FastaReader<R> {
    reader: R,
    line_buf: String,
    current_header: Option<String>,
}

impl FastaReader<Box<dyn BufRead + Send>> {
    /// Opens a FASTA file, decompressing it when the name ends in `.gz`.
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let file = File::open(path)?;
        let ext = path.extension().and_then(|e| e.to_str()).unwrap_or("");

        let reader: Box<dyn BufRead + Send> = if ext == "gz" {
            Box::new(BufReader::with_capacity(1024 * 1024, MultiGzDecoder::new(file)))
        } else {
            Box::new(BufReader::with_capacity(1024 * 1024, file))
        };
        FastaReader::new(reader)
    }
}

impl<R: BufRead> FastaReader<R> {
    /// Wraps an already buffered reader.
    pub fn new(reader: R) -> Result<Self> {
        let mut reader = Self {
            reader,
            line_buf: String::with_capacity(256),
            current_header: None,
        };

        // Skip forward to the first header line
        loop {
            reader.line_buf.clear();
            if reader.reader.read_line(&mut reader.line_buf)? == 0 {
                break;
            }
            if let Some(header) = reader.line_buf.strip_prefix('>') {
                reader.current_header = Some(header.trim_end().to_string());
                break;
            }
        }

        Ok(reader)
    }

    /// Reads the next record, or `None` at end of input.
    pub fn read_next(&mut self) -> Result<Option<FastaRecord>> {
        let header = match self.current_header.take() {
            Some(h) => h,
            None => return Ok(None),
        };

        let mut seq = String::with_capacity(10000);

        loop {
            self.line_buf.clear();
            if self.reader.read_line(&mut self.line_buf)? == 0 {
                break;
            }

            if let Some(next) = self.line_buf.strip_prefix('>') {
                self.current_header = Some(next.trim_end().to_string());
                break;
            }
            seq.push_str(self.line_buf.trim());
        }

        let (name, description) = match header.split_once(char::is_whitespace) {
            Some((name, rest)) => (name.to_string(), rest.trim().to_string()),
            None => (header, String::new()),
        };

        Ok(Some(FastaRecord { name, description, seq }))
    }
}

impl<R: BufRead> Iterator for FastaReader<R> {
    type Item = Result<FastaRecord>;

    fn next(&mut self) -> Option<Self::Item> {
        self.read_next().transpose()
    }
}

/// Writes one single-line FASTA record.
pub fn write_fasta<W: Write>(writer: &mut W, id: &str, residues: &[u8]) -> Result<()> {
    writeln!(writer, ">{}", id)?;
    writer.write_all(residues)?;
    writeln!(writer)?;
    Ok(())
}

// ============================================================================
// Encoded Sequences
// ============================================================================

/// Nucleotide sequence canonicalised for alignment: upper-case ASCII,
/// restricted to IUPAC codes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NucleotideSequence {
    residues: Vec<u8>,
}

impl NucleotideSequence {
    /// Upper-cases and validates `seq`. `id` is only used in error messages.
    pub fn encode(id: &str, seq: &str) -> Result<Self> {
        let mut residues = Vec::with_capacity(seq.len());
        for (position, c) in seq.chars().enumerate() {
            let upper = c.to_ascii_uppercase();
            if !upper.is_ascii() || !VALID_NUCLEOTIDES.contains(&(upper as u8)) {
                return Err(Error::InvalidSequence {
                    id: id.to_string(),
                    position,
                    byte: c,
                });
            }
            residues.push(upper as u8);
        }
        Ok(Self { residues })
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.residues
    }

    pub fn len(&self) -> usize {
        self.residues.len()
    }

    pub fn is_empty(&self) -> bool {
        self.residues.is_empty()
    }
}

impl TryFrom<&FastaRecord> for NucleotideSequence {
    type Error = Error;

    fn try_from(record: &FastaRecord) -> Result<Self> {
        NucleotideSequence::encode(&record.name, &record.seq)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    #[test]
    fn test_read_multiline_records() {
        let data = "junk\n>seq1 first contig\nACGT\nacgt\n\n>seq2\nTTTT\n";
        let reader = FastaReader::new(Cursor::new(data)).unwrap();
        let records: Vec<FastaRecord> = reader.collect::<Result<_>>().unwrap();

        assert_eq!(records.len(), 2);
        assert_eq!(records[0].name, "seq1");
        assert_eq!(records[0].description, "first contig");
        assert_eq!(records[0].seq, "ACGTacgt");
        assert_eq!(records[1].name, "seq2");
        assert_eq!(records[1].description, "");
        assert_eq!(records[1].seq, "TTTT");
    }

    #[test]
    fn test_empty_input() {
        let mut reader = FastaReader::new(Cursor::new("")).unwrap();
        assert!(reader.read_next().unwrap().is_none());
    }

    #[test]
    fn test_open_gzipped() {
        use flate2::write::GzEncoder;
        use flate2::Compression;

        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("q.fa.gz");
        let mut enc = GzEncoder::new(File::create(&path).unwrap(), Compression::default());
        enc.write_all(b">q1\nACGT\n").unwrap();
        enc.finish().unwrap();

        let mut reader = FastaReader::open(&path).unwrap();
        let rec = reader.read_next().unwrap().unwrap();
        assert_eq!(rec.name, "q1");
        assert_eq!(rec.seq, "ACGT");
    }

    #[test]
    fn test_encode_uppercases() {
        let seq = NucleotideSequence::encode("q", "acgtNn").unwrap();
        assert_eq!(seq.as_bytes(), b"ACGTNN");
        assert_eq!(seq.len(), 6);
    }

    #[test]
    fn test_encode_rejects_invalid() {
        let err = NucleotideSequence::encode("q", "ACGXT").unwrap_err();
        match err {
            Error::InvalidSequence { position, byte, .. } => {
                assert_eq!(position, 3);
                assert_eq!(byte, 'X');
            }
            other => panic!("unexpected error: {other}"),
        }
        assert!(NucleotideSequence::encode("q", "ACGé").is_err());
    }

    #[test]
    fn test_encode_rejects_gaps() {
        let err = NucleotideSequence::encode("q", "---").unwrap_err();
        assert!(matches!(err, Error::InvalidSequence { position: 0, byte: '-', .. }));
        assert!(NucleotideSequence::encode("q", "AC-GT").is_err());
    }

    #[test]
    fn test_write_fasta() {
        let mut out = Vec::new();
        write_fasta(&mut out, "gene_0", b"ACGT").unwrap();
        assert_eq!(out, b">gene_0\nACGT\n");
    }
}
