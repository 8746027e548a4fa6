//! ABRICATE-compatible tabular report.
//!
//! # Columns
//! ```text
//! #FILE  SEQUENCE  START  END  STRAND  GENE  COVERAGE  COVERAGE_MAP  GAPS
//! %COVERAGE  %IDENTITY  DATABASE  ACCESSION  PRODUCT  RESISTANCE
//! ```
//! Coordinates are 1-based and inclusive.

use crate::hit::Hit;
use std::io::{self, Write};

pub const HEADER: [&str; 15] = [
    "#FILE",
    "SEQUENCE",
    "START",
    "END",
    "STRAND",
    "GENE",
    "COVERAGE",
    "COVERAGE_MAP",
    "GAPS",
    "%COVERAGE",
    "%IDENTITY",
    "DATABASE",
    "ACCESSION",
    "PRODUCT",
    "RESISTANCE",
];

/// One output row, fully rendered.
#[derive(Debug, Clone, PartialEq)]
pub struct ReportRow {
    pub file: String,
    pub sequence: String,
    pub start: usize,
    pub end: usize,
    pub strand: char,
    pub gene: String,
    pub coverage: String,
    pub coverage_map: String,
    pub gaps: String,
    pub percent_coverage: f64,
    pub percent_identity: f64,
    pub database: String,
    pub accession: String,
    pub product: String,
    pub resistance: String,
}

impl ReportRow {
    pub fn from_hit(file: &str, query_id: &str, hit: &Hit<'_>) -> Self {
        let query = hit.alignment.query();
        let target = hit.alignment.target();

        ReportRow {
            file: file.to_string(),
            sequence: query_id.to_string(),
            start: query.start + 1,
            end: query.stop + 1,
            strand: hit.alimap.strand(0).sign(),
            gene: hit.gene.name.clone(),
            coverage: format!("{}-{}/{}", target.start + 1, target.stop + 1, hit.gene.length()),
            coverage_map: hit.minimap_default(),
            gaps: format!(
                "{}/{}",
                hit.alignment.num_gap_openings, hit.alignment.total_gap_count
            ),
            percent_coverage: hit.percent_coverage(),
            percent_identity: hit.percent_identity(),
            database: hit.database.name().to_string(),
            accession: hit.gene.accession.clone(),
            product: hit.gene.description.clone(),
            resistance: hit.gene.resistance_label(),
        }
    }

    /// Tab-separated line, without the trailing newline.
    pub fn to_line(&self) -> String {
        format!(
            "{}\t{}\t{}\t{}\t{}\t{}\t{}\t{}\t{}\t{:5.2}\t{:5.2}\t{}\t{}\t{}\t{}",
            self.file,
            self.sequence,
            self.start,
            self.end,
            self.strand,
            self.gene,
            self.coverage,
            self.coverage_map,
            self.gaps,
            self.percent_coverage,
            self.percent_identity,
            self.database,
            self.accession,
            self.product,
            self.resistance
        )
    }
}

pub fn write_header<W: Write>(out: &mut W) -> io::Result<()> {
    writeln!(out, "{}", HEADER.join("\t"))
}

pub fn write_rows<W: Write>(out: &mut W, rows: &[ReportRow]) -> io::Result<()> {
    for row in rows {
        writeln!(out, "{}", row.to_line())?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::alignment::{AlignmentRecord, Segment, Strand};
    use crate::database::Database;
    use crate::gene::Gene;

    #[test]
    fn test_row_layout() {
        let gene = Gene::new(
            "aac(6')-Ib",
            "NG_052361.1",
            "aminoglycoside 6'-N-acetyltransferase",
            ["tobramycin", "amikacin"],
            "A".repeat(150),
        );
        let db = Database::new("ncbi", vec![gene]).unwrap();
        let alignment = AlignmentRecord {
            query_id: "query".to_string(),
            target_id: "gene_0".to_string(),
            segments: [
                Segment::new(999, 1074, Strand::Minus),
                Segment::new(0, 75, Strand::Plus),
            ],
            alignment_length: 78,
            total_gap_count: 2,
            num_gap_openings: 1,
            percent_identity: 97.4359,
            evalue: Some(1e-30),
        };
        let hit = Hit::new(db.get(0).unwrap(), &db, alignment);
        let row = ReportRow::from_hit("assembly.fa", "LGJG01000038", &hit);

        assert_eq!(row.start, 1000);
        assert_eq!(row.end, 1075);
        assert_eq!(row.coverage, "1-76/150");
        assert_eq!(row.gaps, "1/2");

        let line = row.to_line();
        let fields: Vec<&str> = line.split('\t').collect();
        assert_eq!(fields.len(), HEADER.len());
        assert_eq!(
            fields,
            vec![
                "assembly.fa",
                "LGJG01000038",
                "1000",
                "1075",
                "-",
                "aac(6')-Ib",
                "1-76/150",
                "========/......",
                "1/2",
                "50.67",
                "97.44",
                "ncbi",
                "NG_052361.1",
                "aminoglycoside 6'-N-acetyltransferase",
                "AMIKACIN;TOBRAMYCIN",
            ]
        );
    }

    #[test]
    fn test_small_percentages_are_padded() {
        let row = ReportRow {
            file: "f".into(),
            sequence: "s".into(),
            start: 1,
            end: 2,
            strand: '?',
            gene: "g".into(),
            coverage: "1-2/400".into(),
            coverage_map: ".".into(),
            gaps: "0/0".into(),
            percent_coverage: 0.5,
            percent_identity: 100.0,
            database: "d".into(),
            accession: "a".into(),
            product: "p".into(),
            resistance: String::new(),
        };
        let line = row.to_line();
        assert!(line.contains("\t 0.50\t100.00\t"));
        assert!(line.ends_with("\tp\t"));
    }

    #[test]
    fn test_header() {
        let mut out = Vec::new();
        write_header(&mut out).unwrap();
        let text = String::from_utf8(out).unwrap();
        assert!(text.starts_with("#FILE\tSEQUENCE\tSTART"));
        assert!(text.ends_with("PRODUCT\tRESISTANCE\n"));
    }
}
