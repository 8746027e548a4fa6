//! NCBI BLAST+ `blastn` back-end.
//!
//! Writes the registered queries and targets into the scope directory, runs
//! `blastn -subject` with tabular output and adapts each line.
//!
//! # Tabular columns requested
//! ```text
//! qseqid sseqid qstart qend sstart send length gaps gapopen pident evalue
//! ```
//! BLAST coordinates are 1-based inclusive. A subject range running
//! backwards (`sstart > send`) means the query matched the reverse strand
//! of the gene.

use crate::alignment::{find_executable, Aligner, AlignmentRecord, SearchConfig, Segment, Strand};
use crate::error::{Error, Result};
use crate::scope::Scope;
use std::path::PathBuf;
use std::process::Command;

const OUTFMT: &str = "6 qseqid sseqid qstart qend sstart send length gaps gapopen pident evalue";

/// Parses one line of the tabular output above.
pub fn parse_tabular_line(line: &str) -> Result<AlignmentRecord> {
    let fields: Vec<&str> = line.split('\t').collect();
    if fields.len() < 11 {
        return Err(Error::AlignmentEngine(format!(
            "Invalid blastn line: expected 11 fields, found {}",
            fields.len()
        )));
    }

    let int = |i: usize, what: &str| -> Result<usize> {
        fields[i]
            .trim()
            .parse()
            .map_err(|_| Error::AlignmentEngine(format!("Invalid {} in blastn output: {:?}", what, fields[i])))
    };
    let float = |i: usize, what: &str| -> Result<f64> {
        fields[i]
            .trim()
            .parse()
            .map_err(|_| Error::AlignmentEngine(format!("Invalid {} in blastn output: {:?}", what, fields[i])))
    };

    let qstart = int(2, "qstart")?;
    let qend = int(3, "qend")?;
    let sstart = int(4, "sstart")?;
    let send = int(5, "send")?;
    if qstart == 0 || qend == 0 || sstart == 0 || send == 0 {
        return Err(Error::AlignmentEngine(format!(
            "blastn reported a 0 coordinate in {:?}",
            line
        )));
    }

    let query_strand = if sstart <= send { Strand::Plus } else { Strand::Minus };

    Ok(AlignmentRecord {
        query_id: fields[0].to_string(),
        target_id: fields[1].to_string(),
        segments: [
            Segment::new(qstart - 1, qend - 1, query_strand),
            Segment::new(sstart - 1, send - 1, Strand::Plus),
        ],
        alignment_length: int(6, "length")?,
        total_gap_count: int(7, "gaps")?,
        num_gap_openings: int(8, "gapopen")?,
        percent_identity: float(9, "pident")?,
        evalue: Some(float(10, "evalue")?),
    })
}

#[derive(Debug, Clone)]
pub struct BlastN {
    executable: PathBuf,
}

impl BlastN {
    /// Finds `blastn` on `$PATH`.
    pub fn new() -> Result<Self> {
        Ok(Self::with_executable(find_executable("blastn")?))
    }

    pub fn with_executable(executable: PathBuf) -> Self {
        Self { executable }
    }

    fn command(&self, query: &std::path::Path, subject: &std::path::Path, config: &SearchConfig) -> Command {
        let mut cmd = Command::new(&self.executable);
        cmd.arg("-task")
            .arg("blastn")
            .arg("-query")
            .arg(query)
            .arg("-subject")
            .arg(subject)
            .arg("-outfmt")
            .arg(OUTFMT)
            .arg("-dust")
            .arg(if config.dust_filtering { "yes" } else { "no" })
            .arg("-perc_identity")
            .arg(config.percent_identity.to_string())
            .arg("-evalue")
            .arg(format!("{:e}", config.evalue))
            .arg("-max_target_seqs")
            .arg(config.max_target_sequences.to_string());
        if config.culling_limit > 0 {
            cmd.arg("-culling_limit").arg(config.culling_limit.to_string());
        }
        // -num_threads is rejected together with -subject
        cmd
    }
}

impl Aligner for BlastN {
    fn search(
        &self,
        scope: &mut Scope<'_>,
        queries: &[&str],
        targets: &[&str],
        config: &SearchConfig,
    ) -> Result<Vec<AlignmentRecord>> {
        if queries.is_empty() || targets.is_empty() {
            return Ok(Vec::new());
        }
        let query_path = scope.write_fasta("queries.fa", queries)?;
        let subject_path = scope.write_fasta("targets.fa", targets)?;

        let mut cmd = self.command(&query_path, &subject_path, config);
        tracing::debug!(command = ?cmd, "running blastn");

        let output = cmd
            .output()
            .map_err(|e| Error::AlignmentEngine(format!("Failed to run blastn: {}", e)))?;
        if !output.status.success() {
            return Err(Error::AlignmentEngine(format!(
                "blastn failed (exit code: {:?}): {}",
                output.status.code(),
                String::from_utf8_lossy(&output.stderr).trim()
            )));
        }

        let stdout = String::from_utf8_lossy(&output.stdout);
        let records = stdout
            .lines()
            .filter(|l| !l.trim().is_empty() && !l.starts_with('#'))
            .map(parse_tabular_line)
            .collect::<Result<Vec<_>>>()?;
        tracing::debug!(alignments = records.len(), "blastn finished");
        Ok(records)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_plus_strand() {
        let line = "query\tgene_4\t1001\t1861\t1\t861\t861\t0\t0\t99.884\t0.0";
        let rec = parse_tabular_line(line).unwrap();

        assert_eq!(rec.query_id, "query");
        assert_eq!(rec.target_id, "gene_4");
        assert_eq!(rec.query(), &Segment { start: 1000, stop: 1860, strand: Strand::Plus });
        assert_eq!(rec.target(), &Segment { start: 0, stop: 860, strand: Strand::Plus });
        assert_eq!(rec.alignment_length, 861);
        assert!(!rec.has_gaps());
        assert_eq!(rec.percent_identity, 99.884);
        assert_eq!(rec.evalue, Some(0.0));
    }

    #[test]
    fn test_parse_minus_strand() {
        let line = "query\tgene_0\t11\t210\t200\t1\t202\t3\t2\t97.5\t1e-95";
        let rec = parse_tabular_line(line).unwrap();

        assert_eq!(rec.query().strand, Strand::Minus);
        assert_eq!(rec.query().start, 10);
        assert_eq!(rec.query().stop, 209);
        assert_eq!(rec.target().start, 0);
        assert_eq!(rec.target().stop, 199);
        assert_eq!(rec.total_gap_count, 3);
        assert_eq!(rec.num_gap_openings, 2);
        assert_eq!(rec.evalue, Some(1e-95));
    }

    #[test]
    fn test_parse_errors() {
        assert!(parse_tabular_line("query\tgene_0\t1").is_err());
        assert!(parse_tabular_line("query\tgene_0\t0\t10\t1\t10\t10\t0\t0\t100\t0").is_err());
        assert!(parse_tabular_line("query\tgene_0\t1\t10\t1\t10\t10\t0\t0\tabc\t0").is_err());
    }

    #[test]
    fn test_command_line() {
        let blast = BlastN::with_executable(PathBuf::from("blastn"));
        let cmd = blast.command(
            std::path::Path::new("q.fa"),
            std::path::Path::new("t.fa"),
            &SearchConfig::default(),
        );
        let args: Vec<String> = cmd.get_args().map(|a| a.to_string_lossy().into_owned()).collect();

        let value_of = |flag: &str| {
            let pos = args.iter().position(|a| a == flag).unwrap();
            args[pos + 1].clone()
        };
        assert_eq!(value_of("-dust"), "no");
        assert_eq!(value_of("-perc_identity"), "80");
        assert_eq!(value_of("-evalue"), "1e-20");
        assert_eq!(value_of("-max_target_seqs"), "10000");
        assert_eq!(value_of("-culling_limit"), "1");
        assert_eq!(value_of("-outfmt"), OUTFMT);
    }
}
