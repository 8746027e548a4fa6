use abricate::alignment::{find_executable, Aligner, AlignmentRecord, SearchConfig, Segment, Strand};
use abricate::blastn::BlastN;
use abricate::database::Database;
use abricate::finder::ResistanceGeneFinder;
use abricate::gene::Gene;
use abricate::report::ReportRow;
use abricate::scope::Scope;
use abricate::Result;
use std::io::Cursor;

/// Finds every target that occurs verbatim in a query, on either strand.
struct ExactMatchAligner;

fn reverse_complement(seq: &[u8]) -> Vec<u8> {
    seq.iter()
        .rev()
        .map(|b| match b {
            b'A' => b'T',
            b'T' => b'A',
            b'C' => b'G',
            b'G' => b'C',
            other => *other,
        })
        .collect()
}

fn find(haystack: &[u8], needle: &[u8]) -> Option<usize> {
    haystack.windows(needle.len()).position(|w| w == needle)
}

impl Aligner for ExactMatchAligner {
    fn search(
        &self,
        scope: &mut Scope<'_>,
        queries: &[&str],
        targets: &[&str],
        _config: &SearchConfig,
    ) -> Result<Vec<AlignmentRecord>> {
        let mut records = Vec::new();
        for q in queries {
            let query = scope.get(q).expect("query registered").as_bytes().to_vec();
            for t in targets {
                let target = scope.get(t).expect("target registered").as_bytes();
                let len = target.len();
                let (pos, strand) = match find(&query, target) {
                    Some(p) => (p, Strand::Plus),
                    None => match find(&query, &reverse_complement(target)) {
                        Some(p) => (p, Strand::Minus),
                        None => continue,
                    },
                };
                records.push(AlignmentRecord {
                    query_id: q.to_string(),
                    target_id: t.to_string(),
                    segments: [
                        Segment::new(pos, pos + len - 1, strand),
                        Segment::new(0, len - 1, Strand::Plus),
                    ],
                    alignment_length: len,
                    total_gap_count: 0,
                    num_gap_openings: 0,
                    percent_identity: 100.0,
                    evalue: Some(0.0),
                });
            }
        }
        Ok(records)
    }
}

fn tet_database() -> Database {
    Database::new(
        "ncbi",
        vec![Gene::new(
            "tetA",
            "NG_048154.1",
            "tetracycline efflux MFS transporter TetA",
            ["tetracycline"],
            "ACGT".repeat(50),
        )],
    )
    .unwrap()
}

#[test]
fn test_identical_query_single_full_hit() {
    let finder = ResistanceGeneFinder::new(tet_database(), ExactMatchAligner);
    let query = "ACGT".repeat(50);
    let hits: Vec<_> = finder.find_genes(query.as_str()).unwrap().collect::<Result<_>>().unwrap();

    assert_eq!(hits.len(), 1);
    let hit = &hits[0];
    assert_eq!(hit.gene.name, "tetA");
    assert!((hit.percent_identity() - 100.0).abs() < 1e-9);
    assert!((hit.percent_coverage() - 100.0).abs() < 1e-9);
    assert_eq!(hit.minimap(15).unwrap(), "===============");
}

#[test]
fn test_gene_embedded_in_contig_lowercase() {
    let finder = ResistanceGeneFinder::new(tet_database(), ExactMatchAligner);
    let contig = format!("{}{}{}", "g".repeat(1000), "acgt".repeat(50), "t".repeat(500));
    let hits: Vec<_> = finder.find_genes(&contig).unwrap().collect::<Result<_>>().unwrap();

    assert_eq!(hits.len(), 1);
    let row = ReportRow::from_hit("assembly.fa", "contig_7", &hits[0]);
    assert_eq!(row.start, 1001);
    assert_eq!(row.end, 1200);
    assert_eq!(row.strand, '+');
    assert_eq!(row.coverage, "1-200/200");
    assert_eq!(row.resistance, "TETRACYCLINE");
    assert!(row.to_line().contains("\t100.00\t100.00\tncbi\tNG_048154.1\t"));
}

#[test]
fn test_reverse_strand_hit() {
    let gene = Gene::new("blaX", "ACC1", "test beta-lactamase", ["beta-lactam"], "AAACCCGGGTTTAC");
    let db = Database::new("card", vec![gene]).unwrap();
    let finder = ResistanceGeneFinder::new(db, ExactMatchAligner);

    let contig = format!("CCCC{}", "GTAAACCCGGGTTT");
    let hits: Vec<_> = finder.find_genes(&contig).unwrap().collect::<Result<_>>().unwrap();
    assert_eq!(hits.len(), 1);
    assert_eq!(hits[0].alimap.strand(0).sign(), '-');
    assert_eq!(hits[0].alignment.query().start, 4);
}

#[test]
fn test_only_passing_genes_reported() {
    let db = Database::new(
        "ncbi",
        vec![
            Gene::new("tetA", "A1", "", ["tetracycline"], "ACGT".repeat(50)),
            Gene::new("sul1", "A2", "", ["sulfonamide"], "TTTTGGGGCCCCAAAA"),
        ],
    )
    .unwrap();
    let finder = ResistanceGeneFinder::new(db, ExactMatchAligner);
    let names: Vec<String> = finder
        .find_genes("TTTTGGGGCCCCAAAA")
        .unwrap()
        .map(|h| h.unwrap().gene.name.clone())
        .collect();
    assert_eq!(names, vec!["sul1"]);
}

#[test]
fn test_database_roundtrip_then_search() {
    let mut buf = Vec::new();
    tet_database().dump(&mut buf).unwrap();
    let db = Database::load(Cursor::new(buf)).unwrap();

    let finder = ResistanceGeneFinder::new(db, ExactMatchAligner);
    assert_eq!(finder.find_genes("ACGT".repeat(50).as_str()).unwrap().count(), 1);
}

#[test]
fn test_sliced_database_resolves_renumbered_targets() {
    let db = Database::new(
        "ncbi",
        vec![
            Gene::new("first", "A1", "", ["x"], "GGGGGGGGGGGG"),
            Gene::new("tetA", "A2", "", ["tetracycline"], "ACGT".repeat(50)),
        ],
    )
    .unwrap();
    let sliced = db.slice(1..);
    let finder = ResistanceGeneFinder::new(sliced, ExactMatchAligner);
    let hits: Vec<_> = finder
        .find_genes("ACGT".repeat(50).as_str())
        .unwrap()
        .collect::<Result<_>>()
        .unwrap();
    assert_eq!(hits.len(), 1);
    assert_eq!(hits[0].gene.name, "tetA");
}

#[test]
fn test_repeated_calls_are_independent() {
    let finder = ResistanceGeneFinder::new(tet_database(), ExactMatchAligner);
    let query = "ACGT".repeat(50);
    for _ in 0..3 {
        assert_eq!(finder.find_genes(query.as_str()).unwrap().count(), 1);
    }
}

#[test]
fn test_blastn_end_to_end() {
    let blastn = match find_executable("blastn") {
        Ok(path) => BlastN::with_executable(path),
        Err(_) => {
            eprintln!("blastn not found, skipping");
            return;
        }
    };

    // Low-complexity repeats make poor BLAST seeds, so use a mixed sequence
    let gene_seq = "ATGAAACCCAATTTTATTCGGCTAGCATGGACCTTACGGATCGTACGATCGGGCTAACGTTAGCCATGCAATCGGCTA\
                    TTAGCGCATCGGATCGACTGACTAGCTAGCTACGATCGATCGTAGCTAGCATCGACTACGATCAGCTAGCGCGATTA\
                    CGATCGAGCTAGCATCAGCGACTACGATCGACTAGCGATCGAGCAGCATCAGCGACTAGC";
    let db = Database::new("ncbi", vec![Gene::new("blaZ", "X1", "test gene", ["beta-lactam"], gene_seq)]).unwrap();
    let finder = ResistanceGeneFinder::new(db, blastn);

    let contig = format!("{}{}{}", "TTGACCGATAGCCA".repeat(5), gene_seq, "GGCATTACGAATCG".repeat(5));
    let hits: Vec<_> = finder.find_genes(&contig).unwrap().collect::<Result<_>>().unwrap();

    assert_eq!(hits.len(), 1);
    assert_eq!(hits[0].alignment.query().start, 70);
    assert!((hits[0].percent_coverage() - 100.0).abs() < 1e-9);
    assert!((hits[0].percent_identity() - 100.0).abs() < 1e-9);
}
