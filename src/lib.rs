//! abricate - Antimicrobial resistance and virulence gene screening
//!
//! Aligns assembled contigs against a curated gene database and reports
//! genes found above identity and coverage thresholds, in the ABRICATE
//! tabular layout.
//!
//! # Modules
//! - `gene`: reference gene records
//! - `database`: index-addressable gene database and its JSON/FASTA forms
//! - `seqio`: FASTA I/O and encoded nucleotide sequences
//! - `alignment`: engine-neutral alignment records and the `Aligner` trait
//! - `scope`: per-search sequence registration and scratch space
//! - `blastn`: NCBI BLAST+ back-end
//! - `paf`: PAF parsing for the minimap2 back-end
//! - `minimap2`: minimap2 back-end
//! - `hit`: coverage, identity and minimap of one match
//! - `finder`: query screening against a database
//! - `report`: tabular output

pub mod error;
pub mod gene;
pub mod seqio;
pub mod database;
pub mod alignment;
pub mod scope;
pub mod paf;
pub mod blastn;
pub mod minimap2;
pub mod hit;
pub mod finder;
pub mod report;

pub use error::{Error, Result};
