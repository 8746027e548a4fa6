//! Registration scope for one search.
//!
//! A [`Scope`] registers the sequences an aligner may see during one
//! `find_genes` call and owns the scratch directory engines write their
//! input files into. It borrows database sequences instead of copying them.
//! Dropping the scope releases everything, including the directory.

use crate::error::{Error, Result};
use crate::seqio::{write_fasta, NucleotideSequence};
use rustc_hash::FxHashMap;
use std::borrow::Cow;
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};
use tempfile::TempDir;

pub struct Scope<'a> {
    sequences: Vec<(String, Cow<'a, NucleotideSequence>)>,
    index: FxHashMap<String, usize>,
    workdir: Option<TempDir>,
}

impl<'a> Scope<'a> {
    pub fn new() -> Self {
        Self {
            sequences: Vec::new(),
            index: FxHashMap::default(),
            workdir: None,
        }
    }

    /// Registers a borrowed sequence under `id`.
    pub fn add(&mut self, id: &str, sequence: &'a NucleotideSequence) -> Result<()> {
        self.insert(id, Cow::Borrowed(sequence))
    }

    /// Registers an owned sequence under `id`.
    pub fn add_owned(&mut self, id: &str, sequence: NucleotideSequence) -> Result<()> {
        self.insert(id, Cow::Owned(sequence))
    }

    fn insert(&mut self, id: &str, sequence: Cow<'a, NucleotideSequence>) -> Result<()> {
        if self.index.contains_key(id) {
            return Err(Error::Configuration(format!(
                "sequence {:?} registered twice in the same scope",
                id
            )));
        }
        self.index.insert(id.to_string(), self.sequences.len());
        self.sequences.push((id.to_string(), sequence));
        Ok(())
    }

    pub fn get(&self, id: &str) -> Option<&NucleotideSequence> {
        self.index.get(id).map(|&i| &*self.sequences[i].1)
    }

    pub fn len(&self) -> usize {
        self.sequences.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sequences.is_empty()
    }

    /// Scratch directory, created on first use.
    pub fn workdir(&mut self) -> Result<PathBuf> {
        if let Some(dir) = &self.workdir {
            return Ok(dir.path().to_path_buf());
        }
        let dir = tempfile::Builder::new().prefix("abricate_").tempdir()?;
        let path = dir.path().to_path_buf();
        tracing::trace!(path = %path.display(), "created scope workdir");
        self.workdir = Some(dir);
        Ok(path)
    }

    /// Writes the sequences named by `ids` to a FASTA file in the workdir.
    pub fn write_fasta(&mut self, file_name: &str, ids: &[&str]) -> Result<PathBuf> {
        let path = self.workdir()?.join(file_name);
        let mut out = BufWriter::new(File::create(&path)?);
        for id in ids {
            let seq = self.get(id).ok_or_else(|| {
                Error::Configuration(format!("sequence {:?} is not registered in this scope", id))
            })?;
            write_fasta(&mut out, id, seq.as_bytes())?;
        }
        out.flush()?;
        Ok(path)
    }

    pub fn has_workdir(&self) -> bool {
        self.workdir.is_some()
    }

    pub fn workdir_path(&self) -> Option<&Path> {
        self.workdir.as_ref().map(|d| d.path())
    }
}

impl Default for Scope<'_> {
    fn default() -> Self {
        Self::new()
    }
}

impl Drop for Scope<'_> {
    fn drop(&mut self) {
        tracing::trace!(sequences = self.sequences.len(), "releasing search scope");
    }
}
