//! minimap2 back-end.
//!
//! Runs `minimap2 -c` with the registered targets as reference and the
//! queries as reads, then adapts the PAF output. minimap2 has no identity or
//! e-value cutoff of its own, so the identity threshold of the search config
//! is applied here and the e-value is ignored.

use crate::alignment::{find_executable, Aligner, AlignmentRecord, SearchConfig};
use crate::error::{Error, Result};
use crate::paf::PafReader;
use crate::scope::Scope;
use std::path::PathBuf;
use std::process::Command;

#[derive(Debug, Clone)]
pub struct Minimap2 {
    executable: PathBuf,
    preset: String,
}

impl Minimap2 {
    /// Finds `minimap2` on `$PATH`, using the `asm20` preset.
    pub fn new() -> Result<Self> {
        Ok(Self::with_executable(find_executable("minimap2")?))
    }

    pub fn with_executable(executable: PathBuf) -> Self {
        Self {
            executable,
            preset: "asm20".to_string(),
        }
    }

    pub fn preset(mut self, preset: &str) -> Self {
        self.preset = preset.to_string();
        self
    }
}

impl Aligner for Minimap2 {
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
        let target_path = scope.write_fasta("targets.fa", targets)?;

        let mut cmd = Command::new(&self.executable);
        cmd.args(["-x", &self.preset, "-c", "--secondary=no"]);
        if config.culling_limit > 0 {
            cmd.arg("-N").arg(config.culling_limit.saturating_sub(1).to_string());
        }
        if config.threads > 0 {
            cmd.arg("-t").arg(config.threads.to_string());
        }
        cmd.arg(&target_path).arg(&query_path);
        tracing::debug!(command = ?cmd, "running minimap2");

        let output = cmd
            .output()
            .map_err(|e| Error::AlignmentEngine(format!("Failed to run minimap2: {}", e)))?;
        if !output.status.success() {
            return Err(Error::AlignmentEngine(format!(
                "minimap2 failed (exit code: {:?}): {}",
                output.status.code(),
                String::from_utf8_lossy(&output.stderr).trim()
            )));
        }

        let mut records = Vec::new();
        for paf in PafReader::new(output.stdout.as_slice()) {
            let record = paf?.to_alignment()?;
            if record.percent_identity >= config.percent_identity {
                records.push(record);
            }
        }
        tracing::debug!(alignments = records.len(), "minimap2 finished");
        Ok(records)
    }
}
