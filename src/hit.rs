//! Evaluated alignments of a query against one gene.

use crate::alignment::{AlignMap, AlignmentRecord};
use crate::database::Database;
use crate::error::{Error, Result};
use crate::gene::Gene;
use std::fmt;

/// Default minimap width, matching the ABRICATE `COVERAGE_MAP` column.
pub const MINIMAP_WIDTH: i64 = 15;

/// A gene matched by a query alignment.
///
/// Borrows the gene and its database; valid as long as the database is.
#[derive(Clone)]
pub struct Hit<'db> {
    pub gene: &'db Gene,
    pub database: &'db Database,
    pub alignment: AlignmentRecord,
    pub alimap: AlignMap,
}

impl<'db> Hit<'db> {
    pub fn new(gene: &'db Gene, database: &'db Database, alignment: AlignmentRecord) -> Self {
        let alimap = AlignMap::new(&alignment.segments);
        Self {
            gene,
            database,
            alignment,
            alimap,
        }
    }

    /// Percentage of the gene spanned by non-gap alignment columns.
    ///
    /// Not clamped: gap accounting can push this past 100.
    pub fn percent_coverage(&self) -> f64 {
        let reflen = self.gene.length() as f64;
        let aligned = self.alignment.alignment_length as f64 - self.alignment.total_gap_count as f64;
        100.0 * aligned / reflen
    }

    pub fn percent_identity(&self) -> f64 {
        self.alignment.percent_identity
    }

    /// Renders where on the gene the alignment falls, `width` characters
    /// wide. `=` marks covered positions and `.` uncovered ones. Gapped
    /// alignments give up one span character for a `/` marker placed after
    /// the middle position.
    ///
    /// # Errors
    /// `Error::Configuration` when `width` leaves no room for the strip.
    pub fn minimap(&self, width: i64) -> Result<String> {
        let gaps = self.alignment.has_gaps();
        if width <= 0 {
            return Err(Error::Configuration(format!(
                "minimap width must be positive, got {}",
                width
            )));
        }
        let width = width - i64::from(gaps);
        if width == 0 {
            return Err(Error::Configuration(
                "minimap width too small to fit the gap marker".to_string(),
            ));
        }

        let target = self.alignment.target();
        let scale = self.gene.length() as f64 / width as f64;
        let start = floor_div(target.start as f64, scale);
        let stop = floor_div(target.stop as f64, scale);

        let mut chars = String::with_capacity(width as usize + 1);
        for i in 0..width {
            let pos = i as f64;
            chars.push(if start <= pos && pos <= stop { '=' } else { '.' });
            if gaps && i == width / 2 {
                chars.push('/');
            }
        }
        Ok(chars)
    }

    /// [`Hit::minimap`] at the default width.
    pub fn minimap_default(&self) -> String {
        // MINIMAP_WIDTH leaves room for the gap marker
        self.minimap(MINIMAP_WIDTH).unwrap_or_default()
    }
}

/// Floor of `x / y` taken from the exact remainder, so a quotient that
/// rounds up to an integer still lands in the lower cell.
fn floor_div(x: f64, y: f64) -> f64 {
    let rem = x % y;
    let div = (x - rem) / y;
    let floor = div.floor();
    if div - floor > 0.5 {
        floor + 1.0
    } else {
        floor
    }
}

impl fmt::Debug for Hit<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Hit")
            .field("gene", &self.gene.name)
            .field("database", &self.database.name())
            .field("alignment", &self.alignment)
            .finish()
    }
}
