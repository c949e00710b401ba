//! Per-file processing and the parallel batch fan-out.

use crate::{config::TransformConfig, document::Document, error::FileError, pretty::PrettyPrinter};
use rayon::prelude::*;
use std::{
    fs,
    path::{Path, PathBuf},
};

/// What happened to a file that was processed without error.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    Rewritten,
    Unchanged,
    /// `--check` run and the file is not formatted.
    WouldChange,
}

/// How a run treats its results.
#[derive(Debug, Clone, Copy, Default)]
pub struct Mode {
    /// Report instead of writing.
    pub check: bool,
}

/// Totals for a batch run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Summary {
    pub rewritten: usize,
    pub unchanged: usize,
    pub would_change: usize,
    pub skipped: usize,
    pub failed: usize,
}

impl Summary {
    fn record(&mut self, result: &Result<Outcome, FileError>) {
        match result {
            Ok(Outcome::Rewritten) => self.rewritten += 1,
            Ok(Outcome::Unchanged) => self.unchanged += 1,
            Ok(Outcome::WouldChange) => self.would_change += 1,
            Err(e) if e.is_recoverable() => self.skipped += 1,
            Err(_) => self.failed += 1,
        }
    }
}

/// Extract, clean and write back one file.
///
/// The result goes to `output` when given, otherwise over the input file.
pub fn process_file(
    path: &Path,
    output: Option<&Path>,
    config: &TransformConfig,
    printer: &dyn PrettyPrinter,
    mode: Mode,
) -> Result<Outcome, FileError> {
    let mut doc = Document::open(path, &config.extraction)?;
    log::debug!(
        "{}: {} byte fragment",
        doc.path().display(),
        doc.working().len()
    );
    doc.clean(&config.pipeline, &config.rules, printer)?;
    let rendered = doc.render(&config.extraction)?;

    let target = output.unwrap_or(doc.path());
    let changed = doc.is_changed(&rendered) || output.is_some();
    if !changed {
        return Ok(Outcome::Unchanged);
    }
    if mode.check {
        return Ok(Outcome::WouldChange);
    }
    fs::write(target, rendered).map_err(|e| FileError::Write(target.to_path_buf(), e))?;
    Ok(Outcome::Rewritten)
}

/// Process every file in parallel. One file's failure never stops another.
pub fn run_batch(
    paths: &[PathBuf],
    config: &TransformConfig,
    printer: &dyn PrettyPrinter,
    mode: Mode,
) -> Summary {
    let results: Vec<_> = paths
        .par_iter()
        .map(|path| {
            let result = process_file(path, None, config, printer, mode);
            report(path, &result);
            result
        })
        .collect();

    let mut summary = Summary::default();
    for result in &results {
        summary.record(result);
    }
    log::info!(
        "{} rewritten, {} unchanged, {} would change, {} skipped, {} failed",
        summary.rewritten,
        summary.unchanged,
        summary.would_change,
        summary.skipped,
        summary.failed
    );
    summary
}

/// Log one file's result.
pub fn report(path: &Path, result: &Result<Outcome, FileError>) {
    match result {
        Ok(Outcome::Rewritten) => log::info!("formatted {}", path.display()),
        Ok(Outcome::Unchanged) => log::debug!("unchanged {}", path.display()),
        Ok(Outcome::WouldChange) => log::warn!("would reformat {}", path.display()),
        Err(e) if e.is_recoverable() => log::warn!("{e}, skipped"),
        Err(e) => log::error!("{}", describe(e)),
    }
}

/// The error and its causes on one line, as anyhow's `{:#}` renders them.
fn describe(e: &FileError) -> String {
    anyhow::Chain::new(e)
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join(": ")
}
