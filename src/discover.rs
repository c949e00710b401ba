//! Glob-based file discovery for batch runs.

use crate::error::DiscoverError;
use glob::Pattern;
use std::path::{Path, PathBuf};

/// Which files a batch run should touch.
#[derive(Debug, Clone, Default)]
pub struct Selection {
    pub patterns: Vec<String>,
    pub exclude: Vec<String>,
    pub extensions: Vec<String>,
}

impl Selection {
    /// Expand the patterns into a sorted, de-duplicated file list.
    ///
    /// A pattern naming a directory selects everything below it.
    pub fn discover(&self) -> Result<Vec<PathBuf>, DiscoverError> {
        if self.patterns.is_empty() {
            return Err(DiscoverError::NoPatterns);
        }
        let exclude = self
            .exclude
            .iter()
            .map(|p| Pattern::new(p).map_err(|e| DiscoverError::Pattern(p.clone(), e)))
            .collect::<Result<Vec<_>, _>>()?;

        let mut files = Vec::new();
        for pattern in &self.patterns {
            let pattern = if Path::new(pattern).is_dir() {
                format!("{}/**/*", Pattern::escape(pattern.trim_end_matches('/')))
            } else {
                pattern.clone()
            };
            let paths =
                glob::glob(&pattern).map_err(|e| DiscoverError::Pattern(pattern.clone(), e))?;
            for entry in paths {
                match entry {
                    Ok(path) if path.is_file() => files.push(path),
                    Ok(_) => {}
                    Err(e) => log::warn!("skipping unreadable path: {e}"),
                }
            }
        }

        files.retain(|path| {
            self.has_extension(path) && !exclude.iter().any(|p| p.matches_path(path))
        });
        files.sort();
        files.dedup();

        if files.is_empty() {
            return Err(DiscoverError::NoFiles(self.patterns.clone()));
        }
        log::debug!("discovered {} files", files.len());
        Ok(files)
    }

    fn has_extension(&self, path: &Path) -> bool {
        if self.extensions.is_empty() {
            return true;
        }
        let Some(ext) = path.extension().and_then(|e| e.to_str()) else {
            return false;
        };
        self.extensions
            .iter()
            .any(|wanted| wanted.trim_start_matches('.').eq_ignore_ascii_case(ext))
    }
}
