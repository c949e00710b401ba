//! Per-file unit of work.

use crate::{
    error::FileError,
    extract::Extraction,
    pretty::PrettyPrinter,
    transform::{Pipeline, Rules},
};
use std::{
    fs,
    path::{Path, PathBuf},
};

/// One file being formatted.
///
/// `original` is read once and never changes; `working` starts as the
/// extracted fragment and is replaced by each pipeline run.
#[derive(Debug)]
pub struct Document {
    path: PathBuf,
    original: String,
    working: String,
}

impl Document {
    /// Read `path` and pull its fragment out.
    ///
    /// An empty fragment counts as a miss: there is nothing to format.
    pub fn open(path: &Path, extraction: &Extraction) -> Result<Self, FileError> {
        let path = fs::canonicalize(path).map_err(|e| FileError::Read(path.to_path_buf(), e))?;
        let original = fs::read_to_string(&path).map_err(|e| FileError::Read(path.clone(), e))?;
        Self::from_text(path, original, extraction)
    }

    pub fn from_text(
        path: PathBuf,
        original: String,
        extraction: &Extraction,
    ) -> Result<Self, FileError> {
        let working = match extraction.extract(&original) {
            Some(fragment) if !fragment.trim().is_empty() => fragment.to_owned(),
            _ => return Err(FileError::ExtractionMiss(path)),
        };
        Ok(Self {
            path,
            original,
            working,
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn original(&self) -> &str {
        &self.original
    }

    pub fn working(&self) -> &str {
        &self.working
    }

    /// Run the pipeline over the working fragment.
    pub fn clean(
        &mut self,
        pipeline: &Pipeline,
        rules: &Rules,
        printer: &dyn PrettyPrinter,
    ) -> Result<(), FileError> {
        self.working = pipeline
            .run(&self.working, rules, printer)
            .map_err(|e| FileError::PrettyPrint(self.path.clone(), e))?;
        Ok(())
    }

    /// Full file text with the working fragment spliced back in.
    pub fn render(&self, extraction: &Extraction) -> Result<String, FileError> {
        extraction
            .reinsert(self.original(), self.working())
            .ok_or_else(|| FileError::ExtractionMiss(self.path.clone()))
    }

    pub fn is_changed(&self, rendered: &str) -> bool {
        rendered != self.original()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{extract::Matcher, pretty::Passthrough, transform::Stage};
    use tempfile::TempDir;

    fn template_extraction() -> Extraction {
        Extraction::new(
            Matcher::Between {
                open: "<template>".to_owned(),
                close: "</template>".to_owned(),
            },
            Default::default(),
        )
    }

    #[test]
    fn test_open_reads_fragment() {
        let temp = TempDir::new().unwrap();
        let file = temp.path().join("card.gjs");
        fs::write(&file, "const x = 1;\n<template>\n  <b class=\"z a\">  \n</template>\n").unwrap();

        let doc = Document::open(&file, &template_extraction()).unwrap();
        assert!(doc.path().is_absolute());
        assert_eq!(doc.working(), "\n  <b class=\"z a\">  \n");
        assert!(doc.original().starts_with("const x = 1;"));
    }

    #[test]
    fn test_open_missing_file() {
        let temp = TempDir::new().unwrap();
        let missing = temp.path().join("nope.hbs");
        let err = Document::open(&missing, &Extraction::default()).unwrap_err();
        assert!(matches!(err, FileError::Read(..)));
    }

    #[test]
    fn test_empty_fragment_is_a_miss() {
        let err = Document::from_text(
            PathBuf::from("/x.gjs"),
            "<template>\n  \n</template>".to_owned(),
            &template_extraction(),
        )
        .unwrap_err();
        assert!(err.is_recoverable());

        let empty = Extraction::default();
        let err = Document::from_text(PathBuf::from("/y.hbs"), String::new(), &empty).unwrap_err();
        assert!(matches!(err, FileError::ExtractionMiss(_)));
    }

    #[test]
    fn test_clean_and_render() {
        let extraction = template_extraction();
        let mut doc = Document::from_text(
            PathBuf::from("/card.gjs"),
            "head\n<template>\n  <b class=\"z a\">  \n</template>\ntail\n".to_owned(),
            &extraction,
        )
        .unwrap();

        let pipeline = Pipeline::new(vec![Stage::OrderClassNames, Stage::RightTrim]);
        doc.clean(&pipeline, &Rules::default(), &Passthrough).unwrap();

        let rendered = doc.render(&extraction).unwrap();
        assert_eq!(rendered, "head\n<template>\n  <b class=\"a z\">\n</template>\ntail\n");
        assert!(doc.is_changed(&rendered));
    }

    #[test]
    fn test_render_untouched_is_original() {
        let extraction = template_extraction();
        let doc = Document::from_text(
            PathBuf::from("/card.gjs"),
            "<template><p>x</p></template>".to_owned(),
            &extraction,
        )
        .unwrap();
        let rendered = doc.render(&extraction).unwrap();
        assert!(!doc.is_changed(&rendered));
    }
}
