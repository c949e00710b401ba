//! Run configuration from `templatefmt.toml`.
//!
//! ```toml
//! include = ["app/components/**/*"]
//! extensions = ["hbs", "gjs"]
//! stages = ["pretty-print", "format-text-nodes", "order-class-names",
//!           "void-attributes", "self-close-tags", "right-trim"]
//!
//! [extract]
//! kind = "between"
//! open = "<template>"
//! close = "</template>"
//!
//! [classes]
//! utility_prefixes = ["u-", "is-"]
//! void_attributes = ["alt"]
//!
//! [pretty_print]
//! command = ["prettyhtml", "--stdin"]
//! options = { print-width = 80 }
//!
//! [single_file]
//! utility_prefixes = ["tw-"]
//! ```
//!
//! Every section is optional. The resolved, immutable form handed to the
//! runner is [`TransformConfig`].

use crate::{
    error::ConfigError,
    extract::{Extraction, Matcher, Reinsertion},
    pretty::{ExternalCommand, Passthrough, PrettyPrinter},
    tags,
    transform::{Pipeline, Rules, Stage},
};
use regex::Regex;
use serde::Deserialize;
use std::{fs, io, path::Path};

pub const DEFAULT_CONFIG_NAME: &str = "templatefmt.toml";

/// Root of the config file.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct FileConfig {
    /// Glob patterns used when none are given on the command line
    pub include: Vec<String>,

    /// Glob patterns removed from the discovered files
    pub exclude: Vec<String>,

    /// File extensions to keep (without dot). Empty keeps everything.
    pub extensions: Vec<String>,

    /// Pipeline order. Defaults to every stage, pretty-print first.
    pub stages: Option<Vec<Stage>>,

    pub preserve_final_line_whitespace: bool,

    pub extract: ExtractSection,

    pub classes: ClassesSection,

    pub pretty_print: PrettyPrintSection,

    /// Replaces the ambient settings in `--file` mode
    pub single_file: SingleFileSection,
}

/// `[extract]`: where the fragment lives inside each file.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(tag = "kind", rename_all = "kebab-case")]
pub enum ExtractSection {
    #[default]
    Whole,
    Between {
        open: String,
        close: String,
    },
    Pattern {
        pattern: String,
    },
}

/// `[classes]`
#[derive(Debug, Clone, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ClassesSection {
    pub utility_prefixes: Vec<String>,
    pub void_attributes: Vec<String>,
}

impl Default for ClassesSection {
    fn default() -> Self {
        Self {
            utility_prefixes: Vec::new(),
            void_attributes: tags::DEFAULT_VOID_ATTRIBUTES
                .iter()
                .map(|s| s.to_string())
                .collect(),
        }
    }
}

/// `[pretty_print]`: the external formatter and its opaque options.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct PrettyPrintSection {
    /// Program followed by fixed arguments. Empty disables the call.
    pub command: Vec<String>,
    pub options: toml::Table,
}

/// `[single_file]`: unset fields fall back to the ambient ones, except
/// `extract`, which falls back to the whole file.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct SingleFileSection {
    pub extract: Option<ExtractSection>,
    pub utility_prefixes: Option<Vec<String>>,
    pub void_attributes: Option<Vec<String>>,
}

/// Everything one file's pipeline needs. Shared read-only across workers.
#[derive(Debug, Clone, Default)]
pub struct TransformConfig {
    pub extraction: Extraction,
    pub rules: Rules,
    pub pipeline: Pipeline,
}

impl FileConfig {
    /// Load `path`. A missing file is only an error when it was asked for
    /// explicitly.
    pub fn load(path: &Path, explicit: bool) -> Result<Self, ConfigError> {
        let content = match fs::read_to_string(path) {
            Ok(content) => content,
            Err(e) if e.kind() == io::ErrorKind::NotFound && !explicit => {
                log::debug!("no {} found, using defaults", path.display());
                return Ok(Self::default());
            }
            Err(e) => return Err(ConfigError::Io(path.to_path_buf(), e)),
        };
        Self::parse(&content)
    }

    pub fn parse(content: &str) -> Result<Self, ConfigError> {
        let config: Self = toml::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    fn validate(&self) -> Result<(), ConfigError> {
        if self.stages.as_ref().is_some_and(Vec::is_empty) {
            return Err(ConfigError::Validation("`stages` must not be empty".into()));
        }
        if self.pretty_print.command.iter().any(|arg| arg.is_empty()) {
            return Err(ConfigError::Validation(
                "`pretty_print.command` contains an empty argument".into(),
            ));
        }
        if self.pretty_print.command.is_empty() && !self.pretty_print.options.is_empty() {
            return Err(ConfigError::Validation(
                "`pretty_print.options` given without `pretty_print.command`".into(),
            ));
        }

        let single = &self.single_file;
        let extracts = [Some(&self.extract), single.extract.as_ref()];
        for extract in extracts.into_iter().flatten() {
            extract.validate()?;
        }

        let prefixes = [Some(&self.classes.utility_prefixes), single.utility_prefixes.as_ref()];
        if prefixes.into_iter().flatten().flatten().any(String::is_empty) {
            return Err(ConfigError::Validation(
                "utility class prefixes must not be empty".into(),
            ));
        }
        let attributes = [Some(&self.classes.void_attributes), single.void_attributes.as_ref()];
        if attributes
            .into_iter()
            .flatten()
            .flatten()
            .any(|name| name.is_empty() || name.contains(char::is_whitespace))
        {
            return Err(ConfigError::Validation(
                "void attribute names must be single non-empty tokens".into(),
            ));
        }
        Ok(())
    }

    /// Settings for batch runs.
    pub fn transform(&self) -> Result<TransformConfig, ConfigError> {
        Ok(TransformConfig {
            extraction: self.extract.resolve()?,
            rules: Rules {
                utility_prefixes: self.classes.utility_prefixes.clone(),
                void_attributes: self.classes.void_attributes.clone(),
                preserve_final_line_whitespace: self.preserve_final_line_whitespace,
            },
            pipeline: self.pipeline(),
        })
    }

    /// Settings for `--file` runs, with `[single_file]` layered on top.
    pub fn single_file_transform(&self) -> Result<TransformConfig, ConfigError> {
        let single = &self.single_file;
        let extraction = match &single.extract {
            Some(extract) => extract.resolve()?,
            None => Extraction::default(),
        };
        Ok(TransformConfig {
            extraction,
            rules: Rules {
                utility_prefixes: single
                    .utility_prefixes
                    .clone()
                    .unwrap_or_else(|| self.classes.utility_prefixes.clone()),
                void_attributes: single
                    .void_attributes
                    .clone()
                    .unwrap_or_else(|| self.classes.void_attributes.clone()),
                preserve_final_line_whitespace: self.preserve_final_line_whitespace,
            },
            pipeline: self.pipeline(),
        })
    }

    /// The pretty-printer, resolved on `PATH` once for the whole run.
    pub fn printer(&self) -> Result<Box<dyn PrettyPrinter>, ConfigError> {
        if self.pretty_print.command.is_empty() {
            log::debug!("no pretty-print command configured, stage is a no-op");
            return Ok(Box::new(Passthrough));
        }
        let command =
            ExternalCommand::resolve(&self.pretty_print.command, &self.pretty_print.options)?;
        Ok(Box::new(command))
    }

    fn pipeline(&self) -> Pipeline {
        self.stages
            .clone()
            .map(Pipeline::new)
            .unwrap_or_default()
    }
}

impl ExtractSection {
    fn validate(&self) -> Result<(), ConfigError> {
        match self {
            ExtractSection::Between { open, close } if open.is_empty() || close.is_empty() => {
                Err(ConfigError::Validation(
                    "`extract.open` and `extract.close` must not be empty".into(),
                ))
            }
            ExtractSection::Pattern { pattern } => {
                Regex::new(pattern).map(drop).map_err(Into::into)
            }
            _ => Ok(()),
        }
    }

    fn resolve(&self) -> Result<Extraction, ConfigError> {
        let matcher = match self {
            ExtractSection::Whole => Matcher::Whole,
            ExtractSection::Between { open, close } => Matcher::Between {
                open: open.clone(),
                close: close.clone(),
            },
            ExtractSection::Pattern { pattern } => Matcher::Pattern(Regex::new(pattern)?),
        };
        Ok(Extraction::new(matcher, Reinsertion::Splice))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_parse_full_config() {
        let config = FileConfig::parse(
            r#"
            include = ["app/**/*.hbs"]
            extensions = ["hbs"]
            stages = ["order-class-names", "right-trim"]
            preserve_final_line_whitespace = true

            [extract]
            kind = "between"
            open = "<template>"
            close = "</template>"

            [classes]
            utility_prefixes = ["u-"]
            void_attributes = ["alt", "title"]

            [single_file]
            utility_prefixes = ["tw-"]
            "#,
        )
        .unwrap();

        assert_eq!(config.include, ["app/**/*.hbs"]);
        let transform = config.transform().unwrap();
        assert_eq!(
            transform.pipeline.stages(),
            [Stage::OrderClassNames, Stage::RightTrim]
        );
        assert_eq!(transform.rules.utility_prefixes, ["u-"]);
        assert_eq!(transform.rules.void_attributes, ["alt", "title"]);
        assert!(transform.rules.preserve_final_line_whitespace);
        assert!(matches!(
            transform.extraction.matcher(),
            Matcher::Between { .. }
        ));
    }

    #[test]
    fn test_defaults() {
        let config = FileConfig::parse("").unwrap();
        let transform = config.transform().unwrap();
        assert_eq!(transform.pipeline, Pipeline::default());
        assert_eq!(transform.rules, Rules::default());
        assert!(matches!(transform.extraction.matcher(), Matcher::Whole));
    }

    #[test]
    fn test_single_file_overrides() {
        let config = FileConfig::parse(
            r#"
            [extract]
            kind = "pattern"
            pattern = "(?s)<template>(.*)</template>"

            [classes]
            utility_prefixes = ["u-"]
            void_attributes = ["title"]

            [single_file]
            utility_prefixes = ["tw-"]
            "#,
        )
        .unwrap();

        let single = config.single_file_transform().unwrap();
        assert_eq!(single.rules.utility_prefixes, ["tw-"]);
        assert_eq!(single.rules.void_attributes, ["title"]);
        // without its own matcher, single-file mode formats the whole file
        assert!(matches!(single.extraction.matcher(), Matcher::Whole));

        let batch = config.transform().unwrap();
        assert!(matches!(batch.extraction.matcher(), Matcher::Pattern(_)));
    }

    #[test]
    fn test_rejects_invalid() {
        for bad in [
            "stages = []",
            "unknown_key = 1",
            "stages = [\"sort-everything\"]",
            "[extract]\nkind = \"between\"\nopen = \"\"\nclose = \"</template>\"",
            "[extract]\nkind = \"pattern\"\npattern = \"(unclosed\"",
            "[classes]\nutility_prefixes = [\"\"]",
            "[classes]\nvoid_attributes = [\"a b\"]",
            "[pretty_print]\ncommand = [\"\"]",
            "[pretty_print]\noptions = { print-width = 80 }",
            "[single_file]\nextract = { kind = \"between\", open = \"<t>\", close = \"\" }",
        ] {
            assert!(FileConfig::parse(bad).is_err(), "accepted: {bad}");
        }
    }

    #[test]
    fn test_load_missing() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join(DEFAULT_CONFIG_NAME);

        assert!(FileConfig::load(&path, false).is_ok());
        assert!(matches!(
            FileConfig::load(&path, true),
            Err(ConfigError::Io(..))
        ));

        fs::write(&path, "extensions = [\"gjs\"]\n").unwrap();
        assert_eq!(FileConfig::load(&path, true).unwrap().extensions, ["gjs"]);
    }

    #[test]
    fn test_printer_without_command_is_passthrough() {
        let printer = FileConfig::default().printer().unwrap();
        assert_eq!(printer.pretty_print("<p>  </p>").unwrap().contents, "<p>  </p>");
    }
}
