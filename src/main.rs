//! templatefmt: normalizes the HTML template embedded in component files.
//!
//! - Pulls the template fragment out of each file (whole file, between two
//!   literal markers, or a regex match) and splices the result back in place,
//!   leaving the rest of the file byte-for-byte intact.
//! - Runs the fragment through an external pretty-printer, then through the
//!   line rewrites in `transform` (text nodes, class order, void attributes,
//!   self-closing void elements, trailing whitespace).
//! - Files of a batch are processed in parallel; one file failing never stops
//!   the others.
//!
//! ```text
//! templatefmt [PATTERNS]...   : format every file the globs select
//! templatefmt --file PATH     : format one file with the [single_file] settings
//! --check                     : report files that would change, write nothing
//! ```
//!
//! Settings come from `templatefmt.toml` (see `templatefmt::config`).

use anyhow::{Context, Result};
use clap::{ArgAction, Parser};
use std::path::PathBuf;
use std::process::ExitCode;
use templatefmt::config::{FileConfig, TransformConfig, DEFAULT_CONFIG_NAME};
use templatefmt::discover::Selection;
use templatefmt::runner::{self, Mode, Outcome};

/// CLI flags
#[derive(Parser)]
#[command(author, version, about)]
struct Cli {
    /// Files, directories or glob patterns to format (default: `include` from the config)
    patterns: Vec<String>,

    /// Format exactly this file, using the `[single_file]` settings
    #[arg(long, conflicts_with = "patterns", value_hint = clap::ValueHint::FilePath)]
    file: Option<PathBuf>,

    /// Output file for --file (default: overwrite input)
    #[arg(short, long, requires = "file", value_hint = clap::ValueHint::FilePath)]
    output: Option<PathBuf>,

    /// Config file path (default: templatefmt.toml, optional)
    #[arg(short = 'C', long, value_hint = clap::ValueHint::FilePath)]
    config: Option<PathBuf>,

    /// Glob patterns to leave out, on top of the config's `exclude`
    #[arg(long, value_name = "PATTERN")]
    exclude: Vec<String>,

    /// Report files that would change without writing them
    #[arg(long, action = ArgAction::SetTrue)]
    check: bool,

    /// Keep trailing whitespace on the fragment's last line
    #[arg(long = "preserve-final-whitespace", action = ArgAction::SetTrue)]
    preserve_final_whitespace: bool,

    /// Log debug output
    #[arg(short, long, action = ArgAction::SetTrue)]
    verbose: bool,
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    let level = if cli.verbose { "debug" } else { "info" };
    env_logger::Builder::from_env(env_logger::Env::default().filter_or("RUST_LOG", level))
        .format_timestamp(None)
        .init();

    match run(&cli) {
        Ok(code) => code,
        Err(e) => {
            log::error!("{e:#}");
            ExitCode::FAILURE
        }
    }
}

fn run(cli: &Cli) -> Result<ExitCode> {
    let config_path = cli
        .config
        .clone()
        .unwrap_or_else(|| PathBuf::from(DEFAULT_CONFIG_NAME));
    let config = FileConfig::load(&config_path, cli.config.is_some())
        .with_context(|| format!("cannot load {}", config_path.display()))?;
    let printer = config.printer().context("cannot set up the pretty-printer")?;
    let mode = Mode { check: cli.check };

    if let Some(file) = &cli.file {
        let transform = with_cli_overrides(config.single_file_transform()?, cli);
        let result = runner::process_file(
            file,
            cli.output.as_deref(),
            &transform,
            printer.as_ref(),
            mode,
        );
        return match result {
            Err(e) if !e.is_recoverable() => Err(e.into()),
            result => {
                runner::report(file, &result);
                let would_change = matches!(result, Ok(Outcome::WouldChange));
                Ok(if would_change { ExitCode::FAILURE } else { ExitCode::SUCCESS })
            }
        };
    }

    let transform = with_cli_overrides(config.transform()?, cli);
    log::debug!(
        "extraction {:?}, stages {:?}",
        transform.extraction.matcher(),
        transform.pipeline.stages()
    );
    let selection = Selection {
        patterns: if cli.patterns.is_empty() {
            config.include.clone()
        } else {
            cli.patterns.clone()
        },
        exclude: config.exclude.iter().chain(&cli.exclude).cloned().collect(),
        extensions: config.extensions.clone(),
    };
    let files = selection.discover()?;

    let summary = runner::run_batch(&files, &transform, printer.as_ref(), mode);
    if cli.check && summary.would_change > 0 {
        return Ok(ExitCode::FAILURE);
    }
    Ok(ExitCode::SUCCESS)
}

fn with_cli_overrides(mut transform: TransformConfig, cli: &Cli) -> TransformConfig {
    if cli.preserve_final_whitespace {
        transform.rules.preserve_final_line_whitespace = true;
    }
    transform
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_definition() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_output_requires_file() {
        assert!(Cli::try_parse_from(["templatefmt", "-o", "out.hbs", "a.hbs"]).is_err());
        assert!(Cli::try_parse_from(["templatefmt", "--file", "a.hbs", "b.hbs"]).is_err());

        let cli = Cli::try_parse_from([
            "templatefmt",
            "--file",
            "a.hbs",
            "-o",
            "out.hbs",
            "--preserve-final-whitespace",
        ])
        .unwrap();
        assert_eq!(cli.output, Some(PathBuf::from("out.hbs")));
        let transform = with_cli_overrides(TransformConfig::default(), &cli);
        assert!(transform.rules.preserve_final_line_whitespace);
    }
}
