//! Adapter for the external generic HTML pretty-printer.
//!
//! The pretty-printer does the bulk of the work (indentation, one node per
//! line). Everything in `transform` assumes its output shape. It is treated
//! as a deterministic black box: the fragment goes in on stdin, the
//! formatted text comes back on stdout.

use crate::error::PrettyPrintError;
use std::{
    ffi::OsString,
    io::{Read, Write},
    path::PathBuf,
    process::{Command, Stdio},
    thread,
};

/// Result of one pretty-printer call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Printed {
    pub contents: String,
}

pub trait PrettyPrinter: Send + Sync {
    fn pretty_print(&self, text: &str) -> Result<Printed, PrettyPrintError>;
}

/// Leaves the text as is. Used when no command is configured.
#[derive(Debug, Default, Clone, Copy)]
pub struct Passthrough;

impl PrettyPrinter for Passthrough {
    fn pretty_print(&self, text: &str) -> Result<Printed, PrettyPrintError> {
        Ok(Printed {
            contents: text.to_owned(),
        })
    }
}

/// Runs an external formatter program.
#[derive(Debug, Clone)]
pub struct ExternalCommand {
    name: String,
    program: PathBuf,
    args: Vec<OsString>,
}

impl ExternalCommand {
    /// Resolve `command` (program + fixed args) on `PATH` and append the
    /// option table as `--key=value` flags.
    pub fn resolve(command: &[String], options: &toml::Table) -> Result<Self, PrettyPrintError> {
        let (name, fixed) = command
            .split_first()
            .map(|(name, rest)| (name.clone(), rest))
            .unwrap_or_default();
        let program = which::which(&name).map_err(|e| PrettyPrintError::NotFound(name.clone(), e))?;

        let mut args: Vec<OsString> = fixed.iter().map(OsString::from).collect();
        args.extend(option_args(options).into_iter().map(OsString::from));

        Ok(Self {
            name,
            program,
            args,
        })
    }
}

impl PrettyPrinter for ExternalCommand {
    fn pretty_print(&self, text: &str) -> Result<Printed, PrettyPrintError> {
        let spawn_err = |e: std::io::Error| PrettyPrintError::Spawn(self.name.clone(), e);

        let mut child = Command::new(&self.program)
            .args(&self.args)
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .spawn()
            .map_err(spawn_err)?;

        // stdin is fed and stderr drained from their own threads while stdout
        // drains here. Any pipe left unread can fill up and stall the child.
        let mut stdin = child.stdin.take();
        let mut stdout = child.stdout.take();
        let mut stderr = child.stderr.take();
        let (written, read, diagnostics) = thread::scope(|scope| {
            let writer = scope.spawn(move || match stdin.as_mut() {
                Some(pipe) => pipe.write_all(text.as_bytes()),
                None => Ok(()),
            });
            let errors = scope.spawn(move || {
                let mut buf = Vec::new();
                if let Some(pipe) = stderr.as_mut() {
                    // Best effort: stderr only feeds the failure message.
                    let _ = pipe.read_to_end(&mut buf);
                }
                buf
            });
            let mut out = Vec::with_capacity(text.len() + text.len() / 4);
            let read = match stdout.as_mut() {
                Some(pipe) => pipe.read_to_end(&mut out).map(|_| out),
                None => Ok(out),
            };
            let written = writer
                .join()
                .unwrap_or_else(|_| Err(std::io::Error::other("stdin writer panicked")));
            let diagnostics = errors.join().unwrap_or_default();
            (written, read, diagnostics)
        });

        let status = child.wait().map_err(spawn_err)?;
        if !status.success() {
            return Err(PrettyPrintError::Failed {
                program: self.name.clone(),
                status,
                stderr: String::from_utf8_lossy(&diagnostics).trim().to_owned(),
            });
        }
        if !diagnostics.is_empty() {
            log::debug!("{}: {} bytes on stderr", self.name, diagnostics.len());
        }
        written.map_err(spawn_err)?;
        let bytes = read.map_err(spawn_err)?;

        let contents =
            String::from_utf8(bytes).map_err(|e| PrettyPrintError::Utf8(self.name.clone(), e))?;
        Ok(Printed { contents })
    }
}

/// Forward the opaque option table verbatim as command line flags.
///
/// `true` becomes a bare `--key`, arrays repeat the flag once per item.
fn option_args(options: &toml::Table) -> Vec<String> {
    let mut args = Vec::with_capacity(options.len());
    for (key, value) in options {
        match value {
            toml::Value::Boolean(true) => args.push(format!("--{key}")),
            toml::Value::Array(items) => {
                args.extend(items.iter().map(|item| format!("--{key}={}", scalar(item))));
            }
            other => args.push(format!("--{key}={}", scalar(other))),
        }
    }
    args
}

fn scalar(value: &toml::Value) -> String {
    match value {
        toml::Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_passthrough_is_identity() {
        let printed = Passthrough.pretty_print("<div>\n  x\n</div>\n").unwrap();
        assert_eq!(printed.contents, "<div>\n  x\n</div>\n");
    }

    #[test]
    fn test_option_args() {
        let options: toml::Table = toml::from_str(
            r#"
            print-width = 80
            sort-attributes = true
            wrap-attributes = false
            parser = "html"
            ignore = ["a", "b"]
            "#,
        )
        .unwrap();

        let mut args = option_args(&options);
        args.sort();
        assert_eq!(
            args,
            [
                "--ignore=a",
                "--ignore=b",
                "--parser=html",
                "--print-width=80",
                "--sort-attributes",
                "--wrap-attributes=false",
            ]
        );
    }

    #[test]
    fn test_missing_program() {
        let err = ExternalCommand::resolve(
            &["templatefmt-no-such-formatter".to_owned()],
            &toml::Table::new(),
        )
        .unwrap_err();
        assert!(matches!(err, PrettyPrintError::NotFound(..)));
    }

    #[cfg(unix)]
    #[test]
    fn test_external_command_round_trip() {
        let cat = ExternalCommand::resolve(&["cat".to_owned()], &toml::Table::new()).unwrap();
        let printed = cat.pretty_print("<p>\n  hi\n</p>").unwrap();
        assert_eq!(printed.contents, "<p>\n  hi\n</p>");
    }

    #[cfg(unix)]
    #[test]
    fn test_external_command_failure() {
        let fail = ExternalCommand::resolve(&["false".to_owned()], &toml::Table::new()).unwrap();
        let err = fail.pretty_print("<p></p>").unwrap_err();
        assert!(matches!(err, PrettyPrintError::Failed { .. }));
    }

    #[cfg(unix)]
    #[test]
    fn test_external_command_noisy_stderr() {
        // More than a pipe buffer of stderr before stdout is closed.
        let noisy = ExternalCommand::resolve(
            &[
                "sh".to_owned(),
                "-c".to_owned(),
                "head -c 300000 /dev/zero >&2; cat".to_owned(),
            ],
            &toml::Table::new(),
        )
        .unwrap();
        let printed = noisy.pretty_print("<p>\n  hi\n</p>\n").unwrap();
        assert_eq!(printed.contents, "<p>\n  hi\n</p>\n");
    }

    #[cfg(unix)]
    #[test]
    fn test_external_command_failure_keeps_stderr() {
        let fail = ExternalCommand::resolve(
            &["sh".to_owned(), "-c".to_owned(), "echo bad markup >&2; exit 3".to_owned()],
            &toml::Table::new(),
        )
        .unwrap();
        match fail.pretty_print("<p></p>").unwrap_err() {
            PrettyPrintError::Failed { stderr, .. } => assert_eq!(stderr, "bad markup"),
            other => panic!("unexpected error: {other}"),
        }
    }
}
