//! Normalizes the HTML template embedded in component files.
//!
//! The crate is organized leaf-first:
//!
//! | Module      | Purpose                                                    |
//! |-------------|------------------------------------------------------------|
//! | `tags`      | void element and void attribute tables                     |
//! | `transform` | the line rewrites and the [`transform::Pipeline`]          |
//! | `pretty`    | adapter for the external HTML pretty-printer               |
//! | `extract`   | fragment extraction and reinsertion                        |
//! | `document`  | per-file state: path, original text, working fragment      |
//! | `config`    | `templatefmt.toml` and the resolved [`config::TransformConfig`] |
//! | `discover`  | glob-based file selection                                  |
//! | `runner`    | per-file processing and the parallel batch                 |
//!
//! Programmatic callers can skip the config file and build a
//! [`config::TransformConfig`] directly, for example with an
//! [`extract::Matcher::Function`] for templates the built-in matchers cannot
//! locate.

pub mod config;
pub mod discover;
pub mod document;
pub mod error;
pub mod extract;
pub mod pretty;
pub mod runner;
pub mod tags;
pub mod transform;
