//! Line-level rewrites over pretty-printed HTML.
//!
//! Every stage takes the whole fragment and returns a new one. None of them
//! parse HTML: they rely on the pretty-printer having put one node boundary
//! per line and work line by line with anchored patterns.
//!
//! - format_text_nodes : `  >text</x>` → `  >` / `    text` / `  </x>`
//! - order_class_names : component classes first, then utility classes, each alphabetized.
//!                       Values containing `{` (template interpolation) are never touched.
//! - void_attributes   : bare `alt` → `alt=""`
//! - self_close_tags   : the bare `>` closing a multi-line void element becomes `/>`
//! - right_trim        : drop trailing whitespace per line
//!
//! Stages must be idempotent. `self_close_tags` needs `format_text_nodes` to
//! have run first because it only recognizes a `>` that sits on its own line.

use crate::{error::PrettyPrintError, pretty::PrettyPrinter, tags};
use memchr::{memchr, memmem};
use regex::Regex;
use serde::Deserialize;
use std::{borrow::Cow, sync::LazyLock};

/// First `class="…"` attribute on a line, preceded by whitespace.
static CLASS_ATTR: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r#"^(.*?\sclass=")([^"]*)"(.*)$"#).unwrap());

/// Collapsed text node: indentation, `>`, text not starting with `<`, closing tag.
static TEXT_NODE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(\s{2,})>([^<].*)(</.*)").unwrap());

/* ================================ Stages ================================= */

/// One step of the cleanup routine.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Stage {
    PrettyPrint,
    FormatTextNodes,
    OrderClassNames,
    VoidAttributes,
    SelfCloseTags,
    RightTrim,
}

/// Settings the line rewrites read. Immutable for the whole run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Rules {
    pub utility_prefixes: Vec<String>,
    pub void_attributes: Vec<String>,
    pub preserve_final_line_whitespace: bool,
}

impl Default for Rules {
    fn default() -> Self {
        Self {
            utility_prefixes: Vec::new(),
            void_attributes: tags::DEFAULT_VOID_ATTRIBUTES
                .iter()
                .map(|s| s.to_string())
                .collect(),
            preserve_final_line_whitespace: false,
        }
    }
}

impl Stage {
    pub fn apply(
        self,
        text: &str,
        rules: &Rules,
        printer: &dyn PrettyPrinter,
    ) -> Result<String, PrettyPrintError> {
        Ok(match self {
            Stage::PrettyPrint => printer.pretty_print(text)?.contents,
            Stage::FormatTextNodes => format_text_nodes(text),
            Stage::OrderClassNames => order_class_names(text, &rules.utility_prefixes),
            Stage::VoidAttributes => void_attributes(text, &rules.void_attributes),
            Stage::SelfCloseTags => self_close_tags(text),
            Stage::RightTrim => right_trim(text, rules.preserve_final_line_whitespace),
        })
    }
}

/// Ordered list of stages applied to every fragment.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Pipeline {
    stages: Vec<Stage>,
}

impl Default for Pipeline {
    fn default() -> Self {
        Self::new(vec![
            Stage::PrettyPrint,
            Stage::FormatTextNodes,
            Stage::OrderClassNames,
            Stage::VoidAttributes,
            Stage::SelfCloseTags,
            Stage::RightTrim,
        ])
    }
}

impl Pipeline {
    pub fn new(stages: Vec<Stage>) -> Self {
        Self { stages }
    }

    pub fn stages(&self) -> &[Stage] {
        &self.stages
    }

    pub fn run(
        &self,
        text: &str,
        rules: &Rules,
        printer: &dyn PrettyPrinter,
    ) -> Result<String, PrettyPrintError> {
        let mut current = text.to_owned();
        for stage in &self.stages {
            current = stage.apply(&current, rules, printer)?;
        }
        Ok(current)
    }
}

/* ============================ Line primitives ============================ */

fn map_lines<'a>(text: &'a str, mut f: impl FnMut(&'a str) -> Cow<'a, str>) -> String {
    let mut out = String::with_capacity(text.len() + text.len() / 16);
    for (i, line) in text.split('\n').enumerate() {
        if i > 0 {
            out.push('\n');
        }
        out.push_str(&f(line));
    }
    out
}

/// Order each line's class list: component classes, then classes starting
/// with one of `utility_prefixes`. Both groups sorted, ties keep input order.
pub fn order_class_names(text: &str, utility_prefixes: &[String]) -> String {
    map_lines(text, |line| {
        let Some(caps) = CLASS_ATTR.captures(line) else {
            return Cow::Borrowed(line);
        };
        let value = &caps[2];
        if memchr(b'{', value.as_bytes()).is_some() {
            return Cow::Borrowed(line);
        }

        let (mut classes, mut utilities): (Vec<&str>, Vec<&str>) = value
            .split_whitespace()
            .partition(|class| !is_utility(class, utility_prefixes));
        classes.sort();
        utilities.sort();
        classes.append(&mut utilities);

        Cow::Owned(format!("{}{}\"{}", &caps[1], classes.join(" "), &caps[3]))
    })
}

fn is_utility(class: &str, prefixes: &[String]) -> bool {
    prefixes.iter().any(|prefix| class.starts_with(prefix.as_str()))
}

/// Turn the bare `>` closing a multi-line void element into `/>`.
///
/// ```text
///   <img          <img
///     src="a"  →    src="a"
///   >             />
/// ```
pub fn self_close_tags(text: &str) -> String {
    let mut pending: Option<usize> = None;
    let out = map_lines_numbered(text, |number, line| {
        let trimmed = line.trim();
        if tags::is_open_marker(trimmed) {
            pending = Some(number);
        } else if pending.is_some() && trimmed.ends_with('>') {
            // Any line that closes the tag ends the wait, only a bare `>` is rewritten.
            pending = None;
            if trimmed == ">" {
                if let Some(at) = memchr(b'>', line.as_bytes()) {
                    return Cow::Owned(format!("{}/>{}", &line[..at], &line[at + 1..]));
                }
            }
        }
        Cow::Borrowed(line)
    });

    if let Some(number) = pending {
        log::warn!("void element opened on line {number} is never closed; left as is");
    }
    out
}

fn map_lines_numbered<'a>(
    text: &'a str,
    mut f: impl FnMut(usize, &'a str) -> Cow<'a, str>,
) -> String {
    let mut number = 0;
    map_lines(text, |line| {
        number += 1;
        f(number, line)
    })
}

/// Give bare occurrences of each attribute in `names` an explicit empty value.
pub fn void_attributes(text: &str, names: &[String]) -> String {
    map_lines(text, |line| {
        let mut current = Cow::Borrowed(line);
        for name in names {
            if let Some(filled) = fill_bare_attribute(&current, name) {
                current = Cow::Owned(filled);
            }
        }
        current
    })
}

/// `None` when `line` has no bare `name` attribute.
///
/// Occurrences inside a quoted value never count. A name followed by more
/// attributes only counts on a tag line (`<img alt src=…>`) or when it leads
/// the line, as on the attribute lines of a multi-line tag.
fn fill_bare_attribute(line: &str, name: &str) -> Option<String> {
    if name.is_empty() {
        return None;
    }
    let bytes = line.as_bytes();
    let trimmed = line.trim_start();
    let lead = line.len() - trimmed.len();
    let tag_line = trimmed.starts_with('<');

    let mut out = String::new();
    let mut copied = 0;
    let mut scanned = 0;
    let mut quote = None;

    for start in memmem::find_iter(bytes, name.as_bytes()) {
        for &b in &bytes[scanned..start] {
            quote = match (quote, b) {
                (None, b'"' | b'\'') => Some(b),
                (Some(open), b) if open == b => None,
                (state, _) => state,
            };
        }
        scanned = start;
        if quote.is_some() {
            continue;
        }

        let end = start + name.len();
        let starts_token = start == 0 || bytes[start - 1].is_ascii_whitespace();
        let attribute_position = tag_line || start == lead;
        if !starts_token || !is_bare_suffix(&line[end..], attribute_position) {
            continue;
        }
        out.push_str(&line[copied..end]);
        out.push_str("=\"\"");
        copied = end;
    }

    if copied == 0 {
        return None;
    }
    out.push_str(&line[copied..]);
    Some(out)
}

fn is_bare_suffix(rest: &str, attribute_position: bool) -> bool {
    if rest.is_empty() || rest.starts_with('>') || rest.starts_with("/>") {
        return true;
    }
    let after = rest.trim_start();
    attribute_position && after.len() != rest.len() && !after.starts_with('=')
}

/// Split collapsed `>text</tag>` lines into opening bracket, indented text
/// and closing tag.
pub fn format_text_nodes(text: &str) -> String {
    map_lines(text, |line| TEXT_NODE.replace(line, "${1}>\n${1}  ${2}\n${1}${3}"))
}

/// Strip trailing whitespace from each line, optionally sparing the last one.
pub fn right_trim(text: &str, preserve_final_line: bool) -> String {
    let last = memchr::memrchr(b'\n', text.as_bytes()).map_or(0, |at| at + 1);
    let (body, tail) = if preserve_final_line {
        text.split_at(last)
    } else {
        (text, "")
    };

    let mut out = map_lines(body, |line| Cow::Borrowed(line.trim_end()));
    out.push_str(tail);
    out
}
