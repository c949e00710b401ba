//! Extraction and reinsertion of the template fragment.
//!
//! A component file usually holds more than markup. The extraction rule
//! picks the region to format, and the reinsertion rule puts the formatted
//! text back. Everything outside that region is kept byte for byte, so
//! `reinsert(t, extract(t))` always gives back `t`.

use memchr::memmem;
use regex::Regex;
use std::{fmt, ops::Range, sync::Arc};

/// Picks the byte range of a file's text that holds the fragment.
pub type FindFn = dyn Fn(&str) -> Option<Range<usize>> + Send + Sync;

/// Builds the new file text from the original text and the formatted fragment.
pub type ReplaceFn = dyn Fn(&str, &str) -> String + Send + Sync;

/// Locates the fragment in the original text.
#[derive(Clone)]
pub enum Matcher {
    /// The whole file is the fragment.
    Whole,
    /// Text strictly between the first `open` and the next `close` after it.
    Between { open: String, close: String },
    /// First match of the regex. Capture group 1 narrows the region when present.
    Pattern(Regex),
    /// Caller supplied range finder.
    Function(Arc<FindFn>),
}

/// Puts the formatted fragment back.
#[derive(Clone, Default)]
pub enum Reinsertion {
    /// Substitute the region the matcher found.
    #[default]
    Splice,
    /// Caller supplied rebuild, given `(original, fragment)`.
    Function(Arc<ReplaceFn>),
}

/// The resolved extract/reinsert pair for one run.
#[derive(Clone)]
pub struct Extraction {
    matcher: Matcher,
    reinsertion: Reinsertion,
}

impl Default for Extraction {
    /// Identity on both sides: whole-file fragment, whole-file replacement.
    fn default() -> Self {
        Self::new(Matcher::Whole, Reinsertion::Splice)
    }
}

impl Extraction {
    pub fn new(matcher: Matcher, reinsertion: Reinsertion) -> Self {
        Self {
            matcher,
            reinsertion,
        }
    }

    pub fn matcher(&self) -> &Matcher {
        &self.matcher
    }

    /// The fragment to transform, or `None` when the file has none.
    pub fn extract<'a>(&self, original: &'a str) -> Option<&'a str> {
        self.locate(original).map(|range| &original[range])
    }

    /// New file text with `fragment` in place of the extracted region.
    ///
    /// `None` when the original text has no fragment to replace.
    pub fn reinsert(&self, original: &str, fragment: &str) -> Option<String> {
        match &self.reinsertion {
            Reinsertion::Splice => {
                let range = self.locate(original)?;
                let mut out =
                    String::with_capacity(original.len() - range.len() + fragment.len());
                out.push_str(&original[..range.start]);
                out.push_str(fragment);
                out.push_str(&original[range.end..]);
                Some(out)
            }
            Reinsertion::Function(replace) => Some(replace(original, fragment)),
        }
    }

    fn locate(&self, text: &str) -> Option<Range<usize>> {
        let range = match &self.matcher {
            Matcher::Whole => 0..text.len(),
            Matcher::Between { open, close } => {
                let start = memmem::find(text.as_bytes(), open.as_bytes())? + open.len();
                let end = start + memmem::find(&text.as_bytes()[start..], close.as_bytes())?;
                start..end
            }
            Matcher::Pattern(re) => {
                let caps = re.captures(text)?;
                caps.get(1).or_else(|| caps.get(0))?.range()
            }
            Matcher::Function(find) => find(text)?,
        };
        // A finder returning a range that splits a character or overruns is a miss.
        text.get(range.clone()).map(|_| range)
    }
}

impl fmt::Debug for Matcher {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Matcher::Whole => f.write_str("Whole"),
            Matcher::Between { open, close } => f
                .debug_struct("Between")
                .field("open", open)
                .field("close", close)
                .finish(),
            Matcher::Pattern(re) => f.debug_tuple("Pattern").field(&re.as_str()).finish(),
            Matcher::Function(_) => f.write_str("Function(..)"),
        }
    }
}

impl fmt::Debug for Reinsertion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Reinsertion::Splice => f.write_str("Splice"),
            Reinsertion::Function(_) => f.write_str("Function(..)"),
        }
    }
}

impl fmt::Debug for Extraction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Extraction")
            .field("matcher", &self.matcher)
            .field("reinsertion", &self.reinsertion)
            .finish()
    }
}
