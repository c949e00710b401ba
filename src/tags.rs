//! Static element/attribute tables shared by the line transforms.

/// Void elements: no closing tag, no children. A pretty-printed opening tag
/// for one of these must end in `/>`.
pub const SELF_CLOSING: [&str; 15] = [
    "area", "base", "br", "col", "embed", "hr", "img", "input", "keygen", "link", "meta",
    "param", "source", "track", "wbr",
];

/// Boolean-looking attributes that still require an explicit (empty) value.
pub const DEFAULT_VOID_ATTRIBUTES: [&str; 1] = ["alt"];

pub fn is_self_closing(name: &str) -> bool {
    matches_ignore_ascii_case(name, &SELF_CLOSING)
}

/// `line` (already trimmed) is a bare void opening marker such as `<img`,
/// with its attributes and closing bracket on the following lines.
pub fn is_open_marker(trimmed: &str) -> bool {
    trimmed
        .strip_prefix('<')
        .is_some_and(|name| !name.is_empty() && is_self_closing(name))
}

fn matches_ignore_ascii_case(name: &str, set: &[&str]) -> bool {
    set.iter().any(|s| name.eq_ignore_ascii_case(s))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_self_closing_table() {
        assert_eq!(SELF_CLOSING.len(), 15);
        assert!(is_self_closing("img"));
        assert!(is_self_closing("KEYGEN"));
        assert!(!is_self_closing("div"));
        assert!(!is_self_closing("image"));
    }

    #[test]
    fn test_open_marker() {
        assert!(is_open_marker("<img"));
        assert!(is_open_marker("<wbr"));
        assert!(!is_open_marker("<img src=\"x\">"));
        assert!(!is_open_marker("<div"));
        assert!(!is_open_marker("<"));
        assert!(!is_open_marker("img"));
    }
}
