//! Path segment sanitization.
//!
//! Turns arbitrary strings (recovered file names, tag values) into names
//! that are safe on every common filesystem. Readable substitutions run
//! first, then anything left from the illegal set becomes `_`.

/// Ordered literal substitutions applied before the blanket replacement.
const REPLACEMENTS: &[(&str, &str)] = &[
    ("\"", "in"),
    (":", "-"),
    ("?", ""),
    ("\r", ""),
    ("\n", ""),
    ("/", ","),
    ("\\", ","),
];

/// Characters that must never appear in a path segment.
const ILLEGAL_CHARS: &[char] = &['>', '<', '/', '\\', ':', ';', '\t', '|', '\n', '\r', '"', '?', '*'];

/// Whether a character may not appear in a sanitized segment.
pub fn is_illegal(c: char) -> bool {
    ILLEGAL_CHARS.contains(&c) || c.is_ascii_control()
}

/// Make a string safe to use as a single path segment.
///
/// Idempotent: sanitizing a sanitized name changes nothing.
pub fn sanitize(name: &str) -> String {
    let mut out = name.to_string();
    for (from, to) in REPLACEMENTS {
        if out.contains(from) {
            out = out.replace(from, to);
        }
    }
    let out: String = out
        .chars()
        .map(|c| if is_illegal(c) { '_' } else { c })
        .collect();
    // "." and ".." would resolve to the current or parent directory
    if is_dot_name(&out) {
        return "_".repeat(out.len());
    }
    out
}

/// Whether a name would pass through [`sanitize`] unchanged.
pub fn is_clean(name: &str) -> bool {
    !name.chars().any(is_illegal) && !is_dot_name(name)
}

fn is_dot_name(name: &str) -> bool {
    !name.is_empty() && name.chars().all(|c| c == '.')
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_dot_names_are_replaced() {
        assert_eq!(sanitize(".."), "__");
        assert_eq!(sanitize("."), "_");
        assert_eq!(sanitize("?.."), "__");
        assert_eq!(sanitize("..."), "___");
        assert_eq!(sanitize("..a"), "..a");
        assert!(!is_clean(".."));
        assert!(is_clean(".hidden"));
    }

    #[test]
    fn test_sanitize_substitutions() {
        assert_eq!(sanitize("12\" Mix"), "12in Mix");
        assert_eq!(sanitize("Track: Title"), "Track- Title");
        assert_eq!(sanitize("AC/DC"), "AC,DC");
        assert_eq!(sanitize("a\\b"), "a,b");
        assert_eq!(sanitize("Why?"), "Why");
        assert_eq!(sanitize("line\r\nbreak"), "linebreak");
    }

    #[test]
    fn test_sanitize_blanket_replacement() {
        assert_eq!(sanitize("a<b>c"), "a_b_c");
        assert_eq!(sanitize("pipe|test"), "pipe_test");
        assert_eq!(sanitize("semi;colon"), "semi_colon");
        assert_eq!(sanitize("tab\there"), "tab_here");
        assert_eq!(sanitize("star*"), "star_");
    }

    #[test]
    fn test_valid_name_unchanged() {
        assert_eq!(sanitize("f1234567.jpg"), "f1234567.jpg");
        assert!(is_clean("Valid Name [1].mp3"));
        assert!(!is_clean("bad|name"));
    }
}
