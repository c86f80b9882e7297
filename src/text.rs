//! Small string helpers used by the macro file parser.

/// Strip trailing whitespace, including `\r` and `\n`.
pub fn rtrim(s: &str) -> &str {
    s.trim_end_matches(|c: char| c.is_whitespace())
}

/// Strip leading whitespace.
pub fn ltrim(s: &str) -> &str {
    s.trim_start_matches(|c: char| c.is_whitespace())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rtrim_strips_line_endings() {
        assert_eq!(rtrim("hello \t\r\n"), "hello");
        assert_eq!(rtrim("\thello"), "\thello");
        assert_eq!(rtrim(""), "");
    }

    #[test]
    fn ltrim_keeps_inner_spaces() {
        assert_eq!(ltrim("\t\t see ya  "), "see ya  ");
        assert_eq!(ltrim("   "), "");
    }
}
