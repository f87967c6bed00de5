//! Shared utility functions.

/// Take at most `max_chars` characters from the start of `s`.
///
/// Counts Unicode scalar values, not bytes, and never splits a character.
pub fn take_chars(s: &str, max_chars: usize) -> &str {
    match s.char_indices().nth(max_chars) {
        Some((end, _)) => &s[..end],
        None => s,
    }
}

/// Whitespace-separated word count, used as a cheap token estimate.
pub fn word_count(s: &str) -> usize {
    s.split_whitespace().count()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn take_ascii() {
        assert_eq!(take_chars("hello world", 5), "hello");
    }

    #[test]
    fn take_no_op_when_short() {
        assert_eq!(take_chars("hi", 10), "hi");
        assert_eq!(take_chars("", 10), "");
    }

    #[test]
    fn take_multibyte_counts_chars() {
        let s = "あのね";
        assert_eq!(take_chars(s, 1), "あ");
        assert_eq!(take_chars(s, 2), "あの");
        assert_eq!(take_chars(s, 3), "あのね");
    }

    #[test]
    fn word_count_ignores_extra_whitespace() {
        assert_eq!(word_count("  one two\n three  "), 3);
        assert_eq!(word_count(""), 0);
    }
}
