/// Character reserved as a delimiter in pad identifiers.
pub const RESERVED_DELIMITER: char = '$';

/// Returns true if `name` may be used as a pad id.
///
/// Only the reserved delimiter is rejected; the empty string is accepted.
pub fn is_valid_pad_name(name: &str) -> bool {
    !name.contains(RESERVED_DELIMITER)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rejects_delimiter() {
        assert!(!is_valid_pad_name("foo$bar"));
        assert!(!is_valid_pad_name("$"));
        assert!(!is_valid_pad_name("trailing$"));
    }

    #[test]
    fn accepts_plain_names() {
        assert!(is_valid_pad_name("foo-bar"));
        assert!(is_valid_pad_name("Meeting Notes 2024"));
        assert!(is_valid_pad_name("ünïcødé"));
    }

    #[test]
    fn accepts_empty() {
        assert!(is_valid_pad_name(""));
    }
}
