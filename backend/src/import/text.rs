//! Small text helpers shared by the import pipeline.

const ZWNJ: char = '\u{200C}';

/// Maps Persian (`۰-۹`) and Arabic-Indic (`٠-٩`) digits to ASCII.
pub fn normalize_digits(input: &str) -> String {
    input
        .chars()
        .map(|c| match c {
            '۰'..='۹' => char::from(b'0' + (c as u32 - '۰' as u32) as u8),
            '٠'..='٩' => char::from(b'0' + (c as u32 - '٠' as u32) as u8),
            _ => c,
        })
        .collect()
}

/// Trims and collapses every run of whitespace to a single space.
pub fn collapse_whitespace(input: &str) -> String {
    input.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Canonical comparison form of a human-entered name.
pub fn fold_name(input: &str) -> String {
    let folded: String = input
        .chars()
        .map(|c| match c {
            'ي' | 'ى' => 'ی',
            'ك' => 'ک',
            ZWNJ => ' ',
            _ => c,
        })
        .collect();
    collapse_whitespace(&folded).to_lowercase()
}

/// `None` for empty or whitespace-only cells, trimmed text otherwise.
pub fn non_empty(input: Option<&str>) -> Option<String> {
    input
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn persian_and_arabic_digits_become_ascii() {
        assert_eq!(normalize_digits("۱۴۰۴/۰۱/۰۷"), "1404/01/07");
        assert_eq!(normalize_digits("١٨"), "18");
    }

    #[test]
    fn fold_name_unifies_arabic_letters_and_spacing() {
        assert_eq!(fold_name("  علي   رضايي "), "علی رضایی");
        assert_eq!(fold_name("رضایی\u{200C}نژاد"), "رضایی نژاد");
        assert_eq!(fold_name("Ali REZAEI"), "ali rezaei");
    }

    #[test]
    fn non_empty_drops_blank_cells() {
        assert_eq!(non_empty(Some("  ")), None);
        assert_eq!(non_empty(Some(" x ")), Some("x".to_string()));
        assert_eq!(non_empty(None), None);
    }
}
