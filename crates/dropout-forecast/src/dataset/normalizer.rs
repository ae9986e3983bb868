use std::fmt::Display;
use unicode_normalization::UnicodeNormalization;

/// Canonical lookup form of a display name: NFD-decomposed with every
/// non-ASCII code point dropped (so accents vanish but base letters stay),
/// lower-cased and trimmed. The output is pure ASCII, which makes the
/// function idempotent.
pub fn normalize(text: &str) -> String {
    let folded: String = text
        .nfd()
        .filter(char::is_ascii)
        .collect::<String>()
        .to_ascii_lowercase();
    folded.trim().to_string()
}

/// Stringifies a non-text value before normalizing it.
pub fn normalize_value<T: Display + ?Sized>(value: &T) -> String {
    normalize(&value.to_string())
}
