//! Label-text normalization
//!
//! Labeled cells on the summary sheet (and header cells on the derived
//! sheets) are located by visible text, not by coordinates. Template authors
//! are not consistent about casing or accents ("Subsídios" vs "SUBSIDIOS"),
//! so all comparisons go through one normal form.

use unicode_normalization::char::is_combining_mark;
use unicode_normalization::UnicodeNormalization;

/// Normalize label text for comparison: trim, lowercase, and strip
/// diacritics (NFD decomposition with combining marks dropped).
///
/// # Examples
/// ```
/// use closeout_core::normalize_label;
///
/// assert_eq!(normalize_label("  DÉBITO EM FOLHA "), "debito em folha");
/// assert_eq!(normalize_label("Subsídios"), "subsidios");
/// ```
pub fn normalize_label(text: &str) -> String {
    text.trim()
        .to_lowercase()
        .nfd()
        .filter(|c| !is_combining_mark(*c))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_trims_and_lowercases() {
        assert_eq!(normalize_label("  Checkouts a pagar  "), "checkouts a pagar");
        assert_eq!(normalize_label("TOTAL DO FECHAMENTO"), "total do fechamento");
    }

    #[test]
    fn test_strips_diacritics() {
        assert_eq!(normalize_label("DÉBITO EM FOLHA"), "debito em folha");
        assert_eq!(normalize_label("TOTAL DO FUNCIONÁRIO"), "total do funcionario");
        assert_eq!(normalize_label("Créditos inseridos"), "creditos inseridos");
    }

    #[test]
    fn test_accent_insensitive_equality() {
        assert_eq!(
            normalize_label("DÉBITO EM FOLHA"),
            normalize_label("debito em folha")
        );
    }

    #[test]
    fn test_empty() {
        assert_eq!(normalize_label(""), "");
        assert_eq!(normalize_label("   "), "");
    }
}
