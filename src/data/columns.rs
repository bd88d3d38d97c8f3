use std::sync::LazyLock;

use regex::Regex;

static NON_WORD: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"[^\w\s]").unwrap());
static WHITESPACE_RUN: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\s+").unwrap());

/// Normalize a raw column label into an identifier.
///
/// Trims surrounding whitespace, drops every character that is neither a word
/// character nor whitespace, then collapses each whitespace run into `_`.
/// `"Annual Income ($)"` becomes `"Annual_Income_"`.
pub fn normalize_column(raw: &str) -> String {
    let stripped = NON_WORD.replace_all(raw.trim(), "");
    WHITESPACE_RUN.replace_all(&stripped, "_").into_owned()
}

/// Normalize every header, preserving length and order.
pub fn normalize_columns<S: AsRef<str>>(raw: &[S]) -> Vec<String> {
    raw.iter().map(|h| normalize_column(h.as_ref())).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn customer_headers() {
        let raw = [
            "CustomerID",
            "Gender",
            " Age ",
            "Annual Income ($)",
            "Spending Score (1-100)",
            "Profession",
            "Work Experience",
            "Family Size",
        ];
        assert_eq!(
            normalize_columns(&raw),
            vec![
                "CustomerID",
                "Gender",
                "Age",
                "Annual_Income_",
                "Spending_Score_1100",
                "Profession",
                "Work_Experience",
                "Family_Size",
            ]
        );
    }

    #[test]
    fn whitespace_runs_collapse() {
        assert_eq!(normalize_column("family \t  size"), "family_size");
        assert_eq!(normalize_column("a ( b"), "a_b");
    }

    #[test]
    fn empty_and_punctuation_only_labels_become_empty() {
        assert_eq!(normalize_column(""), "");
        assert_eq!(normalize_column("   "), "");
        assert_eq!(normalize_column("($%)"), "");
    }

    #[test]
    fn unicode_letters_are_kept() {
        assert_eq!(normalize_column("Größe (cm)"), "Größe_cm");
    }

    proptest! {
        #[test]
        fn normalization_is_idempotent(raw in "\\PC{0,24}") {
            let once = normalize_column(&raw);
            prop_assert_eq!(normalize_column(&once), once.clone());
        }

        #[test]
        fn normalized_names_have_no_whitespace(raw in "[ a-zA-Z0-9()$%\\-\t]{0,24}") {
            let name = normalize_column(&raw);
            prop_assert!(!name.chars().any(char::is_whitespace));
        }
    }
}
