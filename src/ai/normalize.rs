//! Response normalization
//!
//! Providers are asked for plain text but still emit markdown now and then.
//! Every successful response passes through [`normalize_response`] before it
//! reaches the caller, whichever provider produced it.

use std::sync::LazyLock;

use regex::Regex;

static HEADING_TOKEN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"#{1,6}\s").expect("static heading pattern compiles")
});

static BLANK_RUN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\n{3,}").expect("static newline pattern compiles"));

/// Strip bold/italic/heading markup, collapse 3+ newlines to 2, trim.
pub fn normalize_response(raw: &str) -> String {
    let without_emphasis = raw.replace("**", "").replace('*', "");
    let without_headings = HEADING_TOKEN.replace_all(&without_emphasis, "");
    let collapsed = BLANK_RUN.replace_all(&without_headings, "\n\n");
    collapsed.trim().to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_strips_markup() {
        let raw = "# Heading\n\n**Bold** and *italic*\n\n\n\n## Causes\nStress";
        let clean = normalize_response(raw);

        assert_eq!(clean, "Heading\n\nBold and italic\n\nCauses\nStress");
    }

    #[test]
    fn test_collapses_newlines() {
        assert_eq!(normalize_response("a\n\n\n\n\nb"), "a\n\nb");
        assert_eq!(normalize_response("a\n\nb"), "a\n\nb");
    }

    #[test]
    fn test_trims() {
        assert_eq!(normalize_response("  \n text \n\n "), "text");
    }

    #[test]
    fn test_plain_text_unchanged() {
        let text = "Behavior Analysis:\nThe dog is anxious.";
        assert_eq!(normalize_response(text), text);
    }

    proptest! {
        #[test]
        fn prop_no_markup_survives(
            words in proptest::collection::vec("[a-z]{1,8}", 1..10),
            hashes in 1usize..=6,
            newlines in 3usize..8,
        ) {
            let body = words.join(" ");
            let raw = format!(
                "{} Title\n**{}**{}*{}*",
                "#".repeat(hashes),
                body,
                "\n".repeat(newlines),
                body
            );
            let clean = normalize_response(&raw);
            prop_assert!(!clean.contains('*'));
            prop_assert!(!clean.contains('#'));
            prop_assert!(!clean.contains("\n\n\n"));
        }

        #[test]
        fn prop_never_grows(raw in "[a-z#* \n]{0,80}") {
            let once = normalize_response(&raw);
            prop_assert!(once.len() <= raw.len());
            prop_assert!(normalize_response(&once).len() <= once.len());
        }
    }
}
