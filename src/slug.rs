//! Slug derivation for categories, tags and books.
//!
//! Slugs are derived once, when a row is first saved, and never recomputed:
//! renaming a category or editing a book title leaves its URL stable.

use unicode_normalization::UnicodeNormalization;

/// Derive a URL-safe slug from a display name.
///
/// Unicode-aware: the name is NFKC-normalized and lowercased, alphanumeric
/// characters are kept (including non-Latin scripts), and every other run of
/// characters collapses to a single `-`. A name with no alphanumeric content
/// yields an empty slug, which callers must treat as a validation failure.
pub fn slugify(name: &str) -> String {
    let normalized: String = name.nfkc().collect();

    let mut slug = String::with_capacity(normalized.len());
    let mut pending_sep = false;
    for c in normalized.chars() {
        if c.is_alphanumeric() {
            if pending_sep && !slug.is_empty() {
                slug.push('-');
            }
            pending_sep = false;
            for lc in c.to_lowercase() {
                slug.push(lc);
            }
        } else {
            pending_sep = true;
        }
    }
    slug
}

/// Candidate slug for the n-th attempt at a base: `base` itself first, then
/// `base-2`, `base-3`, ...
pub fn numbered(base: &str, attempt: u32) -> String {
    if attempt <= 1 {
        base.to_string()
    } else {
        format!("{}-{}", base, attempt)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn basic_ascii() {
        assert_eq!(slugify("Clean Code"), "clean-code");
        assert_eq!(slugify("  Rust,  2nd Edition!  "), "rust-2nd-edition");
    }

    #[test]
    fn unicode_names_keep_their_script() {
        assert_eq!(slugify("بايثون للمبتدئين"), "بايثون-للمبتدئين");
        assert_eq!(slugify("Café Culture"), "café-culture");
    }

    #[test]
    fn no_leading_or_trailing_separator() {
        assert_eq!(slugify("--hello--"), "hello");
        assert_eq!(slugify("!!!"), "");
        assert_eq!(slugify(""), "");
    }

    #[test]
    fn numbered_candidates() {
        assert_eq!(numbered("x", 1), "x");
        assert_eq!(numbered("x", 2), "x-2");
        assert_eq!(numbered("x", 7), "x-7");
    }
}
