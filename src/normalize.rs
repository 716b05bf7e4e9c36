use std::sync::OnceLock;

use regex::{Captures, Regex};

/// Compound terms with several natural spellings, keyed by their compact form.
/// Longer keys come first so the alternation prefers the most specific rewrite.
const CANONICAL_REWRITES: [(&str, &str); 11] = [
    ("extremecloseup", "extreme-close-up"),
    ("extremelongshot", "extreme-long-shot"),
    ("overtheshoulder", "over-the-shoulder"),
    ("pointofview", "point-of-view"),
    ("birdseyeview", "bird's-eye-view"),
    ("wormseyeview", "worm's-eye-view"),
    ("dutchangle", "dutch-angle"),
    ("mediumshot", "medium-shot"),
    ("closeup", "close-up"),
    ("longshot", "long-shot"),
    ("wideshot", "wide-shot"),
];

/// Lowercases, drops whitespace and punctuation, then rewrites known compound terms to
/// a single canonical spelling. Two strings that differ only in spacing, hyphenation or
/// apostrophes normalize identically.
pub fn normalize_clause(text: &str) -> String {
    let compacted: String = text
        .chars()
        .filter(|ch| ch.is_alphanumeric())
        .flat_map(char::to_lowercase)
        .collect();
    canonicalize(&compacted)
}

fn canonicalize(compacted: &str) -> String {
    static REWRITE_RE: OnceLock<Regex> = OnceLock::new();
    let re = REWRITE_RE.get_or_init(|| {
        let alternation = CANONICAL_REWRITES
            .iter()
            .map(|(from, _)| *from)
            .collect::<Vec<_>>()
            .join("|");
        Regex::new(&alternation).expect("canonical rewrite regex should compile")
    });
    re.replace_all(compacted, |caps: &Captures<'_>| {
        let matched = &caps[0];
        CANONICAL_REWRITES
            .iter()
            .find(|(from, _)| *from == matched)
            .map(|(_, to)| (*to).to_owned())
            .unwrap_or_else(|| matched.to_owned())
    })
    .into_owned()
}

/// Hyphen-free variant of an already normalized string.
pub fn unhyphenated(normalized: &str) -> String {
    normalized.replace('-', "")
}

/// Spaced variant of an already normalized string (`close-up` -> `close up`).
pub fn spaced(normalized: &str) -> String {
    normalized.replace('-', " ")
}

pub fn placeholder(name: &str) -> String {
    format!("[{name}]")
}

/// Returns the inner name when `text` is exactly a bracketed placeholder.
pub fn placeholder_name(text: &str) -> Option<&str> {
    let inner = text.trim().strip_prefix('[')?.strip_suffix(']')?;
    let inner = inner.trim();
    (!inner.is_empty() && !inner.contains(['[', ']'])).then_some(inner)
}

#[cfg(test)]
mod tests {
    use super::{normalize_clause, placeholder_name, spaced, unhyphenated};

    #[test]
    fn spelling_variants_collapse() {
        let expected = normalize_clause("Close-Up");
        for variant in ["close up", "Closeup", "CLOSE-UP", "close - up"] {
            assert_eq!(normalize_clause(variant), expected, "variant: {variant}");
        }
        assert_eq!(expected, "close-up");
    }

    #[test]
    fn apostrophes_do_not_matter() {
        assert_eq!(normalize_clause("Bird's Eye View"), "bird's-eye-view");
        assert_eq!(normalize_clause("birds eye view"), "bird's-eye-view");
        assert_eq!(normalize_clause("Bird’s-Eye-View"), "bird's-eye-view");
    }

    #[test]
    fn most_specific_rewrite_wins() {
        assert_eq!(normalize_clause("Extreme Close Up"), "extreme-close-up");
        assert_eq!(normalize_clause("extreme long shot"), "extreme-long-shot");
        assert_eq!(normalize_clause("Medium Shot"), "medium-shot");
    }

    #[test]
    fn template_keywords_survive_normalization() {
        assert!(normalize_clause("inspired by Roger Deakins").contains("inspiredby"));
        assert!(normalize_clause("Created in  Blender").contains("createdin"));
        assert!(normalize_clause("Studio Ghibli Aesthetic").ends_with("aesthetic"));
    }

    #[test]
    fn variants_strip_or_space_hyphens() {
        assert_eq!(unhyphenated("extreme-close-up"), "extremecloseup");
        assert_eq!(spaced("extreme-close-up"), "extreme close up");
    }

    #[test]
    fn placeholders_require_brackets() {
        assert_eq!(placeholder_name(" [Shot Type] "), Some("Shot Type"));
        assert_eq!(placeholder_name("[ ]"), None);
        assert_eq!(placeholder_name("Shot Type"), None);
        assert_eq!(placeholder_name("inspired by [Style]"), None);
    }
}
