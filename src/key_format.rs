use regex::Regex;
use std::sync::OnceLock;

/// Minimum number of dot-separated segments in a well-formed key
pub const MIN_SEGMENTS: usize = 2;

fn segment_regex() -> &'static Regex {
    static SEGMENT_REGEX: OnceLock<Regex> = OnceLock::new();
    SEGMENT_REGEX.get_or_init(|| {
        Regex::new(r"^[a-z0-9]+(?:-[a-z0-9]+)*$")
            .expect("SEGMENT_REGEX pattern is invalid - this is a bug")
    })
}

/// Naming convention: at least two dot-separated segments, each lowercase
/// alphanumeric words optionally joined by single hyphens
/// (`community.stats.groups`, `pages.symbol-detail.title`).
///
/// Advisory only; a bad name never fails validation.
pub fn is_valid_key_format(key: &str) -> bool {
    let segments: Vec<&str> = key.split('.').collect();
    segments.len() >= MIN_SEGMENTS && segments.iter().all(|s| segment_regex().is_match(s))
}

/// Keys breaking the convention, sorted and deduplicated.
pub fn find_invalid_keys<'a, I>(keys: I) -> Vec<String>
where
    I: IntoIterator<Item = &'a String>,
{
    let mut invalid: Vec<String> = keys
        .into_iter()
        .filter(|k| !is_valid_key_format(k))
        .cloned()
        .collect();
    invalid.sort();
    invalid.dedup();
    invalid
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn accepts_dotted_lowercase_keys() {
        assert!(is_valid_key_format("community.stats.groups"));
        assert!(is_valid_key_format("pages.symbol-detail.title"));
        assert!(is_valid_key_format("hunt.step2"));
    }

    #[test]
    fn rejects_nonconforming_keys() {
        assert!(!is_valid_key_format("title"));
        assert!(!is_valid_key_format("Community.stats"));
        assert!(!is_valid_key_format("community..stats"));
        assert!(!is_valid_key_format("community.stats_total"));
        assert!(!is_valid_key_format("community.-stats"));
        assert!(!is_valid_key_format("community.stats."));
    }

    #[test]
    fn collects_sorted_unique_offenders() {
        let keys = vec![
            "b.Bad".to_string(),
            "a.good".to_string(),
            "b.Bad".to_string(),
            "Aa".to_string(),
        ];
        assert_eq!(
            find_invalid_keys(&keys),
            vec!["Aa".to_string(), "b.Bad".to_string()]
        );
    }
}
