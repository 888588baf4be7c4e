//! Placeholder and markup consistency between the two languages.
//!
//! Placeholders are single-level `{identifier}` tokens; there is no escaping and
//! no nested-brace support. Tags are any `<...>` span. Malformed syntax simply
//! yields fewer tokens on that side.

use regex::Regex;
use serde::Serialize;
use std::collections::BTreeSet;
use std::sync::OnceLock;

use crate::dictionary::FlattenedDictionary;

static PLACEHOLDER_REGEX: OnceLock<Regex> = OnceLock::new();
static HTML_TAG_REGEX: OnceLock<Regex> = OnceLock::new();

pub(crate) fn placeholder_regex() -> &'static Regex {
    PLACEHOLDER_REGEX.get_or_init(|| {
        Regex::new(r"\{[A-Za-z_][A-Za-z0-9_]*\}")
            .expect("PLACEHOLDER_REGEX pattern is invalid - this is a bug")
    })
}

fn html_tag_regex() -> &'static Regex {
    HTML_TAG_REGEX.get_or_init(|| {
        Regex::new(r"<[^<>]+>").expect("HTML_TAG_REGEX pattern is invalid - this is a bug")
    })
}

/// `{name}` tokens in order of appearance, braces included.
pub fn extract_placeholders(value: &str) -> Vec<String> {
    placeholder_regex()
        .find_iter(value)
        .map(|m| m.as_str().to_string())
        .collect()
}

/// `<...>` tags in order of appearance.
pub fn extract_html_tags(value: &str) -> Vec<String> {
    html_tag_regex()
        .find_iter(value)
        .map(|m| m.as_str().to_string())
        .collect()
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum FormatIssueKind {
    PlaceholderCount,
    PlaceholderNames,
    HtmlTags,
}

impl FormatIssueKind {
    pub fn as_str(self) -> &'static str {
        match self {
            FormatIssueKind::PlaceholderCount => "placeholderCount",
            FormatIssueKind::PlaceholderNames => "placeholderNames",
            FormatIssueKind::HtmlTags => "htmlTags",
        }
    }
}

/// One detected mismatch for a key present in both languages
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FormatIssue {
    pub key: String,
    pub kind: FormatIssueKind,
    pub primary_value: String,
    pub secondary_value: String,
    /// Placeholder names: tokens the primary string lacks. Tags: the primary string's tags.
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub primary_details: Vec<String>,
    /// Placeholder names: tokens the secondary string lacks. Tags: the secondary string's tags.
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub secondary_details: Vec<String>,
}

impl FormatIssue {
    pub fn describe(&self, primary_language: &str, secondary_language: &str) -> String {
        match self.kind {
            FormatIssueKind::PlaceholderCount => format!(
                "placeholder count differs ({}: {}, {}: {})",
                primary_language,
                extract_placeholders(&self.primary_value).len(),
                secondary_language,
                extract_placeholders(&self.secondary_value).len()
            ),
            FormatIssueKind::PlaceholderNames => format!(
                "placeholder names differ (missing in {}: [{}], missing in {}: [{}])",
                primary_language,
                self.primary_details.join(", "),
                secondary_language,
                self.secondary_details.join(", ")
            ),
            FormatIssueKind::HtmlTags => format!(
                "HTML tag count differs ({}: [{}], {}: [{}])",
                primary_language,
                self.primary_details.join(" "),
                secondary_language,
                self.secondary_details.join(" ")
            ),
        }
    }
}

/// Check a single pair of strings.
///
/// A count mismatch stops the checks for the key; otherwise the names check and
/// the tag check run independently.
pub fn check_pair(key: &str, primary: &str, secondary: &str) -> Vec<FormatIssue> {
    let mut issues = Vec::new();
    let primary_tokens = extract_placeholders(primary);
    let secondary_tokens = extract_placeholders(secondary);

    let issue = |kind: FormatIssueKind,
                 primary_details: Vec<String>,
                 secondary_details: Vec<String>| FormatIssue {
        key: key.to_string(),
        kind,
        primary_value: primary.to_string(),
        secondary_value: secondary.to_string(),
        primary_details,
        secondary_details,
    };

    if primary_tokens.len() != secondary_tokens.len() {
        issues.push(issue(FormatIssueKind::PlaceholderCount, Vec::new(), Vec::new()));
        return issues;
    }

    let primary_set: BTreeSet<&String> = primary_tokens.iter().collect();
    let secondary_set: BTreeSet<&String> = secondary_tokens.iter().collect();
    if primary_set != secondary_set {
        let missing_in_primary: Vec<String> = secondary_set
            .difference(&primary_set)
            .map(|s| (*s).clone())
            .collect();
        let missing_in_secondary: Vec<String> = primary_set
            .difference(&secondary_set)
            .map(|s| (*s).clone())
            .collect();
        issues.push(issue(
            FormatIssueKind::PlaceholderNames,
            missing_in_primary,
            missing_in_secondary,
        ));
    }

    let primary_tags = extract_html_tags(primary);
    let secondary_tags = extract_html_tags(secondary);
    if primary_tags.len() != secondary_tags.len() {
        issues.push(issue(FormatIssueKind::HtmlTags, primary_tags, secondary_tags));
    }

    issues
}

/// Every format issue for keys present in both maps. Keys missing on either
/// side are the differ's concern and are skipped here.
pub fn find_format_issues(
    primary: &FlattenedDictionary,
    secondary: &FlattenedDictionary,
) -> Vec<FormatIssue> {
    primary
        .iter()
        .filter_map(|(key, primary_value)| {
            secondary
                .get(key)
                .map(|secondary_value| check_pair(key, primary_value, secondary_value))
        })
        .flatten()
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn flat(entries: &[(&str, &str)]) -> FlattenedDictionary {
        entries
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    #[test]
    fn renamed_placeholder_is_reported_with_both_sides() {
        let issues = find_format_issues(
            &flat(&[("k", "Hello {name}")]),
            &flat(&[("k", "Bonjour {nom}")]),
        );
        assert_eq!(
            issues,
            vec![FormatIssue {
                key: "k".to_string(),
                kind: FormatIssueKind::PlaceholderNames,
                primary_value: "Hello {name}".to_string(),
                secondary_value: "Bonjour {nom}".to_string(),
                primary_details: vec!["{nom}".to_string()],
                secondary_details: vec!["{name}".to_string()],
            }]
        );
    }

    #[test]
    fn matching_placeholders_with_different_text_are_fine() {
        let issues = find_format_issues(
            &flat(&[("k", "{count} symbols in {group}")]),
            &flat(&[("k", "{group} contient {count} symboles")]),
        );
        assert!(issues.is_empty());
    }

    #[test]
    fn count_mismatch_short_circuits() {
        let issues = check_pair("k", "<b>{a}</b> {b}", "{a}");
        assert_eq!(issues.len(), 1);
        assert_eq!(issues[0].kind, FormatIssueKind::PlaceholderCount);
    }

    #[test]
    fn tag_mismatch_is_independent_of_names() {
        let issues = check_pair("k", "<strong>{name}</strong>", "{nom}");
        let kinds: Vec<_> = issues.iter().map(|i| i.kind).collect();
        assert_eq!(
            kinds,
            vec![FormatIssueKind::PlaceholderNames, FormatIssueKind::HtmlTags]
        );
        assert_eq!(issues[1].primary_details, vec!["<strong>", "</strong>"]);
        assert!(issues[1].secondary_details.is_empty());
    }

    #[test]
    fn keys_missing_on_one_side_are_skipped() {
        let issues = find_format_issues(&flat(&[("only.en", "{x}")]), &flat(&[("only.fr", "y")]));
        assert!(issues.is_empty());
    }

    #[test]
    fn malformed_braces_yield_no_tokens() {
        assert!(extract_placeholders("{ spaced } {{double}").len() == 1);
        assert!(extract_placeholders("{unclosed").is_empty());
        assert_eq!(extract_html_tags("a < b and c > d"), vec!["< b and c >"]);
    }
}
