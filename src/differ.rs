//! Missing-key detection between two locale dictionaries.

use serde::Serialize;

use crate::dictionary::{Dictionary, DictionaryNode, FlattenedDictionary};

/// Keys present in `source` and absent from `target`, sorted.
pub fn find_missing_keys(source: &FlattenedDictionary, target: &FlattenedDictionary) -> Vec<String> {
    source
        .keys()
        .filter(|key| !target.contains_key(*key))
        .cloned()
        .collect()
}

/// Tree-aware variant: when a subtree of `source` has no object counterpart in
/// `target`, every leaf under it is reported, not just the subtree root.
pub fn find_missing_keys_deep(source: &Dictionary, target: &Dictionary) -> Vec<String> {
    let mut missing = Vec::new();
    walk_missing(source, Some(target), "", &mut missing);
    missing.sort();
    missing
}

fn walk_missing(source: &Dictionary, target: Option<&Dictionary>, prefix: &str, out: &mut Vec<String>) {
    for (key, node) in source.iter() {
        let path = if prefix.is_empty() {
            key.clone()
        } else {
            format!("{}.{}", prefix, key)
        };
        let counterpart = target.and_then(|t| t.get(key));

        match (node, counterpart) {
            (DictionaryNode::Branch(nested), Some(DictionaryNode::Branch(other))) => {
                walk_missing(nested, Some(other), &path, out);
            }
            // Absent, or a leaf where an object is expected: the whole subtree is missing.
            (DictionaryNode::Branch(nested), _) => {
                out.extend(nested.leaf_paths(&path));
            }
            (DictionaryNode::Leaf(_), Some(DictionaryNode::Leaf(_))) => {}
            (DictionaryNode::Leaf(_), _) => out.push(path),
        }
    }
}

/// Both directions of the diff between the primary and secondary dictionaries.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct MissingKeys {
    pub primary_language: String,
    pub secondary_language: String,
    /// Present in primary, absent from secondary
    pub missing_in_secondary: Vec<String>,
    /// Present in secondary, absent from primary
    pub missing_in_primary: Vec<String>,
}

impl MissingKeys {
    pub fn total(&self) -> usize {
        self.missing_in_secondary.len() + self.missing_in_primary.len()
    }

    pub fn is_empty(&self) -> bool {
        self.total() == 0
    }

    /// Keys missing in `language`, if it is one of the pair.
    pub fn missing_in(&self, language: &str) -> Option<&[String]> {
        if language == self.secondary_language {
            Some(&self.missing_in_secondary)
        } else if language == self.primary_language {
            Some(&self.missing_in_primary)
        } else {
            None
        }
    }
}

/// Run the deep differ in both directions.
pub fn diff_dictionaries(
    primary_language: &str,
    primary: &Dictionary,
    secondary_language: &str,
    secondary: &Dictionary,
) -> MissingKeys {
    MissingKeys {
        primary_language: primary_language.to_string(),
        secondary_language: secondary_language.to_string(),
        missing_in_secondary: find_missing_keys_deep(primary, secondary),
        missing_in_primary: find_missing_keys_deep(secondary, primary),
    }
}
