//! Explicit translation lookup for tooling and scripts.
//!
//! Built once from the loaded dictionaries; there is no global state.

use anyhow::{bail, Result};
use std::collections::BTreeMap;

use crate::dictionary::{DictionaryLoader, FlattenedDictionary};
use crate::error::LoadResult;
use crate::format_check::placeholder_regex;
use crate::fs::FileSystem;

pub struct TranslationRuntime {
    primary: String,
    active: String,
    dictionaries: BTreeMap<String, FlattenedDictionary>,
}

impl TranslationRuntime {
    /// `languages[0]` is the primary (fallback) language and starts active.
    pub fn new(languages: Vec<(String, FlattenedDictionary)>) -> Result<Self> {
        let Some((primary, _)) = languages.first() else {
            bail!("at least one language is required");
        };
        let primary = primary.clone();
        Ok(Self {
            active: primary.clone(),
            primary,
            dictionaries: languages.into_iter().collect(),
        })
    }

    pub fn from_loader<F: FileSystem>(
        loader: &DictionaryLoader<'_, F>,
        languages: &[String],
    ) -> Result<Self> {
        let loaded = languages
            .iter()
            .map(|lang| Ok((lang.clone(), loader.load(lang)?.flatten())))
            .collect::<LoadResult<Vec<_>>>()?;
        Self::new(loaded)
    }

    pub fn language(&self) -> &str {
        &self.active
    }

    pub fn set_language(&mut self, language: &str) -> Result<()> {
        if !self.dictionaries.contains_key(language) {
            bail!(
                "unknown language '{}' (available: {})",
                language,
                self.dictionaries
                    .keys()
                    .cloned()
                    .collect::<Vec<_>>()
                    .join(", ")
            );
        }
        self.active = language.to_string();
        Ok(())
    }

    /// Raw string for `key`: active language, then primary, then none.
    pub fn lookup(&self, key: &str) -> Option<&str> {
        [&self.active, &self.primary]
            .into_iter()
            .filter_map(|lang| self.dictionaries.get(lang.as_str()))
            .find_map(|dict| dict.get(key))
            .map(String::as_str)
    }

    /// Translated and interpolated string; the key itself when no language has it.
    pub fn translate(&self, key: &str, params: &BTreeMap<String, String>) -> String {
        match self.lookup(key) {
            Some(template) => interpolate(template, params),
            None => key.to_string(),
        }
    }
}

/// Replace `{name}` with `params["name"]`; unknown placeholders stay as written.
pub fn interpolate(template: &str, params: &BTreeMap<String, String>) -> String {
    placeholder_regex()
        .replace_all(template, |caps: &regex::Captures<'_>| {
            let token = &caps[0];
            let name = &token[1..token.len() - 1];
            params
                .get(name)
                .cloned()
                .unwrap_or_else(|| token.to_string())
        })
        .into_owned()
}
