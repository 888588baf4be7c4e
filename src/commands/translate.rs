use anyhow::{bail, Result};
use std::collections::BTreeMap;

use crate::config::Config;
use crate::dictionary::DictionaryLoader;
use crate::fs::RealFileSystem;
use crate::runtime::TranslationRuntime;

/// `name=value` pairs into interpolation parameters
pub fn parse_params(raw: &[String]) -> Result<BTreeMap<String, String>> {
    let mut params = BTreeMap::new();
    for pair in raw {
        let Some((name, value)) = pair.split_once('=') else {
            bail!("Invalid --param '{}': expected name=value", pair);
        };
        if name.trim().is_empty() {
            bail!("Invalid --param '{}': empty name", pair);
        }
        params.insert(name.trim().to_string(), value.to_string());
    }
    Ok(params)
}

pub fn run(config: &Config, key: &str, language: Option<&str>, raw_params: &[String]) -> Result<()> {
    let params = parse_params(raw_params)?;
    let fs = RealFileSystem;
    let loader = DictionaryLoader::new(&fs, config.locales_path(), config.locale_format);
    let mut runtime = TranslationRuntime::from_loader(&loader, &config.languages)?;
    if let Some(language) = language {
        runtime.set_language(language)?;
    }
    println!("{}", runtime.translate(key, &params));
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn params_split_on_first_equals() {
        let params = parse_params(&["name=Ana".to_string(), "expr=a=b".to_string()]).unwrap();
        assert_eq!(params["name"], "Ana");
        assert_eq!(params["expr"], "a=b");
        assert!(parse_params(&["novalue".to_string()]).is_err());
    }
}
