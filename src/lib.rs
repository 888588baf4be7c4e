pub mod commands;
pub mod config;
pub mod dictionary;
pub mod differ;
pub mod error;
pub mod extractor;
pub mod fixer;
pub mod format_check;
pub mod fs;
pub mod generic_keys;
pub mod history;
pub mod key_format;
pub mod logging;
pub mod report;
pub mod runtime;
pub mod validator;
