use anyhow::{Result, anyhow};
use isolang::Language;

/// Language utilities for ISO language code handling
///
/// This module provides functions for validating and comparing the ISO 639-1
/// (2-letter) codes used throughout the pipeline, and for turning codes into
/// readable names for logs.
/// Validate that a code is a known ISO 639-1 or ISO 639-3 language code
pub fn validate_language_code(code: &str) -> Result<()> {
    let normalized = code.trim().to_lowercase();

    if normalized.len() == 2 && Language::from_639_1(&normalized).is_some() {
        return Ok(());
    }
    if normalized.len() == 3 && Language::from_639_3(&normalized).is_some() {
        return Ok(());
    }

    Err(anyhow!("Invalid language code: {}", code))
}

/// Check whether two language codes refer to the same language,
/// tolerating a mix of 2- and 3-letter forms
pub fn language_codes_match(a: &str, b: &str) -> bool {
    let a = a.trim().to_lowercase();
    let b = b.trim().to_lowercase();
    if a == b {
        return true;
    }

    match (parse_language(&a), parse_language(&b)) {
        (Some(lang_a), Some(lang_b)) => lang_a == lang_b,
        _ => false,
    }
}

/// English name for a language code, for log output
pub fn get_language_name(code: &str) -> Result<String> {
    parse_language(&code.trim().to_lowercase())
        .map(|lang| lang.to_name().to_string())
        .ok_or_else(|| anyhow!("Unknown language code: {}", code))
}

fn parse_language(code: &str) -> Option<Language> {
    match code.len() {
        2 => Language::from_639_1(code),
        3 => Language::from_639_3(code),
        _ => None,
    }
}
