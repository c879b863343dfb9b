//! Text helpers shared by the model and services crates.

use once_cell::sync::Lazy;
use regex::Regex;
use unicode_normalization::UnicodeNormalization;

static NON_SLUG_RUN: Lazy<Regex> = Lazy::new(|| Regex::new(r"[^a-z0-9]+").unwrap());

/// Combining diacritical marks block
fn is_combining_diacritic(c: char) -> bool {
    ('\u{0300}'..='\u{036f}').contains(&c)
}

/// Turns a title into an URL-safe identifier: `"Vánoční cukroví"` -> `"vanocni-cukrovi"`.
pub fn slugify(title: &str) -> String {
    let folded: String = title
        .to_lowercase()
        .nfd()
        .filter(|c| !is_combining_diacritic(*c))
        .collect();
    NON_SLUG_RUN
        .replace_all(&folded, "-")
        .trim_matches('-')
        .to_string()
}
