//! Slug derivation for listing detail URLs.

use rand::distr::Alphanumeric;
use rand::Rng;

/// Maximum length of the derived portion of a slug.
pub const SLUG_MAX: usize = 60;

/// Length of the random suffix appended on collision or empty derivation.
pub const SUFFIX_LEN: usize = 6;

/// Derive a URL slug from a (sanitized) title.
///
/// Lowercases, maps non-alphanumeric runs to single dashes, and truncates.
/// May return an empty string for titles with no alphanumeric content; the
/// caller is expected to fall back to a generated slug.
pub fn derive(title: &str) -> String {
    let mut slug = String::with_capacity(title.len());
    let mut last_dash = true;
    for ch in title.chars() {
        if ch.is_ascii_alphanumeric() {
            slug.push(ch.to_ascii_lowercase());
            last_dash = false;
        } else if !last_dash {
            slug.push('-');
            last_dash = true;
        }
        if slug.len() >= SLUG_MAX {
            break;
        }
    }
    slug.trim_matches('-').to_string()
}

/// Short random alphanumeric suffix, lowercased for URL friendliness.
pub fn random_suffix() -> String {
    rand::rng()
        .sample_iter(&Alphanumeric)
        .take(SUFFIX_LEN)
        .map(|byte| (byte as char).to_ascii_lowercase())
        .collect()
}

/// Combine a derived slug with a random suffix, handling the empty case.
pub fn with_suffix(base: &str) -> String {
    if base.is_empty() {
        format!("listing-{}", random_suffix())
    } else {
        format!("{base}-{}", random_suffix())
    }
}
