//! Title normalization for metadata lookups.
//!
//! Storefront titles carry marketing suffixes ("Definitive Edition",
//! "GOTY", ...) that make external search miss. [`normalize`] strips them
//! using a literal, ordered rule table. The output is only ever used as a
//! search key; the stored record keeps the original title.

/// Version of [`EDITION_RULES`]. Bump whenever the table changes.
pub const RULES_VERSION: u32 = 1;

/// Ordered `(pattern, replacement)` pairs applied with replace-all.
///
/// Longer, more specific patterns must come before the generic ones they
/// contain, otherwise `" Edition"` would leave `" - Ultimate"` behind.
pub const EDITION_RULES: &[(&str, &str)] = &[
    ("™", ""),
    ("®", ""),
    (" - Game of the Year Edition", ""),
    (": Game of the Year Edition", ""),
    (" Game of the Year Edition", ""),
    (" - GOTY Edition", ""),
    (" GOTY Edition", ""),
    (" - Definitive Edition", ""),
    (": Definitive Edition", ""),
    (" Definitive Edition", ""),
    (" - Complete Edition", ""),
    (": Complete Edition", ""),
    (" Complete Edition", ""),
    (" - Ultimate Edition", ""),
    (": Ultimate Edition", ""),
    (" Ultimate Edition", ""),
    (" - Deluxe Edition", ""),
    (": Deluxe Edition", ""),
    (" Deluxe Edition", ""),
    (" - Enhanced Edition", ""),
    (": Enhanced Edition", ""),
    (" Enhanced Edition", ""),
    (" - Special Edition", ""),
    (": Special Edition", ""),
    (" Special Edition", ""),
    (" - Anniversary Edition", ""),
    (" Anniversary Edition", ""),
    (" - Director's Cut", ""),
    (": Director's Cut", ""),
    (" Director's Cut", ""),
    (" Edition", ""),
    (" Collection", ""),
    (" Console", ""),
    (" for Windows 10", ""),
    (" for Windows", ""),
];

/// Strip edition and platform suffixes from `title`.
///
/// Returns the input unchanged when nothing matches, or when stripping
/// would leave nothing to search for.
pub fn normalize(title: &str) -> String {
    let stripped = EDITION_RULES
        .iter()
        .fold(title.to_string(), |acc, (pattern, replacement)| {
            if acc.contains(pattern) {
                acc.replace(pattern, replacement)
            } else {
                acc
            }
        });

    let trimmed = stripped.trim();
    if trimmed.is_empty() {
        title.to_string()
    } else {
        trimmed.to_string()
    }
}
