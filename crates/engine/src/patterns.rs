//! Fixed price patterns and keyword tables used by the parser.
//!
//! The numeric thresholds here are empirical heuristics carried over from
//! field use, not domain law — they are named so callers can see exactly
//! which knob produced a given score.

use std::sync::OnceLock;

use regex::Regex;

/// Prices at or above this value are rejected outright during parsing.
pub const MAX_PRICE: i64 = 100_000;
/// Inclusive bounds of the "plausible retail price" range that earns a
/// confidence bonus.
pub const PLAUSIBLE_MIN: i64 = 10;
pub const PLAUSIBLE_MAX: i64 = 10_000;
/// A parse result is capped to this many candidates to bound noise from long
/// blocks of unrelated text.
pub const MAX_CANDIDATES: usize = 10;
/// Lines longer than this are probably prose, not price lines.
pub const LONG_LINE_CHARS: usize = 100;
/// Trailing text after a price is only usable as an item label below this length.
pub const MAX_TRAILING_LABEL_CHARS: usize = 30;

pub const BASE_CONFIDENCE: f32 = 0.5;
pub const CURRENCY_BONUS: f32 = 0.2;
pub const PLAUSIBLE_RANGE_BONUS: f32 = 0.1;
pub const MULTI_TOKEN_BONUS: f32 = 0.1;
pub const LONG_LINE_PENALTY: f32 = 0.2;

// ── Compiled regex cache ─────────────────────────────────────────────────────

macro_rules! re {
    ($name:ident, $pat:expr) => {
        pub fn $name() -> &'static Regex {
            static R: OnceLock<Regex> = OnceLock::new();
            R.get_or_init(|| Regex::new($pat).expect("invalid regex"))
        }
    };
}

re!(re_currency_prefixed,
    r"(?i)(?:j\$|jmd|\$)\s*([\d,]+(?:\.\d{1,2})?)");
re!(re_currency_suffixed,
    r"(?i)([\d,]+(?:\.\d{1,2})?)\s*(?:j\$|jmd|\$|dollars)");
// Bare "123.00" amounts with no currency marker. Also matches non-price
// decimals that happen to end in .00 (see DESIGN.md).
re!(re_bare_decimal,
    r"\b(\d{1,5}(?:,\d{3})*\.00)\b");
re!(re_currency_marker,
    r"(?i)j\$|jmd|\$|\bdollars\b");

/// The ordered matchers the parser tries against each line. The first pattern
/// that matches a line wins.
pub fn price_matchers() -> [&'static Regex; 3] {
    [re_currency_prefixed(), re_currency_suffixed(), re_bare_decimal()]
}

// ── Keyword tables ───────────────────────────────────────────────────────────

const CATEGORY_KEYWORDS: &[(&str, &[&str])] = &[
    ("Groceries", &["rice", "bread", "flour", "sugar"]),
    ("Meat & Seafood", &["chicken", "beef", "pork", "fish"]),
    ("Fuel", &["gas", "fuel", "petrol", "diesel"]),
    ("Dairy", &["milk", "cheese", "yogurt", "butter"]),
];

const UNIT_KEYWORDS: &[(&str, &[&str])] = &[
    ("per lb", &["lb", "pound"]),
    ("per kg", &["kg", "kilo"]),
    ("per gallon", &["gal", "gallon"]),
    ("per liter", &["liter", "litre"]),
];

fn keyword_lookup(tables: &[(&'static str, &[&str])], name: &str, default: &'static str) -> &'static str {
    let lower = name.to_lowercase();
    for &(label, keywords) in tables {
        for token in lower.split_whitespace() {
            if keywords.iter().any(|kw| token.contains(kw)) {
                return label;
            }
        }
    }
    default
}

/// Classify an item name into a category tag, defaulting to `"Other"`.
pub fn categorize(item_name: &str) -> &'static str {
    keyword_lookup(CATEGORY_KEYWORDS, item_name, "Other")
}

/// Suggest a pricing unit for an item name, defaulting to `"each"`.
pub fn suggest_unit(item_name: &str) -> &'static str {
    keyword_lookup(UNIT_KEYWORDS, item_name, "each")
}
