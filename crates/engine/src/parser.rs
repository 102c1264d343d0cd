use std::cmp::Ordering;
use std::str::FromStr;

use regex::Captures;
use rust_decimal::Decimal;

use pricelens_core::ExtractedPrice;

use crate::dedup::dedup_exact;
use crate::patterns::{
    self, categorize, price_matchers, re_currency_marker, suggest_unit,
};
use crate::recognizer::{RecognizedLine, RecognizedText};

/// Parse recognized text into a ranked, capped, enriched candidate list.
///
/// Per line the ordered price matchers are tried and the first pattern that
/// matches wins; every match of that pattern on the line yields one
/// candidate. Candidates are then exact-deduplicated, sorted by confidence
/// descending, capped, and enriched (category, unit, title-cased name).
pub fn parse_recognized(text: &RecognizedText) -> Vec<ExtractedPrice> {
    let candidates: Vec<ExtractedPrice> =
        text.lines().flat_map(parse_line).collect();

    let mut deduped = dedup_exact(candidates);
    deduped.sort_by(|a, b| {
        b.confidence
            .partial_cmp(&a.confidence)
            .unwrap_or(Ordering::Equal)
    });
    deduped.truncate(patterns::MAX_CANDIDATES);
    deduped.into_iter().map(enrich).collect()
}

/// Parse one recognized line into zero or more raw candidates.
pub fn parse_line(line: &RecognizedLine) -> Vec<ExtractedPrice> {
    for matcher in price_matchers() {
        let found: Vec<ExtractedPrice> = matcher
            .captures_iter(&line.text)
            .filter_map(|caps| candidate_from_match(line, &caps))
            .collect();
        if !found.is_empty() {
            return found;
        }
    }
    Vec::new()
}

fn candidate_from_match(line: &RecognizedLine, caps: &Captures) -> Option<ExtractedPrice> {
    let whole = caps.get(0)?;
    let value = parse_amount(caps.get(1)?.as_str())?;
    let item_name = derive_item_name(&line.text, whole.start(), whole.end());
    let confidence = score_line(&line.text, value);
    Some(ExtractedPrice::new(
        item_name,
        value,
        line.text.clone(),
        confidence,
        line.bounding_box,
    ))
}

/// Strip grouping and currency residue and parse to a decimal. Values outside
/// `(0, MAX_PRICE)` are rejected, not clamped.
fn parse_amount(raw: &str) -> Option<Decimal> {
    let clean: String = raw
        .chars()
        .filter(|c| c.is_ascii_digit() || *c == '.')
        .collect();
    let value = Decimal::from_str(&clean).ok()?;
    if value <= Decimal::ZERO || value >= Decimal::from(patterns::MAX_PRICE) {
        return None;
    }
    Some(value)
}

/// Prefer the text before the price as the label; fall back to short trailing
/// text; otherwise "Unknown Item".
fn derive_item_name(text: &str, match_start: usize, match_end: usize) -> String {
    let before = clean_label(&text[..match_start]);
    if !before.is_empty() {
        return capitalize_first(&before);
    }
    let after = clean_label(&text[match_end..]);
    if !after.is_empty() && after.chars().count() < patterns::MAX_TRAILING_LABEL_CHARS {
        return capitalize_first(&after);
    }
    "Unknown Item".to_string()
}

/// Keep letters, digits, whitespace and parentheses; trim the rest away.
fn clean_label(s: &str) -> String {
    s.chars()
        .filter(|c| c.is_alphanumeric() || c.is_whitespace() || matches!(c, '(' | ')'))
        .collect::<String>()
        .trim()
        .to_string()
}

fn capitalize_first(s: &str) -> String {
    let mut chars = s.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().collect::<String>() + chars.as_str(),
        None => String::new(),
    }
}

/// Additive confidence heuristic, clamped to [0, 1].
fn score_line(text: &str, value: Decimal) -> f32 {
    let mut confidence = patterns::BASE_CONFIDENCE;
    if re_currency_marker().is_match(text) {
        confidence += patterns::CURRENCY_BONUS;
    }
    if value >= Decimal::from(patterns::PLAUSIBLE_MIN)
        && value <= Decimal::from(patterns::PLAUSIBLE_MAX)
    {
        confidence += patterns::PLAUSIBLE_RANGE_BONUS;
    }
    if text.split_whitespace().count() >= 2 {
        confidence += patterns::MULTI_TOKEN_BONUS;
    }
    if text.chars().count() > patterns::LONG_LINE_CHARS {
        confidence -= patterns::LONG_LINE_PENALTY;
    }
    confidence.clamp(0.0, 1.0)
}

/// The one-time post-parse refinement: whitespace-normalized title-cased
/// name, keyword category and unit. Returns a new record, never mutates.
pub fn enrich(candidate: ExtractedPrice) -> ExtractedPrice {
    let item_name = title_case(&candidate.item_name);
    let category = categorize(&item_name).to_string();
    let unit = suggest_unit(&item_name).to_string();
    ExtractedPrice { item_name, category, unit, ..candidate }
}

fn title_case(s: &str) -> String {
    s.split_whitespace()
        .map(|word| {
            let mut chars = word.chars();
            match chars.next() {
                Some(first) => first
                    .to_uppercase()
                    .chain(chars.flat_map(char::to_lowercase))
                    .collect(),
                None => String::new(),
            }
        })
        .collect::<Vec<String>>()
        .join(" ")
}

#[cfg(test)]
mod tests {
    use super::*;
    use pricelens_core::BoundingBox;
    use crate::recognizer::{RecognizedBlock, RecognizedLine};

    fn line(text: &str) -> RecognizedLine {
        RecognizedLine {
            text: text.to_string(),
            bounding_box: BoundingBox::default(),
        }
    }

    fn recognized(lines: &[&str]) -> RecognizedText {
        RecognizedText {
            blocks: vec![RecognizedBlock {
                lines: lines
                    .iter()
                    .enumerate()
                    .map(|(i, text)| RecognizedLine {
                        text: text.to_string(),
                        bounding_box: BoundingBox::new(0.0, i as f32 * 20.0, 320.0, 18.0),
                    })
                    .collect(),
            }],
        }
    }

    // ── Line parsing ─────────────────────────────────────────────────────────

    #[test]
    fn currency_prefixed_line_parses() {
        let result = parse_line(&line("Rice 1lb J$120.00"));
        assert_eq!(result.len(), 1);
        assert_eq!(result[0].price, Decimal::new(12000, 2));
        assert_eq!(result[0].item_name, "Rice 1lb");
        assert_eq!(result[0].original_text, "Rice 1lb J$120.00");
    }

    #[test]
    fn fully_scored_line_reaches_point_nine() {
        // base 0.5 + currency 0.2 + plausible 0.1 + multi-token 0.1
        let result = parse_line(&line("Rice 1lb J$120.00"));
        assert!((result[0].confidence - 0.9).abs() < 1e-6);
    }

    #[test]
    fn currency_line_confidence_at_least_point_seven() {
        for price in ["5.00", "120.00", "15000.00", "99999.99"] {
            let text = format!("Item J${price}");
            let result = parse_line(&line(&text));
            assert_eq!(result.len(), 1, "no candidate for {text}");
            assert!(
                result[0].confidence >= 0.7,
                "confidence {} for {text}",
                result[0].confidence
            );
        }
    }

    #[test]
    fn bare_decimal_needs_trailing_double_zero() {
        assert_eq!(parse_line(&line("Milk 220.00")).len(), 1);
        assert!(parse_line(&line("Milk 220.50")).is_empty());
    }

    #[test]
    fn rejects_zero_and_out_of_range_values() {
        assert!(parse_line(&line("Freebie J$0.00")).is_empty());
        assert!(parse_line(&line("Car J$250,000.00")).is_empty());
    }

    #[test]
    fn first_matching_pattern_wins() {
        // Prefixed and bare patterns both apply; only the prefixed match
        // should produce a candidate.
        let result = parse_line(&line("Rice J$120.00"));
        assert_eq!(result.len(), 1);
    }

    #[test]
    fn trailing_text_used_when_no_prefix() {
        let result = parse_line(&line("J$120.00 Rice"));
        assert_eq!(result[0].item_name, "Rice");
    }

    #[test]
    fn unknown_item_when_no_label_text() {
        let result = parse_line(&line("J$120.00"));
        assert_eq!(result[0].item_name, "Unknown Item");
    }

    #[test]
    fn trailing_label_cutoff_counts_chars_not_bytes() {
        // 27 chars but 32 bytes — must still be accepted as a label.
        let result = parse_line(&line("J$120.00 Crème Brûlée Café Entremets"));
        assert_eq!(result[0].item_name, "Crème Brûlée Café Entremets");
    }

    #[test]
    fn long_trailing_text_is_not_a_label() {
        let tail = "a very long trailing description that runs on";
        let result = parse_line(&line(&format!("J$120.00 {tail}")));
        assert_eq!(result[0].item_name, "Unknown Item");
    }

    #[test]
    fn label_strips_punctuation_but_keeps_parens() {
        let result = parse_line(&line("rice (white), premium: J$120.00"));
        assert_eq!(result[0].item_name, "Rice (white) premium");
    }

    #[test]
    fn long_line_is_penalized() {
        let filler = "x".repeat(110);
        let short = parse_line(&line("Item J$120.00"));
        let long = parse_line(&line(&format!("Item J$120.00 {filler}")));
        assert!((short[0].confidence - long[0].confidence - 0.2).abs() < 1e-6);
    }

    #[test]
    fn lone_number_gets_no_multi_token_bonus() {
        let result = parse_line(&line("120.00"));
        // base 0.5 + plausible 0.1 only
        assert!((result[0].confidence - 0.6).abs() < 1e-6);
    }

    // ── Block parsing ────────────────────────────────────────────────────────

    #[test]
    fn parse_recognized_sorts_by_confidence() {
        let text = recognized(&["220.00", "Milk 1L J$220.00"]);
        let result = parse_recognized(&text);
        assert_eq!(result.len(), 2);
        assert!(result[0].confidence > result[1].confidence);
        assert_eq!(result[0].item_name, "Milk 1l");
    }

    #[test]
    fn parse_recognized_caps_candidates() {
        let lines: Vec<String> = (1..=15)
            .map(|i| format!("Item {i} J${}.00", 100 + i))
            .collect();
        let refs: Vec<&str> = lines.iter().map(String::as_str).collect();
        let result = parse_recognized(&recognized(&refs));
        assert_eq!(result.len(), crate::patterns::MAX_CANDIDATES);
    }

    #[test]
    fn parse_recognized_collapses_exact_duplicates() {
        let text = recognized(&["Rice 1lb J$120.00", "Rice 1lb J$120.00"]);
        assert_eq!(parse_recognized(&text).len(), 1);
    }

    #[test]
    fn no_price_lines_is_empty_not_error() {
        let text = recognized(&["SHOPPER'S FAIR SUPERMARKET", "Thank you, come again"]);
        assert!(parse_recognized(&text).is_empty());
    }

    // ── Enrichment ───────────────────────────────────────────────────────────

    #[test]
    fn enrich_assigns_category_and_unit() {
        let text = recognized(&["Rice 1lb J$120.00"]);
        let result = parse_recognized(&text);
        assert_eq!(result[0].category, "Groceries");
        assert_eq!(result[0].unit, "per lb");
    }

    #[test]
    fn enrich_title_cases_and_normalizes_whitespace() {
        let text = recognized(&["FRESH  MILK   1L J$220.00"]);
        let result = parse_recognized(&text);
        assert_eq!(result[0].item_name, "Fresh Milk 1l");
        assert_eq!(result[0].category, "Dairy");
    }

    #[test]
    fn enrich_defaults_to_other_and_each() {
        let text = recognized(&["Paper Towels J$350.00"]);
        let result = parse_recognized(&text);
        assert_eq!(result[0].category, "Other");
        assert_eq!(result[0].unit, "each");
    }
}
