use std::cmp::Ordering;
use std::collections::HashSet;

use rust_decimal::Decimal;

use pricelens_core::{ExtractedPrice, MergedReceiptResult};

/// Tunable heuristics for the cross-section merge. The defaults are the
/// field-calibrated values; callers may override them.
#[derive(Debug, Clone)]
pub struct MergePolicy {
    /// Minimum word-overlap similarity for two price-equal candidates to be
    /// treated as the same receipt line.
    pub similarity_threshold: f32,
    /// Aggregate-confidence bonus per section beyond the first — redundant
    /// coverage across overlapping photographs raises trust in the result.
    pub section_bonus: f32,
}

impl Default for MergePolicy {
    fn default() -> Self {
        Self {
            similarity_threshold: 0.7,
            section_bonus: 0.05,
        }
    }
}

/// One capture's contribution to a long-receipt merge: its recognized text
/// and its already-deduplicated candidates.
#[derive(Debug, Clone)]
pub struct SectionCapture {
    pub section_number: u32,
    pub full_text: String,
    pub prices: Vec<ExtractedPrice>,
}

/// Jaccard similarity over whitespace-tokenized, lowercased words.
/// Identical strings score 1.0; either string empty scores 0.0.
pub fn word_overlap_similarity(a: &str, b: &str) -> f32 {
    let a = a.to_lowercase();
    let b = b.to_lowercase();
    let a_words: HashSet<&str> = a.split_whitespace().collect();
    let b_words: HashSet<&str> = b.split_whitespace().collect();

    if a_words.is_empty() || b_words.is_empty() {
        return 0.0;
    }
    if a_words == b_words {
        return 1.0;
    }

    let intersection = a_words.intersection(&b_words).count();
    let union = a_words.union(&b_words).count();
    intersection as f32 / union as f32
}

/// The fuzzy duplicate test used across sections: near-equal price and
/// name similarity at or above the policy threshold. Adjacent section
/// photographs deliberately overlap, so the same line frequently shows up in
/// two sections' text.
pub fn is_probable_duplicate(a: &ExtractedPrice, b: &ExtractedPrice, policy: &MergePolicy) -> bool {
    let price_delta = (a.price - b.price).abs();
    price_delta < Decimal::new(1, 2)
        && word_overlap_similarity(&a.item_name, &b.item_name) >= policy.similarity_threshold
}

/// Merge per-section candidate lists into one ordered, deduplicated result.
///
/// Candidates without a section tag inherit their section's number. A
/// probable-duplicate pair keeps its higher-confidence member. Survivors are
/// ordered by `(section, position.top)` — the receipt's physical top-to-bottom
/// reading order.
pub fn merge_sections(sections: &[SectionCapture], policy: &MergePolicy) -> MergedReceiptResult {
    let mut kept: Vec<ExtractedPrice> = Vec::new();

    for section in sections {
        for candidate in &section.prices {
            let mut candidate = candidate.clone();
            if candidate.section_number.is_none() {
                candidate.section_number = Some(section.section_number);
            }
            match kept
                .iter()
                .position(|existing| is_probable_duplicate(existing, &candidate, policy))
            {
                Some(slot) => {
                    if candidate.confidence > kept[slot].confidence {
                        kept[slot] = candidate;
                    }
                }
                None => kept.push(candidate),
            }
        }
    }

    kept.sort_by(|a, b| {
        a.section_number.cmp(&b.section_number).then(
            a.position
                .top
                .partial_cmp(&b.position.top)
                .unwrap_or(Ordering::Equal),
        )
    });

    let confidence = aggregate_confidence(&kept, sections.len(), policy);
    let full_text = sections
        .iter()
        .map(|s| format!("--- Section {} ---\n{}", s.section_number, s.full_text))
        .collect::<Vec<_>>()
        .join("\n\n");

    MergedReceiptResult {
        prices: kept,
        full_text,
        total_sections: sections.len(),
        confidence,
    }
}

/// Mean candidate confidence plus a small per-extra-section bonus, clamped to
/// [0, 1]. An empty result is always 0.0 regardless of section count.
fn aggregate_confidence(prices: &[ExtractedPrice], section_count: usize, policy: &MergePolicy) -> f32 {
    if prices.is_empty() {
        return 0.0;
    }
    let mean: f32 =
        prices.iter().map(|p| p.confidence).sum::<f32>() / prices.len() as f32;
    let bonus = policy.section_bonus * section_count.saturating_sub(1) as f32;
    (mean + bonus).clamp(0.0, 1.0)
}
