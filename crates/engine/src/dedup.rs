use std::collections::HashMap;

use rust_decimal::Decimal;

use pricelens_core::ExtractedPrice;

/// Collapse exact duplicates within one capture.
///
/// Key is `(price rounded to 2 decimals, item name exact)`; the higher-
/// confidence candidate wins its key. First-seen order is otherwise
/// preserved. Cheap compared to the fuzzy cross-section pass, so it runs on
/// every single-image parse.
pub fn dedup_exact(candidates: Vec<ExtractedPrice>) -> Vec<ExtractedPrice> {
    let mut kept: Vec<ExtractedPrice> = Vec::with_capacity(candidates.len());
    let mut index: HashMap<(Decimal, String), usize> = HashMap::new();

    for candidate in candidates {
        let key = (
            candidate.price.round_dp(2).normalize(),
            candidate.item_name.clone(),
        );
        match index.get(&key) {
            Some(&slot) => {
                if candidate.confidence > kept[slot].confidence {
                    kept[slot] = candidate;
                }
            }
            None => {
                index.insert(key, kept.len());
                kept.push(candidate);
            }
        }
    }

    kept
}

#[cfg(test)]
mod tests {
    use super::*;
    use pricelens_core::BoundingBox;
    use std::str::FromStr;

    fn candidate(name: &str, price: &str, confidence: f32) -> ExtractedPrice {
        ExtractedPrice::new(
            name,
            Decimal::from_str(price).unwrap(),
            format!("{name} J${price}"),
            confidence,
            BoundingBox::default(),
        )
    }

    #[test]
    fn keeps_higher_confidence_duplicate() {
        let out = dedup_exact(vec![
            candidate("Rice 1lb", "120.00", 0.6),
            candidate("Rice 1lb", "120.00", 0.9),
        ]);
        assert_eq!(out.len(), 1);
        assert_eq!(out[0].confidence, 0.9);
    }

    #[test]
    fn price_key_rounds_to_two_decimals() {
        let out = dedup_exact(vec![
            candidate("Rice 1lb", "120.001", 0.6),
            candidate("Rice 1lb", "120.00", 0.9),
        ]);
        assert_eq!(out.len(), 1);
    }

    #[test]
    fn different_names_both_survive() {
        let out = dedup_exact(vec![
            candidate("Rice 1lb", "120.00", 0.6),
            candidate("Rice 2lb", "120.00", 0.9),
        ]);
        assert_eq!(out.len(), 2);
    }

    #[test]
    fn different_prices_both_survive() {
        let out = dedup_exact(vec![
            candidate("Rice 1lb", "120.00", 0.6),
            candidate("Rice 1lb", "130.00", 0.9),
        ]);
        assert_eq!(out.len(), 2);
    }

    #[test]
    fn idempotent() {
        let input = vec![
            candidate("Rice 1lb", "120.00", 0.6),
            candidate("Rice 1lb", "120.00", 0.9),
            candidate("Milk 1L", "220.00", 0.8),
        ];
        let once = dedup_exact(input);
        let twice = dedup_exact(once.clone());
        assert_eq!(once, twice);
    }

    #[test]
    fn first_seen_order_preserved() {
        let out = dedup_exact(vec![
            candidate("Bread", "300.00", 0.5),
            candidate("Milk 1L", "220.00", 0.8),
            candidate("Bread", "300.00", 0.9),
        ]);
        assert_eq!(out.len(), 2);
        assert_eq!(out[0].item_name, "Bread");
        assert_eq!(out[0].confidence, 0.9);
        assert_eq!(out[1].item_name, "Milk 1L");
    }
}
