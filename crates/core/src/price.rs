use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Axis-aligned rectangle locating a recognized line in its source image.
/// Coordinates may be pixel or normalized — the engine only ever compares
/// `top` values for ordering and never does arithmetic on them.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct BoundingBox {
    pub left: f32,
    pub top: f32,
    pub width: f32,
    pub height: f32,
}

impl BoundingBox {
    pub fn new(left: f32, top: f32, width: f32, height: f32) -> Self {
        Self { left, top, width, height }
    }
}

/// One candidate price record extracted from recognized text.
///
/// Created by the parser, refined exactly once by the enrichment transform
/// (category / unit / title-cased name), and never mutated after leaving the
/// dedup/merge boundary — the review UI edits a copy.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExtractedPrice {
    /// Best-guess label; `"Unknown Item"` when no usable text surrounds the price.
    pub item_name: String,
    /// Parsed value; always `0 < price < 100000` (out-of-range matches are
    /// rejected during parsing, not clamped).
    pub price: Decimal,
    /// The exact source line, retained for audit and manual correction.
    pub original_text: String,
    /// Heuristic quality estimate (0.0 = guessed, 1.0 = certain).
    pub confidence: f32,
    pub position: BoundingBox,
    pub category: String,
    pub unit: String,
    /// Set only when produced as part of a multi-section (long receipt) capture.
    pub section_number: Option<u32>,
}

impl ExtractedPrice {
    pub fn new(
        item_name: impl Into<String>,
        price: Decimal,
        original_text: impl Into<String>,
        confidence: f32,
        position: BoundingBox,
    ) -> Self {
        Self {
            item_name: item_name.into(),
            price,
            original_text: original_text.into(),
            confidence: confidence.clamp(0.0, 1.0),
            position,
            category: "Other".to_string(),
            unit: "each".to_string(),
            section_number: None,
        }
    }

    /// Returns a copy tagged with the section it came from.
    pub fn with_section(mut self, section_number: u32) -> Self {
        self.section_number = Some(section_number);
        self
    }
}
