use std::io;
use std::path::PathBuf;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::price::ExtractedPrice;

/// One physical photograph in a long-receipt capture sequence.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReceiptSection {
    pub image_path: PathBuf,
    /// 1-based capture order.
    pub section_number: u32,
    pub captured_at: DateTime<Utc>,
}

impl ReceiptSection {
    pub fn new(image_path: impl Into<PathBuf>, section_number: u32) -> Self {
        Self {
            image_path: image_path.into(),
            section_number,
            captured_at: Utc::now(),
        }
    }

    /// Remove the backing image file (the retake / discard flow).
    pub fn discard(self) -> io::Result<()> {
        std::fs::remove_file(&self.image_path)
    }
}

/// The combined output of merging every section of one long receipt.
/// Immutable once built; consumed by the review UI.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MergedReceiptResult {
    pub prices: Vec<ExtractedPrice>,
    /// All sections' recognized text, each prefixed with a section marker,
    /// in section order.
    pub full_text: String,
    pub total_sections: usize,
    /// Aggregate confidence across the surviving candidates, clamped to [0, 1].
    pub confidence: f32,
}
