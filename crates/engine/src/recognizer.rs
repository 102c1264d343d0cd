use serde::{Deserialize, Serialize};
use thiserror::Error;

use pricelens_core::BoundingBox;

#[derive(Debug, Error)]
pub enum RecognizerError {
    #[error("Image decode error: {0}")]
    ImageDecode(String),
    #[error("Recognition engine error: {0}")]
    Engine(String),
}

/// One recognized line of text with its location in the source image.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RecognizedLine {
    pub text: String,
    pub bounding_box: BoundingBox,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RecognizedBlock {
    pub lines: Vec<RecognizedLine>,
}

/// The recognition engine's output for one image.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RecognizedText {
    pub blocks: Vec<RecognizedBlock>,
}

impl RecognizedText {
    /// Build from plain newline-separated text, assigning synthetic stacked
    /// bounding boxes in reading order.
    pub fn from_plain(text: &str) -> Self {
        let lines = text
            .lines()
            .enumerate()
            .map(|(i, line)| RecognizedLine {
                text: line.to_string(),
                bounding_box: BoundingBox::new(0.0, i as f32 * 20.0, 320.0, 18.0),
            })
            .collect();
        Self { blocks: vec![RecognizedBlock { lines }] }
    }

    /// All lines across all blocks, in reading order.
    pub fn lines(&self) -> impl Iterator<Item = &RecognizedLine> {
        self.blocks.iter().flat_map(|block| block.lines.iter())
    }

    pub fn full_text(&self) -> String {
        self.lines()
            .map(|line| line.text.as_str())
            .collect::<Vec<_>>()
            .join("\n")
    }

    pub fn is_empty(&self) -> bool {
        self.lines().next().is_none()
    }
}

/// Abstraction over an external text-recognition engine.
/// Implementations accept raw PNG/JPEG image bytes and return the recognized
/// text with line bounding boxes.
pub trait TextRecognizer: Send + Sync {
    fn recognize(&self, image_bytes: &[u8]) -> Result<RecognizedText, RecognizerError>;
}

// ── Mock backend (always available, used for tests) ───────────────────────────

/// Returns a pre-set string for every image — useful for exercising the
/// extraction pipeline without a real recognition engine.
pub struct MockRecognizer {
    pub text: String,
}

impl MockRecognizer {
    pub fn new(text: impl Into<String>) -> Self {
        Self { text: text.into() }
    }
}

impl TextRecognizer for MockRecognizer {
    fn recognize(&self, _image_bytes: &[u8]) -> Result<RecognizedText, RecognizerError> {
        Ok(RecognizedText::from_plain(&self.text))
    }
}
