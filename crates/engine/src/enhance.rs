use std::fmt;
use std::io::Cursor;

use image::{DynamicImage, GrayImage, ImageBuffer, Luma};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use pricelens_core::ExtractedPrice;

use crate::parser;
use crate::pipeline::CancelToken;
use crate::recognizer::{RecognizedText, TextRecognizer};

#[derive(Debug, Error)]
pub enum EnhanceError {
    #[error("Enhancement failed: {0}")]
    Transform(String),
    #[error("Failed to encode enhanced image: {0}")]
    Encode(String),
}

/// The fixed, ordered set of enhancement variants tried per capture. Order
/// matters: score ties resolve to the earliest variant, so the untouched
/// original is preferred when nothing beats it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum EnhancementVariant {
    Original,
    ContrastBoost,
    BrightnessAdjust,
    Sharpen,
    Grayscale,
    Binarize,
}

impl EnhancementVariant {
    pub const ORDERED: [EnhancementVariant; 6] = [
        EnhancementVariant::Original,
        EnhancementVariant::ContrastBoost,
        EnhancementVariant::BrightnessAdjust,
        EnhancementVariant::Sharpen,
        EnhancementVariant::Grayscale,
        EnhancementVariant::Binarize,
    ];

    pub fn label(self) -> &'static str {
        match self {
            EnhancementVariant::Original => "original",
            EnhancementVariant::ContrastBoost => "contrast-boost",
            EnhancementVariant::BrightnessAdjust => "brightness-adjust",
            EnhancementVariant::Sharpen => "sharpen",
            EnhancementVariant::Grayscale => "grayscale",
            EnhancementVariant::Binarize => "binarize",
        }
    }
}

impl fmt::Display for EnhancementVariant {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.label())
    }
}

/// Abstraction over the external pixel-transform producer. A failing variant
/// scores zero during selection; it is never fatal on its own.
pub trait ImageEnhancer: Send + Sync {
    fn enhance(
        &self,
        image: &DynamicImage,
        variant: EnhancementVariant,
    ) -> Result<DynamicImage, EnhanceError>;
}

/// Default enhancer built on the `image` crate.
pub struct StandardEnhancer;

impl ImageEnhancer for StandardEnhancer {
    fn enhance(
        &self,
        image: &DynamicImage,
        variant: EnhancementVariant,
    ) -> Result<DynamicImage, EnhanceError> {
        Ok(match variant {
            EnhancementVariant::Original => image.clone(),
            EnhancementVariant::ContrastBoost => {
                DynamicImage::ImageLuma8(stretch_contrast(image.to_luma8()))
            }
            EnhancementVariant::BrightnessAdjust => image.brighten(30),
            EnhancementVariant::Sharpen => image.unsharpen(1.5, 4),
            EnhancementVariant::Grayscale => image.grayscale(),
            EnhancementVariant::Binarize => {
                DynamicImage::ImageLuma8(binarize(image.to_luma8()))
            }
        })
    }
}

/// Stretch the grayscale histogram to the full 0–255 range.
fn stretch_contrast(gray: GrayImage) -> GrayImage {
    let (min_px, max_px) = gray
        .pixels()
        .fold((255u8, 0u8), |(mn, mx), p| (mn.min(p[0]), mx.max(p[0])));

    if max_px == min_px {
        return gray;
    }

    let range = (max_px - min_px) as u32;
    ImageBuffer::from_fn(gray.width(), gray.height(), |x, y| {
        let p = gray.get_pixel(x, y)[0];
        Luma([((p - min_px) as u32 * 255 / range) as u8])
    })
}

/// Threshold at the mean brightness: darker pixels become text (black),
/// everything else background (white).
fn binarize(gray: GrayImage) -> GrayImage {
    let total: u64 = gray.pixels().map(|p| p[0] as u64).sum();
    let count = (gray.width() as u64 * gray.height() as u64).max(1);
    let mean = (total / count) as u8;

    ImageBuffer::from_fn(gray.width(), gray.height(), |x, y| {
        if gray.get_pixel(x, y)[0] < mean {
            Luma([0u8])
        } else {
            Luma([255u8])
        }
    })
}

/// Encode an enhanced image as PNG bytes for the recognition engine.
pub fn encode_png(img: &DynamicImage) -> Result<Vec<u8>, EnhanceError> {
    let mut buf = Vec::new();
    img.write_to(&mut Cursor::new(&mut buf), image::ImageFormat::Png)
        .map_err(|e| EnhanceError::Encode(e.to_string()))?;
    Ok(buf)
}

// ── Variant selection ─────────────────────────────────────────────────────────

#[derive(Debug, Error)]
pub enum SelectionError {
    #[error("Text recognition failed on every enhancement variant: {0}")]
    AllVariantsFailed(String),
    #[error("Processing cancelled")]
    Cancelled,
}

/// The winning variant with its recognition output and parsed candidates.
#[derive(Debug, Clone)]
pub struct VariantSelection {
    pub variant: EnhancementVariant,
    pub recognized: RecognizedText,
    pub candidates: Vec<ExtractedPrice>,
}

/// Try every enhancement variant in order and keep the one whose recognized
/// text parses best. The parser acts purely as a scoring oracle here:
/// score = candidate count + mean candidate confidence, ties resolved to the
/// earliest variant.
///
/// Zero candidates on every variant is a legitimate "no prices found"
/// outcome — the first successfully recognized variant's text (the original,
/// unless its recognition failed) is returned with an empty candidate list.
pub fn select_best_variant<E, R>(
    enhancer: &E,
    recognizer: &R,
    image: &DynamicImage,
    cancel: &CancelToken,
) -> Result<VariantSelection, SelectionError>
where
    E: ImageEnhancer + ?Sized,
    R: TextRecognizer + ?Sized,
{
    let mut best: Option<(f32, VariantSelection)> = None;
    let mut last_error: Option<String> = None;

    for variant in EnhancementVariant::ORDERED {
        if cancel.is_cancelled() {
            return Err(SelectionError::Cancelled);
        }

        let enhanced = match enhancer.enhance(image, variant) {
            Ok(img) => img,
            Err(e) => {
                tracing::warn!("Enhancement variant {variant} failed: {e}");
                continue;
            }
        };
        let bytes = match encode_png(&enhanced) {
            Ok(b) => b,
            Err(e) => {
                tracing::warn!("Could not encode {variant} variant: {e}");
                continue;
            }
        };
        let recognized = match recognizer.recognize(&bytes) {
            Ok(text) => text,
            Err(e) => {
                last_error = Some(e.to_string());
                continue;
            }
        };

        let candidates = parser::parse_recognized(&recognized);
        let score = variant_score(&candidates);
        if best.as_ref().map_or(true, |(top, _)| score > *top) {
            best = Some((score, VariantSelection { variant, recognized, candidates }));
        }
    }

    match best {
        Some((_, selection)) => Ok(selection),
        None => Err(SelectionError::AllVariantsFailed(
            last_error.unwrap_or_else(|| "no variant produced a recognition result".to_string()),
        )),
    }
}

fn variant_score(candidates: &[ExtractedPrice]) -> f32 {
    if candidates.is_empty() {
        return 0.0;
    }
    let mean: f32 =
        candidates.iter().map(|c| c.confidence).sum::<f32>() / candidates.len() as f32;
    candidates.len() as f32 + mean
}
