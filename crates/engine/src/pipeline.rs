use std::path::Path;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use thiserror::Error;
use tokio::sync::mpsc;

use pricelens_core::{ExtractedPrice, MergedReceiptResult, ReceiptSection};

use crate::enhance::{select_best_variant, EnhancementVariant, ImageEnhancer, SelectionError};
use crate::merge::{merge_sections, MergePolicy, SectionCapture};
use crate::recognizer::TextRecognizer;

#[derive(Debug, Error)]
pub enum EngineError {
    /// Corrupt or undecodable source image — fatal for that image only.
    #[error("Could not read image: {0}")]
    ImageUnreadable(String),
    /// The external engine failed on every enhancement variant.
    #[error("Text recognition failed on every enhancement variant: {0}")]
    RecognitionFailure(String),
    /// Cooperative cancellation — a terminal state, not a failure.
    #[error("Processing cancelled")]
    Cancelled,
}

/// Cooperative cancellation flag shared between the caller and a running
/// batch. Checked between images and between enhancement variants.
#[derive(Clone, Default)]
pub struct CancelToken(Arc<AtomicBool>);

impl CancelToken {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.0.store(true, Ordering::Relaxed);
    }

    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::Relaxed)
    }
}

/// Emitted after each image in a batch completes (successfully or not).
#[derive(Debug, Clone, serde::Serialize)]
pub struct BatchProgress {
    pub current: usize,
    pub total: usize,
    pub label: String,
}

/// The result of processing one capture.
#[derive(Debug, Clone)]
pub struct CaptureResult {
    pub full_text: String,
    pub prices: Vec<ExtractedPrice>,
    /// Which enhancement variant won the selection.
    pub variant: EnhancementVariant,
}

#[derive(Debug)]
pub struct SectionOutcome {
    pub section_number: u32,
    pub result: Result<CaptureResult, EngineError>,
}

/// Everything a long-receipt job produces: the per-section success/failure
/// map, the merged result built from the successful sections, and whether the
/// job was cut short by cancellation.
#[derive(Debug)]
pub struct BatchOutcome {
    pub sections: Vec<SectionOutcome>,
    pub merged: MergedReceiptResult,
    pub cancelled: bool,
}

/// Orchestrates: decode → variant selection → parse → dedup → enrich, and the
/// sequential multi-section merge on top of it. No shared mutable state — each
/// invocation works on its own inputs and returns a fresh result.
pub struct PriceCapturePipeline<R: TextRecognizer, E: ImageEnhancer> {
    recognizer: R,
    enhancer: E,
    merge_policy: MergePolicy,
}

impl<R: TextRecognizer, E: ImageEnhancer> PriceCapturePipeline<R, E> {
    pub fn new(recognizer: R, enhancer: E) -> Self {
        Self {
            recognizer,
            enhancer,
            merge_policy: MergePolicy::default(),
        }
    }

    pub fn with_merge_policy(mut self, merge_policy: MergePolicy) -> Self {
        self.merge_policy = merge_policy;
        self
    }

    /// Process one capture from raw image bytes. An empty price list is a
    /// legitimate "no prices found" result, not an error.
    pub fn process_capture(&self, image_bytes: &[u8]) -> Result<CaptureResult, EngineError> {
        self.process_capture_inner(image_bytes, &CancelToken::new())
    }

    fn process_capture_inner(
        &self,
        image_bytes: &[u8],
        cancel: &CancelToken,
    ) -> Result<CaptureResult, EngineError> {
        let image = image::load_from_memory(image_bytes)
            .map_err(|e| EngineError::ImageUnreadable(e.to_string()))?;

        let selection = select_best_variant(&self.enhancer, &self.recognizer, &image, cancel)
            .map_err(|e| match e {
                SelectionError::AllVariantsFailed(msg) => EngineError::RecognitionFailure(msg),
                SelectionError::Cancelled => EngineError::Cancelled,
            })?;

        Ok(CaptureResult {
            full_text: selection.recognized.full_text(),
            prices: selection.candidates,
            variant: selection.variant,
        })
    }

    /// Process one capture from a file on disk.
    pub async fn process_capture_file(&self, path: &Path) -> Result<CaptureResult, EngineError> {
        self.process_file_inner(path, &CancelToken::new()).await
    }

    async fn process_file_inner(
        &self,
        path: &Path,
        cancel: &CancelToken,
    ) -> Result<CaptureResult, EngineError> {
        let bytes = tokio::fs::read(path)
            .await
            .map_err(|e| EngineError::ImageUnreadable(format!("{}: {e}", path.display())))?;
        self.process_capture_inner(&bytes, cancel)
    }

    /// Process a long receipt photographed as multiple overlapping sections.
    ///
    /// Sections are processed sequentially in the given order. A failing
    /// section never aborts the rest of the batch; its error is recorded in
    /// the outcome map. Cancellation stops before the next image and keeps
    /// every per-section result already produced. Section image files are
    /// removed when the job finishes, completed or cancelled.
    pub async fn process_long_receipt(
        &self,
        sections: Vec<ReceiptSection>,
        progress: Option<mpsc::Sender<BatchProgress>>,
        cancel: &CancelToken,
    ) -> BatchOutcome {
        let total = sections.len();
        let mut outcomes: Vec<SectionOutcome> = Vec::with_capacity(total);
        let mut captured: Vec<SectionCapture> = Vec::new();
        let mut cancelled = false;

        for (index, section) in sections.iter().enumerate() {
            if cancel.is_cancelled() {
                cancelled = true;
                break;
            }

            tracing::info!(
                "Processing section {} of {total}: {}",
                section.section_number,
                section.image_path.display()
            );

            match self.process_file_inner(&section.image_path, cancel).await {
                Ok(capture) => {
                    captured.push(SectionCapture {
                        section_number: section.section_number,
                        full_text: capture.full_text.clone(),
                        prices: capture
                            .prices
                            .iter()
                            .cloned()
                            .map(|p| p.with_section(section.section_number))
                            .collect(),
                    });
                    outcomes.push(SectionOutcome {
                        section_number: section.section_number,
                        result: Ok(capture),
                    });
                }
                Err(EngineError::Cancelled) => {
                    cancelled = true;
                    break;
                }
                Err(e) => {
                    tracing::warn!("Section {} failed: {e}", section.section_number);
                    outcomes.push(SectionOutcome {
                        section_number: section.section_number,
                        result: Err(e),
                    });
                }
            }

            if let Some(tx) = &progress {
                let _ = tx.try_send(BatchProgress {
                    current: index + 1,
                    total,
                    label: format!("Section {}", section.section_number),
                });
            }
        }

        let merged = merge_sections(&captured, &self.merge_policy);
        remove_section_files(&sections).await;

        BatchOutcome { sections: outcomes, merged, cancelled }
    }
}

/// Section images are job-scoped temporaries; remove whatever is left once
/// the job ends. Removal failures are logged, never propagated.
async fn remove_section_files(sections: &[ReceiptSection]) {
    for section in sections {
        if let Err(e) = tokio::fs::remove_file(&section.image_path).await {
            tracing::warn!(
                "Failed to remove section image {}: {e}",
                section.image_path.display()
            );
        }
    }
}
