pub mod dedup;
pub mod enhance;
pub mod merge;
pub mod parser;
pub mod patterns;
pub mod pipeline;
pub mod recognizer;

pub use dedup::dedup_exact;
pub use enhance::{
    encode_png, select_best_variant, EnhanceError, EnhancementVariant, ImageEnhancer,
    SelectionError, StandardEnhancer, VariantSelection,
};
pub use merge::{
    is_probable_duplicate, merge_sections, word_overlap_similarity, MergePolicy, SectionCapture,
};
pub use parser::{enrich, parse_line, parse_recognized};
pub use pipeline::{
    BatchOutcome, BatchProgress, CancelToken, CaptureResult, EngineError, PriceCapturePipeline,
    SectionOutcome,
};
pub use recognizer::{
    MockRecognizer, RecognizedBlock, RecognizedLine, RecognizedText, RecognizerError,
    TextRecognizer,
};
