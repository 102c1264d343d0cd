pub mod price;
pub mod section;

pub use price::{BoundingBox, ExtractedPrice};
pub use section::{MergedReceiptResult, ReceiptSection};
