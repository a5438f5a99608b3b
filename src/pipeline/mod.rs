//! Document reconstruction pipeline.
//!
//! ```text
//! PageImage[]
//!     ↓
//! [fetch_pages] (bounded concurrent recognition, page order kept)
//!     ↓
//! BackendResponse[]
//!     ↓
//! [normalize] → LineBlock[] → [reconstruct_page] (rows → classify → reorder)
//!     ↓
//! Word[] in reading order
//!     ↓
//! [OffsetAssembler] (page text + character spans)
//!     ↓
//! Document
//! ```
//!
//! Recognition is the only concurrent stage. Everything after it runs page by
//! page, in page-number order, because the document offsets and the word
//! order are counters carried from one page to the next.
//!
//! [fetch_pages]: crate::recognition::fetch_pages
//! [normalize]: crate::recognition::normalize

pub mod document;
pub mod offsets;

// Re-export main types
pub use document::{
    reconstruct_document, reconstruct_page, DocumentAssembler, DocumentProcessor, PageLayout,
};
pub use offsets::OffsetAssembler;
