//! # Scan Reflow
//!
//! Reading-order and character-offset reconstruction for OCR'd page images.
//!
//! A recognition backend reports words and lines by position only. This crate
//! turns those boxes into one logically ordered document text and records,
//! for every word, the exact character span it occupies, so that slicing the
//! text at that span reproduces the word.
//!
//! ## Core Features
//!
//! - **Row Segmentation**: jittery backend lines grouped into visual rows
//! - **Layout Classification**: regular prose vs. tabular form per page
//! - **Two-Column Prose**: column separators detected and read left column first
//! - **Tables**: cell grid rebuilt from the widest rows, wrapped cells folded back
//! - **Offsets**: page-local and document-global inclusive spans per word
//! - **Backend I/O**: bounded concurrent recognition with retry, backoff and
//!   operation polling
//!
//! ## Quick Start
//!
//! ```
//! use scan_reflow::model::PageImage;
//! use scan_reflow::pipeline::reconstruct_document;
//! use scan_reflow::recognition::BackendResponse;
//!
//! let response: BackendResponse = serde_json::from_str(
//!     r#"{"kind": "words", "words": [
//!         {"text": "Chief", "bounding_box": {"left": 0, "top": 0, "right": 60, "bottom": 20},
//!          "break_type": "SPACE"},
//!         {"text": "complaint",
//!          "bounding_box": {"left": 70, "top": 0, "right": 180, "bottom": 20},
//!          "break_type": "LINE_BREAK"}
//!     ]}"#,
//! )
//! .unwrap();
//!
//! let document = reconstruct_document(vec![(PageImage::new(1, "page-1.png"), response)]);
//! assert_eq!(document.text, "Chief complaint\n");
//! let word = &document.pages[0].words[1];
//! assert_eq!((word.document_index_first, word.document_index_last), (6, 14));
//! assert!(document.verify_offsets().is_ok());
//! ```

#![warn(missing_docs)]

// Error handling
pub mod error;

// Configuration
pub mod config;

// Geometry primitives
pub mod geometry;

// Words, pages and documents
pub mod model;

// Backend contract and I/O
pub mod recognition;

// Reading order
pub mod layout;

// Orchestration
pub mod pipeline;

// Re-exports
pub use config::ReflowConfig;
pub use error::{BackendError, Error, Result};
pub use model::{Document, Page, PageImage, Word, PAGE_BREAK};
pub use pipeline::{reconstruct_document, DocumentProcessor};
pub use recognition::{AsyncRecognitionBackend, BackendResponse, RecognitionBackend};
