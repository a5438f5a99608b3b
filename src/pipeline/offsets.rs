//! Character offset assignment.
//!
//! The assembler walks each page's words in their final reading order and
//! builds the page text alongside the offsets, so the text and the spans can
//! never disagree. Pages must be fed in page order: the document counters
//! carry over from one page to the next.

use std::path::PathBuf;

use crate::model::{Page, Word};

/// Assigns page-local and document-global spans to words, page by page.
#[derive(Debug, Clone, Default)]
pub struct OffsetAssembler {
    document_index: usize,
    order: usize,
    pages_emitted: usize,
}

impl OffsetAssembler {
    /// Create an assembler positioned at the start of the document.
    pub fn new() -> Self {
        Self::default()
    }

    /// Assemble one page from its words in reading order.
    ///
    /// Words with empty text are dropped. Every page after the first is
    /// preceded in the document text by one page-break character, which is
    /// accounted for here.
    pub fn assemble_page(
        &mut self,
        page_number: u32,
        source_image: impl Into<PathBuf>,
        words: Vec<Word>,
    ) -> Page {
        if self.pages_emitted > 0 {
            self.document_index += 1;
        }

        let mut text = String::new();
        let mut page_index = 0;
        let mut placed = Vec::with_capacity(words.len());

        for mut word in words.into_iter().filter(|w| !w.text.is_empty()) {
            let len = word.char_len();
            word.page = page_number;
            word.order = self.order;
            word.page_index_first = page_index;
            word.page_index_last = page_index + len - 1;
            word.document_index_first = self.document_index;
            word.document_index_last = self.document_index + len - 1;

            let trailer = word.trailer();
            let advance = len + trailer.chars().count();
            text.push_str(&word.text);
            text.push_str(trailer);

            page_index += advance;
            self.document_index += advance;
            self.order += 1;
            placed.push(word);
        }

        debug_assert_eq!(text.chars().count(), page_index);
        debug_assert!(placed.iter().all(|w| {
            crate::model::slice_chars(&text, w.page_index_first, w.page_index_last)
                == Some(w.text.as_str())
        }));

        self.pages_emitted += 1;
        Page {
            page_number,
            text,
            source_image: source_image.into(),
            words: placed,
        }
    }

    /// Characters of document text accounted for so far.
    pub fn document_len(&self) -> usize {
        self.document_index
    }

    /// Words emitted so far.
    pub fn word_count(&self) -> usize {
        self.order
    }

    /// Pages emitted so far.
    pub fn page_count(&self) -> usize {
        self.pages_emitted
    }
}
