//! Page reconstruction and document aggregation.

use std::sync::Arc;

use crate::config::ReflowConfig;
use crate::error::Result;
use crate::layout::{
    classify_layout, reorder_regular, reorder_tabular, segment_rows, single_stream,
    Classification, LayoutKind,
};
use crate::model::{Document, LineBlock, Page, PageImage, Word, PAGE_BREAK};
use crate::pipeline::offsets::OffsetAssembler;
use crate::recognition::{fetch_pages, normalize, BackendResponse, RecognitionBackend};

/// Reading order of one page, before offsets are assigned.
#[derive(Debug, Clone, PartialEq)]
pub struct PageLayout {
    /// How the page was classified
    pub classification: Classification,
    /// Words in reading order
    pub words: Vec<Word>,
    /// Whether the reorderer failed and single-stream order was used
    pub fell_back: bool,
}

/// Reconstruct the reading order of a page from its line blocks.
///
/// Never fails: if the chosen reorderer rejects the page, the rows are read
/// top to bottom, left to right instead.
pub fn reconstruct_page(blocks: Vec<LineBlock>) -> PageLayout {
    let rows = segment_rows(blocks);
    let classification = classify_layout(&rows);
    log::debug!(
        "{} row(s), tabular ratio {:.2} -> {:?}",
        rows.len(),
        classification.tabular_ratio,
        classification.kind
    );

    let reordered = match classification.kind {
        LayoutKind::Regular => reorder_regular(&rows),
        LayoutKind::Tabular => reorder_tabular(&rows),
    };

    match reordered {
        Ok(words) => PageLayout {
            classification,
            words,
            fell_back: false,
        },
        Err(e) => {
            log::warn!("Layout reconstruction failed ({}), using single-stream order", e);
            PageLayout {
                classification,
                words: single_stream(&rows),
                fell_back: true,
            }
        },
    }
}

/// Stitches reconstructed pages into a [`Document`], in the order pushed.
#[derive(Debug, Default)]
pub struct DocumentAssembler {
    offsets: OffsetAssembler,
    pages: Vec<Page>,
}

impl DocumentAssembler {
    /// Create an empty assembler.
    pub fn new() -> Self {
        Self::default()
    }

    /// Assign offsets to a page's words and append the page.
    pub fn push_page(&mut self, image: &PageImage, words: Vec<Word>) -> &Page {
        let page = self
            .offsets
            .assemble_page(image.page_number, image.path.clone(), words);
        self.pages.push(page);
        &self.pages[self.pages.len() - 1]
    }

    /// Number of pages pushed so far.
    pub fn len(&self) -> usize {
        self.pages.len()
    }

    /// Whether no page has been pushed.
    pub fn is_empty(&self) -> bool {
        self.pages.is_empty()
    }

    /// Join the page texts and return the finished document.
    pub fn finish(self) -> Document {
        let mut text = String::with_capacity(self.pages.iter().map(|p| p.text.len() + 1).sum());
        for (i, page) in self.pages.iter().enumerate() {
            if i > 0 {
                text.push(PAGE_BREAK);
            }
            text.push_str(&page.text);
        }
        debug_assert_eq!(text.chars().count(), self.offsets.document_len());

        Document {
            text,
            pages: self.pages,
        }
    }
}

/// Build a document from backend responses that are already available.
///
/// Pages are processed in page-number order regardless of input order.
pub fn reconstruct_document(mut pages: Vec<(PageImage, BackendResponse)>) -> Document {
    pages.sort_by_key(|(image, _)| image.page_number);

    let mut assembler = DocumentAssembler::new();
    for (image, response) in &pages {
        let layout = reconstruct_page(normalize(image.page_number, response));
        if layout.fell_back {
            log::info!("Page {} used fallback ordering", image.page_number);
        }
        let page = assembler.push_page(image, layout.words);
        log::debug!("Page {}: {} word(s)", page.page_number, page.words.len());
    }
    assembler.finish()
}

/// Runs recognition and reconstruction for whole documents.
pub struct DocumentProcessor<B: ?Sized> {
    backend: Arc<B>,
    config: ReflowConfig,
}

impl<B: RecognitionBackend + ?Sized + 'static> DocumentProcessor<B> {
    /// Create a processor; fails if `config` is invalid.
    pub fn new(backend: Arc<B>, config: ReflowConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self { backend, config })
    }

    /// Configuration in use.
    pub fn config(&self) -> &ReflowConfig {
        &self.config
    }

    /// Recognize `pages` concurrently, then reconstruct them in page order.
    ///
    /// Any page whose recognition fails fails the whole document.
    pub async fn process(&self, pages: &[PageImage]) -> Result<Document> {
        let responses = fetch_pages(Arc::clone(&self.backend), pages, &self.config).await?;
        let document = reconstruct_document(pages.iter().cloned().zip(responses).collect());
        log::info!(
            "Reconstructed {} page(s), {} word(s)",
            document.pages.len(),
            document.words().count()
        );
        Ok(document)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geometry::BoundingBox;
    use crate::recognition::{BackendWord, BreakType};

    fn backend_word(text: &str, left: f32, top: f32, break_type: BreakType) -> BackendWord {
        BackendWord {
            text: text.to_string(),
            bounding_box: BoundingBox::new(left, top, left + 60.0, top + 20.0),
            break_type: Some(break_type),
        }
    }

    fn line_response(texts: &[&str]) -> BackendResponse {
        let last = texts.len() - 1;
        let words = texts
            .iter()
            .enumerate()
            .map(|(i, t)| {
                let kind = if i == last {
                    BreakType::LineBreak
                } else {
                    BreakType::Space
                };
                backend_word(t, i as f32 * 70.0, 0.0, kind)
            })
            .collect();
        BackendResponse::Words { words }
    }

    #[test]
    fn test_reconstruct_page_single_line() {
        let blocks = normalize(1, &line_response(&["Chief", "complaint"]));
        let layout = reconstruct_page(blocks);
        assert!(!layout.fell_back);
        assert_eq!(layout.classification.kind, LayoutKind::Regular);
        let texts: Vec<&str> = layout.words.iter().map(|w| w.text.as_str()).collect();
        assert_eq!(texts, vec!["Chief", "complaint"]);
    }

    #[test]
    fn test_reconstruct_page_falls_back_on_bad_geometry() {
        let mut blocks = normalize(1, &line_response(&["a", "b"]));
        blocks[0].bbox.right = f32::INFINITY;
        let layout = reconstruct_page(blocks);
        assert!(layout.fell_back);
        assert_eq!(layout.words.len(), 2);
    }

    #[test]
    fn test_reconstruct_document_sorts_pages() {
        let document = reconstruct_document(vec![
            (PageImage::new(2, "p2.png"), line_response(&["second"])),
            (PageImage::new(1, "p1.png"), line_response(&["first"])),
        ]);
        assert_eq!(document.text, "first\n\u{000C}second\n");
        assert_eq!(document.pages[0].page_number, 1);
        assert_eq!(document.pages[1].source_image.to_str(), Some("p2.png"));
        assert_eq!(document.pages[1].words[0].document_index_first, 7);
        assert!(document.verify_offsets().is_ok());
    }

    #[test]
    fn test_empty_document() {
        let document = reconstruct_document(Vec::new());
        assert!(document.text.is_empty());
        assert!(document.pages.is_empty());
    }

    #[test]
    fn test_processor_rejects_invalid_config() {
        struct Never;

        #[async_trait::async_trait]
        impl RecognitionBackend for Never {
            async fn recognize(
                &self,
                _image: &PageImage,
            ) -> std::result::Result<BackendResponse, crate::error::BackendError> {
                Err(crate::error::BackendError::Terminal("unused".into()))
            }
        }

        let config = ReflowConfig::default().with_max_concurrency(0);
        assert!(DocumentProcessor::new(Arc::new(Never), config).is_err());
    }
}
