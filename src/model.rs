//! Word, page and document records produced by reconstruction.
//!
//! These are the types handed to downstream consumers. Their serde form is the
//! JSON output contract: a page serializes as
//! `{page, text, png_path, coordinates: [...]}` and every coordinate carries
//! the word's box, its reading order and its inclusive character spans in the
//! page text and the document text.

use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use crate::error::OffsetMismatch;
use crate::geometry::BoundingBox;

/// Character placed between pages in [`Document::text`].
///
/// Normalization strips it from word text, so it never appears inside a
/// page's own text.
pub const PAGE_BREAK: char = '\u{000C}';

/// One recognized word.
///
/// `order` and the four index fields are zero until the word passes through
/// [`crate::pipeline::OffsetAssembler`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Word {
    /// Recognized text, never empty
    pub text: String,
    /// Page number the word was recognized on
    pub page: u32,
    /// Position in the page image
    #[serde(flatten)]
    pub bbox: BoundingBox,
    /// Position in the document-wide reading order
    pub order: usize,
    /// Inclusive start of the word in the document text
    pub document_index_first: usize,
    /// Inclusive end of the word in the document text
    pub document_index_last: usize,
    /// Inclusive start of the word in the page text
    pub page_index_first: usize,
    /// Inclusive end of the word in the page text
    pub page_index_last: usize,
    /// Trailing spaces (0 or 1)
    pub spaces: u8,
    /// Word is followed by an inserted hyphen
    pub hyphen: bool,
    /// Word is the last on its visual line
    pub new_line: bool,
    /// Sensitive-data category, filled in by downstream redaction
    pub phi_type: Option<String>,
    /// Sensitive-data confidence, filled in by downstream redaction
    pub phi_score: Option<f32>,
}

impl Word {
    /// Create a word with no break markers and unassigned offsets.
    pub fn new(text: impl Into<String>, page: u32, bbox: BoundingBox) -> Self {
        Self {
            text: text.into(),
            page,
            bbox,
            order: 0,
            document_index_first: 0,
            document_index_last: 0,
            page_index_first: 0,
            page_index_last: 0,
            spaces: 0,
            hyphen: false,
            new_line: false,
            phi_type: None,
            phi_score: None,
        }
    }

    /// Set the trailing-space marker.
    pub fn with_space(mut self, space: bool) -> Self {
        self.spaces = u8::from(space);
        self
    }

    /// Set the hyphen marker.
    pub fn with_hyphen(mut self, hyphen: bool) -> Self {
        self.hyphen = hyphen;
        self
    }

    /// Set the end-of-line marker.
    pub fn with_new_line(mut self, new_line: bool) -> Self {
        self.new_line = new_line;
        self
    }

    /// Length of the word in characters.
    pub fn char_len(&self) -> usize {
        self.text.chars().count()
    }

    /// Text emitted after the word: space, then hyphen, then newline.
    pub fn trailer(&self) -> &'static str {
        match (self.spaces > 0, self.hyphen, self.new_line) {
            (false, false, false) => "",
            (true, false, false) => " ",
            (false, true, false) => "-",
            (false, false, true) => "\n",
            (true, true, false) => " -",
            (true, false, true) => " \n",
            (false, true, true) => "-\n",
            (true, true, true) => " -\n",
        }
    }
}

/// A backend line (or word group) with its child words, in backend order.
///
/// This is the unit the row segmenter and the reorderers move around; the
/// words inside a block always keep their original relative order.
#[derive(Debug, Clone, PartialEq)]
pub struct LineBlock {
    /// Box enclosing the line
    pub bbox: BoundingBox,
    /// Words of the line, left to right as reported
    pub words: Vec<Word>,
}

impl LineBlock {
    /// Build a block whose box encloses all of its words.
    ///
    /// Returns `None` for an empty word list.
    pub fn from_words(words: Vec<Word>) -> Option<Self> {
        let bbox = BoundingBox::enclosing(words.iter().map(|w| &w.bbox))?;
        Some(Self { bbox, words })
    }
}

/// Input page: an image reference plus its page number.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PageImage {
    /// Page number within the document (1-based by convention)
    pub page_number: u32,
    /// Rasterized page image
    pub path: PathBuf,
}

impl PageImage {
    /// Create a page image reference.
    pub fn new(page_number: u32, path: impl Into<PathBuf>) -> Self {
        Self {
            page_number,
            path: path.into(),
        }
    }
}

/// One reconstructed page.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Page {
    /// Page number
    #[serde(rename = "page")]
    pub page_number: u32,
    /// Reconstructed page text
    pub text: String,
    /// Image the page was recognized from
    #[serde(rename = "png_path")]
    pub source_image: PathBuf,
    /// Words in reading order
    #[serde(rename = "coordinates")]
    pub words: Vec<Word>,
}

/// A reconstructed document: the full text plus one record per page.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct Document {
    /// Page texts joined by [`PAGE_BREAK`]
    #[serde(rename = "document_text")]
    pub text: String,
    /// Pages in page-number order
    pub pages: Vec<Page>,
}

impl Document {
    /// Iterate over every word of the document in reading order.
    pub fn words(&self) -> impl Iterator<Item = &Word> {
        self.pages.iter().flat_map(|p| p.words.iter())
    }

    /// Check that every word's spans reproduce its text.
    ///
    /// Both the document-level and the page-level spans are checked. A
    /// mismatch means the assembler is broken, not that the input was bad.
    pub fn verify_offsets(&self) -> Result<(), OffsetMismatch> {
        for page in &self.pages {
            for word in &page.words {
                let in_document =
                    slice_chars(&self.text, word.document_index_first, word.document_index_last);
                if in_document != Some(word.text.as_str()) {
                    return Err(OffsetMismatch {
                        page: page.page_number,
                        order: word.order,
                        expected: word.text.clone(),
                        found: in_document.map(str::to_string),
                    });
                }
                let in_page = slice_chars(&page.text, word.page_index_first, word.page_index_last);
                if in_page != Some(word.text.as_str()) {
                    return Err(OffsetMismatch {
                        page: page.page_number,
                        order: word.order,
                        expected: word.text.clone(),
                        found: in_page.map(str::to_string),
                    });
                }
            }
        }
        Ok(())
    }

    /// Serialize to the JSON output contract.
    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string_pretty(self)
    }
}

/// Slice `text` by inclusive character positions.
///
/// # Examples
///
/// ```
/// use scan_reflow::model::slice_chars;
///
/// assert_eq!(slice_chars("naïve café", 6, 9), Some("café"));
/// assert_eq!(slice_chars("abc", 1, 5), None);
/// ```
pub fn slice_chars(text: &str, first: usize, last: usize) -> Option<&str> {
    if last < first {
        return None;
    }
    let mut indices = text.char_indices().map(|(i, _)| i).chain(std::iter::once(text.len()));
    let start = indices.nth(first)?;
    let end = indices.nth(last - first)?;
    Some(&text[start..end])
}

#[cfg(test)]
mod tests {
    use super::*;

    fn word(text: &str) -> Word {
        Word::new(text, 1, BoundingBox::new(0.0, 0.0, 10.0, 10.0))
    }

    #[test]
    fn test_trailer_combinations() {
        assert_eq!(word("a").trailer(), "");
        assert_eq!(word("a").with_space(true).trailer(), " ");
        assert_eq!(word("a").with_new_line(true).trailer(), "\n");
        assert_eq!(word("a").with_hyphen(true).with_new_line(true).trailer(), "-\n");
        assert_eq!(word("a").with_space(true).with_new_line(true).trailer(), " \n");
    }

    #[test]
    fn test_char_len_counts_scalars() {
        assert_eq!(word("café").char_len(), 4);
        assert_eq!(word("café").text.len(), 5);
    }

    #[test]
    fn test_slice_chars_bounds() {
        assert_eq!(slice_chars("hello", 0, 4), Some("hello"));
        assert_eq!(slice_chars("hello", 4, 4), Some("o"));
        assert_eq!(slice_chars("hello", 5, 5), None);
        assert_eq!(slice_chars("hello", 3, 2), None);
    }

    #[test]
    fn test_line_block_encloses_words() {
        let words = vec![
            Word::new("a", 1, BoundingBox::new(0.0, 2.0, 10.0, 12.0)),
            Word::new("b", 1, BoundingBox::new(15.0, 0.0, 30.0, 10.0)),
        ];
        let block = LineBlock::from_words(words).unwrap();
        assert_eq!(block.bbox, BoundingBox::new(0.0, 0.0, 30.0, 12.0));
        assert!(LineBlock::from_words(Vec::new()).is_none());
    }

    #[test]
    fn test_word_serializes_flat_contract() {
        let json = serde_json::to_value(word("x").with_space(true)).unwrap();
        for key in [
            "text",
            "page",
            "top",
            "right",
            "bottom",
            "left",
            "order",
            "document_index_first",
            "document_index_last",
            "page_index_first",
            "page_index_last",
            "spaces",
            "hyphen",
            "new_line",
            "phi_type",
            "phi_score",
        ] {
            assert!(json.get(key).is_some(), "missing key {key}");
        }
        assert_eq!(json["spaces"], 1);
        assert!(json["phi_type"].is_null());
    }

    #[test]
    fn test_page_serializes_contract_names() {
        let page = Page {
            page_number: 3,
            text: "x".to_string(),
            source_image: PathBuf::from("p3.png"),
            words: vec![word("x")],
        };
        let json = serde_json::to_value(&page).unwrap();
        assert_eq!(json["page"], 3);
        assert_eq!(json["png_path"], "p3.png");
        assert_eq!(json["coordinates"].as_array().unwrap().len(), 1);
    }
}
