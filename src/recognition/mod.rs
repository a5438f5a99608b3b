//! Recognition backend contract and response normalization.
//!
//! Backends come in two shapes: a flat word list annotated with detected
//! breaks, or a block → line → word tree. Both are normalized into
//! [`LineBlock`]s with per-word space, hyphen and newline markers, which is
//! all the layout code consumes.
//!
//! # Backend I/O
//!
//! - [`backend`]: the async traits a backend implements, and the polling
//!   adapter for operation-handle backends
//! - [`retry`]: exponential backoff for transient failures
//! - [`pool`]: bounded concurrent fetch of a document's pages
//! - [`client_cache`]: caller-owned, time-bounded cache of a client handle

pub mod backend;
pub mod client_cache;
pub mod pool;
pub mod retry;

pub use backend::{
    AsyncRecognitionBackend, OperationHandle, OperationStatus, PollingBackend, RecognitionBackend,
};
pub use client_cache::{ClientCache, Clock, SystemClock};
pub use pool::fetch_pages;
pub use retry::{retry, RetryError, RetryPolicy};

use serde::{Deserialize, Serialize};

use crate::geometry::BoundingBox;
use crate::model::{LineBlock, Word, PAGE_BREAK};

/// Break detected after a word by a flat-list backend.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum BreakType {
    /// Regular space
    Space,
    /// Wide space
    SureSpace,
    /// Line-wrapping break
    EolSureSpace,
    /// Line-ending break without a space
    LineBreak,
    /// Hyphen ending a line
    Hyphen,
    /// Break the backend could not classify, or a type this crate does not know
    #[serde(other)]
    Unknown,
}

impl BreakType {
    /// Whether the break closes the visual line.
    pub fn ends_line(self) -> bool {
        matches!(self, BreakType::EolSureSpace | BreakType::LineBreak | BreakType::Hyphen)
    }
}

/// A word as reported by a backend.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BackendWord {
    /// Recognized text
    pub text: String,
    /// Position in the page image
    pub bounding_box: BoundingBox,
    /// Break following the word, if any
    #[serde(default)]
    pub break_type: Option<BreakType>,
}

/// A line of a hierarchical backend response.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BackendLine {
    /// Line box; derived from the words when absent
    #[serde(default)]
    pub bounding_box: Option<BoundingBox>,
    /// Words of the line
    pub words: Vec<BackendWord>,
}

/// A block of a hierarchical backend response.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BackendBlock {
    /// Block box, informational only
    #[serde(default)]
    pub bounding_box: Option<BoundingBox>,
    /// Lines of the block
    pub lines: Vec<BackendLine>,
}

/// Raw result of one recognition call.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum BackendResponse {
    /// Flat word list with break annotations
    Words {
        /// Words in backend order
        words: Vec<BackendWord>,
    },
    /// Block → line → word tree
    Blocks {
        /// Blocks in backend order
        blocks: Vec<BackendBlock>,
    },
}

impl BackendResponse {
    /// Total number of words in the response.
    pub fn word_count(&self) -> usize {
        match self {
            BackendResponse::Words { words } => words.len(),
            BackendResponse::Blocks { blocks } => {
                blocks.iter().flat_map(|b| &b.lines).map(|l| l.words.len()).sum()
            },
        }
    }
}

/// Word text with the page-break sentinel removed, `None` if nothing is left.
fn clean_text(text: &str) -> Option<String> {
    let cleaned: String = text.chars().filter(|&c| c != PAGE_BREAK).collect();
    (!cleaned.is_empty()).then_some(cleaned)
}

/// Normalize a backend response into line blocks for `page`.
///
/// Words whose text is empty once the page-break sentinel is removed are
/// dropped.
pub fn normalize(page: u32, response: &BackendResponse) -> Vec<LineBlock> {
    match response {
        BackendResponse::Words { words } => normalize_flat(page, words),
        BackendResponse::Blocks { blocks } => normalize_tree(page, blocks),
    }
}

fn normalize_flat(page: u32, words: &[BackendWord]) -> Vec<LineBlock> {
    let mut blocks = Vec::new();
    let mut line: Vec<Word> = Vec::new();

    for raw in words {
        let Some(text) = clean_text(&raw.text) else {
            continue;
        };
        let bbox = raw.bounding_box.normalized();
        let word = match raw.break_type {
            None | Some(BreakType::Unknown) => Word::new(text, page, bbox),
            Some(BreakType::Space | BreakType::SureSpace) => {
                Word::new(text, page, bbox).with_space(true)
            },
            Some(BreakType::EolSureSpace | BreakType::LineBreak) => {
                Word::new(text, page, bbox).with_new_line(true)
            },
            Some(BreakType::Hyphen) => {
                Word::new(text, page, bbox).with_hyphen(true).with_new_line(true)
            },
        };
        line.push(word);
        if raw.break_type.is_some_and(BreakType::ends_line) {
            blocks.extend(LineBlock::from_words(std::mem::take(&mut line)));
        }
    }
    blocks.extend(LineBlock::from_words(line));
    blocks
}

fn normalize_tree(page: u32, blocks: &[BackendBlock]) -> Vec<LineBlock> {
    let mut out = Vec::new();
    for line in blocks.iter().flat_map(|b| &b.lines) {
        let mut words: Vec<Word> = line
            .words
            .iter()
            .filter_map(|raw| {
                let text = clean_text(&raw.text)?;
                let hyphen = raw.break_type == Some(BreakType::Hyphen);
                Some(Word::new(text, page, raw.bounding_box.normalized()).with_hyphen(hyphen))
            })
            .collect();
        let Some(last) = words.len().checked_sub(1) else {
            continue;
        };
        for (i, word) in words.iter_mut().enumerate() {
            if i == last {
                word.new_line = true;
            } else if !word.hyphen {
                word.spaces = 1;
            }
        }
        let bbox = match line.bounding_box {
            Some(bbox) => bbox.normalized(),
            None => match BoundingBox::enclosing(words.iter().map(|w| &w.bbox)) {
                Some(bbox) => bbox,
                None => continue,
            },
        };
        out.push(LineBlock { bbox, words });
    }
    out
}
