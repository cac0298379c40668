//! Content source - blocks of words with their audio and timing maps
//!
//! Blocks are looked up by id. The engine never owns content; it asks the
//! source for a block each time one is loaded.

use std::collections::HashSet;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::ContentError;
use crate::model::timing::{RawWord, WordRef, WordSpan};

/// Everything the engine needs to synchronize one block
#[derive(Debug, Clone, PartialEq)]
pub struct BlockContent {
    pub id: String,
    /// Reference handed to the transport (file path, URL, ...)
    pub audio_ref: String,
    pub word_spans: Vec<WordSpan>,
    /// Rendered words, parallel to `word_spans`
    pub element_refs: Vec<WordRef>,
}

impl BlockContent {
    /// Pair spans with their rendered words in document order
    ///
    /// Words without a matching element get a synthetic id so they can still
    /// be synchronized.
    pub fn raw_words(&self) -> Vec<RawWord> {
        if self.element_refs.len() != self.word_spans.len() {
            tracing::warn!(
                block = %self.id,
                spans = self.word_spans.len(),
                elements = self.element_refs.len(),
                "span/element count mismatch"
            );
        }

        self.word_spans
            .iter()
            .enumerate()
            .map(|(i, span)| RawWord {
                span: *span,
                element: self.element_refs.get(i).cloned().unwrap_or_else(|| WordRef {
                    id: format!("{}-w{}", self.id, i),
                    ..WordRef::default()
                }),
            })
            .collect()
    }

    /// End of the latest word; the shortest audio that covers the block
    pub fn spoken_until_ms(&self) -> u64 {
        self.word_spans.iter().map(|s| s.end()).max().unwrap_or(0)
    }
}

/// Lookup of blocks by id, in document order
pub trait ContentSource {
    fn block(&self, block_id: &str) -> Option<BlockContent>;

    /// The block following `block_id` in document order; `None` at the end
    fn next_block_id(&self, block_id: &str) -> Option<String>;
}

// ============================================================================
// Static content (YAML / JSON documents)
// ============================================================================

/// One authored word: `map` is `begin,dur[,end]` in milliseconds
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WordEntry {
    pub map: String,
    #[serde(default)]
    pub text: String,
    /// Layout line; converted to a vertical offset using `line_height`
    #[serde(default)]
    pub line: u32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BlockEntry {
    pub id: String,
    pub audio: String,
    #[serde(default)]
    pub words: Vec<WordEntry>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
struct ContentFile {
    #[serde(default = "default_line_height")]
    line_height: i32,
    blocks: Vec<BlockEntry>,
}

fn default_line_height() -> i32 {
    24
}

/// Content held in memory, usually read from a YAML or JSON document
#[derive(Debug, Clone, Default)]
pub struct StaticContent {
    blocks: Vec<BlockContent>,
}

impl StaticContent {
    /// Build from already-parsed blocks, rejecting duplicate ids
    pub fn new(blocks: Vec<BlockContent>) -> Result<Self, ContentError> {
        let mut seen = HashSet::new();
        for block in &blocks {
            if !seen.insert(block.id.as_str()) {
                return Err(ContentError::DuplicateBlock(block.id.clone()));
            }
        }
        Ok(Self { blocks })
    }

    pub fn from_yaml_str(yaml: &str) -> Result<Self, ContentError> {
        let file: ContentFile =
            serde_yaml::from_str(yaml).map_err(|e| ContentError::Parse(e.to_string()))?;
        Self::from_file(file)
    }

    pub fn from_json_str(json: &str) -> Result<Self, ContentError> {
        let file: ContentFile =
            serde_json::from_str(json).map_err(|e| ContentError::Parse(e.to_string()))?;
        Self::from_file(file)
    }

    /// Load a content document, choosing the format by extension
    pub fn load(path: &Path) -> Result<Self, ContentError> {
        let text = std::fs::read_to_string(path)?;
        let is_json = path
            .extension()
            .and_then(|e| e.to_str())
            .is_some_and(|e| e.eq_ignore_ascii_case("json"));

        let content = if is_json {
            Self::from_json_str(&text)?
        } else {
            Self::from_yaml_str(&text)?
        };
        tracing::info!(
            "Loaded {} blocks from {}",
            content.blocks.len(),
            path.display()
        );
        Ok(content)
    }

    fn from_file(file: ContentFile) -> Result<Self, ContentError> {
        let line_height = file.line_height;
        let blocks = file
            .blocks
            .into_iter()
            .map(|entry| -> Result<BlockContent, ContentError> {
                let mut word_spans = Vec::with_capacity(entry.words.len());
                let mut element_refs = Vec::with_capacity(entry.words.len());
                for (i, word) in entry.words.into_iter().enumerate() {
                    word_spans.push(word.map.parse::<WordSpan>()?);
                    let offset_top = i32::try_from(word.line)
                        .ok()
                        .and_then(|line| line.checked_mul(line_height))
                        .ok_or_else(|| {
                            ContentError::Parse(format!(
                                "block {:?} word {}: line {} is out of range",
                                entry.id, i, word.line
                            ))
                        })?;
                    element_refs.push(WordRef {
                        id: word.id.unwrap_or_else(|| format!("{}-w{}", entry.id, i)),
                        text: word.text,
                        offset_top,
                    });
                }
                Ok(BlockContent {
                    id: entry.id,
                    audio_ref: entry.audio,
                    word_spans,
                    element_refs,
                })
            })
            .collect::<Result<Vec<_>, _>>()?;

        Self::new(blocks)
    }

    pub fn block_ids(&self) -> impl Iterator<Item = &str> {
        self.blocks.iter().map(|b| b.id.as_str())
    }

    pub fn first_block_id(&self) -> Option<&str> {
        self.blocks.first().map(|b| b.id.as_str())
    }
}

impl ContentSource for StaticContent {
    fn block(&self, block_id: &str) -> Option<BlockContent> {
        self.blocks.iter().find(|b| b.id == block_id).cloned()
    }

    fn next_block_id(&self, block_id: &str) -> Option<String> {
        let pos = self.blocks.iter().position(|b| b.id == block_id)?;
        self.blocks.get(pos + 1).map(|b| b.id.clone())
    }
}
