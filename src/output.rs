//! Output buffering and the final disk flush.
//!
//! During evaluation each worker owns one [`RelationSink`]; nothing is
//! written to disk until the parallel region has ended. Sentence text
//! accumulates line by line; paragraph text accumulates per entity and the
//! per-worker shards are merged on the main thread.

use crate::config::DocumentType;
use crate::error::{GeoRelateError, Result};
use rustc_hash::FxHashMap;
use std::fs::{File, OpenOptions};
use std::io::{BufWriter, Write};
use std::path::Path;

/// Initial capacity of a worker's sentence buffer, in bytes.
pub const BUFFER_INITIAL_CAPACITY: usize = 8192;

/// Per-worker output accumulator.
#[derive(Debug)]
pub struct RelationSink {
    doc_type: DocumentType,
    self_join: bool,
    /// Sentence-mode lines, newline terminated.
    pub sentences: String,
    /// Paragraph-mode shard: entity name to accumulated text.
    pub entity_texts: FxHashMap<String, String>,
}

impl RelationSink {
    pub fn new(doc_type: DocumentType, self_join: bool) -> Self {
        Self {
            doc_type,
            self_join,
            sentences: String::with_capacity(BUFFER_INITIAL_CAPACITY),
            entity_texts: FxHashMap::default(),
        }
    }

    pub fn doc_type(&self) -> DocumentType {
        self.doc_type
    }

    /// True when reverse renderings are suppressed.
    pub fn is_self_join(&self) -> bool {
        self.self_join
    }

    /// Append one sentence group as a line. Empty groups are dropped.
    pub fn push_sentence(&mut self, text: &str) {
        if text.is_empty() {
            return;
        }
        self.sentences.push_str(text);
        self.sentences.push('\n');
    }

    /// Append text to an entity's paragraph. Empty fragments are dropped.
    pub fn append_for_entity(&mut self, entity: &str, text: &str) {
        if text.is_empty() {
            return;
        }
        match self.entity_texts.get_mut(entity) {
            Some(paragraph) => paragraph.push_str(text),
            None => {
                self.entity_texts.insert(entity.to_string(), text.to_string());
            }
        }
    }

    /// Fold another worker's shard into this one. Sentence buffers stay
    /// separate (they are concatenated in worker order at flush time), so
    /// only entity shards merge here.
    pub fn merge_entities(&mut self, other: FxHashMap<String, String>) {
        for (entity, text) in other {
            match self.entity_texts.get_mut(&entity) {
                Some(paragraph) => paragraph.push_str(&text),
                None => {
                    self.entity_texts.insert(entity, text);
                }
            }
        }
    }
}

/// Line-buffered writer for the rendered document.
///
/// The handle is scoped to this struct; dropping it closes the file on
/// every exit path.
pub struct DiskWriter {
    writer: BufWriter<File>,
}

impl DiskWriter {
    /// Open the output file, truncating unless `append` is set.
    pub fn create(path: &Path, append: bool) -> Result<Self> {
        let mut options = OpenOptions::new();
        options.write(true).create(true);
        if append {
            options.append(true);
        } else {
            options.truncate(true);
        }
        let file = options.open(path).map_err(|source| GeoRelateError::FileOpen {
            path: path.to_path_buf(),
            source,
        })?;
        Ok(Self {
            writer: BufWriter::new(file),
        })
    }

    /// Write the fixed three-line ground-rules header.
    pub fn write_ground_rules(&mut self) -> Result<()> {
        const GROUND_RULES: &str = "\
The following text describes how geographic entities relate to each other in space.\n\
Relations cover adjacency, containment, equality, overlap and disjointness, with compass directions between separated entities.\n\
Common areas are reported in square kilometers.\n";
        self.writer
            .write_all(GROUND_RULES.as_bytes())
            .map_err(GeoRelateError::FileWrite)
    }

    /// Write sentence-mode buffers, concatenated in worker order.
    pub fn write_sentence_buffers(&mut self, buffers: &[String]) -> Result<()> {
        for buffer in buffers {
            self.writer
                .write_all(buffer.as_bytes())
                .map_err(GeoRelateError::FileWrite)?;
        }
        Ok(())
    }

    /// Write one `"<entity>: information: <text>"` line per entity.
    pub fn write_entity_paragraphs(
        &mut self,
        entity_texts: &FxHashMap<String, String>,
    ) -> Result<()> {
        for (entity, text) in entity_texts {
            writeln!(self.writer, "{entity}: information: {text}").map_err(GeoRelateError::FileWrite)?;
        }
        Ok(())
    }

    /// Flush buffered output to disk.
    pub fn finish(mut self) -> Result<()> {
        self.writer.flush().map_err(GeoRelateError::FileWrite)
    }
}
