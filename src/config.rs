//! Run configuration: dataset specifications from the INI catalogue and the
//! explicit [`Context`] handed to every component.

use crate::error::{GeoRelateError, Result};
use configparser::ini::Ini;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Default number of grid partitions per dimension.
pub const DEFAULT_PARTITIONS_PER_DIM: i32 = 10_000;

/// Largest partitions-per-dimension value whose cell count still fits the
/// i32 partition id space.
pub const MAX_PARTITIONS_PER_DIM: i32 = 46_340;

/// Input file format, as declared by the `filetype` INI key.
///
/// Every format is consumed as tab-separated rows with one WKT column;
/// the token is kept for cataloguing and logging.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FileFormat {
    /// `WKT` and `TSV` files: tab-separated rows carrying WKT literals.
    Wkt,
    /// `CSV` exports re-tabbed to TSV.
    Csv,
    /// `DAT` dumps.
    Binary,
}

impl FileFormat {
    pub fn from_token(token: &str) -> Option<Self> {
        match token.trim().to_ascii_uppercase().as_str() {
            // TSV carries the same rows, the WKT just sits in a column.
            "WKT" | "TSV" => Some(FileFormat::Wkt),
            "CSV" => Some(FileFormat::Csv),
            "DAT" => Some(FileFormat::Binary),
            _ => None,
        }
    }
}

/// Shape of the rendered document.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DocumentType {
    /// One sentence group per pair, one per line.
    #[default]
    Sentences,
    /// One line per entity accumulating full sentences.
    Paragraphs,
    /// One line per entity with combined single-sentence relations.
    ParagraphsCompressed,
}

impl DocumentType {
    pub fn from_token(token: &str) -> Option<Self> {
        match token.trim().to_ascii_uppercase().as_str() {
            "SENTENCES" => Some(DocumentType::Sentences),
            "PARAGRAPHS" => Some(DocumentType::Paragraphs),
            "PARAGRAPHS_COMPRESSED" => Some(DocumentType::ParagraphsCompressed),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            DocumentType::Sentences => "SENTENCES",
            DocumentType::Paragraphs => "PARAGRAPHS",
            DocumentType::ParagraphsCompressed => "PARAGRAPHS_COMPRESSED",
        }
    }
}

/// One dataset entry of the INI catalogue.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DatasetSpec {
    /// Section name in the catalogue, also the CLI handle.
    pub nickname: String,
    pub path: PathBuf,
    pub file_format: FileFormat,
    /// Free-text prefix for entity names, e.g. `"county"`.
    pub description: String,
    /// Zero-based column holding the WKT literal.
    pub wkt_col_idx: usize,
    /// Zero-based column holding the entity name.
    pub name_col_idx: usize,
    /// Optional zero-based column holding a FIPS state code that decorates
    /// the entity name.
    pub other_col_idx: Option<usize>,
}

impl DatasetSpec {
    /// Read the section `nickname` from a loaded catalogue.
    pub fn from_ini(ini: &Ini, nickname: &str) -> Result<Self> {
        let require = |key: &str| {
            ini.get(nickname, key).ok_or_else(|| {
                GeoRelateError::Ini(format!(
                    "'{key}' invalid or missing for dataset '{nickname}'"
                ))
            })
        };
        let require_col = |key: &str| -> Result<usize> {
            require(key)?.trim().parse().map_err(|_| {
                GeoRelateError::Ini(format!(
                    "'{key}' must be a zero-based column index for dataset '{nickname}'"
                ))
            })
        };

        let path = PathBuf::from(require("path")?);
        let file_format = FileFormat::from_token(&require("filetype")?).ok_or_else(|| {
            GeoRelateError::Ini(format!(
                "'filetype' must be one of WKT/TSV/CSV/DAT for dataset '{nickname}'"
            ))
        })?;
        let description = require("description")?;
        let wkt_col_idx = require_col("wktcolidx")?;
        let name_col_idx = require_col("namecolidx")?;
        let other_col_idx = match ini.get(nickname, "othercolidx") {
            Some(raw) => Some(raw.trim().parse().map_err(|_| {
                GeoRelateError::Ini(format!(
                    "'othercolidx' must be a zero-based column index for dataset '{nickname}'"
                ))
            })?),
            None => None,
        };

        Ok(Self {
            nickname: nickname.to_string(),
            path,
            file_format,
            description,
            wkt_col_idx,
            name_col_idx,
            other_col_idx,
        })
    }

    /// Verify the dataset file exists.
    pub fn verify(&self) -> Result<()> {
        if self.path.is_file() {
            Ok(())
        } else {
            Err(GeoRelateError::InvalidFilepath(self.path.clone()))
        }
    }
}

/// The full run configuration, passed explicitly to every component.
#[derive(Debug, Clone)]
pub struct Context {
    pub dataset_r: DatasetSpec,
    pub dataset_s: DatasetSpec,
    pub partitions_per_dim: i32,
    pub num_threads: usize,
    pub doc_type: DocumentType,
    pub output_path: PathBuf,
    pub append: bool,
    /// Set when both datasets point at the same file; reverse renderings
    /// are suppressed.
    pub self_join: bool,
}

impl Context {
    /// Assemble a context from catalogue entries and run options. The
    /// self-join flag is derived from the dataset paths.
    pub fn new(
        dataset_r: DatasetSpec,
        dataset_s: DatasetSpec,
        doc_type: DocumentType,
        output_path: PathBuf,
    ) -> Self {
        let self_join = dataset_r.path == dataset_s.path;
        Self {
            dataset_r,
            dataset_s,
            partitions_per_dim: DEFAULT_PARTITIONS_PER_DIM,
            num_threads: 1,
            doc_type,
            output_path,
            append: false,
            self_join,
        }
    }

    pub fn with_partitions_per_dim(mut self, partitions_per_dim: i32) -> Self {
        self.partitions_per_dim = partitions_per_dim;
        self
    }

    pub fn with_num_threads(mut self, num_threads: usize) -> Self {
        self.num_threads = num_threads;
        self
    }

    pub fn with_append(mut self, append: bool) -> Self {
        self.append = append;
        self
    }

    /// Validate option ranges and dataset files.
    pub fn validate(&self) -> Result<()> {
        if self.partitions_per_dim < 1 || self.partitions_per_dim > MAX_PARTITIONS_PER_DIM {
            return Err(GeoRelateError::InvalidArgs(format!(
                "partitions per dimension must be in [1, {MAX_PARTITIONS_PER_DIM}], got {}",
                self.partitions_per_dim
            )));
        }
        if self.num_threads == 0 {
            return Err(GeoRelateError::InvalidArgs(
                "worker count must be at least 1".into(),
            ));
        }
        self.dataset_r.verify()?;
        self.dataset_s.verify()?;
        Ok(())
    }
}

/// Load the INI catalogue and resolve both dataset sections plus the
/// document type (optional `documenttype` key in R's section, defaulting to
/// sentences).
pub fn load_catalogue(
    path: &Path,
    nickname_r: &str,
    nickname_s: &str,
) -> Result<(DatasetSpec, DatasetSpec, DocumentType)> {
    let mut ini = Ini::new();
    ini.load(path)
        .map_err(|e| GeoRelateError::Ini(format!("{}: {e}", path.display())))?;

    let spec_r = DatasetSpec::from_ini(&ini, nickname_r)?;
    let spec_s = DatasetSpec::from_ini(&ini, nickname_s)?;

    let doc_type = match ini.get(nickname_r, "documenttype") {
        Some(token) => DocumentType::from_token(&token).ok_or_else(|| {
            GeoRelateError::Ini(format!(
                "'documenttype' must be SENTENCES, PARAGRAPHS or PARAGRAPHS_COMPRESSED, got '{token}'"
            ))
        })?,
        None => DocumentType::default(),
    };

    Ok((spec_r, spec_s, doc_type))
}
