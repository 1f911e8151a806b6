//! Natural-language descriptions of pairwise spatial relations between two
//! geometry datasets.
//!
//! ```no_run
//! use georelate::{evaluate, load_datasets, Context};
//!
//! # fn run(ctx: Context) -> georelate::Result<()> {
//! let (r, s) = load_datasets(&ctx)?;
//! let output = evaluate(&r, &s, &ctx)?;
//! # Ok(())
//! # }
//! ```
//!
//! Both datasets are loaded onto a shared uniform grid, joined partition by
//! partition with reference-point duplicate elimination, refined through
//! DE-9IM mask matching, and rendered as sentences or per-entity paragraphs.

pub mod config;
pub mod dataset;
pub mod error;
pub mod fips;
pub mod grid;
pub mod join;
pub mod output;
pub mod parse;
pub mod refine;
pub mod relation;
pub mod shape;
pub mod text;

pub use config::{Context, DatasetSpec, DocumentType, FileFormat};
pub use dataset::{load_datasets, Dataset};
pub use error::{GeoRelateError, Result};
pub use join::{evaluate, JoinOutput};
pub use output::DiskWriter;
pub use relation::{CardinalDirection, TopologyRelation};
pub use shape::{Mbr, Shape, ShapeGeometry, ShapeKind};

/// Error margin for coordinate and area comparisons.
pub const EPS: f64 = 1e-8;

pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Common imports
pub mod prelude {
    pub use crate::{Context, DatasetSpec, DocumentType, GeoRelateError, Result};

    pub use crate::{evaluate, load_datasets, Dataset, DiskWriter, JoinOutput};

    pub use crate::{CardinalDirection, Mbr, Shape, ShapeGeometry, ShapeKind, TopologyRelation};
}
