//! Dataset container and the two-pass loader/indexer.
//!
//! Grid cell sizes depend on the global bounds of *both* datasets, so each
//! file is read twice: a bounds pass that only envelopes geometries, and an
//! index pass that builds shapes and replicates them into grid cells.

use crate::config::{Context, DatasetSpec};
use crate::error::{GeoRelateError, Result};
use crate::grid::{partitions_for_mbr, DataspaceBounds, UniformGridIndex};
use crate::shape::Shape;
use crate::{fips, parse};
use rustc_hash::FxHashMap;
use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::Path;
use tracing::{debug, info};

/// A fully loaded and indexed dataset. Owns its shapes; the grid index
/// refers to them by record id.
#[derive(Debug, Clone)]
pub struct Dataset {
    pub spec: DatasetSpec,
    /// The shared dataspace, identical for both datasets of a run.
    pub dataspace: DataspaceBounds,
    pub objects: FxHashMap<u64, Shape>,
    /// Record ids in load order.
    pub object_ids: Vec<u64>,
    pub index: UniformGridIndex,
    pub total_objects: usize,
}

impl Dataset {
    /// Look up a shape by record id.
    pub fn object(&self, rec_id: u64) -> Option<&Shape> {
        self.objects.get(&rec_id)
    }

    /// (non-empty partition count, mean objects per non-empty partition)
    pub fn partition_statistics(&self) -> (usize, f64) {
        let partitions = self.index.len();
        if partitions == 0 {
            return (0, 0.0);
        }
        let replicated: usize = self
            .index
            .partitions()
            .iter()
            .map(|p| p.contents.len())
            .sum();
        (partitions, replicated as f64 / partitions as f64)
    }
}

fn open_reader(path: &Path) -> Result<BufReader<File>> {
    let file = File::open(path).map_err(|source| GeoRelateError::FileOpen {
        path: path.to_path_buf(),
        source,
    })?;
    Ok(BufReader::new(file))
}

fn read_line(line: std::io::Result<String>, path: &Path) -> Result<String> {
    line.map_err(|source| GeoRelateError::FileOpen {
        path: path.to_path_buf(),
        source,
    })
}

/// Extract a zero-based tab-separated column. A missing column on a
/// non-empty row means the catalogue indexes are wrong for this file, which
/// is fatal.
fn column(line: &str, idx: usize, line_number: u64, key: &str) -> Result<String> {
    line.split('\t')
        .nth(idx)
        .map(str::to_string)
        .ok_or_else(|| {
            GeoRelateError::InvalidArgs(format!(
                "{key} column {idx} out of range on line {line_number}"
            ))
        })
}

/// Pass 1: envelope every parseable row and accumulate dataset bounds.
pub fn scan_bounds(spec: &DatasetSpec) -> Result<DataspaceBounds> {
    let reader = open_reader(&spec.path)?;
    let mut x_min = f64::INFINITY;
    let mut y_min = f64::INFINITY;
    let mut x_max = f64::NEG_INFINITY;
    let mut y_max = f64::NEG_INFINITY;
    let mut lines: u64 = 0;
    let mut accepted: u64 = 0;
    let mut skipped: u64 = 0;

    for line in reader.lines() {
        let line = read_line(line, &spec.path)?;
        let line_number = lines;
        lines += 1;
        if line.is_empty() {
            skipped += 1;
            continue;
        }
        let wkt_text = column(&line, spec.wkt_col_idx, line_number, "wkt")?;
        match parse::parse_geometry(&wkt_text) {
            Ok(geometry) => {
                let Some(mbr) = geometry.envelope() else {
                    skipped += 1;
                    continue;
                };
                x_min = x_min.min(mbr.min.x);
                y_min = y_min.min(mbr.min.y);
                x_max = x_max.max(mbr.max.x);
                y_max = y_max.max(mbr.max.y);
                accepted += 1;
            }
            Err(err) if err.is_recoverable() => {
                debug!(
                    "dataset {}: skipping line {line_number}: {err}",
                    spec.nickname
                );
                skipped += 1;
            }
            Err(err) => return Err(err),
        }
    }

    if accepted == 0 {
        return Err(GeoRelateError::InvalidGeometry(format!(
            "dataset '{}' contains no valid geometries",
            spec.nickname
        )));
    }
    info!(
        "Dataset {} bounds pass: {accepted} of {lines} rows accepted ({skipped} skipped)",
        spec.nickname
    );
    Ok(DataspaceBounds::from_corners(x_min, y_min, x_max, y_max))
}

/// Compose the display name for a row: optional dataset description prefix,
/// the name column, and an optional FIPS state suffix.
fn compose_name(spec: &DatasetSpec, line: &str, line_number: u64) -> Result<String> {
    let name_token = column(line, spec.name_col_idx, line_number, "name")?;
    let mut name = if spec.description.is_empty() {
        name_token
    } else {
        format!("{} {}", spec.description, name_token)
    };
    if let Some(other_idx) = spec.other_col_idx {
        let fips_token = column(line, other_idx, line_number, "other")?;
        name.push_str(", ");
        name.push_str(fips::state_name_for_token(&fips_token));
    }
    Ok(name)
}

/// Pass 2: parse accepted rows into shapes, assign partitions on the shared
/// dataspace and build the grid index.
pub fn index_dataset(
    spec: &DatasetSpec,
    dataspace: DataspaceBounds,
    partitions_per_dim: i32,
) -> Result<Dataset> {
    let reader = open_reader(&spec.path)?;
    let mut dataset = Dataset {
        spec: spec.clone(),
        dataspace,
        objects: FxHashMap::default(),
        object_ids: Vec::new(),
        index: UniformGridIndex::new(),
        total_objects: 0,
    };
    let mut lines: u64 = 0;
    let mut skipped: u64 = 0;

    for line in reader.lines() {
        let line = read_line(line, &spec.path)?;
        // Record ids are line numbers, so skipped rows still advance them.
        let line_number = lines;
        lines += 1;
        if line.is_empty() {
            skipped += 1;
            continue;
        }
        let wkt_text = column(&line, spec.wkt_col_idx, line_number, "wkt")?;
        let geometry = match parse::parse_geometry(&wkt_text) {
            Ok(geometry) => geometry,
            Err(err) if err.is_recoverable() => {
                skipped += 1;
                continue;
            }
            Err(err) => return Err(err),
        };

        let name = compose_name(spec, &line, line_number)?;
        let mut shape = match Shape::new(line_number, name, geometry) {
            Ok(shape) => shape,
            Err(err) if err.is_recoverable() => {
                skipped += 1;
                continue;
            }
            Err(err) => return Err(err),
        };
        shape.partitions = partitions_for_mbr(&dataspace, partitions_per_dim, &shape.mbr)?;
        for &partition_id in &shape.partitions {
            dataset.index.add_object(partition_id, shape.rec_id);
        }
        dataset.object_ids.push(shape.rec_id);
        dataset.objects.insert(shape.rec_id, shape);
        dataset.total_objects += 1;
    }

    let (partitions, avg) = dataset.partition_statistics();
    info!(
        "Dataset {} loaded: {} objects ({skipped} rows skipped), {partitions} non-empty partitions, {avg:.2} avg objects per partition",
        spec.nickname, dataset.total_objects
    );
    Ok(dataset)
}

/// Load both datasets of a run: bounds pass each, unify the dataspace, then
/// index both on the shared grid. Self-joins load once and share the result.
pub fn load_datasets(ctx: &Context) -> Result<(Dataset, Dataset)> {
    let bounds_r = scan_bounds(&ctx.dataset_r)?;

    if ctx.self_join {
        let dataset_r = index_dataset(&ctx.dataset_r, bounds_r, ctx.partitions_per_dim)?;
        let mut dataset_s = dataset_r.clone();
        dataset_s.spec = ctx.dataset_s.clone();
        return Ok((dataset_r, dataset_s));
    }

    let bounds_s = scan_bounds(&ctx.dataset_s)?;
    let dataspace = DataspaceBounds::union(&bounds_r, &bounds_s);
    info!(
        "Global dataspace bounds: ({:.6}, {:.6}) - ({:.6}, {:.6})",
        dataspace.x_min, dataspace.y_min, dataspace.x_max, dataspace.y_max
    );
    let dataset_r = index_dataset(&ctx.dataset_r, dataspace, ctx.partitions_per_dim)?;
    let dataset_s = index_dataset(&ctx.dataset_s, dataspace, ctx.partitions_per_dim)?;
    Ok((dataset_r, dataset_s))
}
