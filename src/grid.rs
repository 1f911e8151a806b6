//! Uniform grid index: dataspace bounds, partition arithmetic, and the
//! sparse partition-to-contents map.
//!
//! The dataspace is cut into `P × P` equal cells. A shape is replicated
//! into every cell its MBR overlaps; partition ids are row-major
//! (`id = i + j * P`, with `j` along the y axis).

use crate::error::{GeoRelateError, Result};
use crate::shape::Mbr;
use crate::EPS;
use rustc_hash::FxHashMap;

/// Global bounds and extents of the joined dataspace, in degrees.
///
/// Bounds are padded by [`EPS`] per side so that coordinates sitting
/// exactly on the outer border never round into an out-of-range cell.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DataspaceBounds {
    pub x_min: f64,
    pub y_min: f64,
    pub x_max: f64,
    pub y_max: f64,
    pub x_extent: f64,
    pub y_extent: f64,
    pub max_extent: f64,
}

impl DataspaceBounds {
    /// Build padded bounds from raw corner coordinates.
    pub fn from_corners(x_min: f64, y_min: f64, x_max: f64, y_max: f64) -> Self {
        let x_min = x_min - EPS;
        let y_min = y_min - EPS;
        let x_max = x_max + EPS;
        let y_max = y_max + EPS;
        Self {
            x_min,
            y_min,
            x_max,
            y_max,
            x_extent: x_max - x_min,
            y_extent: y_max - y_min,
            max_extent: (x_max - x_min).max(y_max - y_min),
        }
    }

    /// The bounds enclosing both inputs. Inputs are already padded, so no
    /// further padding is applied.
    pub fn union(a: &DataspaceBounds, b: &DataspaceBounds) -> Self {
        let x_min = a.x_min.min(b.x_min);
        let y_min = a.y_min.min(b.y_min);
        let x_max = a.x_max.max(b.x_max);
        let y_max = a.y_max.max(b.y_max);
        Self {
            x_min,
            y_min,
            x_max,
            y_max,
            x_extent: x_max - x_min,
            y_extent: y_max - y_min,
            max_extent: (x_max - x_min).max(y_max - y_min),
        }
    }
}

/// Row-major partition id for cell `(i, j)`.
pub fn partition_id(i: i32, j: i32, partitions_per_dim: i32) -> i32 {
    i + j * partitions_per_dim
}

/// Partition id of the cell containing the point `(x, y)`.
pub fn partition_of_point(bounds: &DataspaceBounds, partitions_per_dim: i32, x: f64, y: f64) -> i32 {
    let dx = bounds.x_extent / partitions_per_dim as f64;
    let dy = bounds.y_extent / partitions_per_dim as f64;
    let i = ((x - bounds.x_min) / dx).floor() as i32;
    let j = ((y - bounds.y_min) / dy).floor() as i32;
    partition_id(i, j, partitions_per_dim)
}

/// All partition ids whose cells overlap the MBR, in i-major scan order.
///
/// Fails with [`InvalidPartition`](GeoRelateError::InvalidPartition) when a
/// corner cell falls outside `[0, P²)`; that means the dataspace bounds
/// were computed wrong, not that the input is bad.
pub fn partitions_for_mbr(
    bounds: &DataspaceBounds,
    partitions_per_dim: i32,
    mbr: &Mbr,
) -> Result<Vec<i32>> {
    let dx = bounds.x_extent / partitions_per_dim as f64;
    let dy = bounds.y_extent / partitions_per_dim as f64;

    let i_min = ((mbr.min.x - bounds.x_min) / dx).floor() as i32;
    let j_min = ((mbr.min.y - bounds.y_min) / dy).floor() as i32;
    let i_max = ((mbr.max.x - bounds.x_min) / dx).floor() as i32;
    let j_max = ((mbr.max.y - bounds.y_min) / dy).floor() as i32;

    let cell_count = partitions_per_dim as i64 * partitions_per_dim as i64;
    let first = partition_id(i_min, j_min, partitions_per_dim);
    let last = partition_id(i_max, j_max, partitions_per_dim);
    for (label, id) in [("first", first), ("last", last)] {
        if id < 0 || id as i64 >= cell_count {
            return Err(GeoRelateError::InvalidPartition(format!(
                "{label} partition id {id} out of range for MBR ({}, {}, {}, {})",
                mbr.min.x, mbr.min.y, mbr.max.x, mbr.max.y
            )));
        }
    }

    let mut ids =
        Vec::with_capacity(((i_max - i_min + 1) * (j_max - j_min + 1)).max(0) as usize);
    for i in i_min..=i_max {
        for j in j_min..=j_max {
            ids.push(partition_id(i, j, partitions_per_dim));
        }
    }
    Ok(ids)
}

/// One non-empty grid cell and the records replicated into it.
#[derive(Debug, Clone)]
pub struct Partition {
    pub id: i32,
    /// Record ids in insertion order, resolved against the owning dataset.
    pub contents: Vec<u64>,
}

impl Partition {
    fn new(id: i32) -> Self {
        Self {
            id,
            contents: Vec::new(),
        }
    }
}

/// Sparse uniform grid: only non-empty partitions are materialized.
///
/// Partitions stay iterable in first-insertion order, which keeps worker
/// assignment deterministic for a given input.
#[derive(Debug, Clone, Default)]
pub struct UniformGridIndex {
    partitions: Vec<Partition>,
    partition_map: FxHashMap<i32, usize>,
}

impl UniformGridIndex {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a record reference to the partition, creating it on first use.
    pub fn add_object(&mut self, partition_id: i32, rec_id: u64) {
        match self.partition_map.get(&partition_id) {
            Some(&slot) => self.partitions[slot].contents.push(rec_id),
            None => {
                let mut partition = Partition::new(partition_id);
                partition.contents.push(rec_id);
                self.partition_map.insert(partition_id, self.partitions.len());
                self.partitions.push(partition);
            }
        }
    }

    /// Look up a partition by id.
    pub fn partition(&self, partition_id: i32) -> Option<&Partition> {
        self.partition_map
            .get(&partition_id)
            .map(|&slot| &self.partitions[slot])
    }

    /// All non-empty partitions in first-insertion order.
    pub fn partitions(&self) -> &[Partition] {
        &self.partitions
    }

    pub fn len(&self) -> usize {
        self.partitions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.partitions.is_empty()
    }
}
