//! Partition-parallel spatial join.
//!
//! Workers walk disjoint slices of R's partition list. For every partition
//! id also present in S's index, the cartesian product of the two cell
//! contents is enumerated; a pair is processed only in the cell containing
//! the lower-left corner of its common MBR, so pairs replicated across
//! cells are refined exactly once.

use crate::config::{Context, DocumentType};
use crate::error::{GeoRelateError, Result};
use crate::grid::{partition_of_point, Partition};
use crate::output::RelationSink;
use crate::refine::{self, MbrCase};
use crate::relation::TopologyRelation;
use crate::shape::{Mbr, Shape};
use crate::text;
use crate::{Dataset, EPS};
use rustc_hash::FxHashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::thread;
use tracing::{debug, info};

/// Classify two overlapping MBRs into their refinement case.
///
/// Callers handle the x-disjoint fast path first; y-disjoint pairs fall
/// through to the refiner, which classifies them disjoint from the matrix.
pub fn classify_mbrs(r: &Mbr, s: &Mbr) -> MbrCase {
    let d_xmin = r.min.x - s.min.x;
    let d_ymin = r.min.y - s.min.y;
    let d_xmax = r.max.x - s.max.x;
    let d_ymax = r.max.y - s.max.y;

    if d_xmin.abs() < EPS && d_xmax.abs() < EPS && d_ymin.abs() < EPS && d_ymax.abs() < EPS {
        return MbrCase::Equal;
    }
    if d_xmin <= 0.0 && d_xmax >= 0.0 {
        if d_ymin <= 0.0 && d_ymax >= 0.0 {
            return MbrCase::SInR;
        }
        // R's x-span strictly contains S's while S's y-span strictly
        // contains R's: the MBRs cross.
        if d_xmin < 0.0 && d_xmax > 0.0 && d_ymin > 0.0 && d_ymax < 0.0 {
            return MbrCase::Cross;
        }
    }
    if d_xmin >= 0.0 && d_xmax <= 0.0 {
        if d_ymin >= 0.0 && d_ymax <= 0.0 {
            return MbrCase::RInS;
        }
        if d_xmin > 0.0 && d_xmax < 0.0 && d_ymin < 0.0 && d_ymax > 0.0 {
            return MbrCase::Cross;
        }
    }
    MbrCase::Intersect
}

/// Result of one evaluation run, ready to flush.
#[derive(Debug)]
pub struct JoinOutput {
    pub doc_type: DocumentType,
    /// Sentence-mode buffers in worker order.
    pub sentence_buffers: Vec<String>,
    /// Merged paragraph-mode entity texts.
    pub entity_texts: FxHashMap<String, String>,
    /// Number of pairs that passed reference-point elimination.
    pub pairs: u64,
}

struct WorkerOutput {
    sink: RelationSink,
    pairs: u64,
}

/// Evaluate the join of R against S and return the rendered output.
///
/// Workers own their sinks; the only cross-thread state is the read-only
/// datasets and the cancellation flag. The first fatal worker error in
/// worker order is surfaced after the pool drains.
pub fn evaluate(dataset_r: &Dataset, dataset_s: &Dataset, ctx: &Context) -> Result<JoinOutput> {
    let partitions = dataset_r.index.partitions();
    let workers = ctx.num_threads.max(1);
    let chunk_size = partitions.len().div_ceil(workers).max(1);
    let cancelled = AtomicBool::new(false);

    info!(
        "Evaluating {} R-partitions on {workers} worker(s)",
        partitions.len()
    );

    let worker_results: Vec<Result<WorkerOutput>> = thread::scope(|scope| {
        let handles: Vec<_> = (0..workers)
            .map(|worker| {
                let slice = partitions
                    .chunks(chunk_size)
                    .nth(worker)
                    .unwrap_or(&[]);
                let cancelled = &cancelled;
                scope.spawn(move || run_worker(slice, dataset_r, dataset_s, ctx, cancelled))
            })
            .collect();
        handles
            .into_iter()
            .map(|handle| match handle.join() {
                Ok(result) => result,
                Err(panic) => std::panic::resume_unwind(panic),
            })
            .collect()
    });

    let mut sentence_buffers = Vec::with_capacity(workers);
    let mut merged = RelationSink::new(ctx.doc_type, ctx.self_join);
    let mut pairs = 0;
    let mut first_error = None;
    for result in worker_results {
        match result {
            Ok(output) => {
                pairs += output.pairs;
                sentence_buffers.push(output.sink.sentences);
                merged.merge_entities(output.sink.entity_texts);
            }
            Err(err) => {
                if first_error.is_none() {
                    first_error = Some(err);
                }
            }
        }
    }
    if let Some(err) = first_error {
        return Err(err);
    }

    info!("Evaluation produced {pairs} refined pairs");
    Ok(JoinOutput {
        doc_type: ctx.doc_type,
        sentence_buffers,
        entity_texts: merged.entity_texts,
        pairs,
    })
}

fn run_worker(
    partitions: &[Partition],
    dataset_r: &Dataset,
    dataset_s: &Dataset,
    ctx: &Context,
    cancelled: &AtomicBool,
) -> Result<WorkerOutput> {
    let mut sink = RelationSink::new(ctx.doc_type, ctx.self_join);
    let mut pairs = 0;
    for partition in partitions {
        if cancelled.load(Ordering::Relaxed) {
            debug!("worker cancelled before partition {}", partition.id);
            break;
        }
        let Some(partition_s) = dataset_s.index.partition(partition.id) else {
            continue;
        };
        match join_partition(partition, partition_s, dataset_r, dataset_s, ctx, &mut sink) {
            Ok(count) => pairs += count,
            Err(err) => {
                cancelled.store(true, Ordering::Relaxed);
                return Err(err);
            }
        }
    }
    Ok(WorkerOutput { sink, pairs })
}

fn resolve<'d>(dataset: &'d Dataset, rec_id: u64, partition_id: i32) -> Result<&'d Shape> {
    dataset.object(rec_id).ok_or_else(|| {
        GeoRelateError::InvalidPartition(format!(
            "partition {partition_id} references missing record {rec_id} in dataset '{}'",
            dataset.spec.nickname
        ))
    })
}

/// Join one common partition: cartesian product with reference-point
/// duplicate elimination. Returns the number of pairs processed here.
fn join_partition(
    partition_r: &Partition,
    partition_s: &Partition,
    dataset_r: &Dataset,
    dataset_s: &Dataset,
    ctx: &Context,
    sink: &mut RelationSink,
) -> Result<u64> {
    let mut pairs = 0;
    for &rec_r in &partition_r.contents {
        let shape_r = resolve(dataset_r, rec_r, partition_r.id)?;
        for &rec_s in &partition_s.contents {
            let shape_s = resolve(dataset_s, rec_s, partition_s.id)?;

            // The pair belongs to the cell holding the lower-left corner of
            // the common MBR; every other common cell skips it.
            let common_xmin = shape_r.mbr.min.x.max(shape_s.mbr.min.x);
            let common_ymin = shape_r.mbr.min.y.max(shape_s.mbr.min.y);
            let owner = partition_of_point(
                &dataset_r.dataspace,
                ctx.partitions_per_dim,
                common_xmin,
                common_ymin,
            );
            if owner != partition_r.id {
                continue;
            }

            relate_pair(shape_r, shape_s, sink);
            pairs += 1;
        }
    }
    Ok(pairs)
}

/// Classify one candidate pair and render it into the sink.
fn relate_pair(shape_r: &Shape, shape_s: &Shape, sink: &mut RelationSink) {
    if shape_r.mbr.min.x > shape_s.mbr.max.x || shape_r.mbr.max.x < shape_s.mbr.min.x {
        // x-disjoint fast path: report the direction without refinement.
        let direction = refine::cardinal_direction_between(shape_r, shape_s);
        let forward = text::directional_relation(&shape_r.name, &shape_s.name, direction);
        match sink.doc_type() {
            DocumentType::Sentences => sink.push_sentence(&forward),
            DocumentType::Paragraphs | DocumentType::ParagraphsCompressed => {
                sink.append_for_entity(&shape_r.name, &forward);
                if !sink.is_self_join() {
                    let reverse = text::directional_relation(
                        &shape_s.name,
                        &shape_r.name,
                        direction.opposite(),
                    );
                    sink.append_for_entity(&shape_s.name, &reverse);
                }
            }
        }
        return;
    }

    let case = classify_mbrs(&shape_r.mbr, &shape_s.mbr);
    let relation = refine::refine(shape_r, shape_s, case);
    match sink.doc_type() {
        DocumentType::Sentences => render_sentence(shape_r, shape_s, relation, sink),
        DocumentType::Paragraphs => render_paragraphs(shape_r, shape_s, relation, sink),
        DocumentType::ParagraphsCompressed => render_compressed(shape_r, shape_s, relation, sink),
    }
}

fn render_sentence(
    shape_r: &Shape,
    shape_s: &Shape,
    relation: TopologyRelation,
    sink: &mut RelationSink,
) {
    let mut group = text::topological_relation(&shape_r.name, &shape_s.name, relation);
    if relation.is_directional() {
        let direction = refine::cardinal_direction_between(shape_r, shape_s);
        group.push_str(&text::directional_relation(
            &shape_r.name,
            &shape_s.name,
            direction,
        ));
    }
    let area = refine::common_area_km2(shape_r, shape_s, relation);
    group.push_str(&text::area_in_sqkm(&shape_r.name, &shape_s.name, area));
    sink.push_sentence(&group);
}

fn render_paragraphs(
    shape_r: &Shape,
    shape_s: &Shape,
    relation: TopologyRelation,
    sink: &mut RelationSink,
) {
    let name_r = &shape_r.name;
    let name_s = &shape_s.name;
    let reverse = !sink.is_self_join();

    sink.append_for_entity(name_r, &text::topological_relation(name_r, name_s, relation));
    if reverse {
        sink.append_for_entity(
            name_s,
            &text::topological_relation(name_s, name_r, relation.swapped()),
        );
    }

    if relation.is_directional() {
        let direction = refine::cardinal_direction_between(shape_r, shape_s);
        sink.append_for_entity(
            name_r,
            &text::directional_relation(name_r, name_s, direction),
        );
        if reverse {
            sink.append_for_entity(
                name_s,
                &text::directional_relation(name_s, name_r, direction.opposite()),
            );
        }
    }

    // The common area is symmetric; both entities get the same sentence.
    let area = refine::common_area_km2(shape_r, shape_s, relation);
    let area_text = text::area_in_sqkm(name_r, name_s, area);
    sink.append_for_entity(name_r, &area_text);
    if reverse {
        sink.append_for_entity(name_s, &area_text);
    }
}

fn render_compressed(
    shape_r: &Shape,
    shape_s: &Shape,
    relation: TopologyRelation,
    sink: &mut RelationSink,
) {
    // A self-joined dataset pairs every entity with itself; skip those.
    if sink.is_self_join() && relation == TopologyRelation::Equal {
        return;
    }

    let (direction, area_text) = if relation.is_directional() {
        (
            Some(refine::cardinal_direction_between(shape_r, shape_s)),
            String::new(),
        )
    } else {
        let area = refine::common_area_km2(shape_r, shape_s, relation);
        (None, text::format_area(area))
    };

    let name_r = &shape_r.name;
    let name_s = &shape_s.name;
    sink.append_for_entity(
        name_r,
        &text::combined_relation(name_r, name_s, relation, direction, &area_text),
    );
    if !sink.is_self_join() {
        sink.append_for_entity(
            name_s,
            &text::combined_relation(
                name_s,
                name_r,
                relation.swapped(),
                direction.map(|d| d.opposite()),
                &area_text,
            ),
        );
    }
}
