//! Join scenarios driven through the public load/evaluate pipeline.

use georelate::shape::degrees_to_square_kilometers;
use georelate::{evaluate, load_datasets, Context, DatasetSpec, DocumentType, FileFormat, JoinOutput};
use std::io::Write;
use std::path::PathBuf;
use tempfile::NamedTempFile;

fn write_rows(rows: &[&str]) -> NamedTempFile {
    let mut file = NamedTempFile::new().unwrap();
    for row in rows {
        writeln!(file, "{row}").unwrap();
    }
    file
}

fn spec_for(nickname: &str, path: PathBuf) -> DatasetSpec {
    DatasetSpec {
        nickname: nickname.into(),
        path,
        file_format: FileFormat::Wkt,
        description: String::new(),
        wkt_col_idx: 0,
        name_col_idx: 1,
        other_col_idx: None,
    }
}

fn run_join(
    rows_r: &[&str],
    rows_s: &[&str],
    doc_type: DocumentType,
    partitions_per_dim: i32,
    threads: usize,
) -> JoinOutput {
    let file_r = write_rows(rows_r);
    let file_s = write_rows(rows_s);
    let ctx = Context::new(
        spec_for("r", file_r.path().to_path_buf()),
        spec_for("s", file_s.path().to_path_buf()),
        doc_type,
        PathBuf::from("unused.txt"),
    )
    .with_partitions_per_dim(partitions_per_dim)
    .with_num_threads(threads);

    let (dataset_r, dataset_s) = load_datasets(&ctx).unwrap();
    evaluate(&dataset_r, &dataset_s, &ctx).unwrap()
}

fn sentence_lines(output: &JoinOutput) -> Vec<String> {
    output
        .sentence_buffers
        .iter()
        .flat_map(|buffer| buffer.lines().map(str::to_string))
        .collect()
}

#[test]
fn scenario_polygon_contains_polygon() {
    let output = run_join(
        &["POLYGON((0 0,10 0,10 10,0 10,0 0))\touter"],
        &["POLYGON((2 2,8 2,8 8,2 8,2 2))\tinner"],
        DocumentType::Sentences,
        10,
        1,
    );

    // Common area of a containment pair is the area of the contained shape.
    let expected_area = degrees_to_square_kilometers(36.0, 5.0);
    let lines = sentence_lines(&output);
    assert_eq!(lines.len(), 1);
    assert_eq!(
        lines[0],
        format!(
            "outer contains inner. outer and inner have approximately {expected_area:.2} square kilometers of common area. "
        )
    );
}

#[test]
fn scenario_adjacent_squares_meet() {
    let output = run_join(
        &["POLYGON((0 0,10 0,10 10,0 10,0 0))\tleft"],
        &["POLYGON((10 0,20 0,20 10,10 10,10 0))\tright"],
        DocumentType::Sentences,
        10,
        1,
    );

    let lines = sentence_lines(&output);
    assert_eq!(lines.len(), 1);
    // Meeting pairs get a direction clause and no area clause.
    assert_eq!(lines[0], "left is adjacent to right. left is west of right. ");
}

#[test]
fn scenario_point_inside_polygon() {
    let output = run_join(
        &["POINT(5 5)\tdot"],
        &["POLYGON((0 0,10 0,10 10,0 10,0 0))\tsquare"],
        DocumentType::Sentences,
        10,
        1,
    );

    let lines = sentence_lines(&output);
    assert_eq!(lines.len(), 1);
    // Points have zero area, so no area clause is rendered.
    assert_eq!(lines[0], "dot is inside of square. ");
}

#[test]
fn scenario_far_disjoint_direction_only() {
    // A single grid cell keeps the far-apart pair in one common partition,
    // where the x-disjoint fast path reports the direction alone.
    let output = run_join(
        &["POLYGON((0 0,5 0,5 5,0 5,0 0))\tnear"],
        &["POLYGON((100 100,105 100,105 105,100 105,100 100))\tfar"],
        DocumentType::Sentences,
        1,
        1,
    );

    let lines = sentence_lines(&output);
    assert_eq!(lines.len(), 1);
    assert_eq!(lines[0], "near is southwest of far. ");
}

#[test]
fn scenario_equal_polygons() {
    let output = run_join(
        &["POLYGON((0 0,10 0,10 10,0 10,0 0))\tcopy a"],
        &["POLYGON((0 0,10 0,10 10,0 10,0 0))\tcopy b"],
        DocumentType::Sentences,
        10,
        1,
    );

    let expected_area = degrees_to_square_kilometers(100.0, 5.0);
    let lines = sentence_lines(&output);
    assert_eq!(lines.len(), 1);
    assert_eq!(
        lines[0],
        format!(
            "copy a is equal with copy b. copy a and copy b have approximately {expected_area:.2} square kilometers of common area. "
        )
    );
}

#[test]
fn scenario_linestring_crosses_polygon() {
    let output = run_join(
        &["LINESTRING(0 0,10 10)\tdiagonal"],
        &["POLYGON((2 2,8 2,8 8,2 8,2 2))\tblock"],
        DocumentType::Sentences,
        10,
        1,
    );

    let lines = sentence_lines(&output);
    assert_eq!(lines.len(), 1);
    // Linestring overlaps have zero area by convention: no area clause.
    assert_eq!(lines[0], "diagonal intersects with block. ");
}

#[test]
fn reference_point_dedup_refines_once() {
    // Both MBRs span many coarse cells and overlap in several of them; the
    // pair must still be refined exactly once.
    let output = run_join(
        &["POLYGON((0 0,60 0,60 60,0 60,0 0))\tbig r"],
        &["POLYGON((30 30,90 30,90 90,30 90,30 30))\tbig s"],
        DocumentType::Sentences,
        8,
        1,
    );

    assert_eq!(output.pairs, 1);
    assert_eq!(sentence_lines(&output).len(), 1);
}

#[test]
fn sentence_output_is_deterministic_across_worker_counts() {
    let rows_r = [
        "POLYGON((0 0,10 0,10 10,0 10,0 0))\tr0",
        "POLYGON((20 20,30 20,30 30,20 30,20 20))\tr1",
        "POINT(25 25)\tr2",
        "LINESTRING(0 0,40 40)\tr3",
        "POLYGON((5 5,15 5,15 15,5 15,5 5))\tr4",
    ];
    let rows_s = [
        "POLYGON((2 2,8 2,8 8,2 8,2 2))\ts0",
        "POLYGON((20 20,30 20,30 30,20 30,20 20))\ts1",
        "POINT(7 7)\ts2",
        "POLYGON((35 0,45 0,45 10,35 10,35 0))\ts3",
    ];

    let mut baseline = sentence_lines(&run_join(
        &rows_r,
        &rows_s,
        DocumentType::Sentences,
        6,
        1,
    ));
    baseline.sort();
    assert!(!baseline.is_empty());

    for threads in [2, 3, 4] {
        let mut lines = sentence_lines(&run_join(
            &rows_r,
            &rows_s,
            DocumentType::Sentences,
            6,
            threads,
        ));
        lines.sort();
        assert_eq!(lines, baseline, "worker count {threads} changed the output");
    }
}

#[test]
fn paragraphs_render_forward_and_reverse() {
    let output = run_join(
        &["POLYGON((0 0,10 0,10 10,0 10,0 0))\touter"],
        &["POLYGON((2 2,8 2,8 8,2 8,2 2))\tinner"],
        DocumentType::Paragraphs,
        10,
        1,
    );

    let forward = output.entity_texts.get("outer").unwrap();
    let reverse = output.entity_texts.get("inner").unwrap();
    assert!(forward.starts_with("outer contains inner. "));
    assert!(reverse.starts_with("inner is inside of outer. "));
    // The symmetric area sentence is shared verbatim.
    assert!(forward.contains("square kilometers of common area"));
    assert!(reverse.contains("square kilometers of common area"));
}

#[test]
fn paragraphs_reverse_direction_is_opposite() {
    let output = run_join(
        &["POLYGON((0 0,10 0,10 10,0 10,0 0))\tleft"],
        &["POLYGON((10 0,20 0,20 10,10 10,10 0))\tright"],
        DocumentType::Paragraphs,
        10,
        1,
    );

    assert!(output
        .entity_texts
        .get("left")
        .unwrap()
        .contains("left is west of right. "));
    assert!(output
        .entity_texts
        .get("right")
        .unwrap()
        .contains("right is east of left. "));
}

#[test]
fn compressed_combines_relation_and_area() {
    let output = run_join(
        &["POLYGON((0 0,10 0,10 10,0 10,0 0))\touter"],
        &["POLYGON((2 2,8 2,8 8,2 8,2 2))\tinner"],
        DocumentType::ParagraphsCompressed,
        10,
        1,
    );

    let expected_area = degrees_to_square_kilometers(36.0, 5.0);
    assert_eq!(
        output.entity_texts.get("outer").unwrap(),
        &format!(
            "outer contains inner and they have {expected_area:.2} square km of area in common. "
        )
    );
    assert_eq!(
        output.entity_texts.get("inner").unwrap(),
        &format!(
            "inner is inside of outer and they have {expected_area:.2} square km of area in common. "
        )
    );
}

#[test]
fn compressed_meet_carries_direction_instead_of_area() {
    let output = run_join(
        &["POLYGON((0 0,10 0,10 10,0 10,0 0))\tleft"],
        &["POLYGON((10 0,20 0,20 10,10 10,10 0))\tright"],
        DocumentType::ParagraphsCompressed,
        10,
        1,
    );

    assert_eq!(
        output.entity_texts.get("left").unwrap(),
        "left is adjacent to and west of right. "
    );
    assert_eq!(
        output.entity_texts.get("right").unwrap(),
        "right is adjacent to and east of left. "
    );
}
