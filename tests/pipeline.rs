//! End-to-end runs: INI catalogue, TSV inputs, loader, join and disk flush.

use georelate::config::load_catalogue;
use georelate::{evaluate, load_datasets, Context, DiskWriter, DocumentType};
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};
use tempfile::TempDir;

struct Fixture {
    dir: TempDir,
}

impl Fixture {
    fn new() -> Self {
        Self {
            dir: TempDir::new().unwrap(),
        }
    }

    fn write_file(&self, name: &str, contents: &str) -> PathBuf {
        let path = self.dir.path().join(name);
        let mut file = fs::File::create(&path).unwrap();
        file.write_all(contents.as_bytes()).unwrap();
        path
    }

    fn catalogue(&self, counties: &Path, lakes: &Path, doc_type: &str) -> PathBuf {
        self.write_file(
            "datasets.ini",
            &format!(
                "[counties]\n\
                 path = {}\n\
                 filetype = TSV\n\
                 description = county\n\
                 wktcolidx = 0\n\
                 namecolidx = 1\n\
                 othercolidx = 2\n\
                 documenttype = {doc_type}\n\
                 \n\
                 [lakes]\n\
                 path = {}\n\
                 filetype = TSV\n\
                 description = lake\n\
                 wktcolidx = 0\n\
                 namecolidx = 1\n",
                counties.display(),
                lakes.display(),
            ),
        )
    }
}

const COUNTY_ROWS: &str = "\
POLYGON((0 0,10 0,10 10,0 10,0 0))\tAdams\t42\n\
POLYGON((10 0,20 0,20 10,10 10,10 0))\tBerks\t42\n\
not a geometry\tGhost\t42\n";

const LAKE_ROWS: &str = "\
POLYGON((2 2,8 2,8 8,2 8,2 2))\tClearwater\n\
POINT(15 5)\tMidpoint\n";

fn build_context(fixture: &Fixture, doc_type: &str) -> Context {
    let counties = fixture.write_file("counties.tsv", COUNTY_ROWS);
    let lakes = fixture.write_file("lakes.tsv", LAKE_ROWS);
    let catalogue = fixture.catalogue(&counties, &lakes, doc_type);

    let (spec_r, spec_s, parsed_doc_type) =
        load_catalogue(&catalogue, "counties", "lakes").unwrap();
    Context::new(
        spec_r,
        spec_s,
        parsed_doc_type,
        fixture.dir.path().join("out.txt"),
    )
    .with_partitions_per_dim(16)
}

#[test]
fn end_to_end_sentences() {
    let fixture = Fixture::new();
    let ctx = build_context(&fixture, "SENTENCES");
    assert_eq!(ctx.doc_type, DocumentType::Sentences);
    ctx.validate().unwrap();

    let (dataset_r, dataset_s) = load_datasets(&ctx).unwrap();
    // The malformed county row was dropped.
    assert_eq!(dataset_r.total_objects, 2);
    assert_eq!(dataset_s.total_objects, 2);

    let output = evaluate(&dataset_r, &dataset_s, &ctx).unwrap();
    let mut writer = DiskWriter::create(&ctx.output_path, ctx.append).unwrap();
    writer.write_sentence_buffers(&output.sentence_buffers).unwrap();
    writer.finish().unwrap();

    let contents = fs::read_to_string(&ctx.output_path).unwrap();
    let lines: Vec<&str> = contents.lines().collect();
    // Adams contains Clearwater; Berks contains Midpoint; the FIPS column
    // decorates county names.
    assert!(lines
        .iter()
        .any(|l| l.starts_with("county Adams, Pennsylvania contains lake Clearwater. ")));
    assert!(lines
        .iter()
        .any(|l| *l == "county Berks, Pennsylvania contains lake Midpoint. "));
}

#[test]
fn end_to_end_paragraph_lines() {
    let fixture = Fixture::new();
    let ctx = build_context(&fixture, "PARAGRAPHS");
    assert_eq!(ctx.doc_type, DocumentType::Paragraphs);

    let (dataset_r, dataset_s) = load_datasets(&ctx).unwrap();
    let output = evaluate(&dataset_r, &dataset_s, &ctx).unwrap();

    let mut writer = DiskWriter::create(&ctx.output_path, ctx.append).unwrap();
    writer.write_entity_paragraphs(&output.entity_texts).unwrap();
    writer.finish().unwrap();

    let contents = fs::read_to_string(&ctx.output_path).unwrap();
    let clearwater = contents
        .lines()
        .find(|l| l.starts_with("lake Clearwater: information: "))
        .expect("missing Clearwater paragraph");
    assert!(clearwater.contains("lake Clearwater is inside of county Adams, Pennsylvania. "));
}

#[test]
fn end_to_end_append_mode() {
    let fixture = Fixture::new();
    let ctx = build_context(&fixture, "SENTENCES").with_append(true);

    let (dataset_r, dataset_s) = load_datasets(&ctx).unwrap();
    let output = evaluate(&dataset_r, &dataset_s, &ctx).unwrap();

    for _ in 0..2 {
        let mut writer = DiskWriter::create(&ctx.output_path, ctx.append).unwrap();
        writer.write_sentence_buffers(&output.sentence_buffers).unwrap();
        writer.finish().unwrap();
    }

    let contents = fs::read_to_string(&ctx.output_path).unwrap();
    let expected: usize = output
        .sentence_buffers
        .iter()
        .map(|b| b.lines().count())
        .sum();
    assert_eq!(contents.lines().count(), expected * 2);
}

#[test]
fn self_join_suppresses_reverse_entries() {
    let fixture = Fixture::new();
    let shapes = fixture.write_file(
        "shapes.tsv",
        "POLYGON((0 0,10 0,10 10,0 10,0 0))\tWest Square\n\
         POLYGON((10 0,20 0,20 10,10 10,10 0))\tEast Square\n",
    );
    let catalogue = fixture.write_file(
        "datasets.ini",
        &format!(
            "[shapes]\n\
             path = {}\n\
             filetype = TSV\n\
             description =\n\
             wktcolidx = 0\n\
             namecolidx = 1\n\
             documenttype = PARAGRAPHS_COMPRESSED\n",
            shapes.display()
        ),
    );

    let (spec_r, spec_s, doc_type) = load_catalogue(&catalogue, "shapes", "shapes").unwrap();
    let ctx = Context::new(
        spec_r,
        spec_s,
        doc_type,
        fixture.dir.path().join("out.txt"),
    )
    .with_partitions_per_dim(8);
    assert!(ctx.self_join);

    let (dataset_r, dataset_s) = load_datasets(&ctx).unwrap();
    let output = evaluate(&dataset_r, &dataset_s, &ctx).unwrap();

    // Equal self-pairs are skipped in compressed self-joins, and no reverse
    // entries are generated; each direction comes from its own forward pair.
    let west = output.entity_texts.get("West Square").unwrap();
    let east = output.entity_texts.get("East Square").unwrap();
    assert!(!west.contains("is equal with"));
    assert!(!east.contains("is equal with"));
    assert_eq!(west, "West Square is adjacent to and west of East Square. ");
    assert_eq!(east, "East Square is adjacent to and east of West Square. ");
}

#[test]
fn worker_counts_agree_end_to_end() {
    let fixture = Fixture::new();
    let ctx = build_context(&fixture, "SENTENCES");
    let (dataset_r, dataset_s) = load_datasets(&ctx).unwrap();

    let collect = |threads: usize| {
        let ctx = ctx.clone().with_num_threads(threads);
        let output = evaluate(&dataset_r, &dataset_s, &ctx).unwrap();
        let mut lines: Vec<String> = output
            .sentence_buffers
            .iter()
            .flat_map(|b| b.lines().map(str::to_string))
            .collect();
        lines.sort();
        lines
    };

    let single = collect(1);
    assert_eq!(collect(2), single);
    assert_eq!(collect(5), single);
}
