use clap::Parser;
use georelate::config::{self, DEFAULT_PARTITIONS_PER_DIM};
use georelate::{evaluate, load_datasets, Context, DiskWriter, DocumentType};
use std::path::PathBuf;
use std::process::ExitCode;
use std::time::Instant;
use tracing::{error, info};

/// Describe the pairwise spatial relations between two datasets as text.
#[derive(Parser, Debug)]
#[command(version, about, long_about = None)]
struct Args {
    /// Dataset R nickname in the datasets INI catalogue
    #[arg(short = 'R', value_name = "NICKNAME")]
    dataset_r: String,

    /// Dataset S nickname in the datasets INI catalogue
    #[arg(short = 'S', value_name = "NICKNAME")]
    dataset_s: String,

    /// Grid partitions per dimension
    #[arg(short = 'p', default_value_t = DEFAULT_PARTITIONS_PER_DIM)]
    partitions: i32,

    /// Worker thread count
    #[arg(short = 't', default_value_t = 1)]
    threads: usize,

    /// Output file path
    #[arg(short = 'o', value_name = "PATH")]
    output: PathBuf,

    /// Append to the output file instead of truncating it
    #[arg(short = 'a')]
    append: bool,

    /// Path to the datasets INI catalogue
    #[arg(short = 'c', default_value = "datasets.ini", value_name = "PATH")]
    config: PathBuf,
}

fn run(args: Args) -> anyhow::Result<()> {
    let (spec_r, spec_s, doc_type) =
        config::load_catalogue(&args.config, &args.dataset_r, &args.dataset_s)?;
    let ctx = Context::new(spec_r, spec_s, doc_type, args.output.clone())
        .with_partitions_per_dim(args.partitions)
        .with_num_threads(args.threads)
        .with_append(args.append);
    ctx.validate()?;
    if ctx.self_join {
        info!("Both datasets share a path; running as a self-join");
    }

    let timer = Instant::now();
    let (dataset_r, dataset_s) = load_datasets(&ctx)?;
    info!(
        "Loaded {} and {} objects in {:.2}s",
        dataset_r.total_objects,
        dataset_s.total_objects,
        timer.elapsed().as_secs_f64()
    );

    let timer = Instant::now();
    let output = evaluate(&dataset_r, &dataset_s, &ctx)?;
    info!(
        "Evaluation finished in {:.2}s ({} pairs)",
        timer.elapsed().as_secs_f64(),
        output.pairs
    );

    let mut writer = DiskWriter::create(&ctx.output_path, ctx.append)?;
    writer.write_ground_rules()?;
    match output.doc_type {
        DocumentType::Sentences => writer.write_sentence_buffers(&output.sentence_buffers)?,
        DocumentType::Paragraphs | DocumentType::ParagraphsCompressed => {
            writer.write_entity_paragraphs(&output.entity_texts)?
        }
    }
    writer.finish()?;
    info!("Wrote {}", ctx.output_path.display());

    Ok(())
}

fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "georelate=info".into()),
        )
        .init();

    let args = Args::parse();
    match run(args) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            error!("{err:#}");
            ExitCode::FAILURE
        }
    }
}
