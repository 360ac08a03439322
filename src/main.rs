use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Context;
use clap::{Args, Parser, Subcommand};

use medqa_synth::core::config::{AppPaths, ConfigService, QueryMode, SynthConfig};
use medqa_synth::core::logging;
use medqa_synth::dataset::PipelineState;
use medqa_synth::embedding::build_embedder;
use medqa_synth::llm::build_generator;
use medqa_synth::pipeline::{
    run_grounded, run_parametric, run_vectorize, GroundedOptions, ParametricOptions,
    VectorizeOptions,
};
use medqa_synth::rag::{ContextRetriever, EmbeddingStore, Metric};

#[derive(Parser, Debug)]
#[command(
    name = "medqa-synth",
    about = "Synthesize first-aid question/answer datasets grounded in an embedded document store"
)]
struct Cli {
    /// Configuration file (defaults to config.yml in the project root)
    #[arg(long, global = true, env = "MEDQA_CONFIG_PATH")]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Ask the model for situational questions, then answer them from retrieved chunks
    Parametric(ParametricArgs),
    /// Generate questions from consecutive store chunks and answer them from the chunks plus retrieval
    Grounded(GroundedArgs),
    /// Chunk and embed .txt/.md documents into an embedding store
    Vectorize(VectorizeArgs),
}

#[derive(Args, Debug)]
struct RetrievalArgs {
    /// Embedding store JSON produced by `vectorize`
    #[arg(long, alias = "embeddings_file")]
    embeddings_file: PathBuf,

    /// Output dataset JSON; existing records are kept and extended
    #[arg(long)]
    output: Option<PathBuf>,

    /// Number of chunks retrieved per question (1-1000)
    #[arg(long, value_parser = clap::value_parser!(u64).range(1..=1000))]
    top_k: Option<u64>,

    /// Similarity metric: l2 or cosine
    #[arg(long)]
    metric: Option<Metric>,
}

#[derive(Args, Debug)]
struct ParametricArgs {
    #[command(flatten)]
    retrieval: RetrievalArgs,

    /// Number of question attempts
    #[arg(long, value_parser = clap::value_parser!(u64).range(1..))]
    generations: Option<u64>,

    /// Seed for topic/situation sampling
    #[arg(long)]
    seed: Option<u64>,
}

#[derive(Args, Debug)]
struct GroundedArgs {
    #[command(flatten)]
    retrieval: RetrievalArgs,

    /// Consecutive chunks concatenated per question round
    #[arg(long, alias = "chunk_size", value_parser = clap::value_parser!(u64).range(1..=1000))]
    chunk_size: Option<u64>,

    /// Stop after this many chunk groups
    #[arg(long)]
    max_rounds: Option<usize>,

    /// Retrieval query: each generated question, or the first chunk of the group
    #[arg(long, value_enum)]
    query_mode: Option<QueryMode>,
}

#[derive(Args, Debug)]
struct VectorizeArgs {
    /// Directory containing .txt/.md documents
    #[arg(long)]
    input_dir: PathBuf,

    /// Embedding store JSON to create or extend
    #[arg(long)]
    output: PathBuf,

    #[arg(long, alias = "chunk_size", value_parser = clap::value_parser!(u64).range(1..))]
    chunk_size: Option<u64>,

    #[arg(long)]
    chunk_overlap: Option<u64>,

    /// Chunks with this many characters or fewer are not embedded
    #[arg(long)]
    min_chunk_chars: Option<u64>,

    /// Texts per embedding request
    #[arg(long, value_parser = clap::value_parser!(u64).range(1..=4096))]
    batch: Option<u64>,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let paths = Arc::new(AppPaths::new());
    let service = ConfigService::new(paths.clone()).with_config_path(cli.config.clone());
    let mut config = service
        .load_settings()
        .with_context(|| format!("Failed to load configuration from {}", service.config_path().display()))?;
    logging::init(&paths, &config.logging).context("Failed to set up logging")?;

    match cli.command {
        Command::Parametric(args) => parametric(&mut config, &paths, args).await,
        Command::Grounded(args) => grounded(&mut config, &paths, args).await,
        Command::Vectorize(args) => vectorize(&mut config, args).await,
    }
}

async fn parametric(
    config: &mut SynthConfig,
    paths: &AppPaths,
    args: ParametricArgs,
) -> anyhow::Result<()> {
    if let Some(generations) = args.generations {
        config.parametric.generations = generations as usize;
    }
    let output = args
        .retrieval
        .output
        .clone()
        .unwrap_or_else(|| paths.data_dir.join("firstaid_qa.json"));
    let retriever = build_retriever(config, &args.retrieval, Metric::L2)?;
    let generator = build_generator(&config.generation).context("Failed to set up generation")?;
    let mut state = PipelineState::load(&output, config.parametric.flush_every)
        .context("Failed to load existing dataset")?;

    let mut options = ParametricOptions::from_config(config);
    options.seed = args.seed;

    run_parametric(generator.as_ref(), &retriever, &mut state, &options)
        .await
        .context("Parametric run aborted")?;
    Ok(())
}

async fn grounded(
    config: &mut SynthConfig,
    paths: &AppPaths,
    args: GroundedArgs,
) -> anyhow::Result<()> {
    if let Some(chunk_size) = args.chunk_size {
        config.grounded.chunk_size = chunk_size as usize;
    }
    if let Some(query_mode) = args.query_mode {
        config.grounded.query_mode = query_mode;
    }
    let output = args
        .retrieval
        .output
        .clone()
        .unwrap_or_else(|| paths.data_dir.join("advanced_firstaid_qa.json"));
    let retriever = build_retriever(config, &args.retrieval, Metric::Cosine)?;
    let generator = build_generator(&config.generation).context("Failed to set up generation")?;
    let mut state = PipelineState::load(&output, config.grounded.flush_every)
        .context("Failed to load existing dataset")?
        .with_source_tag(config.grounded.source_tag.clone());

    let mut options = GroundedOptions::from_config(config);
    options.max_rounds = args.max_rounds;

    run_grounded(generator.as_ref(), &retriever, &mut state, &options)
        .await
        .context("Grounded run aborted")?;
    Ok(())
}

async fn vectorize(config: &mut SynthConfig, args: VectorizeArgs) -> anyhow::Result<()> {
    if let Some(chunk_size) = args.chunk_size {
        config.vectorize.chunk_size = chunk_size as usize;
    }
    if let Some(chunk_overlap) = args.chunk_overlap {
        config.vectorize.chunk_overlap = chunk_overlap as usize;
    }
    if let Some(min_chunk_chars) = args.min_chunk_chars {
        config.vectorize.min_chunk_chars = min_chunk_chars as usize;
    }
    if let Some(batch) = args.batch {
        config.vectorize.batch_size = batch as usize;
    }

    let embedder = build_embedder(&config.embedding).context("Failed to set up embedding")?;
    let options = VectorizeOptions::from_config(config, args.input_dir, args.output);
    run_vectorize(embedder.as_ref(), &options)
        .await
        .context("Vectorize run aborted")?;
    Ok(())
}

fn build_retriever(
    config: &mut SynthConfig,
    args: &RetrievalArgs,
    default_metric: Metric,
) -> anyhow::Result<ContextRetriever> {
    if let Some(top_k) = args.top_k {
        config.retrieval.top_k = top_k as usize;
    }
    let metric = args
        .metric
        .or(config.retrieval.metric)
        .unwrap_or(default_metric);

    let store = EmbeddingStore::load(&args.embeddings_file).with_context(|| {
        format!(
            "Failed to load embedding store {}",
            args.embeddings_file.display()
        )
    })?;
    let embedder = build_embedder(&config.embedding).context("Failed to set up embedding")?;
    Ok(ContextRetriever::new(store, metric, embedder)?)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn top_k_outside_range_is_rejected_by_the_parser() {
        for bad in ["0", "1001", "-3"] {
            let parsed = Cli::try_parse_from([
                "medqa-synth",
                "parametric",
                "--embeddings-file",
                "store.json",
                "--top-k",
                bad,
            ]);
            assert!(parsed.is_err(), "--top-k {} should be rejected", bad);
        }

        let cli = Cli::try_parse_from([
            "medqa-synth",
            "grounded",
            "--embeddings_file",
            "store.json",
            "--top-k",
            "7",
        ])
        .unwrap();
        match cli.command {
            Command::Grounded(args) => assert_eq!(args.retrieval.top_k, Some(7)),
            other => panic!("unexpected command {:?}", other),
        }
    }
}
