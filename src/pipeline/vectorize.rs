//! Builds or extends the embedding store from plain-text documents.

use std::collections::HashSet;
use std::fs;
use std::path::{Path, PathBuf};

use crate::core::config::SynthConfig;
use crate::core::errors::SetupError;
use crate::dataset::write_json_atomic;
use crate::embedding::{EmbedDirection, Embedder};
use crate::rag::{split_into_chunks, Chunk, ChunkerConfig, TextChunk};

const DOCUMENT_EXTENSIONS: &[&str] = &["txt", "md"];

#[derive(Debug, Clone)]
pub struct VectorizeOptions {
    pub input_dir: PathBuf,
    pub output: PathBuf,
    pub chunker: ChunkerConfig,
    /// Chunks of this many characters or fewer are not embedded.
    pub min_chunk_chars: usize,
    pub batch_size: usize,
}

impl VectorizeOptions {
    pub fn from_config(config: &SynthConfig, input_dir: PathBuf, output: PathBuf) -> Self {
        Self {
            input_dir,
            output,
            chunker: ChunkerConfig {
                chunk_size: config.vectorize.chunk_size,
                chunk_overlap: config.vectorize.chunk_overlap,
            },
            min_chunk_chars: config.vectorize.min_chunk_chars,
            batch_size: config.vectorize.batch_size,
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct VectorizeStats {
    pub documents: usize,
    /// Chunks not yet present in the store.
    pub pending: usize,
    /// Chunks dropped for being too short.
    pub short: usize,
    pub embedded: usize,
    pub failed_batches: usize,
    pub total: usize,
}

/// Chunks every document under `input_dir`, embeds the chunks the store does
/// not have yet and saves the store after each batch.
///
/// Short chunks are dropped after splitting, so the surviving chunks keep the
/// index the chunker gave them and a rerun maps them to the same ids.
pub async fn run_vectorize(
    embedder: &dyn Embedder,
    options: &VectorizeOptions,
) -> Result<VectorizeStats, SetupError> {
    if options.batch_size == 0 {
        return Err(SetupError::Config("batch_size must be positive".to_string()));
    }
    if options.chunker.chunk_overlap >= options.chunker.chunk_size {
        return Err(SetupError::Config(format!(
            "chunk_overlap ({}) must be smaller than chunk_size ({})",
            options.chunker.chunk_overlap, options.chunker.chunk_size
        )));
    }

    let mut store = load_existing(&options.output)?;
    let existing: HashSet<(String, usize)> = store
        .iter()
        .map(|chunk| (chunk.source_id.clone(), chunk.chunk_index))
        .collect();

    let documents = list_documents(&options.input_dir)?;
    let mut stats = VectorizeStats {
        documents: documents.len(),
        ..Default::default()
    };

    let mut pending: Vec<TextChunk> = Vec::new();
    for path in &documents {
        let text = fs::read_to_string(path).map_err(|err| SetupError::io(path, err))?;
        let source_id = path
            .file_name()
            .map(|name| name.to_string_lossy().into_owned())
            .unwrap_or_default();
        for chunk in split_into_chunks(&text, &source_id, options.chunker) {
            if chunk.text.chars().count() <= options.min_chunk_chars {
                stats.short += 1;
                continue;
            }
            if !existing.contains(&(chunk.source_id.clone(), chunk.chunk_index)) {
                pending.push(chunk);
            }
        }
    }
    if stats.short > 0 {
        tracing::debug!(
            "Skipped {} chunks of {} characters or fewer",
            stats.short,
            options.min_chunk_chars
        );
    }
    stats.pending = pending.len();
    tracing::info!(
        "Embedding {} new chunks from {} documents with {}",
        pending.len(),
        documents.len(),
        embedder.model_id()
    );

    for (batch_no, batch) in pending.chunks(options.batch_size).enumerate() {
        let texts: Vec<String> = batch.iter().map(|chunk| chunk.text.clone()).collect();
        let vectors = match embedder.embed(&texts, EmbedDirection::Document).await {
            Ok(vectors) if vectors.len() == batch.len() => vectors,
            Ok(vectors) => {
                tracing::warn!(
                    "Batch {} returned {} vectors for {} texts; skipping",
                    batch_no,
                    vectors.len(),
                    batch.len()
                );
                stats.failed_batches += 1;
                continue;
            }
            Err(err) => {
                tracing::warn!("Embedding batch {} failed: {}", batch_no, err);
                stats.failed_batches += 1;
                continue;
            }
        };

        store.extend(batch.iter().zip(vectors).map(|(chunk, embedding)| Chunk {
            text: chunk.text.clone(),
            embedding,
            source_id: chunk.source_id.clone(),
            chunk_index: chunk.chunk_index,
        }));
        stats.embedded += batch.len();
        write_json_atomic(&options.output, &store)?;
        tracing::debug!("Saved {} chunks to {}", store.len(), options.output.display());
    }

    stats.total = store.len();
    tracing::info!(
        "Vectorize finished: {} embedded, {} failed batches, store has {} chunks",
        stats.embedded,
        stats.failed_batches,
        stats.total
    );
    Ok(stats)
}

fn load_existing(path: &Path) -> Result<Vec<Chunk>, SetupError> {
    if !path.exists() {
        return Ok(Vec::new());
    }
    let raw = fs::read_to_string(path).map_err(|err| SetupError::io(path, err))?;
    if raw.trim().is_empty() {
        return Ok(Vec::new());
    }
    serde_json::from_str(&raw).map_err(|err| SetupError::json(path, err))
}

fn list_documents(dir: &Path) -> Result<Vec<PathBuf>, SetupError> {
    if !dir.is_dir() {
        return Err(SetupError::MissingInput(dir.to_path_buf()));
    }
    let mut documents: Vec<PathBuf> = fs::read_dir(dir)
        .map_err(|err| SetupError::io(dir, err))?
        .filter_map(|entry| entry.ok().map(|e| e.path()))
        .filter(|path| {
            path.is_file()
                && path
                    .extension()
                    .and_then(|ext| ext.to_str())
                    .map(|ext| DOCUMENT_EXTENSIONS.contains(&ext.to_ascii_lowercase().as_str()))
                    .unwrap_or(false)
        })
        .collect();
    documents.sort();
    Ok(documents)
}
