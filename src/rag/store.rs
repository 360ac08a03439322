//! Embedding store loading.
//!
//! The store is a single JSON array of `{text, embedding, pdf, chunk_id}`
//! records produced by the document vectorizer. It is read fully into memory
//! before the index is built.

use std::collections::HashSet;
use std::fs::File;
use std::io::BufReader;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::core::errors::SetupError;

/// A span of source text paired with its embedding vector.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Chunk {
    pub text: String,
    pub embedding: Vec<f32>,
    /// Source document identifier.
    #[serde(rename = "pdf", alias = "source")]
    pub source_id: String,
    /// Position of the chunk within its source document.
    #[serde(rename = "chunk_id")]
    pub chunk_index: usize,
}

/// Ordered chunks sharing one embedding dimensionality.
#[derive(Debug, Clone)]
pub struct EmbeddingStore {
    chunks: Vec<Chunk>,
    dimension: usize,
}

impl EmbeddingStore {
    pub fn load(path: &Path) -> Result<Self, SetupError> {
        if !path.exists() {
            return Err(SetupError::MissingInput(path.to_path_buf()));
        }

        let file = File::open(path).map_err(|err| SetupError::io(path, err))?;
        let chunks: Vec<Chunk> = serde_json::from_reader(BufReader::new(file))
            .map_err(|err| SetupError::json(path, err))?;

        let store = Self::from_chunks(chunks)?;
        tracing::info!(
            "Loaded {} chunks (dimension {}) from {}",
            store.len(),
            store.dimension,
            path.display()
        );
        Ok(store)
    }

    /// Checks the store invariants: non-empty, one dimensionality, unique
    /// `(source_id, chunk_index)` pairs.
    pub fn from_chunks(chunks: Vec<Chunk>) -> Result<Self, SetupError> {
        let first = chunks
            .first()
            .ok_or_else(|| SetupError::InvalidStore("store contains no chunks".to_string()))?;
        let dimension = first.embedding.len();
        if dimension == 0 {
            return Err(SetupError::InvalidStore(
                "embedding vectors must not be empty".to_string(),
            ));
        }

        let mut seen = HashSet::with_capacity(chunks.len());
        for (position, chunk) in chunks.iter().enumerate() {
            if chunk.embedding.len() != dimension {
                return Err(SetupError::InvalidStore(format!(
                    "record {} has dimension {}, expected {}",
                    position,
                    chunk.embedding.len(),
                    dimension
                )));
            }
            if !seen.insert((chunk.source_id.as_str(), chunk.chunk_index)) {
                return Err(SetupError::InvalidStore(format!(
                    "duplicate chunk {}#{} at record {}",
                    chunk.source_id, chunk.chunk_index, position
                )));
            }
        }

        Ok(Self { chunks, dimension })
    }

    pub fn chunks(&self) -> &[Chunk] {
        &self.chunks
    }

    pub fn get(&self, position: usize) -> Option<&Chunk> {
        self.chunks.get(position)
    }

    pub fn dimension(&self) -> usize {
        self.dimension
    }

    pub fn len(&self) -> usize {
        self.chunks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.chunks.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    fn chunk(text: &str, source: &str, index: usize, embedding: Vec<f32>) -> Chunk {
        Chunk {
            text: text.to_string(),
            embedding,
            source_id: source.to_string(),
            chunk_index: index,
        }
    }

    #[test]
    fn loads_records_in_file_order() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("pdf_embeddings.json");
        fs::write(
            &path,
            r#"[
                {"text": "Apply direct pressure.", "embedding": [1.0, 0.0], "pdf": "bec.pdf", "chunk_id": 0},
                {"text": "Elevate the limb.", "embedding": [0.0, 1.0], "pdf": "bec.pdf", "chunk_id": 1}
            ]"#,
        )
        .unwrap();

        let store = EmbeddingStore::load(&path).unwrap();
        assert_eq!(store.len(), 2);
        assert_eq!(store.dimension(), 2);
        assert_eq!(store.chunks()[1].text, "Elevate the limb.");
        assert_eq!(store.chunks()[1].source_id, "bec.pdf");
        assert_eq!(store.chunks()[1].chunk_index, 1);
    }

    #[test]
    fn accepts_source_alias() {
        let parsed: Chunk = serde_json::from_str(
            r#"{"text": "t", "embedding": [0.5], "source": "ifrc.pdf", "chunk_id": 3}"#,
        )
        .unwrap();
        assert_eq!(parsed.source_id, "ifrc.pdf");
    }

    #[test]
    fn missing_file_is_reported() {
        let dir = tempfile::tempdir().unwrap();
        let err = EmbeddingStore::load(&dir.path().join("absent.json")).unwrap_err();
        assert!(matches!(err, SetupError::MissingInput(_)));
    }

    #[test]
    fn rejects_mixed_dimensions() {
        let err = EmbeddingStore::from_chunks(vec![
            chunk("a", "doc", 0, vec![1.0, 0.0]),
            chunk("b", "doc", 1, vec![1.0, 0.0, 0.0]),
        ])
        .unwrap_err();
        assert!(err.to_string().contains("dimension 3"));
    }

    #[test]
    fn rejects_duplicate_chunk_ids() {
        let err = EmbeddingStore::from_chunks(vec![
            chunk("a", "doc", 0, vec![1.0]),
            chunk("b", "doc", 0, vec![0.5]),
        ])
        .unwrap_err();
        assert!(err.to_string().contains("duplicate chunk doc#0"));
    }

    #[test]
    fn rejects_empty_store() {
        assert!(EmbeddingStore::from_chunks(Vec::new()).is_err());
    }
}
