use super::RunStats;
use crate::core::config::{QueryMode, SynthConfig};
use crate::core::errors::{GenerationError, SetupError};
use crate::dataset::PipelineState;
use crate::llm::TextGenerator;
use crate::rag::{Chunk, ContextRetriever, RetrievedContext};
use crate::synth::{AnswerContext, AnswerSynthesizer, QaCandidate, QuestionSynthesizer, Vocabulary};

/// Separator between chunks in both the seed block and the retrieved block.
const BLOCK_SEPARATOR: &str = "\n\n";

#[derive(Debug, Clone)]
pub struct GroundedOptions {
    pub model_id: String,
    /// Consecutive store chunks concatenated into one seed block.
    pub chunk_size: usize,
    pub top_k: usize,
    pub query_mode: QueryMode,
    /// Stop after this many chunk groups.
    pub max_rounds: Option<usize>,
    pub question_temperature: f32,
    pub question_max_tokens: u32,
    pub answer_temperature: f32,
    pub answer_max_tokens: u32,
}

impl GroundedOptions {
    pub fn from_config(config: &SynthConfig) -> Self {
        Self {
            model_id: config.generation.model.clone(),
            chunk_size: config.grounded.chunk_size,
            top_k: config.retrieval.top_k,
            query_mode: config.grounded.query_mode,
            max_rounds: None,
            question_temperature: config.grounded.question_temperature,
            question_max_tokens: config.grounded.question_max_tokens,
            answer_temperature: config.grounded.answer_temperature,
            answer_max_tokens: config.grounded.answer_max_tokens,
        }
    }
}

/// Walks the store in groups of `chunk_size`, asks for three questions per
/// group and answers each surviving question from the group plus retrieved
/// chunks. Incomplete trailing groups are skipped.
pub async fn run_grounded(
    generator: &dyn TextGenerator,
    retriever: &ContextRetriever,
    state: &mut PipelineState,
    options: &GroundedOptions,
) -> Result<RunStats, SetupError> {
    if options.chunk_size == 0 {
        return Err(SetupError::Config("chunk_size must be positive".to_string()));
    }
    if options.top_k == 0 {
        return Err(SetupError::Config("top_k must be positive".to_string()));
    }

    let vocabulary = Vocabulary::default();
    let questions = QuestionSynthesizer::new(
        generator,
        &options.model_id,
        options.question_temperature,
        options.question_max_tokens,
    );
    let answers = AnswerSynthesizer::new(
        generator,
        &options.model_id,
        options.answer_temperature,
        options.answer_max_tokens,
    );
    let mut stats = RunStats::default();

    let groups: Vec<&[Chunk]> = retriever
        .store()
        .chunks()
        .chunks_exact(options.chunk_size)
        .take(options.max_rounds.unwrap_or(usize::MAX))
        .collect();
    tracing::info!(
        "Starting grounded run: {} groups of {} chunks, query mode {:?}",
        groups.len(),
        options.chunk_size,
        options.query_mode
    );

    for (round, group) in groups.iter().enumerate() {
        let seed_block = group
            .iter()
            .map(|chunk| chunk.text.as_str())
            .collect::<Vec<_>>()
            .join(BLOCK_SEPARATOR);

        let batch = match questions.grounded(&seed_block, &vocabulary).await {
            Ok(batch) => batch,
            Err(err) => {
                tracing::warn!("Question generation failed for group {}: {}", round, err);
                stats.failed += 1;
                continue;
            }
        };
        stats.questions += batch.len();

        for question in batch {
            if state.contains(&question) {
                tracing::debug!("Skipping duplicate question: {}", question);
                stats.rejected += 1;
                continue;
            }

            let retrieved = match retrieve_for(retriever, options, group, &question).await {
                Ok(context) => context.joined(BLOCK_SEPARATOR),
                Err(err) => {
                    tracing::warn!("Retrieval failed for '{}': {}", question, err);
                    stats.failed += 1;
                    continue;
                }
            };

            let context = AnswerContext::SeedAndRetrieved {
                seed: &seed_block,
                retrieved: &retrieved,
            };
            let answer = match answers.answer(&question, context).await {
                Ok(answer) => answer,
                Err(err) => {
                    tracing::warn!("Answer generation failed for '{}': {}", question, err);
                    stats.failed += 1;
                    continue;
                }
            };

            let candidate = QaCandidate {
                question: question.clone(),
                context: context.record_text(),
                answer,
                topic_tags: Vec::new(),
            };
            if state.accept(candidate, Some(&vocabulary))? {
                stats.accepted += 1;
                tracing::info!("[group {}/{}] Accepted: {}", round + 1, groups.len(), question);
            } else {
                stats.rejected += 1;
            }
        }
    }

    state.flush()?;
    stats.log_summary("Grounded", state.len());
    Ok(stats)
}

async fn retrieve_for(
    retriever: &ContextRetriever,
    options: &GroundedOptions,
    group: &[Chunk],
    question: &str,
) -> Result<RetrievedContext, GenerationError> {
    match options.query_mode {
        QueryMode::Question => retriever.retrieve(question, options.top_k).await,
        QueryMode::SeedChunk => match group.first() {
            Some(first) => retriever.retrieve_by_vector(&first.embedding, options.top_k),
            None => Ok(RetrievedContext::default()),
        },
    }
}
