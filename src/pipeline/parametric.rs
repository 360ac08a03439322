use rand::rngs::StdRng;
use rand::SeedableRng;

use super::RunStats;
use crate::core::config::SynthConfig;
use crate::core::errors::SetupError;
use crate::dataset::PipelineState;
use crate::llm::TextGenerator;
use crate::rag::ContextRetriever;
use crate::synth::{AnswerContext, AnswerSynthesizer, QaCandidate, QuestionSynthesizer, Seed};

/// Separator between retrieved chunks in the answer context.
const CONTEXT_SEPARATOR: &str = "\n";

#[derive(Debug, Clone)]
pub struct ParametricOptions {
    pub model_id: String,
    /// Number of question attempts, not accepted records.
    pub generations: usize,
    pub top_k: usize,
    pub question_temperature: f32,
    pub answer_temperature: f32,
    pub max_tokens: u32,
    /// Fixed rng seed for reproducible topic/situation sampling.
    pub seed: Option<u64>,
}

impl ParametricOptions {
    pub fn from_config(config: &SynthConfig) -> Self {
        Self {
            model_id: config.generation.model.clone(),
            generations: config.parametric.generations,
            top_k: config.retrieval.top_k,
            question_temperature: config.parametric.question_temperature,
            answer_temperature: config.parametric.answer_temperature,
            max_tokens: config.parametric.max_tokens,
            seed: None,
        }
    }
}

/// Generates a question from a random seed, retrieves context for it and asks
/// for a context-bound answer, `generations` times.
pub async fn run_parametric(
    generator: &dyn TextGenerator,
    retriever: &ContextRetriever,
    state: &mut PipelineState,
    options: &ParametricOptions,
) -> Result<RunStats, SetupError> {
    if options.top_k == 0 {
        return Err(SetupError::Config("top_k must be positive".to_string()));
    }
    let mut rng = match options.seed {
        Some(seed) => StdRng::seed_from_u64(seed),
        None => StdRng::from_os_rng(),
    };
    let questions = QuestionSynthesizer::new(
        generator,
        &options.model_id,
        options.question_temperature,
        options.max_tokens,
    );
    let answers = AnswerSynthesizer::new(
        generator,
        &options.model_id,
        options.answer_temperature,
        options.max_tokens,
    );
    let mut stats = RunStats::default();

    tracing::info!(
        "Starting parametric run: {} generations, top_k {}",
        options.generations,
        options.top_k
    );

    for attempt in 1..=options.generations {
        let seed = Seed::random(&mut rng);

        let question = match questions.parametric(&seed).await {
            Ok(question) => question,
            Err(err) => {
                tracing::warn!("Question generation failed: {}", err);
                stats.failed += 1;
                continue;
            }
        };
        stats.questions += 1;

        if question.is_empty() || state.contains(&question) {
            tracing::debug!("Skipping empty or duplicate question: {:?}", question);
            stats.rejected += 1;
            continue;
        }

        let context = match retriever.retrieve(&question, options.top_k).await {
            Ok(context) => context.joined(CONTEXT_SEPARATOR),
            Err(err) => {
                tracing::warn!("Retrieval failed for '{}': {}", question, err);
                stats.failed += 1;
                continue;
            }
        };

        let answer = match answers
            .answer(&question, AnswerContext::Retrieved(&context))
            .await
        {
            Ok(answer) => answer,
            Err(err) => {
                tracing::warn!("Answer generation failed for '{}': {}", question, err);
                stats.failed += 1;
                continue;
            }
        };

        let candidate = QaCandidate {
            question: question.clone(),
            context,
            answer,
            topic_tags: seed.tags(),
        };
        if state.accept(candidate, None)? {
            stats.accepted += 1;
            tracing::info!(
                "[{}/{}] Accepted ({} | {}): {}",
                attempt,
                options.generations,
                seed.topic,
                seed.situation,
                question
            );
        } else {
            stats.rejected += 1;
        }
    }

    state.flush()?;
    stats.log_summary("Parametric", state.len());
    Ok(stats)
}
