//! Context-constrained answer generation.

use super::prompts;
use crate::core::errors::GenerationError;
use crate::llm::{Answer, GenerationRequest, TextGenerator};

/// What the answer call may draw on.
#[derive(Debug, Clone, Copy)]
pub enum AnswerContext<'c> {
    /// Only the chunks retrieved for the question.
    Retrieved(&'c str),
    /// The chunk group the question came from plus the retrieved chunks.
    SeedAndRetrieved { seed: &'c str, retrieved: &'c str },
}

impl AnswerContext<'_> {
    /// The context text stored alongside the record.
    pub fn record_text(&self) -> String {
        match self {
            AnswerContext::Retrieved(text) => text.to_string(),
            AnswerContext::SeedAndRetrieved { seed, retrieved } => {
                format!("{}\n\n{}", seed, retrieved)
            }
        }
    }
}

pub struct AnswerSynthesizer<'a> {
    generator: &'a dyn TextGenerator,
    model_id: &'a str,
    temperature: f32,
    max_tokens: u32,
}

impl<'a> AnswerSynthesizer<'a> {
    pub fn new(
        generator: &'a dyn TextGenerator,
        model_id: &'a str,
        temperature: f32,
        max_tokens: u32,
    ) -> Self {
        Self {
            generator,
            model_id,
            temperature,
            max_tokens,
        }
    }

    pub async fn answer(
        &self,
        question: &str,
        context: AnswerContext<'_>,
    ) -> Result<Answer, GenerationError> {
        let (system_prompt, user_prompt) = match context {
            AnswerContext::Retrieved(text) => (
                prompts::RETRIEVED_ANSWER_SYSTEM_PROMPT,
                prompts::retrieved_answer_user_prompt(question, text),
            ),
            AnswerContext::SeedAndRetrieved { seed, retrieved } => (
                prompts::GROUNDED_ANSWER_SYSTEM_PROMPT,
                prompts::grounded_answer_user_prompt(question, seed, retrieved),
            ),
        };

        let request = GenerationRequest::new(
            self.model_id,
            system_prompt,
            user_prompt,
            self.temperature,
            self.max_tokens,
        )?;
        let raw = self.generator.generate(&request).await?;
        Ok(Answer::decode(&raw))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::ScriptedGenerator;

    #[tokio::test]
    async fn retrieved_context_uses_strict_prompt() {
        let generator =
            ScriptedGenerator::new(|_| Ok("Apply firm pressure for 10 minutes.".to_string()));
        let synth = AnswerSynthesizer::new(&generator, "gemma3n", 0.2, 350);

        let answer = synth
            .answer(
                "How do I stop a nosebleed?",
                AnswerContext::Retrieved("Pinch the soft part of the nose."),
            )
            .await
            .unwrap();

        assert_eq!(answer, Answer::Text("Apply firm pressure for 10 minutes.".to_string()));
        let request = &generator.requests()[0];
        assert_eq!(request.system_prompt, prompts::RETRIEVED_ANSWER_SYSTEM_PROMPT);
        assert_eq!(
            request.user_prompt,
            "Context:\nPinch the soft part of the nose.\nQ: How do I stop a nosebleed?\nA:"
        );
        assert!((request.temperature - 0.2).abs() < f32::EPSILON);
    }

    #[tokio::test]
    async fn seed_and_retrieved_context_reaches_prompt() {
        let generator = ScriptedGenerator::new(|_| Ok("null".to_string()));
        let synth = AnswerSynthesizer::new(&generator, "gemma3n", 0.3, 400);

        let answer = synth
            .answer(
                "What signs indicate shock?",
                AnswerContext::SeedAndRetrieved {
                    seed: "SEED BLOCK",
                    retrieved: "RETRIEVED BLOCK",
                },
            )
            .await
            .unwrap();

        assert!(answer.is_unanswerable());
        let request = &generator.requests()[0];
        assert_eq!(request.system_prompt, prompts::GROUNDED_ANSWER_SYSTEM_PROMPT);
        assert!(request.user_prompt.contains("ORIGINAL CONTEXT:\nSEED BLOCK"));
        assert!(request.user_prompt.contains("ADDITIONAL MEDICAL CONTEXT:\nRETRIEVED BLOCK"));
    }

    #[tokio::test]
    async fn null_sentinel_inside_fence_is_unanswerable() {
        let generator = ScriptedGenerator::new(|_| Ok("```\nNULL\n```".to_string()));
        let synth = AnswerSynthesizer::new(&generator, "gemma3n", 0.2, 350);
        let answer = synth
            .answer("Snake bite in the open sea?", AnswerContext::Retrieved("ctx"))
            .await
            .unwrap();
        assert_eq!(answer, Answer::Unanswerable);
    }

    #[test]
    fn record_text_combines_both_blocks() {
        let ctx = AnswerContext::SeedAndRetrieved {
            seed: "a",
            retrieved: "b",
        };
        assert_eq!(ctx.record_text(), "a\n\nb");
        assert_eq!(AnswerContext::Retrieved("c").record_text(), "c");
    }
}
