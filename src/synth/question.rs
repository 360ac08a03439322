//! Question generation: one question from a (topic, situation) seed, or a
//! batch of three from a block of document chunks.

use super::filter::Vocabulary;
use super::prompts;
use super::topics::Seed;
use crate::core::errors::{GenerationError, ParseError};
use crate::llm::{GenerationRequest, TextGenerator};

/// Number of questions requested per chunk-grounded round.
pub const QUESTIONS_PER_BATCH: usize = 3;

/// Decoded output of a chunk-grounded question call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum QuestionYield {
    /// The model reported the chunk has no usable clinical content.
    None,
    Questions(Vec<String>),
}

/// Decodes the model's reply: a JSON array of exactly three strings, or the
/// `null`/`none` sentinel.
pub fn decode_question_list(raw: &str) -> Result<QuestionYield, ParseError> {
    let trimmed = raw.trim();
    if trimmed.eq_ignore_ascii_case("null") || trimmed.eq_ignore_ascii_case("none") {
        return Ok(QuestionYield::None);
    }

    let items: Vec<serde_json::Value> =
        serde_json::from_str(trimmed).map_err(|err| ParseError::NotAnArray(err.to_string()))?;

    if items.len() != QUESTIONS_PER_BATCH {
        return Err(ParseError::WrongCount {
            expected: QUESTIONS_PER_BATCH,
            actual: items.len(),
        });
    }

    items
        .into_iter()
        .enumerate()
        .map(|(i, item)| match item {
            serde_json::Value::String(text) => Ok(text),
            other => Err(ParseError::NotAnArray(format!(
                "element {} is {}, not a string",
                i, other
            ))),
        })
        .collect::<Result<Vec<_>, _>>()
        .map(QuestionYield::Questions)
}

pub struct QuestionSynthesizer<'a> {
    generator: &'a dyn TextGenerator,
    model_id: &'a str,
    temperature: f32,
    max_tokens: u32,
}

impl<'a> QuestionSynthesizer<'a> {
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

    /// Asks for exactly one situational question. No context is retrieved
    /// first; retrieval happens afterwards to ground the answer.
    pub async fn parametric(&self, seed: &Seed) -> Result<String, GenerationError> {
        let request = GenerationRequest::new(
            self.model_id,
            prompts::parametric_question_system_prompt(seed),
            prompts::PARAMETRIC_QUESTION_USER_PROMPT,
            self.temperature,
            self.max_tokens,
        )?;
        let question = self.generator.generate(&request).await?;
        Ok(question.trim().to_string())
    }

    /// Asks for three questions about `block` and applies the vocabulary rule.
    ///
    /// Malformed output and the sentinel both yield an empty list.
    pub async fn grounded(
        &self,
        block: &str,
        vocabulary: &Vocabulary,
    ) -> Result<Vec<String>, GenerationError> {
        let request = GenerationRequest::new(
            self.model_id,
            prompts::GROUNDED_QUESTION_SYSTEM_PROMPT,
            prompts::grounded_question_user_prompt(block),
            self.temperature,
            self.max_tokens,
        )?;
        let raw = self.generator.generate(&request).await?;

        match decode_question_list(&raw) {
            Ok(QuestionYield::Questions(questions)) => Ok(vocabulary.filter_batch(questions)),
            Ok(QuestionYield::None) => {
                tracing::debug!("Model found no clinical content in chunk group");
                Ok(Vec::new())
            }
            Err(err) => {
                let preview: String = raw.chars().take(100).collect();
                tracing::warn!("Failed to parse questions ({}): {}...", err, preview);
                Ok(Vec::new())
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::ScriptedGenerator;

    #[test]
    fn decodes_three_strings() {
        let decoded = decode_question_list(r#"["A wound?", "A burn?", "A fracture?"]"#).unwrap();
        assert_eq!(
            decoded,
            QuestionYield::Questions(vec![
                "A wound?".to_string(),
                "A burn?".to_string(),
                "A fracture?".to_string()
            ])
        );
    }

    #[test]
    fn decodes_sentinels() {
        assert_eq!(decode_question_list("null").unwrap(), QuestionYield::None);
        assert_eq!(decode_question_list(" NONE ").unwrap(), QuestionYield::None);
    }

    #[test]
    fn rejects_malformed_output() {
        assert!(matches!(
            decode_question_list("Here are three questions: 1. ..."),
            Err(ParseError::NotAnArray(_))
        ));
        assert!(matches!(
            decode_question_list(r#"["one?", "two?"]"#),
            Err(ParseError::WrongCount { expected: 3, actual: 2 })
        ));
        assert!(matches!(
            decode_question_list(r#"["one?", 2, "three?"]"#),
            Err(ParseError::NotAnArray(_))
        ));
        assert!(decode_question_list(r#"{"questions": []}"#).is_err());
    }

    #[tokio::test]
    async fn parametric_prompt_carries_seed_and_sampling() {
        let generator = ScriptedGenerator::new(|_| {
            Ok("  How do I stop bleeding from a deep cut with no bandages?\n".to_string())
        });
        let synth = QuestionSynthesizer::new(&generator, "gemma3n", 0.7, 350);
        let seed = Seed {
            topic: "severe bleeding",
            situation: "a flooded village cut off from emergency services",
        };

        let question = synth.parametric(&seed).await.unwrap();
        assert_eq!(question, "How do I stop bleeding from a deep cut with no bandages?");

        let requests = generator.requests();
        assert_eq!(requests.len(), 1);
        assert!(requests[0].system_prompt.contains("severe bleeding"));
        assert!(requests[0].system_prompt.contains("a flooded village"));
        assert_eq!(requests[0].user_prompt, "Generate a new question.");
        assert_eq!(requests[0].max_tokens, 350);
    }

    #[tokio::test]
    async fn grounded_handles_fenced_array() {
        let generator = ScriptedGenerator::new(|_| {
            Ok("```json\n[\"How do you assess breathing in a patient?\", \"What dose of aspirin is used?\", \"How do you dress a wound?\"]\n```".to_string())
        });
        let synth = QuestionSynthesizer::new(&generator, "gemma3n", 0.8, 300);
        let questions = synth
            .grounded("chunk text", &Vocabulary::default())
            .await
            .unwrap();
        assert_eq!(questions.len(), 3);
        assert!(generator.requests()[0].user_prompt.contains("TEXT:\nchunk text"));
    }

    #[tokio::test]
    async fn grounded_parse_failure_is_zero_yield() {
        let generator = ScriptedGenerator::new(|_| Ok("1. What? 2. Why? 3. How?".to_string()));
        let synth = QuestionSynthesizer::new(&generator, "gemma3n", 0.8, 300);
        let questions = synth.grounded("text", &Vocabulary::default()).await.unwrap();
        assert!(questions.is_empty());
    }

    #[tokio::test]
    async fn generation_error_propagates() {
        let generator =
            ScriptedGenerator::new(|_| Err(GenerationError::transport("test", "timeout")));
        let synth = QuestionSynthesizer::new(&generator, "gemma3n", 0.8, 300);
        assert!(synth.grounded("text", &Vocabulary::default()).await.is_err());
    }
}
