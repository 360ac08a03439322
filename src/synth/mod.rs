//! Question/answer synthesis: seeds, prompts, the two model calls, and the
//! rules a candidate must pass before it becomes a record.

pub mod answer;
pub mod filter;
pub mod prompts;
pub mod question;
pub mod topics;

pub use answer::{AnswerContext, AnswerSynthesizer};
pub use filter::{validate, Rejection, Vocabulary};
pub use question::{decode_question_list, QuestionSynthesizer, QuestionYield};
pub use topics::{Seed, SITUATIONS, TOPICS};

use crate::llm::Answer;

/// A generated question with its answer, before validation.
#[derive(Debug, Clone, PartialEq)]
pub struct QaCandidate {
    pub question: String,
    /// The text the answer was grounded on, exactly as sent to the model.
    pub context: String,
    pub answer: Answer,
    /// Topic and situation for parametric candidates; empty otherwise.
    pub topic_tags: Vec<String>,
}
