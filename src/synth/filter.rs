//! Candidate validation: emptiness, duplicates, the unanswerable sentinel and
//! the medical vocabulary rule for chunk-grounded questions.

use std::collections::HashSet;

use thiserror::Error;

use super::QaCandidate;

/// Terms of which a grounded question must contain at least one.
pub const REQUIRED_MEDICAL_TERMS: &[&str] = &[
    "patient",
    "treatment",
    "procedure",
    "medical",
    "emergency",
    "rescue",
    "first aid",
    "injury",
    "wound",
    "bleeding",
    "fracture",
    "vital signs",
    "medication",
    "dose",
    "symptom",
    "diagnosis",
    "equipment",
    "device",
    "technique",
    "protocol",
    "assessment",
    "breathing",
    "airway",
    "circulation",
    "pulse",
    "blood pressure",
];

/// Terms that mark a question as being about the source material itself.
pub const FORBIDDEN_META_TERMS: &[&str] = &[
    "handbook",
    "manual",
    "guide",
    "document",
    "section",
    "chapter",
    "license",
    "copyright",
    "creative commons",
    "training material",
    "educational content",
    "course",
    "curriculum",
    "syllabus",
    "topics covered",
    "purpose of",
    "structure of",
    "organized",
];

/// Questions shorter than this (after trim) never pass the vocabulary rule.
const MIN_QUESTION_CHARS: usize = 10;

/// A generated batch survives only if at least this many questions pass.
pub const MIN_PASSING_PER_BATCH: usize = 2;

/// Why a candidate was dropped.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum Rejection {
    #[error("question is empty")]
    EmptyQuestion,
    #[error("question was already generated")]
    DuplicateQuestion,
    #[error("model marked the question unanswerable")]
    Unanswerable,
    #[error("question failed the medical vocabulary check")]
    Vocabulary,
}

#[derive(Debug, Clone)]
pub struct Vocabulary {
    required: Vec<String>,
    forbidden: Vec<String>,
}

impl Default for Vocabulary {
    fn default() -> Self {
        Self::new(REQUIRED_MEDICAL_TERMS, FORBIDDEN_META_TERMS)
    }
}

impl Vocabulary {
    pub fn new(required: &[&str], forbidden: &[&str]) -> Self {
        Self {
            required: required.iter().map(|t| t.to_lowercase()).collect(),
            forbidden: forbidden.iter().map(|t| t.to_lowercase()).collect(),
        }
    }

    pub fn accepts(&self, question: &str) -> bool {
        let trimmed = question.trim();
        if trimmed.chars().count() <= MIN_QUESTION_CHARS {
            return false;
        }

        let lower = trimmed.to_lowercase();
        let has_forbidden = self.forbidden.iter().any(|term| lower.contains(term.as_str()));
        let has_medical = self.required.iter().any(|term| lower.contains(term.as_str()));
        has_medical && !has_forbidden
    }

    /// Keeps the passing questions if enough of the batch passes, otherwise
    /// discards the whole batch.
    pub fn filter_batch(&self, questions: Vec<String>) -> Vec<String> {
        let passing: Vec<String> = questions
            .into_iter()
            .filter(|q| self.accepts(q))
            .map(|q| q.trim().to_string())
            .collect();

        if passing.len() < MIN_PASSING_PER_BATCH {
            tracing::debug!(
                "Discarding question batch: only {} passed the vocabulary check",
                passing.len()
            );
            return Vec::new();
        }
        passing
    }
}

/// Runs every rejection rule against `candidate`.
///
/// `vocabulary` is only given for chunk-grounded candidates.
pub fn validate(
    candidate: &QaCandidate,
    seen: &HashSet<String>,
    vocabulary: Option<&Vocabulary>,
) -> Result<(), Rejection> {
    if candidate.question.trim().is_empty() {
        return Err(Rejection::EmptyQuestion);
    }
    if seen.contains(&candidate.question) {
        return Err(Rejection::DuplicateQuestion);
    }
    if candidate.answer.is_unanswerable() {
        return Err(Rejection::Unanswerable);
    }
    if let Some(vocabulary) = vocabulary {
        if !vocabulary.accepts(&candidate.question) {
            return Err(Rejection::Vocabulary);
        }
    }
    Ok(())
}
