//! Prompt text for the two-stage question/answer protocol.

use super::topics::Seed;

pub const PARAMETRIC_QUESTION_USER_PROMPT: &str = "Generate a new question.";

const PARAMETRIC_QUESTION_TEMPLATE: &str = "\
You are a seasoned expert in emergency medicine and humanitarian crises. Generate one realistic, non-repetitive, concise, and practical question in English that someone might ask a chatbot about first aid in the following situation:
{situation}

The question must be feasible in such conditions and relevant to real-life emergencies involving:
{topic}.

Avoid general knowledge, disclaimers, or repeated questions.

Generate only one question at a time, highly specific and practical.
";

pub const RETRIEVED_ANSWER_SYSTEM_PROMPT: &str = "\
You are a medical professional. Answer ONLY using the provided context below. \
If you cannot answer with the context, or the question does not make sense (for example a snake bite in the middle of the sea), respond with NULL. \
Do not invent or hallucinate.";

pub const GROUNDED_QUESTION_SYSTEM_PROMPT: &str = r#"You are a medical emergency instructor creating training questions for doctors, nurses, and paramedics.

CRITICAL REQUIREMENTS:
- Questions MUST be practical medical scenarios that healthcare workers face
- Questions MUST be about patient care, treatment procedures, or emergency response
- Questions MUST be answerable using the provided medical context
- Return ONLY a valid JSON array with exactly 3 questions
- Format: ["Question 1?", "Question 2?", "Question 3?"]
- Do not wrap the array in code fences

FORBIDDEN QUESTIONS (DO NOT CREATE):
- About licenses, copyrights, or document metadata
- About training materials, handbooks, or educational content
- About document structure, chapters, or organization
- Abstract concepts not related to direct patient care
- Questions mentioning "document", "handbook", "manual", "guide", "section", "chapter"

REQUIRED QUESTION TYPES (CREATE THESE):
- Patient assessment: "What signs indicate...?"
- Treatment procedures: "How should you treat...?"
- Emergency protocols: "What is the first step when...?"
- Equipment usage: "When using [medical device], what precautions...?"
- Clinical decisions: "If a patient presents with X, you should...?"
- Rescue techniques: "During a rescue, how do you...?"

EXAMPLES OF GOOD QUESTIONS:
- "What vital signs should be monitored in a patient with severe blood loss?"
- "How do you properly immobilize a suspected spinal injury?"
- "When should you use a tourniquet for bleeding control?"

If the provided text does not contain enough medical information to create 3 practical healthcare questions, return exactly: null

Do not include any explanation, just the JSON array or null."#;

pub const GROUNDED_ANSWER_SYSTEM_PROMPT: &str = r#"You are an emergency medicine physician providing clinical guidance.

STRICT REQUIREMENTS:
1. Answer ONLY medical questions about patient care, treatment, or emergency procedures
2. Answer ONLY if you can provide a complete clinical answer using the provided context
3. If the question is about documents, training materials, licenses, or administrative topics: return exactly "null"
4. If the question cannot be answered with the medical context provided: return exactly "null"
5. Provide specific, actionable clinical guidance for healthcare professionals
6. Include specific steps, dosages, timings, or measurements when available in context

Never add information that is not present in the context.

Return either a detailed clinical answer OR exactly "null"."#;

pub fn parametric_question_system_prompt(seed: &Seed) -> String {
    PARAMETRIC_QUESTION_TEMPLATE
        .replace("{situation}", seed.situation)
        .replace("{topic}", seed.topic)
}

pub fn grounded_question_user_prompt(block: &str) -> String {
    format!(
        "Based on this medical text, create exactly 3 questions:\n\nTEXT:\n{}\n\nReturn only the JSON array of 3 questions.",
        block
    )
}

pub fn retrieved_answer_user_prompt(question: &str, context: &str) -> String {
    format!("Context:\n{}\nQ: {}\nA:", context, question)
}

pub fn grounded_answer_user_prompt(question: &str, seed_block: &str, retrieved: &str) -> String {
    format!(
        "QUESTION: {}\n\nORIGINAL CONTEXT:\n{}\n\nADDITIONAL MEDICAL CONTEXT:\n{}\n\n\
         Provide a complete medical answer using this context, or return \"null\" if insufficient information or non-medical question.",
        question, seed_block, retrieved
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parametric_prompt_embeds_seed() {
        let seed = Seed {
            topic: "animal bite",
            situation: "a remote outpost in the Arctic",
        };
        let prompt = parametric_question_system_prompt(&seed);
        assert!(prompt.contains("a remote outpost in the Arctic\n"));
        assert!(prompt.contains("involving:\nanimal bite."));
        assert!(!prompt.contains('{'));
    }

    #[test]
    fn retrieved_answer_prompt_layout() {
        assert_eq!(
            retrieved_answer_user_prompt("How?", "line one\nline two"),
            "Context:\nline one\nline two\nQ: How?\nA:"
        );
    }
}
