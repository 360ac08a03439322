pub mod core;
pub mod dataset;
pub mod embedding;
pub mod llm;
pub mod pipeline;
pub mod rag;
pub mod synth;
pub mod vector_math;

#[cfg(test)]
mod testing;
