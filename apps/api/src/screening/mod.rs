//! Resume screening: anonymization, skill and trait detection, scoring,
//! interview-question synthesis and candidate persistence.

pub mod anonymizer;
pub mod behaviour;
pub mod catalog;
pub mod embeddings;
pub mod extract;
pub mod handlers;
pub mod pipeline;
pub mod prompts;
pub mod scorer;
pub mod sink;
pub mod skills;
pub mod synthesizer;
