// ranking/ - Opportunity scoring core.
//
// types      : catalog records, profile, explanation
// similarity : cosine similarity
// rules      : rule-based adjustments (ordered pipeline)
// engine     : catalog embedding stage + rank driver

pub mod engine;
pub mod error;
pub mod rules;
pub mod similarity;
pub mod types;
