//! # pitchbot-planner
//!
//! Plan generator implementations for PitchBot.

pub mod openai;

pub use openai::OpenAiPlanner;
