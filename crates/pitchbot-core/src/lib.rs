//! # pitchbot-core
//!
//! Core types, traits, configuration, and error handling for PitchBot.

pub mod config;
pub mod error;
pub mod event;
pub mod traits;

pub use config::shellexpand;
