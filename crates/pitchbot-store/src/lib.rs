//! # pitchbot-store
//!
//! SQLite-backed user state store for PitchBot.

pub mod store;

pub use store::Store;
