//! # pitchbot-channels
//!
//! Chat platform transports for PitchBot.

pub mod telegram;

pub use telegram::TelegramTransport;
