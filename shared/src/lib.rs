//! Code shared between the trivia server and client.
//!
//! The crate carries the pieces both ends of the protocol must agree on:
//!
//! - [`wire`]: the fixed-layout UDP discovery offer and the newline-framed
//!   text messages exchanged over the game connection
//! - [`config`]: the JSON game configuration (server identity, ports,
//!   answer token sets, question bank, timing knobs)
//! - [`style`]: ANSI escape helpers for the colored game messages

pub mod config;
pub mod style;
pub mod wire;

pub use config::{ConfigError, GameConfig, Question};
pub use wire::{Offer, WireError};
