//! # Trivia Client Library
//!
//! The terminal client for the LAN trivia game. It listens for the server's
//! UDP discovery offers, connects over TCP, introduces itself with a name
//! handshake, then plays: printing everything the server broadcasts and
//! answering questions through a pluggable [`provider::AnswerProvider`],
//! a human at the keyboard or an automated player.
//!
//! ## Module Organization
//!
//! - [`discovery`]: waits for a valid offer datagram and extracts the
//!   server's address and TCP port
//! - [`game`]: the connect/handshake/play loop
//! - [`provider`]: the answer-provider capability interface and its stock
//!   implementations

pub mod discovery;
pub mod game;
pub mod provider;
