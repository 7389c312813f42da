//! ModLink Bus Communication Protocol
//!
//! This crate defines the serial-bus message protocol spoken between the
//! controllers of a ModLink system: one prime controller, one base system
//! controller, and any number of addressable module controllers. The
//! protocol is designed for simplicity, low latency, and robustness on
//! microcontrollers with no heap and no memory protection.
//!
//! # Frame Overview
//!
//! All messages use a simple delimited frame format:
//! ```text
//! ┌───────┬─────────┬───────┬────────┬──────┬─────────────────────┬──────┐
//! │ START │ COMMAND │ DELIM │ SOURCE │ DEST │ FIELD₀ ⋯ FIELDₙ     │ TERM │
//! │ 1B    │ 0–8B    │ 1B    │ 1B     │ 1B   │ DELIM-separated     │ 1B   │
//! └───────┴─────────┴───────┴────────┴──────┴─────────────────────┴──────┘
//! ```
//!
//! Parsing is strictly one byte at a time with no allocation, so the
//! [`Message`] state machine can run directly inside a UART receive
//! interrupt. Each bus channel owns its own `Message`; the parser itself
//! carries no global state.

#![no_std]
#![deny(unsafe_code)]

#[cfg(test)]
extern crate std;

pub mod addr;
pub mod encode;
pub mod message;

pub use addr::Addr;
pub use encode::{EncodeError, MessageWriter, MAX_FRAME_SIZE};
pub use message::{
    Message, COMMAND_LENGTH, FIELD_DELIM, FIELD_LENGTH, NUM_FIELDS, START_MARKER, TERMINATOR,
};
