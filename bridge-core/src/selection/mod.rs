//! # Menu Selection
//!
//! Turns a user's free-form reply ("3", "three", " Two ") into a choice among
//! the options the assistant last presented. Everything here is synchronous
//! and free of I/O; the registry is the only shared mutable state.

pub mod parser;
pub mod registry;
pub mod resolver;

pub use parser::{parse_number, NUMBER_WORDS};
pub use registry::{OptionRegistry, PendingQuestion};
pub use resolver::{resolve, ActionOutcome};
