//! I/O abstractions for line sources and destination sinks.
//!
//! This module provides:
//! - `AsyncInputProvider`: Trait for input sources
//! - `AsyncOutputTarget`: Trait for output destinations
//! - Standard implementations for files and stdin
//! - In-memory implementations for testing

mod async_input;
mod async_output;
mod async_std_io;
mod memory;

pub use async_input::AsyncInputProvider;
pub use async_output::AsyncOutputTarget;
pub use async_std_io::{AsyncFileInput, AsyncFileOutput, AsyncStdinInput};
pub use memory::{AsyncInMemorySource, InMemorySink};
