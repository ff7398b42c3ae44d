//! OpenAI-compatible chat completions client

pub mod client;
pub mod types;

pub use client::ChatClient;
pub use types::*;
