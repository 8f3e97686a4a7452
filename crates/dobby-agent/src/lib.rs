mod context;

pub mod client;
pub mod emergency;
pub mod error;
pub mod failover;
pub mod prompt;

pub use client::{CompletionClient, GenerationClient};
pub use error::GenerationError;
