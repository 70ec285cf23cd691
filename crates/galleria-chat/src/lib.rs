//! Conversational plumbing for the Galleria backend.
//!
//! Assembles the ordered message list sent to the hosted completion
//! collaborator, talks to that collaborator over its narrow request/response
//! contract, and post-processes replies into display-ready text.

pub mod assembler;
pub mod completion;
pub mod error;
pub mod postprocess;

pub use assembler::{build_prompt, PromptMessage};
pub use completion::{AzureCompletionClient, CompletionClient, MockCompletionClient};
pub use error::ChatError;
pub use postprocess::postprocess;
