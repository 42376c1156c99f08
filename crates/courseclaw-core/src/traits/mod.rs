//! Capability traits: the seams between the dialogue engine and its backends.

pub mod embedder;
pub mod provider;
pub mod tool;

pub use embedder::Embedder;
pub use provider::Provider;
pub use tool::Tool;
