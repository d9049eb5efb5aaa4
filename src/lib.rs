// Public modules
pub mod chat;
pub mod client;
pub mod client_logger;
pub mod error;
pub mod hosting;
pub mod sse;
pub mod types;

mod observability;

// Re-exports
pub use chat::{AbortHandle, ChatConfig, ChatSession};
pub use client::Gemini;
pub use client_logger::ClientLogger;
pub use error::{Error, Result};
pub use observability::register_biometrics;
pub use types::*;
