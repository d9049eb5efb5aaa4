//! Streaming chat sessions.
//!
//! This module holds the conversation-state layer built on top of the
//! [`Gemini`] client:
//!
//! - [`config`]: session configuration (model, greeting, default mode)
//! - [`session`]: the [`ChatSession`] driving one streaming request at a
//!   time, with cooperative cancellation via [`AbortHandle`]
//!
//! [`Gemini`]: crate::Gemini

mod config;
mod session;

pub use config::ChatConfig;
pub use session::{AbortHandle, ChatSession};
