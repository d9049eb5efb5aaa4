//! Configuration for chat sessions.

use crate::types::{ChatMode, KnownModel, Model};

/// Default greeting seeded into every new session's history.
const DEFAULT_GREETING: &str = "Hi! I can help you review pull requests, write documentation, or answer questions about your code.";

/// Configuration for a chat session.
#[derive(Debug, Clone)]
pub struct ChatConfig {
    /// The model to use for generating responses.
    pub model: Model,

    /// The seed greeting entry (model role) every session starts with.
    pub greeting: String,

    /// The mode used by [`ChatSession::send_default`].
    ///
    /// [`ChatSession::send_default`]: crate::chat::ChatSession::send_default
    pub default_mode: ChatMode,
}

impl ChatConfig {
    /// Creates a new ChatConfig with default values.
    ///
    /// Defaults:
    /// - Model: gemini-2.0-flash
    /// - Mode: chat
    pub fn new() -> Self {
        Self {
            model: Model::Known(KnownModel::Gemini20Flash),
            greeting: DEFAULT_GREETING.to_string(),
            default_mode: ChatMode::Chat,
        }
    }

    /// Sets the model to use.
    pub fn with_model(mut self, model: Model) -> Self {
        self.model = model;
        self
    }

    /// Sets the seed greeting.
    pub fn with_greeting(mut self, greeting: impl Into<String>) -> Self {
        self.greeting = greeting.into();
        self
    }

    /// Sets the default mode.
    pub fn with_default_mode(mut self, mode: ChatMode) -> Self {
        self.default_mode = mode;
        self
    }
}

impl Default for ChatConfig {
    fn default() -> Self {
        Self::new()
    }
}
