use serde::{Deserialize, Serialize};

/// A single part of a content entry. The streaming text API only ever
/// exchanges text parts with this crate.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Part {
    /// The text carried by this part.
    pub text: String,
}

impl Part {
    /// Create a new `Part` with the given text.
    pub fn new(text: impl Into<String>) -> Self {
        Self { text: text.into() }
    }
}

/// Role type for a content entry.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    /// A message authored by the end user.
    User,

    /// A message authored by the model.
    Model,
}

/// One entry of conversation context: a role plus its parts.
///
/// The full ordered sequence of these is replayed verbatim as conversation
/// context on every request.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Content {
    /// The role of this entry.
    pub role: Role,

    /// The parts of this entry.
    pub parts: Vec<Part>,
}

impl Content {
    /// Create a new `Content` with the given role and a single text part.
    pub fn new(role: Role, text: impl Into<String>) -> Self {
        Self {
            role,
            parts: vec![Part::new(text)],
        }
    }

    /// Create a new user `Content` with a single text part.
    pub fn user(text: impl Into<String>) -> Self {
        Self::new(Role::User, text)
    }

    /// Create a new model `Content` with a single text part.
    pub fn model(text: impl Into<String>) -> Self {
        Self::new(Role::Model, text)
    }

    /// Returns the concatenated text of all parts.
    pub fn text(&self) -> String {
        self.parts
            .iter()
            .map(|part| part.text.as_str())
            .collect::<Vec<_>>()
            .join("")
    }
}

impl From<&str> for Content {
    fn from(text: &str) -> Self {
        Self::user(text)
    }
}

impl From<String> for Content {
    fn from(text: String) -> Self {
        Self::user(text)
    }
}
