use serde::{Deserialize, Serialize};

use crate::types::{ChatMode, Content, Part};

/// The system instruction sent with a generation request.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct SystemInstruction {
    /// The parts of the instruction.
    pub parts: Vec<Part>,
}

impl SystemInstruction {
    /// Create a new `SystemInstruction` with a single text part.
    pub fn new(text: impl Into<String>) -> Self {
        Self {
            parts: vec![Part::new(text)],
        }
    }
}

impl From<&str> for SystemInstruction {
    fn from(text: &str) -> Self {
        Self::new(text)
    }
}

impl From<String> for SystemInstruction {
    fn from(text: String) -> Self {
        Self::new(text)
    }
}

/// The search capability, attached as `{"search": {}}`.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct SearchTool {}

/// A tool made available to the model for one request.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Tool {
    /// The search capability.
    pub search: SearchTool,
}

impl Tool {
    /// Create the search tool.
    pub fn search() -> Self {
        Self {
            search: SearchTool {},
        }
    }
}

/// Parameters for a streaming generation request.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct GenerateContentRequest {
    /// The conversation context, in insertion order.
    pub contents: Vec<Content>,

    /// The system instruction, if any.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub system_instruction: Option<SystemInstruction>,

    /// Tools attached to this request. Absent rather than empty when no
    /// tool is attached.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tools: Option<Vec<Tool>>,
}

impl GenerateContentRequest {
    /// Create a new request with the given conversation context.
    pub fn new(contents: Vec<Content>) -> Self {
        Self {
            contents,
            system_instruction: None,
            tools: None,
        }
    }

    /// Sets the system instruction.
    pub fn with_system_instruction(mut self, instruction: impl Into<SystemInstruction>) -> Self {
        self.system_instruction = Some(instruction.into());
        self
    }

    /// Attaches the search tool.
    pub fn with_search(mut self) -> Self {
        self.tools = Some(vec![Tool::search()]);
        self
    }

    /// Builds the request for one chat turn: the full history as context,
    /// the mode's system instruction, and the search tool when the mode
    /// calls for it.
    pub fn for_mode(contents: Vec<Content>, mode: ChatMode) -> Self {
        let request = Self::new(contents).with_system_instruction(mode.system_instruction());
        if mode.uses_search() {
            request.with_search()
        } else {
            request
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::{json, to_value};

    #[test]
    fn request_serialization() {
        let request = GenerateContentRequest::new(vec![Content::user("Hello")])
            .with_system_instruction("Be helpful.");
        let json = to_value(&request).unwrap();

        assert_eq!(
            json,
            json!({
                "contents": [
                    {"role": "user", "parts": [{"text": "Hello"}]}
                ],
                "systemInstruction": {"parts": [{"text": "Be helpful."}]}
            })
        );
    }

    #[test]
    fn search_tool_serialization() {
        let request = GenerateContentRequest::new(vec![Content::user("Hello")]).with_search();
        let json = to_value(&request).unwrap();

        assert_eq!(json["tools"], json!([{"search": {}}]));
    }

    #[test]
    fn tools_absent_without_search() {
        let request = GenerateContentRequest::new(vec![Content::user("Hello")]);
        let json = to_value(&request).unwrap();

        assert!(json.get("tools").is_none());
        assert!(json.get("systemInstruction").is_none());
    }

    #[test]
    fn for_mode_attaches_search_except_chat() {
        let request = GenerateContentRequest::for_mode(vec![Content::user("hi")], ChatMode::Chat);
        assert!(request.tools.is_none());
        assert_eq!(
            request.system_instruction,
            Some(SystemInstruction::new(ChatMode::Chat.system_instruction()))
        );

        let request =
            GenerateContentRequest::for_mode(vec![Content::user("hi")], ChatMode::PrReview);
        assert_eq!(request.tools, Some(vec![Tool::search()]));
    }
}
