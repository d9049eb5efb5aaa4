use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// Selects the system instruction and tool attachment for a chat request.
///
/// A mode never changes the transport mechanism; it only changes the
/// system-instruction string sent with the request and whether the search
/// tool is attached. Every mode except generic [`ChatMode::Chat`] attaches
/// the search tool.
#[derive(Debug, Copy, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ChatMode {
    /// General-purpose conversation.
    #[default]
    Chat,

    /// Pull-request review assistance.
    PrReview,

    /// Repository-documentation assistance.
    Documentation,

    /// Conversation grounded in live web results.
    WebBrowsing,
}

const CHAT_INSTRUCTION: &str = "You are a helpful assistant for software developers. \
     Answer questions clearly and concisely, and format code in fenced blocks.";

const PR_REVIEW_INSTRUCTION: &str = "You are a senior code reviewer. Review the pull request the user \
     describes: point out correctness issues, risky changes, and style \
     problems, and suggest concrete improvements. Be direct and specific, \
     and cite file names and line references when the user provides them.";

const DOCUMENTATION_INSTRUCTION: &str = "You are a technical writer. Produce clear repository documentation \
     from the code and descriptions the user provides: summarize purpose, \
     architecture, and usage, and prefer Markdown with headings and \
     examples.";

const WEB_BROWSING_INSTRUCTION: &str = "You are a research assistant with access to web search. Ground your \
     answers in current information, and say so when search results \
     conflict or are inconclusive.";

impl ChatMode {
    /// The system-instruction string this mode selects.
    pub fn system_instruction(&self) -> &'static str {
        match self {
            ChatMode::Chat => CHAT_INSTRUCTION,
            ChatMode::PrReview => PR_REVIEW_INSTRUCTION,
            ChatMode::Documentation => DOCUMENTATION_INSTRUCTION,
            ChatMode::WebBrowsing => WEB_BROWSING_INSTRUCTION,
        }
    }

    /// Whether the search tool is attached to requests in this mode.
    pub fn uses_search(&self) -> bool {
        !matches!(self, ChatMode::Chat)
    }
}

impl fmt::Display for ChatMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ChatMode::Chat => write!(f, "chat"),
            ChatMode::PrReview => write!(f, "pr-review"),
            ChatMode::Documentation => write!(f, "documentation"),
            ChatMode::WebBrowsing => write!(f, "web-browsing"),
        }
    }
}

impl FromStr for ChatMode {
    type Err = std::convert::Infallible;

    /// Parses a mode name. Unrecognized names fall back to [`ChatMode::Chat`].
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(match s {
            "pr-review" => ChatMode::PrReview,
            "documentation" => ChatMode::Documentation,
            "web-browsing" => ChatMode::WebBrowsing,
            _ => ChatMode::Chat,
        })
    }
}
