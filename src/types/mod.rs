// Public modules
pub mod content;
pub mod mode;
pub mod model;
pub mod request;
pub mod response;

// Re-exports
pub use content::{Content, Part, Role};
pub use mode::ChatMode;
pub use model::{KnownModel, Model};
pub use request::{GenerateContentRequest, SearchTool, SystemInstruction, Tool};
pub use response::{Candidate, GenerateContentResponse, PromptFeedback};
