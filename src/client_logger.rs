//! Logging trait for client operations.
//!
//! This module provides the [`ClientLogger`] trait that allows embedders to
//! capture the API interactions passing through the [`Gemini`] client.
//!
//! [`Gemini`]: crate::Gemini

use crate::types::GenerateContentResponse;

/// A trait for logging client operations.
///
/// Implement this trait to record all API interactions: each decoded
/// streaming frame, and the full text reconstructed when a stream finishes.
///
/// # Example
///
/// ```rust,ignore
/// use geminius::{ClientLogger, GenerateContentResponse};
/// use std::sync::Mutex;
///
/// struct FileLogger {
///     file: Mutex<std::fs::File>,
/// }
///
/// impl ClientLogger for FileLogger {
///     fn log_stream_frame(&self, frame: &GenerateContentResponse) {
///         let mut file = self.file.lock().unwrap();
///         writeln!(file, "frame: {}", serde_json::to_string(frame).unwrap()).unwrap();
///     }
///
///     fn log_stream_text(&self, text: &str) {
///         let mut file = self.file.lock().unwrap();
///         writeln!(file, "complete: {text}").unwrap();
///     }
/// }
/// ```
pub trait ClientLogger: Send + Sync {
    /// Log an individual decoded streaming frame.
    fn log_stream_frame(&self, frame: &GenerateContentResponse);

    /// Log the full text reconstructed from a completed (or cancelled)
    /// stream.
    fn log_stream_text(&self, text: &str);
}
