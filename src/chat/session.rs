//! Core chat session management.
//!
//! This module provides the `ChatSession` struct which manages conversation
//! state and drives one streaming request/response cycle at a time.

use std::sync::{Arc, Mutex};

use futures::{Stream, StreamExt};
use tokio_util::sync::CancellationToken;

use crate::chat::config::ChatConfig;
use crate::client::Gemini;
use crate::client_logger::ClientLogger;
use crate::error::Result;
use crate::observability::{CHAT_CANCELLATIONS, CHAT_TURNS};
use crate::types::{ChatMode, Content, GenerateContentRequest, GenerateContentResponse};

/// A cloneable handle that aborts the session's in-flight request.
///
/// Cancellation is cooperative and fire-and-forget: the handle signals the
/// request and returns immediately; the `send` call in progress observes the
/// signal and returns the partial buffer. Cancelling while the session is
/// idle is a no-op because `send` re-arms the signal before each request.
#[derive(Clone, Debug)]
pub struct AbortHandle {
    current: Arc<Mutex<CancellationToken>>,
}

impl AbortHandle {
    fn new() -> Self {
        Self {
            current: Arc::new(Mutex::new(CancellationToken::new())),
        }
    }

    /// Signals the in-flight request, if any, to abort.
    pub fn cancel(&self) {
        self.lock().cancel();
    }

    /// Installs a fresh token for the next request and returns it.
    fn arm(&self) -> CancellationToken {
        let token = CancellationToken::new();
        *self.lock() = token.clone();
        token
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, CancellationToken> {
        // A poisoned lock only means another thread panicked mid-swap; the
        // token inside is still usable.
        self.current.lock().unwrap_or_else(|e| e.into_inner())
    }
}

/// A chat session that manages conversation state and API interactions.
///
/// The session holds the ordered conversation history, seeded with a
/// greeting entry, and replays it verbatim as context on every request.
///
/// # Contract
///
/// At most one request is in flight per session at a time. `send` takes
/// `&mut self`, so the borrow checker enforces what the source design left
/// to convention: there is no queuing, and a concurrent second `send` is
/// unrepresentable. `reset` while a `send` is in flight is likewise
/// unrepresentable on a single session.
pub struct ChatSession {
    client: Gemini,
    config: ChatConfig,
    history: Vec<Content>,
    abort: AbortHandle,
    logger: Option<Arc<dyn ClientLogger>>,
}

impl ChatSession {
    /// Creates a new chat session with the given client and configuration.
    ///
    /// The history starts with a single model-role greeting entry.
    pub fn new(client: Gemini, config: ChatConfig) -> Self {
        let history = vec![Content::model(config.greeting.clone())];
        Self {
            client,
            config,
            history,
            abort: AbortHandle::new(),
            logger: None,
        }
    }

    /// Attaches a logger that observes stream frames and completed text.
    pub fn with_logger(mut self, logger: Arc<dyn ClientLogger>) -> Self {
        self.logger = Some(logger);
        self
    }

    /// Sends a user message and streams the response.
    ///
    /// The user entry is appended to history synchronously before the
    /// network call begins, so a failed call still records it. After each
    /// received delta, `on_progress` is invoked with the cumulative buffer
    /// so far (not the delta). The buffer grows strictly by suffix, so
    /// successive `on_progress` arguments are prefixes of one another.
    ///
    /// On normal completion a model entry holding the full buffer is
    /// appended to history (when non-empty) and the buffer is returned. On
    /// cancellation the partial buffer is returned as a normal result and
    /// history gets no model entry; a few extra `on_progress` calls may
    /// occur in the race window, so the returned buffer, not the last
    /// callback, is authoritative.
    ///
    /// # Errors
    ///
    /// Returns an error on connection failure or a non-success HTTP status,
    /// carrying the provider's error message when it sends one.
    pub async fn send(
        &mut self,
        user_message: &str,
        mode: ChatMode,
        mut on_progress: impl FnMut(&str),
    ) -> Result<String> {
        CHAT_TURNS.click();
        let token = self.abort.arm();

        self.history.push(Content::user(user_message));
        let request = GenerateContentRequest::for_mode(self.history.clone(), mode);

        let stream = tokio::select! {
            biased;
            _ = token.cancelled() => {
                CHAT_CANCELLATIONS.click();
                return Ok(String::new());
            }
            stream = self.client.stream_generate(&self.config.model, &request) => stream?,
        };

        let text = drain_stream(stream, &token, self.logger.as_deref(), &mut on_progress).await?;

        if let Some(logger) = &self.logger {
            logger.log_stream_text(&text);
        }

        if token.is_cancelled() {
            CHAT_CANCELLATIONS.click();
            return Ok(text);
        }
        if !text.is_empty() {
            self.history.push(Content::model(text.clone()));
        }
        Ok(text)
    }

    /// Sends a user message using the configured default mode.
    pub async fn send_default(
        &mut self,
        user_message: &str,
        on_progress: impl FnMut(&str),
    ) -> Result<String> {
        self.send(user_message, self.config.default_mode, on_progress)
            .await
    }

    /// Signals the in-flight request, if any, to abort.
    ///
    /// No-op when the session is idle. To cancel while a `send` future is
    /// being awaited, use the handle from [`ChatSession::abort_handle`]
    /// from another task.
    pub fn cancel(&self) {
        self.abort.cancel();
    }

    /// Returns a cloneable handle that can abort this session's in-flight
    /// request from another task.
    pub fn abort_handle(&self) -> AbortHandle {
        self.abort.clone()
    }

    /// Truncates history back to the single seed greeting entry.
    pub fn reset(&mut self) {
        self.history.clear();
        self.history.push(Content::model(self.config.greeting.clone()));
    }

    /// Returns the conversation history, in insertion order.
    pub fn history(&self) -> &[Content] {
        &self.history
    }

    /// Returns the number of entries in the conversation history.
    pub fn message_count(&self) -> usize {
        self.history.len()
    }
}

/// Drains a frame stream into a cumulative text buffer.
///
/// Chunks are processed strictly in arrival order. Once the token is
/// cancelled, remaining frames are discarded and the buffer accumulated so
/// far is returned; cancellation is not guaranteed to win the race against
/// a frame already being processed.
async fn drain_stream<S>(
    mut stream: S,
    token: &CancellationToken,
    logger: Option<&dyn ClientLogger>,
    on_progress: &mut impl FnMut(&str),
) -> Result<String>
where
    S: Stream<Item = Result<GenerateContentResponse>> + Unpin,
{
    let mut buffer = String::new();
    loop {
        let frame = tokio::select! {
            biased;
            _ = token.cancelled() => break,
            frame = stream.next() => frame,
        };
        match frame {
            Some(Ok(frame)) => {
                if let Some(logger) = logger {
                    logger.log_stream_frame(&frame);
                }
                if let Some(delta) = frame.first_text() {
                    buffer.push_str(delta);
                    if !token.is_cancelled() {
                        on_progress(&buffer);
                    }
                }
            }
            Some(Err(err)) => return Err(err),
            None => break,
        }
    }
    Ok(buffer)
}
