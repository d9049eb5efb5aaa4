//! Integration tests for the geminius library.
//!
//! These run against local stub servers; no real credentials are required.

use std::sync::{Arc, Mutex};

use geminius::hosting::{Anonymous, HostingClient, StaticToken};
use geminius::{
    ChatConfig, ChatMode, ChatSession, ClientLogger, Gemini, GenerateContentResponse, Role,
};

fn delta_frame(text: &str) -> String {
    format!(
        "data: {{\"candidates\":[{{\"content\":{{\"role\":\"model\",\"parts\":[{{\"text\":\"{text}\"}}]}}}}]}}\n\n"
    )
}

fn client_for(server: &mockito::Server) -> Gemini {
    Gemini::with_options(
        Some("test-key".to_string()),
        Some(format!("{}/", server.url())),
        None,
    )
    .expect("client should build")
}

const STREAM_PATH: &str = "/models/gemini-2.0-flash:streamGenerateContent";

#[tokio::test]
async fn streaming_send_accumulates_deltas_and_updates_history() {
    let mut server = mockito::Server::new_async().await;
    let body = format!("{}{}", delta_frame("Hi"), delta_frame(" there"));
    let mock = server
        .mock("POST", STREAM_PATH)
        .match_query(mockito::Matcher::Any)
        .with_status(200)
        .with_header("content-type", "text/event-stream")
        .with_body(body)
        .create_async()
        .await;

    let mut session = ChatSession::new(client_for(&server), ChatConfig::default());
    let mut progress = Vec::new();
    let text = session
        .send("Hello", ChatMode::Chat, |buf| progress.push(buf.to_string()))
        .await
        .expect("send should succeed");

    assert_eq!(text, "Hi there");
    assert_eq!(progress, vec!["Hi".to_string(), "Hi there".to_string()]);

    // Seed greeting, user entry, model entry, in that order.
    let history = session.history();
    assert_eq!(history.len(), 3);
    assert_eq!(history[0].role, Role::Model);
    assert_eq!(history[1].role, Role::User);
    assert_eq!(history[1].text(), "Hello");
    assert_eq!(history[2].role, Role::Model);
    assert_eq!(history[2].text(), "Hi there");

    mock.assert_async().await;
}

#[tokio::test]
async fn progress_buffers_grow_by_prefix() {
    let mut server = mockito::Server::new_async().await;
    let body = format!(
        "{}{}{}{}",
        delta_frame("The"),
        delta_frame(" quick"),
        delta_frame(" brown"),
        delta_frame(" fox")
    );
    server
        .mock("POST", STREAM_PATH)
        .match_query(mockito::Matcher::Any)
        .with_status(200)
        .with_body(body)
        .create_async()
        .await;

    let mut session = ChatSession::new(client_for(&server), ChatConfig::default());
    let mut progress = Vec::new();
    let text = session
        .send("go", ChatMode::Chat, |buf| progress.push(buf.to_string()))
        .await
        .unwrap();

    assert_eq!(text, "The quick brown fox");
    for pair in progress.windows(2) {
        assert!(pair[1].starts_with(&pair[0]));
    }
    assert_eq!(progress.last(), Some(&text));
}

#[tokio::test]
async fn provider_error_message_is_surfaced() {
    let mut server = mockito::Server::new_async().await;
    server
        .mock("POST", STREAM_PATH)
        .match_query(mockito::Matcher::Any)
        .with_status(400)
        .with_header("content-type", "application/json")
        .with_body(r#"{"error":{"message":"bad key","status":"INVALID_ARGUMENT"}}"#)
        .create_async()
        .await;

    let mut session = ChatSession::new(client_for(&server), ChatConfig::default());
    let err = session
        .send("Hello", ChatMode::Chat, |_| {})
        .await
        .unwrap_err();

    assert!(err.is_bad_request());
    assert_eq!(err.message(), "bad key");

    // The user entry stays recorded even though the call failed.
    let history = session.history();
    assert_eq!(history.len(), 2);
    assert_eq!(history[1].role, Role::User);
}

#[tokio::test]
async fn error_without_body_gets_generic_status_message() {
    let mut server = mockito::Server::new_async().await;
    server
        .mock("POST", STREAM_PATH)
        .match_query(mockito::Matcher::Any)
        .with_status(503)
        .create_async()
        .await;

    let mut session = ChatSession::new(client_for(&server), ChatConfig::default());
    let err = session
        .send("Hello", ChatMode::Chat, |_| {})
        .await
        .unwrap_err();

    assert!(err.is_server_error());
    assert!(err.message().contains("503"));
}

#[tokio::test]
async fn empty_stream_appends_no_model_entry() {
    let mut server = mockito::Server::new_async().await;
    server
        .mock("POST", STREAM_PATH)
        .match_query(mockito::Matcher::Any)
        .with_status(200)
        .with_body("")
        .create_async()
        .await;

    let mut session = ChatSession::new(client_for(&server), ChatConfig::default());
    let text = session.send("Hello", ChatMode::Chat, |_| {}).await.unwrap();

    assert_eq!(text, "");
    assert_eq!(session.history().len(), 2);
}

#[tokio::test]
async fn reset_truncates_to_seed_greeting() {
    let mut server = mockito::Server::new_async().await;
    server
        .mock("POST", STREAM_PATH)
        .match_query(mockito::Matcher::Any)
        .with_status(200)
        .with_body(delta_frame("answer"))
        .expect_at_least(1)
        .create_async()
        .await;

    let mut session = ChatSession::new(client_for(&server), ChatConfig::default());
    session.send("one", ChatMode::Chat, |_| {}).await.unwrap();
    session.send("two", ChatMode::Chat, |_| {}).await.unwrap();
    assert_eq!(session.history().len(), 5);

    session.reset();
    assert_eq!(session.history().len(), 1);
    assert_eq!(session.history()[0].role, Role::Model);
}

#[tokio::test]
async fn stale_cancel_does_not_affect_next_send() {
    let mut server = mockito::Server::new_async().await;
    server
        .mock("POST", STREAM_PATH)
        .match_query(mockito::Matcher::Any)
        .with_status(200)
        .with_body(delta_frame("fine"))
        .create_async()
        .await;

    let mut session = ChatSession::new(client_for(&server), ChatConfig::default());
    // Cancelling while idle must not poison the next request.
    session.cancel();
    session.abort_handle().cancel();

    let text = session.send("Hello", ChatMode::Chat, |_| {}).await.unwrap();
    assert_eq!(text, "fine");
    assert_eq!(session.history().len(), 3);
}

#[tokio::test]
async fn cancel_mid_stream_returns_partial_without_model_entry() {
    let mut server = mockito::Server::new_async().await;
    let body = format!("{}{}", delta_frame("Hi"), delta_frame(" there"));
    server
        .mock("POST", STREAM_PATH)
        .match_query(mockito::Matcher::Any)
        .with_status(200)
        .with_header("content-type", "text/event-stream")
        .with_body(body)
        .create_async()
        .await;

    let mut session = ChatSession::new(client_for(&server), ChatConfig::default());
    let abort = session.abort_handle();
    // Cancel as soon as the first delta lands; everything after it is
    // discarded.
    let text = session
        .send("Hello", ChatMode::Chat, |_| abort.cancel())
        .await
        .expect("cancellation is a normal return, not an error");

    assert_eq!(text, "Hi");

    // Seed greeting plus the user entry; no model entry on cancellation.
    let history = session.history();
    assert_eq!(history.len(), 2);
    assert_eq!(history[0].role, Role::Model);
    assert_eq!(history[1].role, Role::User);
    assert_eq!(history[1].text(), "Hello");
}

#[tokio::test]
async fn non_chat_mode_attaches_search_tool() {
    let mut server = mockito::Server::new_async().await;
    let mock = server
        .mock("POST", STREAM_PATH)
        .match_query(mockito::Matcher::Any)
        .match_body(mockito::Matcher::PartialJson(serde_json::json!({
            "tools": [{"search": {}}]
        })))
        .with_status(200)
        .with_body(delta_frame("reviewed"))
        .create_async()
        .await;

    let mut session = ChatSession::new(client_for(&server), ChatConfig::default());
    let text = session
        .send("review this", ChatMode::PrReview, |_| {})
        .await
        .unwrap();

    assert_eq!(text, "reviewed");
    mock.assert_async().await;
}

#[tokio::test]
async fn chat_mode_sends_system_instruction() {
    let mut server = mockito::Server::new_async().await;
    let mock = server
        .mock("POST", STREAM_PATH)
        .match_query(mockito::Matcher::Any)
        .match_body(mockito::Matcher::PartialJson(serde_json::json!({
            "systemInstruction": {
                "parts": [{"text": ChatMode::Chat.system_instruction()}]
            }
        })))
        .with_status(200)
        .with_body(delta_frame("ok"))
        .create_async()
        .await;

    let mut session = ChatSession::new(client_for(&server), ChatConfig::default());
    session.send("hi", ChatMode::Chat, |_| {}).await.unwrap();
    mock.assert_async().await;
}

struct RecordingLogger {
    frames: Mutex<usize>,
    texts: Mutex<Vec<String>>,
}

impl ClientLogger for RecordingLogger {
    fn log_stream_frame(&self, _frame: &GenerateContentResponse) {
        *self.frames.lock().unwrap() += 1;
    }

    fn log_stream_text(&self, text: &str) {
        self.texts.lock().unwrap().push(text.to_string());
    }
}

#[tokio::test]
async fn logger_observes_frames_and_final_text() {
    let mut server = mockito::Server::new_async().await;
    let body = format!("{}{}", delta_frame("Hi"), delta_frame(" there"));
    server
        .mock("POST", STREAM_PATH)
        .match_query(mockito::Matcher::Any)
        .with_status(200)
        .with_body(body)
        .create_async()
        .await;

    let logger = Arc::new(RecordingLogger {
        frames: Mutex::new(0),
        texts: Mutex::new(Vec::new()),
    });
    let mut session =
        ChatSession::new(client_for(&server), ChatConfig::default()).with_logger(logger.clone());
    session.send("Hello", ChatMode::Chat, |_| {}).await.unwrap();

    assert_eq!(*logger.frames.lock().unwrap(), 2);
    assert_eq!(
        logger.texts.lock().unwrap().as_slice(),
        &["Hi there".to_string()]
    );
}

#[tokio::test]
async fn hosting_fetch_caches_and_revalidates_with_etag() {
    let mut server = mockito::Server::new_async().await;
    let repo_body = r#"{"full_name":"octo/widgets","description":"widgets","default_branch":"main"}"#;
    let first = server
        .mock("GET", "/repos/octo/widgets")
        .with_status(200)
        .with_header("content-type", "application/json")
        .with_header("etag", "\"v1\"")
        .with_body(repo_body)
        .expect(1)
        .create_async()
        .await;

    // Zero freshness window so every fetch revalidates.
    let mut client = HostingClient::with_options(
        format!("{}/", server.url()),
        Arc::new(StaticToken::new("tok_abc")),
        None,
        Some(time::Duration::ZERO),
    )
    .unwrap();

    let repo = client.repository("octo", "widgets").await.unwrap();
    assert_eq!(repo.full_name, "octo/widgets");
    first.assert_async().await;

    let revalidated = server
        .mock("GET", "/repos/octo/widgets")
        .match_header("if-none-match", "\"v1\"")
        .with_status(304)
        .expect(1)
        .create_async()
        .await;

    let repo = client.repository("octo", "widgets").await.unwrap();
    assert_eq!(repo.full_name, "octo/widgets");
    assert_eq!(repo.default_branch, "main");
    revalidated.assert_async().await;
}

#[tokio::test]
async fn hosting_fresh_entry_served_without_request() {
    let mut server = mockito::Server::new_async().await;
    let mock = server
        .mock("GET", "/repos/octo/widgets/pulls/7")
        .with_status(200)
        .with_header("content-type", "application/json")
        .with_body(r#"{"number":7,"title":"Add widgets","state":"open"}"#)
        .expect(1)
        .create_async()
        .await;

    let mut client =
        HostingClient::new(format!("{}/", server.url()), Arc::new(Anonymous)).unwrap();

    let one = client.pull_request("octo", "widgets", 7).await.unwrap();
    let two = client.pull_request("octo", "widgets", 7).await.unwrap();
    assert_eq!(one, two);
    assert_eq!(one.title, "Add widgets");
    mock.assert_async().await;
}

#[tokio::test]
async fn hosting_not_found_maps_to_error() {
    let mut server = mockito::Server::new_async().await;
    server
        .mock("GET", "/repos/octo/missing")
        .with_status(404)
        .with_header("content-type", "application/json")
        .with_body(r#"{"message":"Not Found"}"#)
        .create_async()
        .await;

    let mut client =
        HostingClient::new(format!("{}/", server.url()), Arc::new(Anonymous)).unwrap();
    let err = client.repository("octo", "missing").await.unwrap_err();
    assert!(err.is_not_found());
    assert_eq!(err.message(), "Not Found");
}

#[tokio::test]
async fn hosting_pull_request_files() {
    let mut server = mockito::Server::new_async().await;
    server
        .mock("GET", "/repos/octo/widgets/pulls/7/files")
        .with_status(200)
        .with_header("content-type", "application/json")
        .with_body(
            r#"[{"filename":"src/lib.rs","status":"modified","additions":3,"deletions":1}]"#,
        )
        .create_async()
        .await;

    let mut client =
        HostingClient::new(format!("{}/", server.url()), Arc::new(Anonymous)).unwrap();
    let files = client.pull_request_files("octo", "widgets", 7).await.unwrap();
    assert_eq!(files.len(), 1);
    assert_eq!(files[0].filename, "src/lib.rs");
    assert_eq!(files[0].additions, 3);
    assert!(files[0].patch.is_none());
}
