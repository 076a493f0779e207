use backend_mock::{MockBackend, PromptStyle};
use coderun_client::{
    ChannelConnector, ChannelEnvelope, ChannelEvent, SessionId, TransportError, WebSocketConnector,
};
use coderun_types::{ClientFrame, Language};
use std::time::Duration;
use tokio::sync::mpsc::{self, UnboundedReceiver};

async fn next_event(events: &mut UnboundedReceiver<ChannelEnvelope>) -> ChannelEvent {
    tokio::time::timeout(Duration::from_secs(5), events.recv())
        .await
        .expect("timed out waiting for a channel event")
        .expect("event sink closed")
        .event
}

#[tokio::test]
async fn test_interactive_round_trip() {
    let backend = MockBackend::new().spawn().await.unwrap();
    let (sink, mut events) = mpsc::unbounded_channel();
    let session = SessionId::new();

    let handle = WebSocketConnector::new().open(&backend.interactive_url(), session, sink);
    assert_eq!(next_event(&mut events).await, ChannelEvent::Opened);

    handle
        .send(ClientFrame::start(
            Language::Python,
            "print hi\ninput Enter n:\nprint got $input",
        ))
        .unwrap();

    assert_eq!(next_event(&mut events).await, ChannelEvent::OutputChunk("hi\n".to_string()));
    assert_eq!(
        next_event(&mut events).await,
        ChannelEvent::PromptRequested("Enter n:".to_string())
    );

    handle.send(ClientFrame::input("5")).unwrap();

    assert_eq!(next_event(&mut events).await, ChannelEvent::OutputChunk("got 5\n".to_string()));
    assert_eq!(
        next_event(&mut events).await,
        ChannelEvent::Closed("program finished".to_string())
    );

    let sessions = backend.interactive_sessions();
    assert_eq!(sessions.len(), 1);
    assert_eq!(sessions[0].language, "python");
    assert_eq!(sessions[0].inputs, vec!["5".to_string()]);

    // The server closed the channel, so the handle no longer accepts frames.
    assert_eq!(handle.send(ClientFrame::input("6")), Err(TransportError::NotOpen));
}

#[tokio::test]
async fn test_flagged_prompt_frames() {
    let backend = MockBackend::new()
        .with_prompt_style(PromptStyle::Flag)
        .spawn()
        .await
        .unwrap();
    let (sink, mut events) = mpsc::unbounded_channel();

    let handle = WebSocketConnector::new().open(&backend.interactive_url(), SessionId::new(), sink);
    assert_eq!(next_event(&mut events).await, ChannelEvent::Opened);
    handle
        .send(ClientFrame::start(Language::C, "input Name?"))
        .unwrap();

    assert_eq!(next_event(&mut events).await, ChannelEvent::OutputChunk("Name?\n".to_string()));
    assert_eq!(
        next_event(&mut events).await,
        ChannelEvent::PromptRequested("Name?".to_string())
    );
}

#[tokio::test]
async fn test_error_frame() {
    let backend = MockBackend::new().spawn().await.unwrap();
    let (sink, mut events) = mpsc::unbounded_channel();

    let handle = WebSocketConnector::new().open(&backend.interactive_url(), SessionId::new(), sink);
    assert_eq!(next_event(&mut events).await, ChannelEvent::Opened);
    handle
        .send(ClientFrame::start(Language::Python, "error division by zero"))
        .unwrap();

    assert_eq!(
        next_event(&mut events).await,
        ChannelEvent::ErrorOccurred("division by zero".to_string())
    );
}

#[tokio::test]
async fn test_no_events_after_close() {
    let backend = MockBackend::new().spawn().await.unwrap();
    let (sink, mut events) = mpsc::unbounded_channel();

    let handle = WebSocketConnector::new().open(&backend.interactive_url(), SessionId::new(), sink);
    assert_eq!(next_event(&mut events).await, ChannelEvent::Opened);
    handle
        .send(ClientFrame::start(Language::Python, "sleep 100\nprint late"))
        .unwrap();

    handle.close();
    handle.close();

    tokio::time::sleep(Duration::from_millis(300)).await;
    assert!(events.try_recv().is_err());
}

#[tokio::test]
async fn test_connect_failure_reports_error() {
    let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);

    let (sink, mut events) = mpsc::unbounded_channel();
    let session = SessionId::new();
    let _handle = WebSocketConnector::new().open(&format!("ws://{}/ws/interactive/", addr), session, sink);

    let envelope = tokio::time::timeout(Duration::from_secs(5), events.recv())
        .await
        .unwrap()
        .unwrap();
    assert_eq!(envelope.session, session);
    assert!(matches!(envelope.event, ChannelEvent::ErrorOccurred(ref detail) if detail.starts_with("Failed to connect")));
}
