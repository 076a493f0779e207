//! WebSocket transport for interactive sessions.
//!
//! [`WebSocketConnector::open`] spawns one task per channel. The task connects, reports
//! `Opened`, then multiplexes three sources until the channel ends: the owner's
//! shutdown signal, frames queued through the [`ChannelHandle`], and frames arriving
//! from the backend. Inbound text frames are parsed as [`ServerFrame`]s and expanded
//! into events; frames that fail to parse are logged and skipped.

use futures_util::{SinkExt, StreamExt};
use tokio::sync::mpsc::UnboundedSender;
use tokio_tungstenite::tungstenite::Message;

use coderun_types::ServerFrame;

use crate::channel::{ChannelHandle, ChannelPeer};
use crate::error::TransportError;
use crate::types::{ChannelEnvelope, ChannelEvent, SessionId};
use crate::ChannelConnector;

/// Path of the interactive endpoint relative to the backend host.
pub const INTERACTIVE_PATH: &str = "/ws/interactive/";

/// Opens interactive channels over WebSocket
#[derive(Debug, Clone, Default)]
pub struct WebSocketConnector;

impl WebSocketConnector {
    pub fn new() -> Self {
        Self
    }
}

impl ChannelConnector for WebSocketConnector {
    fn open(
        &self,
        endpoint: &str,
        session: SessionId,
        sink: UnboundedSender<ChannelEnvelope>,
    ) -> ChannelHandle {
        let (handle, peer) = ChannelHandle::pair(session, sink);
        let url = endpoint.to_string();
        tokio::spawn(async move {
            run_channel(url, peer).await;
        });
        handle
    }
}

async fn run_channel(url: String, mut peer: ChannelPeer) {
    let session = peer.session();
    let shutdown = peer.shutdown_token();

    log::info!("Connecting session {} to {}", session, url);
    let ws_stream = tokio::select! {
        _ = shutdown.cancelled() => {
            log::debug!("Session {} closed before the channel connected", session);
            return;
        }
        result = tokio_tungstenite::connect_async(url.as_str()) => match result {
            Ok((stream, _response)) => stream,
            Err(e) => {
                let error = TransportError::from(e);
                log::error!("Session {} failed to connect to {}: {}", session, url, error);
                peer.finish(ChannelEvent::ErrorOccurred(format!("Failed to connect: {}", error)));
                return;
            }
        },
    };

    peer.emit(ChannelEvent::Opened);
    let (mut write, mut read) = ws_stream.split();

    loop {
        tokio::select! {
            _ = shutdown.cancelled() => {
                log::debug!("Session {} channel closed by owner", session);
                let _ = write.send(Message::Close(None)).await;
                break;
            }
            outbound = peer.next_outbound() => {
                let Some(frame) = outbound else {
                    let _ = write.send(Message::Close(None)).await;
                    break;
                };
                let text = match serde_json::to_string(&frame) {
                    Ok(text) => text,
                    Err(e) => {
                        log::error!("Failed to encode frame for session {}: {}", session, e);
                        continue;
                    }
                };
                if let Err(e) = write.send(Message::Text(text.into())).await {
                    let error = TransportError::from(e);
                    log::error!("Session {} failed to send frame: {}", session, error);
                    peer.finish(ChannelEvent::ErrorOccurred(error.to_string()));
                    break;
                }
            }
            inbound = read.next() => match inbound {
                Some(Ok(Message::Text(text))) => {
                    match serde_json::from_str::<ServerFrame>(&text) {
                        Ok(frame) => {
                            for event in ChannelEvent::from_frame(&frame) {
                                peer.emit(event);
                            }
                        }
                        Err(e) => {
                            log::warn!("Ignoring malformed frame on session {}: {}", session, e);
                        }
                    }
                }
                Some(Ok(Message::Ping(data))) => {
                    let _ = write.send(Message::Pong(data)).await;
                }
                Some(Ok(Message::Close(frame))) => {
                    let reason = frame
                        .map(|f| f.reason.as_str().to_string())
                        .filter(|reason| !reason.is_empty())
                        .unwrap_or_else(|| "closed by server".to_string());
                    log::info!("Session {} channel closed by server: {}", session, reason);
                    peer.finish(ChannelEvent::Closed(reason));
                    break;
                }
                Some(Ok(_)) => {}
                Some(Err(e)) => {
                    let error = TransportError::from(e);
                    log::error!("Session {} channel error: {}", session, error);
                    peer.finish(ChannelEvent::ErrorOccurred(error.to_string()));
                    break;
                }
                None => {
                    peer.finish(ChannelEvent::Closed("connection ended".to_string()));
                    break;
                }
            }
        }
    }
}
