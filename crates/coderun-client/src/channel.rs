//! Owner and transport sides of an interactive channel.
//!
//! [`ChannelHandle::pair`] splits a channel into the handle kept by the session owner
//! and the [`ChannelPeer`] driven by the transport task. The two sides share a closed
//! flag: the peer only forwards an event while holding the flag's lock and seeing it
//! unset, so once [`ChannelHandle::close`] returns nothing more reaches the owner's
//! sink even if the network keeps delivering data.

use std::sync::{Arc, Mutex, MutexGuard};
use tokio::sync::mpsc::{self, UnboundedReceiver, UnboundedSender};
use tokio_util::sync::CancellationToken;

use coderun_types::ClientFrame;

use crate::error::TransportError;
use crate::types::{ChannelEnvelope, ChannelEvent, SessionId};

struct Shared {
    session: SessionId,
    closed: Mutex<bool>,
    sink: UnboundedSender<ChannelEnvelope>,
    shutdown: CancellationToken,
}

impl Shared {
    fn closed_flag(&self) -> MutexGuard<'_, bool> {
        // The flag is a plain bool, so a poisoned lock still holds a usable value.
        self.closed.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

/// The owner's side of an interactive channel.
pub struct ChannelHandle {
    shared: Arc<Shared>,
    outbound: UnboundedSender<ClientFrame>,
}

/// The transport's side of an interactive channel.
pub struct ChannelPeer {
    shared: Arc<Shared>,
    outbound: UnboundedReceiver<ClientFrame>,
}

impl ChannelHandle {
    pub fn pair(session: SessionId, sink: UnboundedSender<ChannelEnvelope>) -> (ChannelHandle, ChannelPeer) {
        let (outbound_tx, outbound_rx) = mpsc::unbounded_channel();
        let shared = Arc::new(Shared {
            session,
            closed: Mutex::new(false),
            sink,
            shutdown: CancellationToken::new(),
        });

        (
            ChannelHandle {
                shared: shared.clone(),
                outbound: outbound_tx,
            },
            ChannelPeer {
                shared,
                outbound: outbound_rx,
            },
        )
    }

    pub fn session(&self) -> SessionId {
        self.shared.session
    }

    pub fn is_open(&self) -> bool {
        !*self.shared.closed_flag() && !self.outbound.is_closed()
    }

    /// Queue a frame for the transport. Fails with [`TransportError::NotOpen`] once
    /// the channel is closed from either side.
    pub fn send(&self, frame: ClientFrame) -> Result<(), TransportError> {
        let closed = self.shared.closed_flag();
        if *closed {
            return Err(TransportError::NotOpen);
        }
        self.outbound
            .send(frame)
            .map_err(|_| TransportError::NotOpen)
    }

    /// Close the channel. Safe to call any number of times.
    pub fn close(&self) {
        let mut closed = self.shared.closed_flag();
        if !*closed {
            *closed = true;
            log::debug!("Closing channel for session {}", self.shared.session);
        }
        self.shared.shutdown.cancel();
    }
}

impl Drop for ChannelHandle {
    fn drop(&mut self) {
        self.close();
    }
}

impl ChannelPeer {
    pub fn session(&self) -> SessionId {
        self.shared.session
    }

    pub fn is_closed(&self) -> bool {
        *self.shared.closed_flag()
    }

    /// Token cancelled when the owner closes the channel.
    pub fn shutdown_token(&self) -> CancellationToken {
        self.shared.shutdown.clone()
    }

    /// Forward an event to the owner. Returns false when the channel is closed
    /// and the event was discarded.
    pub fn emit(&self, event: ChannelEvent) -> bool {
        let closed = self.shared.closed_flag();
        if *closed {
            log::debug!(
                "Discarding {} for closed session {}",
                event.name(),
                self.shared.session
            );
            return false;
        }
        self.shared
            .sink
            .send(ChannelEnvelope {
                session: self.shared.session,
                event,
            })
            .is_ok()
    }

    /// Forward a final event and mark the channel closed so later sends fail.
    pub fn finish(&self, event: ChannelEvent) -> bool {
        let mut closed = self.shared.closed_flag();
        if *closed {
            return false;
        }
        *closed = true;
        self.shared
            .sink
            .send(ChannelEnvelope {
                session: self.shared.session,
                event,
            })
            .is_ok()
    }

    /// Next frame queued by the owner, or `None` once the handle is gone.
    pub async fn next_outbound(&mut self) -> Option<ClientFrame> {
        self.outbound.recv().await
    }

    /// Next frame already queued by the owner, without waiting.
    pub fn try_next_outbound(&mut self) -> Option<ClientFrame> {
        self.outbound.try_recv().ok()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_events_reach_sink_until_closed() {
        let (sink, mut events) = mpsc::unbounded_channel();
        let session = SessionId::new();
        let (handle, peer) = ChannelHandle::pair(session, sink);

        assert!(peer.emit(ChannelEvent::Opened));
        handle.close();
        assert!(!peer.emit(ChannelEvent::OutputChunk("late".to_string())));

        let envelope = events.recv().await.unwrap();
        assert_eq!(envelope.session, session);
        assert_eq!(envelope.event, ChannelEvent::Opened);
        assert!(events.try_recv().is_err());
    }

    #[tokio::test]
    async fn test_close_is_idempotent_and_blocks_send() {
        let (sink, _events) = mpsc::unbounded_channel();
        let (handle, mut peer) = ChannelHandle::pair(SessionId::new(), sink);

        handle.send(ClientFrame::input("1")).unwrap();
        assert_eq!(peer.try_next_outbound(), Some(ClientFrame::input("1")));

        handle.close();
        handle.close();
        assert!(!handle.is_open());
        assert!(peer.is_closed());
        assert!(peer.shutdown_token().is_cancelled());
        assert_eq!(handle.send(ClientFrame::input("2")), Err(TransportError::NotOpen));
    }

    #[tokio::test]
    async fn test_finish_closes_from_transport_side() {
        let (sink, mut events) = mpsc::unbounded_channel();
        let (handle, peer) = ChannelHandle::pair(SessionId::new(), sink);

        assert!(peer.finish(ChannelEvent::Closed("done".to_string())));
        assert!(!peer.finish(ChannelEvent::Closed("again".to_string())));
        assert_eq!(handle.send(ClientFrame::input("x")), Err(TransportError::NotOpen));

        let envelope = events.recv().await.unwrap();
        assert_eq!(envelope.event, ChannelEvent::Closed("done".to_string()));
        assert!(events.try_recv().is_err());
    }
}
