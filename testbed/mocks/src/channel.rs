//! Mock interactive channel connector

use coderun_client::{ChannelConnector, ChannelEnvelope, ChannelEvent, ChannelHandle, ChannelPeer, SessionId};
use coderun_types::ClientFrame;
use std::sync::{Arc, Mutex};
use tokio::sync::mpsc::UnboundedSender;

struct ScriptedChannel {
    endpoint: String,
    peer: ChannelPeer,
    sent: Vec<ClientFrame>,
}

impl ScriptedChannel {
    fn drain_outbound(&mut self) {
        while let Some(frame) = self.peer.try_next_outbound() {
            self.sent.push(frame);
        }
    }
}

/// Connector whose channels are driven by the test. Channels are numbered in
/// the order they were opened.
#[derive(Clone, Default)]
pub struct ScriptedConnector {
    channels: Arc<Mutex<Vec<ScriptedChannel>>>,
}

impl ScriptedConnector {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn open_count(&self) -> usize {
        self.channels.lock().unwrap().len()
    }

    pub fn endpoint(&self, index: usize) -> String {
        self.channels.lock().unwrap()[index].endpoint.clone()
    }

    pub fn session(&self, index: usize) -> SessionId {
        self.channels.lock().unwrap()[index].peer.session()
    }

    /// Deliver an event as if it came from the backend. Returns false when the
    /// owner already closed the channel.
    pub fn emit(&self, index: usize, event: ChannelEvent) -> bool {
        self.channels.lock().unwrap()[index].peer.emit(event)
    }

    /// Deliver a final event and close the channel from the backend side.
    pub fn finish(&self, index: usize, event: ChannelEvent) -> bool {
        self.channels.lock().unwrap()[index].peer.finish(event)
    }

    /// Every frame the owner has sent on channel `index` so far.
    pub fn sent_frames(&self, index: usize) -> Vec<ClientFrame> {
        let mut channels = self.channels.lock().unwrap();
        let channel = &mut channels[index];
        channel.drain_outbound();
        channel.sent.clone()
    }

    pub fn is_closed(&self, index: usize) -> bool {
        self.channels.lock().unwrap()[index].peer.is_closed()
    }
}

impl ChannelConnector for ScriptedConnector {
    fn open(
        &self,
        endpoint: &str,
        session: SessionId,
        sink: UnboundedSender<ChannelEnvelope>,
    ) -> ChannelHandle {
        let (handle, peer) = ChannelHandle::pair(session, sink);
        self.channels.lock().unwrap().push(ScriptedChannel {
            endpoint: endpoint.to_string(),
            peer,
            sent: Vec::new(),
        });
        handle
    }
}
