/// Companion protocol bridge — store-and-forward frame bridge to a paired
/// application over a serial-style link (BLE, USB, TCP — the host
/// decides).
///
/// The bridge never writes more than one frame per poll: contact sync
/// advances one contact per pass, and the offline backlog drains one entry
/// per pass, so a slow link cannot stall the foreground loop.
mod frame;
mod queue;

pub use frame::{decode_request, encode_frame, CompanionFrame, CompanionRequest, MAX_FRAME_LEN};
pub use queue::{OfflineQueue, QueueOrigin, QueuedFrame};

use crate::directory::NodeDirectory;

#[derive(Debug, Default)]
struct ContactCursor {
    active: bool,
    index: usize,
}

/// Bridge state: link connectivity, offline queue, contact-sync cursor.
#[derive(Debug, Default)]
pub struct CompanionBridge {
    connected: bool,
    queue: OfflineQueue,
    cursor: ContactCursor,
}

impl CompanionBridge {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_connected(&self) -> bool {
        self.connected
    }

    /// Host reports link state changes. Dropping the link cancels an
    /// in-progress contact sync; the companion re-requests on reconnect.
    pub fn set_connected(&mut self, connected: bool) {
        if self.connected != connected {
            tracing::info!(connected, "companion link changed");
        }
        self.connected = connected;
        if !connected {
            self.cursor = ContactCursor::default();
        }
    }

    /// Queue or pass through an outbound notification.
    ///
    /// Connected: returns the encoded frame for the host to write.
    /// Disconnected: captures it in the offline queue (a full queue drops
    /// the notification) and returns `None`.
    pub fn notify(&mut self, frame: &CompanionFrame, origin: QueueOrigin) -> Option<Vec<u8>> {
        let bytes = match encode_frame(frame) {
            Ok(bytes) => bytes,
            Err(e) => {
                tracing::warn!(error = %e, "dropping unencodable companion frame");
                return None;
            }
        };
        if self.connected {
            return Some(bytes);
        }
        if !self.queue.push(origin, bytes) {
            tracing::warn!(?origin, "offline queue full, notification dropped");
        }
        None
    }

    /// Begin (or restart) a contact sync.
    pub fn start_contact_sync(&mut self) {
        self.cursor = ContactCursor {
            active: true,
            index: 0,
        };
    }

    /// Produce at most one outbound frame: offline backlog first, then the
    /// next contact of an active sync.
    pub fn poll(&mut self, directory: &NodeDirectory) -> Option<Vec<u8>> {
        if !self.connected {
            return None;
        }
        if let Some(queued) = self.queue.pop() {
            return Some(queued.bytes);
        }
        if !self.cursor.active {
            return None;
        }

        match directory.by_index(self.cursor.index) {
            Some(node) => {
                self.cursor.index += 1;
                let frame = CompanionFrame::Contact {
                    id: node.id,
                    name: node.name.clone(),
                    node_type: node.node_type,
                    last_heard: node.last_heard,
                };
                encode_frame(&frame).ok()
            }
            None => {
                self.cursor.active = false;
                let frame = CompanionFrame::ContactSyncDone {
                    count: self.cursor.index as u32,
                };
                encode_frame(&frame).ok()
            }
        }
    }

    pub fn queued_len(&self) -> usize {
        self.queue.len()
    }
}
