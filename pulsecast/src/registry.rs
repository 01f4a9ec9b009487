//! Registry of live delivery endpoints.
//!
//! Every connected listener owns an unbounded frame queue; the broadcast
//! engine pushes one frame per endpoint per tick without ever waiting on a
//! socket. An endpoint whose queue is gone (its forwarding task dropped the
//! receiver) is logged but NOT evicted here: eviction belongs to the
//! endpoint's own read loop, which unregisters on disconnect.

use bytes::Bytes;
use std::collections::HashMap;
use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Mutex;
use tokio::sync::mpsc;
use tracing::warn;

/// A frame delivered to a listener endpoint.
#[derive(Debug, Clone)]
pub enum Frame {
    /// Opaque audio payload, sent as a binary websocket frame.
    Audio(Bytes),
    /// JSON announcement, sent as a text websocket frame.
    Text(String),
}

/// Identity of a registered endpoint.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ClientId(u64);

impl fmt::Display for ClientId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Set of live delivery endpoints keyed by identity.
#[derive(Default)]
pub struct ClientRegistry {
    clients: Mutex<HashMap<u64, mpsc::UnboundedSender<Frame>>>,
    next_id: AtomicU64,
}

impl ClientRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a new endpoint; the caller forwards frames from the
    /// returned receiver to its transport.
    pub fn register(&self) -> (ClientId, mpsc::UnboundedReceiver<Frame>) {
        let id = self.next_id.fetch_add(1, Ordering::Relaxed);
        let (tx, rx) = mpsc::unbounded_channel();
        self.clients.lock().unwrap().insert(id, tx);
        (ClientId(id), rx)
    }

    /// Drop an endpoint from the set.
    pub fn unregister(&self, id: ClientId) {
        self.clients.lock().unwrap().remove(&id.0);
    }

    /// Number of registered endpoints.
    pub fn len(&self) -> usize {
        self.clients.lock().unwrap().len()
    }

    pub fn is_empty(&self) -> bool {
        self.clients.lock().unwrap().is_empty()
    }

    /// Queue a frame on every endpoint, best-effort.
    pub fn broadcast(&self, frame: Frame) {
        let clients = self.clients.lock().unwrap();
        for (id, tx) in clients.iter() {
            if tx.send(frame.clone()).is_err() {
                warn!(client = id, "dropping frame for a closed listener queue");
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_register_broadcast_unregister() {
        let registry = ClientRegistry::new();
        let (id_a, mut rx_a) = registry.register();
        let (_id_b, mut rx_b) = registry.register();
        assert_eq!(registry.len(), 2);

        registry.broadcast(Frame::Audio(Bytes::from_static(b"x")));
        assert!(matches!(rx_a.try_recv().unwrap(), Frame::Audio(_)));
        assert!(matches!(rx_b.try_recv().unwrap(), Frame::Audio(_)));

        registry.unregister(id_a);
        assert_eq!(registry.len(), 1);

        registry.broadcast(Frame::Text("{}".to_string()));
        assert!(rx_a.try_recv().is_err());
        assert!(matches!(rx_b.try_recv().unwrap(), Frame::Text(_)));
    }

    #[tokio::test]
    async fn test_broadcast_survives_dropped_receiver() {
        let registry = ClientRegistry::new();
        let (_id, rx) = registry.register();
        drop(rx);

        // The endpoint stays registered; the send error is only logged.
        registry.broadcast(Frame::Audio(Bytes::from_static(b"x")));
        assert_eq!(registry.len(), 1);
    }

    #[tokio::test]
    async fn test_frames_arrive_in_broadcast_order() {
        let registry = ClientRegistry::new();
        let (_id, mut rx) = registry.register();

        for i in 0..10u8 {
            registry.broadcast(Frame::Audio(Bytes::from(vec![i])));
        }
        for i in 0..10u8 {
            match rx.try_recv().unwrap() {
                Frame::Audio(bytes) => assert_eq!(bytes[0], i),
                other => panic!("unexpected frame {other:?}"),
            }
        }
    }
}
