use std::collections::HashMap;
use std::net::SocketAddr;
use std::sync::atomic::{AtomicU64, Ordering};

use ledger_core::Message;
use tokio::sync::{mpsc, RwLock};
use tracing::{debug, warn};

/// Sending side of one peer connection. The queue is drained by that peer's
/// writer task.
#[derive(Clone, Debug)]
pub struct PeerHandle {
    pub id: u64,
    pub address: SocketAddr,
    pub sender: mpsc::Sender<Message>,
}

#[derive(Debug, Default)]
pub struct PeerSet {
    peers: RwLock<HashMap<u64, PeerHandle>>,
    next_id: AtomicU64,
}

impl PeerSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn insert(&self, address: SocketAddr, sender: mpsc::Sender<Message>) -> PeerHandle {
        let handle = PeerHandle {
            id: self.next_id.fetch_add(1, Ordering::Relaxed),
            address,
            sender,
        };
        self.peers.write().await.insert(handle.id, handle.clone());
        handle
    }

    pub async fn remove(&self, id: u64) -> Option<PeerHandle> {
        let removed = self.peers.write().await.remove(&id);
        if let Some(peer) = &removed {
            debug!(id, address = %peer.address, "peer removed");
        }
        removed
    }

    pub async fn len(&self) -> usize {
        self.peers.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.peers.read().await.is_empty()
    }

    /// Queue `message` for every open peer. A peer whose queue is closed or
    /// full is dropped from the set. Returns how many peers took the message.
    pub async fn broadcast(&self, message: &Message) -> usize {
        let mut dead = Vec::new();
        let mut delivered = 0;
        {
            let peers = self.peers.read().await;
            for peer in peers.values() {
                match peer.sender.try_send(message.clone()) {
                    Ok(()) => delivered += 1,
                    Err(e) => {
                        warn!(address = %peer.address, error = %e, "dropping unreachable peer");
                        dead.push(peer.id);
                    }
                }
            }
        }
        if !dead.is_empty() {
            let mut peers = self.peers.write().await;
            for id in dead {
                peers.remove(&id);
            }
        }
        debug!(kind = message.kind(), delivered, "broadcast");
        delivered
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ledger_core::Block;

    fn addr(port: u16) -> SocketAddr {
        SocketAddr::from(([127, 0, 0, 1], port))
    }

    #[tokio::test]
    async fn broadcast_reaches_every_open_peer() {
        let set = PeerSet::new();
        let (tx_a, mut rx_a) = mpsc::channel(4);
        let (tx_b, mut rx_b) = mpsc::channel(4);
        set.insert(addr(1), tx_a).await;
        set.insert(addr(2), tx_b).await;

        let msg = Message::Block(Block::genesis());
        assert_eq!(set.broadcast(&msg).await, 2);
        assert_eq!(rx_a.recv().await, Some(msg.clone()));
        assert_eq!(rx_b.recv().await, Some(msg));
    }

    #[tokio::test]
    async fn closed_peer_is_dropped_others_unaffected() {
        let set = PeerSet::new();
        let (tx_a, rx_a) = mpsc::channel(4);
        let (tx_b, mut rx_b) = mpsc::channel(4);
        set.insert(addr(1), tx_a).await;
        set.insert(addr(2), tx_b).await;
        drop(rx_a);

        let msg = Message::Chain(vec![Block::genesis()]);
        assert_eq!(set.broadcast(&msg).await, 1);
        assert_eq!(set.len().await, 1);
        assert_eq!(rx_b.recv().await, Some(msg));
    }

    #[tokio::test]
    async fn full_queue_drops_the_slow_peer() {
        let set = PeerSet::new();
        let (tx, _rx) = mpsc::channel(1);
        set.insert(addr(1), tx).await;
        let msg = Message::Block(Block::genesis());
        assert_eq!(set.broadcast(&msg).await, 1);
        assert_eq!(set.broadcast(&msg).await, 0);
        assert!(set.is_empty().await);
    }

    #[tokio::test]
    async fn ids_are_unique_and_removable() {
        let set = PeerSet::new();
        let (tx, _rx) = mpsc::channel(1);
        let a = set.insert(addr(1), tx.clone()).await;
        let b = set.insert(addr(1), tx).await;
        assert_ne!(a.id, b.id);
        assert!(set.remove(a.id).await.is_some());
        assert!(set.remove(a.id).await.is_none());
        assert_eq!(set.len().await, 1);
    }
}
