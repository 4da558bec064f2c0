//! Peer connections: a supervised set of handles, one reader and one writer
//! task per connection, and the TCP transport carrying line-delimited JSON.

mod peer;
mod peers;

use std::sync::Arc;

use ledger_core::ChainStore;
use tokio::net::{TcpListener, TcpStream, ToSocketAddrs};
use tokio::task::JoinHandle;
use tracing::{info, warn};

use crate::node::Node;

pub use peer::spawn_peer;
pub use peers::{PeerHandle, PeerSet};

pub async fn bind<A: ToSocketAddrs>(addr: A) -> std::io::Result<TcpListener> {
    let listener = TcpListener::bind(addr).await?;
    info!(addr = %listener.local_addr()?, "gossip listening");
    Ok(listener)
}

/// Accept inbound peers until the listener fails.
pub fn serve<S: ChainStore + 'static>(listener: TcpListener, node: Arc<Node<S>>) -> JoinHandle<()> {
    tokio::spawn(async move {
        loop {
            match listener.accept().await {
                Ok((stream, addr)) => {
                    info!(%addr, "inbound peer");
                    if let Err(e) = spawn_peer(stream, Arc::clone(&node)).await {
                        warn!(%addr, error = %e, "could not set up inbound peer");
                    }
                }
                Err(e) => {
                    warn!(error = %e, "gossip accept failed");
                    break;
                }
            }
        }
    })
}

/// Dial `address` in the background. Failure is logged and otherwise ignored.
pub fn connect<S: ChainStore + 'static>(address: String, node: Arc<Node<S>>) -> JoinHandle<()> {
    tokio::spawn(async move {
        match TcpStream::connect(address.as_str()).await {
            Ok(stream) => {
                if let Err(e) = spawn_peer(stream, node).await {
                    warn!(%address, error = %e, "could not set up outbound peer");
                } else {
                    info!(%address, "connected to peer");
                }
            }
            Err(e) => warn!(%address, error = %e, "failed to connect to peer"),
        }
    })
}
