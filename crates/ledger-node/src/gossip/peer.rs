use std::net::SocketAddr;
use std::sync::Arc;

use ledger_core::{ChainStore, Message};
use tokio::io::{AsyncBufRead, AsyncBufReadExt, AsyncReadExt, AsyncWriteExt, BufReader};
use tokio::net::tcp::{OwnedReadHalf, OwnedWriteHalf};
use tokio::net::TcpStream;
use tokio::sync::mpsc;
use tracing::{debug, warn};

use super::PeerHandle;
use crate::node::Node;

/// Messages a peer may have queued before it is considered unreachable.
const PEER_QUEUE_CAPACITY: usize = 256;

/// Longest gossip line accepted from a peer before the connection is dropped.
const MAX_LINE_BYTES: usize = 8 * 1024 * 1024;

/// Register a connected stream as a peer, queue our full chain for it, and
/// start its reader and writer tasks.
pub async fn spawn_peer<S: ChainStore + 'static>(
    stream: TcpStream,
    node: Arc<Node<S>>,
) -> std::io::Result<PeerHandle> {
    let address = stream.peer_addr()?;
    let (reader, writer) = stream.into_split();
    let (sender, outgoing) = mpsc::channel::<Message>(PEER_QUEUE_CAPACITY);

    let handle = node
        .register_peer(address, sender)
        .await
        .map_err(|e| std::io::Error::other(e.to_string()))?;

    // neither task may hold a sender, or the writer would never see the queue close
    tokio::spawn(writer_task(writer, outgoing, address));
    tokio::spawn(reader_task(reader, node, handle.id, address));
    Ok(handle)
}

async fn writer_task(
    mut writer: OwnedWriteHalf,
    mut outgoing: mpsc::Receiver<Message>,
    address: SocketAddr,
) {
    while let Some(message) = outgoing.recv().await {
        let line = match message.to_line() {
            Ok(line) => line,
            Err(e) => {
                warn!(%address, error = %e, "could not encode message");
                continue;
            }
        };
        if let Err(e) = writer.write_all(line.as_bytes()).await {
            warn!(%address, error = %e, "peer write failed");
            break;
        }
    }
    let _ = writer.shutdown().await;
    debug!(%address, "peer writer finished");
}

async fn reader_task<S: ChainStore + 'static>(
    reader: OwnedReadHalf,
    node: Arc<Node<S>>,
    id: u64,
    address: SocketAddr,
) {
    let mut reader = BufReader::new(reader);
    let mut buf = Vec::new();
    loop {
        match read_line_capped(&mut reader, &mut buf, MAX_LINE_BYTES).await {
            Ok(0) => {
                debug!(%address, "peer closed the connection");
                break;
            }
            Ok(_) => {
                let line = String::from_utf8_lossy(&buf);
                if line.trim().is_empty() {
                    continue;
                }
                match Message::from_line(&line) {
                    Ok(message) => {
                        debug!(%address, kind = message.kind(), "gossip received");
                        node.receive(message).await;
                    }
                    Err(e) => warn!(%address, error = %e, "skipping malformed gossip"),
                }
            }
            Err(e) => {
                warn!(%address, error = %e, "peer read failed");
                break;
            }
        }
    }
    node.peers().remove(id).await;
}

/// Read one `\n`-terminated line into `buf`. Returns the bytes read, 0 at end
/// of stream. A line longer than `max` bytes is an `InvalidData` error.
async fn read_line_capped<R: AsyncBufRead + Unpin>(
    reader: &mut R,
    buf: &mut Vec<u8>,
    max: usize,
) -> std::io::Result<usize> {
    buf.clear();
    let mut limited = (&mut *reader).take(max as u64 + 1);
    let read = limited.read_until(b'\n', buf).await?;
    if read > max && buf.last() != Some(&b'\n') {
        return Err(std::io::Error::new(
            std::io::ErrorKind::InvalidData,
            format!("gossip line exceeds {max} bytes"),
        ));
    }
    Ok(read)
}
