mod common;

use std::sync::Arc;

use common::{node_with_len, remote_chain};
use ledger_core::{Block, MemoryStore, Transaction};
use ledger_node::{api, Node};
use serde_json::{json, Value};

async fn serve(node: Arc<Node<MemoryStore>>) -> anyhow::Result<String> {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await?;
    let addr = listener.local_addr()?;
    tokio::spawn(async move {
        let _ = axum::serve(listener, api::router(node)).await;
    });
    Ok(format!("http://{addr}"))
}

#[tokio::test]
async fn submit_mine_and_read_back() -> anyhow::Result<()> {
    let base = serve(node_with_len(1)).await?;
    let client = reqwest::Client::new();

    let health: Value = client.get(format!("{base}/health")).send().await?.json().await?;
    assert_eq!(health["status"], "ok");

    let res = client
        .post(format!("{base}/tx"))
        .json(&json!({ "from": "alice", "to": "bob", "amount": 3 }))
        .send()
        .await?;
    assert_eq!(res.status(), reqwest::StatusCode::CREATED);
    let tx: Transaction = res.json().await?;

    let pending: Vec<Transaction> = client.get(format!("{base}/pending")).send().await?.json().await?;
    assert_eq!(pending, vec![tx.clone()]);

    let res = client
        .post(format!("{base}/mine"))
        .json(&json!({ "minerAddress": "gj-miner" }))
        .send()
        .await?;
    assert!(res.status().is_success());
    let block: Block = res.json().await?;
    assert_eq!(block.miner, "gj-miner");
    assert_eq!(block.transactions, vec![tx]);

    let chain: Vec<Block> = client.get(format!("{base}/chain")).send().await?.json().await?;
    assert_eq!(chain.len(), 2);
    assert_eq!(chain[1], block);

    let head: Value = client.get(format!("{base}/chain/head")).send().await?.json().await?;
    assert_eq!(head["height"], 1);
    assert_eq!(head["hash"], block.hash.as_str());
    Ok(())
}

#[tokio::test]
async fn malformed_requests_are_rejected_at_the_boundary() -> anyhow::Result<()> {
    let base = serve(node_with_len(1)).await?;
    let client = reqwest::Client::new();

    let res = client
        .post(format!("{base}/tx"))
        .json(&json!({ "from": "alice", "to": "bob", "amount": 0 }))
        .send()
        .await?;
    assert_eq!(res.status(), reqwest::StatusCode::BAD_REQUEST);

    let res = client
        .post(format!("{base}/tx"))
        .json(&json!({ "from": "alice", "amount": 4 }))
        .send()
        .await?;
    assert!(res.status().is_client_error());

    let res = client
        .post(format!("{base}/mine"))
        .json(&json!({ "minerAddress": "" }))
        .send()
        .await?;
    assert_eq!(res.status(), reqwest::StatusCode::BAD_REQUEST);
    Ok(())
}

#[tokio::test]
async fn submitted_blocks_follow_gossip_rules() -> anyhow::Result<()> {
    let node = node_with_len(2);
    let base = serve(Arc::clone(&node)).await?;
    let client = reqwest::Client::new();

    // competing block for an index we already hold
    let stale = remote_chain(2, "rival").pop().expect("two blocks");
    let res = client.post(format!("{base}/blocks")).json(&stale).send().await?;
    assert_eq!(res.status(), reqwest::StatusCode::CONFLICT);

    let next = common::block_on(&node.tip().await, vec![], "external");
    let res = client.post(format!("{base}/blocks")).json(&next).send().await?;
    assert!(res.status().is_success());
    assert_eq!(node.tip().await, next);
    Ok(())
}

#[tokio::test]
async fn peer_request_is_acknowledged() -> anyhow::Result<()> {
    let base = serve(node_with_len(1)).await?;
    let res = reqwest::Client::new()
        .post(format!("{base}/peers"))
        .json(&json!({ "address": "127.0.0.1:1" }))
        .send()
        .await?;
    assert_eq!(res.status(), reqwest::StatusCode::ACCEPTED);
    Ok(())
}
