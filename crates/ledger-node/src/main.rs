use clap::Parser;
use ledger_core::{Chain, ChainStore, MemoryStore};
use ledger_node::{api, config::{Args, StoreKind}, gossip, Node};
use ledger_storage::{JsonFileStore, SledStore};
use std::{net::SocketAddr, sync::Arc};
use tower_http::trace::TraceLayer;
use tracing::{info, Level};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_max_level(Level::DEBUG)
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    let args = Args::parse();
    match args.store {
        StoreKind::Sled => {
            std::fs::create_dir_all(&args.data_dir)?;
            run(Arc::new(SledStore::open(args.sled_path())?), args).await
        }
        StoreKind::Json => run(Arc::new(JsonFileStore::new(args.json_path())), args).await,
        StoreKind::Memory => run(Arc::new(MemoryStore::new()), args).await,
    }
}

async fn run<S: ChainStore + 'static>(store: Arc<S>, args: Args) -> anyhow::Result<()> {
    let chain = Chain::open(store)?;
    info!(height = chain.len(), tip = %chain.tip().hash, "chain ready");
    let node = Node::new(chain, args.node_options());

    let listener = gossip::bind(&args.p2p_listen).await?;
    gossip::serve(listener, Arc::clone(&node));
    for peer in &args.peers {
        gossip::connect(peer.clone(), Arc::clone(&node));
    }

    let app = api::router(node).layer(TraceLayer::new_for_http());
    let addr: SocketAddr = args.listen.parse()?;
    info!("ledger-node listening on http://{addr}");
    axum::serve(tokio::net::TcpListener::bind(addr).await?, app)
        .with_graceful_shutdown(async {
            let _ = tokio::signal::ctrl_c().await;
            info!("shutting down");
        })
        .await?;
    Ok(())
}
