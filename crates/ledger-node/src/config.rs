use std::path::PathBuf;

use clap::{Parser, ValueEnum};

use crate::node::NodeOptions;

#[derive(Copy, Clone, Debug, PartialEq, Eq, ValueEnum)]
pub enum StoreKind {
    /// sled database under the data directory
    Sled,
    /// single JSON document under the data directory
    Json,
    /// nothing survives a restart
    Memory,
}

#[derive(Parser, Debug, Clone)]
#[command(name = "ledger-node", about = "Proof-of-work ledger node")]
pub struct Args {
    /// HTTP control surface address, e.g. 127.0.0.1:8080
    #[arg(long, default_value = "127.0.0.1:8080")]
    pub listen: String,

    /// Address peers connect to for gossip
    #[arg(long, default_value = "127.0.0.1:6001")]
    pub p2p_listen: String,

    /// Peer gossip address to dial at startup (repeatable)
    #[arg(long = "peer")]
    pub peers: Vec<String>,

    /// Data directory for the persisted chain
    #[arg(long, default_value = "./data")]
    pub data_dir: PathBuf,

    #[arg(long, value_enum, default_value_t = StoreKind::Sled)]
    pub store: StoreKind,

    /// Search nonces on every core
    #[arg(long)]
    pub parallel_mining: bool,
}

impl Args {
    pub fn node_options(&self) -> NodeOptions {
        NodeOptions {
            parallel_mining: self.parallel_mining,
        }
    }

    pub fn sled_path(&self) -> PathBuf {
        self.data_dir.join("chain.sled")
    }

    pub fn json_path(&self) -> PathBuf {
        self.data_dir.join("chain.json")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults() {
        let args = Args::try_parse_from(["ledger-node"]).unwrap();
        assert_eq!(args.listen, "127.0.0.1:8080");
        assert_eq!(args.p2p_listen, "127.0.0.1:6001");
        assert!(args.peers.is_empty());
        assert_eq!(args.store, StoreKind::Sled);
        assert!(!args.node_options().parallel_mining);
        assert_eq!(args.sled_path(), PathBuf::from("./data/chain.sled"));
    }

    #[test]
    fn repeated_peers_and_store_choice() {
        let args = Args::try_parse_from([
            "ledger-node",
            "--peer",
            "10.0.0.1:6001",
            "--peer",
            "10.0.0.2:6001",
            "--store",
            "json",
            "--data-dir",
            "/var/lib/ledger",
            "--parallel-mining",
        ])
        .unwrap();
        assert_eq!(args.peers, vec!["10.0.0.1:6001", "10.0.0.2:6001"]);
        assert_eq!(args.store, StoreKind::Json);
        assert_eq!(args.json_path(), PathBuf::from("/var/lib/ledger/chain.json"));
        assert!(args.node_options().parallel_mining);
    }

    #[test]
    fn unknown_store_is_rejected() {
        assert!(Args::try_parse_from(["ledger-node", "--store", "postgres"]).is_err());
    }
}
