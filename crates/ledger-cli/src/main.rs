use anyhow::Result;
use clap::{Parser, Subcommand};
use serde::Serialize;
use tracing::debug;
use tracing_subscriber::{fmt, EnvFilter};

#[derive(Parser, Debug)]
#[command(name = "ledger-cli")]
#[command(about = "CLI client for the ledger node")]
struct Cli {
    /// Node base URL (e.g. http://127.0.0.1:8080)
    #[arg(long, global = true, default_value = "http://127.0.0.1:8080")]
    node: String,

    #[command(subcommand)]
    cmd: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Submit a transaction
    Submit {
        /// Sender
        #[arg(long)]
        from: String,
        /// Recipient
        #[arg(long)]
        to: String,
        /// Amount
        #[arg(long)]
        amount: u64,
    },
    /// Mine the pending transactions into a new block
    Mine {
        /// Address credited as the block's miner
        #[arg(long)]
        miner: String,
    },
    /// Print the node's chain
    Chain,
    /// Print the node's unconfirmed transactions
    Pending,
    /// Ask the node to dial a gossip peer
    Connect {
        /// Peer gossip address, e.g. 127.0.0.1:6002
        address: String,
    },
}

#[derive(Serialize)]
struct Tx {
    from: String,
    to: String,
    amount: u64,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct MineReq {
    miner_address: String,
}

#[derive(Serialize)]
struct PeerReq {
    address: String,
}

async fn print_response(res: reqwest::Response) -> Result<()> {
    let status = res.status();
    let body = res.text().await?;
    println!("status: {}", status);
    match serde_json::from_str::<serde_json::Value>(&body) {
        Ok(json) => println!("{}", serde_json::to_string_pretty(&json)?),
        Err(_) => println!("{body}"),
    }
    Ok(())
}

#[tokio::main]
async fn main() -> Result<()> {
    fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .pretty()
        .init();

    let cli = Cli::parse();
    let node = cli.node.trim_end_matches('/');
    let client = reqwest::Client::new();
    debug!(%node, command = ?cli.cmd, "sending request");

    let res = match cli.cmd {
        Command::Submit { from, to, amount } => {
            let tx = Tx { from, to, amount };
            client.post(format!("{node}/tx")).json(&tx).send().await?
        }
        Command::Mine { miner } => {
            let req = MineReq { miner_address: miner };
            client.post(format!("{node}/mine")).json(&req).send().await?
        }
        Command::Chain => client.get(format!("{node}/chain")).send().await?,
        Command::Pending => client.get(format!("{node}/pending")).send().await?,
        Command::Connect { address } => {
            let req = PeerReq { address };
            client.post(format!("{node}/peers")).json(&req).send().await?
        }
    };
    print_response(res).await
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_subcommands_with_global_node() {
        let cli = Cli::try_parse_from([
            "ledger-cli",
            "mine",
            "--miner",
            "gj-1",
            "--node",
            "http://10.0.0.5:9000",
        ])
        .unwrap();
        assert_eq!(cli.node, "http://10.0.0.5:9000");
        assert!(matches!(cli.cmd, Command::Mine { ref miner } if miner == "gj-1"));

        let cli = Cli::try_parse_from(["ledger-cli", "connect", "127.0.0.1:6002"]).unwrap();
        assert_eq!(cli.node, "http://127.0.0.1:8080");
        assert!(matches!(cli.cmd, Command::Connect { ref address } if address == "127.0.0.1:6002"));
    }

    #[test]
    fn mine_request_uses_wire_field_name() {
        let json = serde_json::to_value(MineReq {
            miner_address: "m".into(),
        })
        .unwrap();
        assert_eq!(json, serde_json::json!({ "minerAddress": "m" }));
    }

    #[test]
    fn submit_requires_amount() {
        assert!(Cli::try_parse_from(["ledger-cli", "submit", "--from", "a", "--to", "b"]).is_err());
    }
}
