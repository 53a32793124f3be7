//! Ledger administration subcommands: thin wrappers over the store traits.

use std::path::PathBuf;

use anyhow::{bail, Context};

use elector_store::{EnabledFilter, Ledger, NewNode, NodeStore, ParticipationStore, WalletStore};
use elector_types::{AccountAddress, NodeId, WalletId};

#[derive(clap::Subcommand)]
pub enum WalletAction {
    /// Register a funding wallet.
    Add {
        /// Wallet address, raw (`0:<hex>`) or user-friendly form.
        address: AccountAddress,
        /// Base path of the wallet key file, without the `.pk` suffix.
        key_file: PathBuf,
    },
    /// List wallets.
    List {
        /// Include disabled wallets.
        #[arg(long)]
        all: bool,
    },
    /// Remove a wallet. Fails while it still owns nodes.
    Del { id: u64 },
}

#[derive(clap::Subcommand)]
pub enum NodeAction {
    /// Register a validator node under a wallet.
    Add {
        #[arg(long)]
        wallet: u64,
        /// `host:port` of the validator engine console.
        #[arg(long)]
        host_port: String,
        /// Server public key file.
        #[arg(long)]
        server_pub: PathBuf,
        /// Client private key file.
        #[arg(long)]
        client_cert: PathBuf,
    },
    /// List nodes, optionally of one wallet.
    List {
        #[arg(long)]
        wallet: Option<u64>,
    },
    /// Remove a node.
    Del { id: u64 },
}

#[derive(clap::Subcommand)]
pub enum ParticipationAction {
    /// List the bids submitted for a node.
    List {
        #[arg(long)]
        node: u64,
        /// Print JSON instead of a table.
        #[arg(long)]
        json: bool,
    },
}

pub fn wallet(ledger: &dyn Ledger, action: WalletAction) -> anyhow::Result<()> {
    match action {
        WalletAction::Add { address, key_file } => {
            let wallet = ledger.add_wallet(address, key_file)?;
            println!("added wallet {} ({})", wallet.id, wallet.address);
        }
        WalletAction::List { all } => {
            let filter = if all {
                EnabledFilter::All
            } else {
                EnabledFilter::Enabled
            };
            for w in ledger.list_wallets(filter)? {
                println!(
                    "{:>4}  {}  {:>24}  {}{}",
                    w.id,
                    w.address,
                    w.balance,
                    w.key_file.display(),
                    if w.enabled { "" } else { "  (disabled)" }
                );
            }
        }
        WalletAction::Del { id } => {
            let id = WalletId(id);
            if !ledger.list_nodes(id, EnabledFilter::All)?.is_empty() {
                bail!("wallet {id} still has nodes; delete them first");
            }
            ledger
                .delete_wallet(id)
                .with_context(|| format!("deleting wallet {id}"))?;
            println!("deleted wallet {id}");
        }
    }
    Ok(())
}

pub fn node(ledger: &dyn Ledger, action: NodeAction) -> anyhow::Result<()> {
    match action {
        NodeAction::Add {
            wallet,
            host_port,
            server_pub,
            client_cert,
        } => {
            let node = ledger.add_node(NewNode {
                wallet_id: WalletId(wallet),
                host_port,
                server_pub,
                client_cert,
            })?;
            println!("added node {} ({}) to wallet {}", node.id, node.host_port, node.wallet_id);
        }
        NodeAction::List { wallet } => {
            let wallets = match wallet {
                Some(id) => vec![WalletId(id)],
                None => ledger
                    .list_wallets(EnabledFilter::All)?
                    .into_iter()
                    .map(|w| w.id)
                    .collect(),
            };
            for wallet_id in wallets {
                for n in ledger.list_nodes(wallet_id, EnabledFilter::All)? {
                    println!(
                        "{:>4}  wallet {:>4}  {}{}",
                        n.id,
                        n.wallet_id,
                        n.host_port,
                        if n.enabled { "" } else { "  (disabled)" }
                    );
                }
            }
        }
        NodeAction::Del { id } => {
            let id = NodeId(id);
            ledger
                .delete_node(id)
                .with_context(|| format!("deleting node {id}"))?;
            println!("deleted node {id}");
        }
    }
    Ok(())
}

pub fn participation(ledger: &dyn Ledger, action: ParticipationAction) -> anyhow::Result<()> {
    let ParticipationAction::List { node, json } = action;
    let records = ledger.node_participations(NodeId(node))?;
    if json {
        println!("{}", serde_json::to_string_pretty(&records)?);
        return Ok(());
    }
    for p in records {
        println!(
            "{}  election {}  stake {}  max_factor {}",
            p.submitted_at, p.election_id, p.stake_amount, p.max_factor
        );
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use elector_store_lmdb::{LmdbStore, DEFAULT_MAP_SIZE};

    fn ledger() -> (tempfile::TempDir, LmdbStore) {
        let dir = tempfile::tempdir().expect("temp dir");
        let store = LmdbStore::open(dir.path(), DEFAULT_MAP_SIZE).expect("open ledger");
        (dir, store)
    }

    #[test]
    fn wallet_with_nodes_cannot_be_deleted() {
        let (_dir, store) = ledger();
        let address = AccountAddress::new(-1, [9; 32]);
        wallet(
            &store,
            WalletAction::Add {
                address,
                key_file: PathBuf::from("/keys/validator"),
            },
        )
        .unwrap();
        node(
            &store,
            NodeAction::Add {
                wallet: 1,
                host_port: "127.0.0.1:3030".into(),
                server_pub: PathBuf::from("server.pub"),
                client_cert: PathBuf::from("client"),
            },
        )
        .unwrap();

        assert!(wallet(&store, WalletAction::Del { id: 1 }).is_err());
        node(&store, NodeAction::Del { id: 1 }).unwrap();
        wallet(&store, WalletAction::Del { id: 1 }).unwrap();
        assert!(store.list_wallets(EnabledFilter::All).unwrap().is_empty());
    }

    #[test]
    fn participation_list_for_unknown_node_is_empty() {
        let (_dir, store) = ledger();
        participation(&store, ParticipationAction::List { node: 7, json: true }).unwrap();
    }
}
