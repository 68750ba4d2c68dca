//! Main node orchestration.
//!
//! [`Blockchain`] owns the chain, the transaction pool and the peer set and
//! is shared between request handlers as `Arc<Blockchain>`. Locks are always
//! taken chain first, then pool, and no lock is held during a proof search
//! or while peers are being fetched.

use crate::ledger::Chain;
use crate::mempool::{Mempool, MempoolStats};
use crate::miner::Miner;
use crate::peers::PeerSet;
use parking_lot::{Mutex, RwLock};
use rmcoin_consensus::{
    resolve, ChainFetcher, FetchError, ProofOfWork, Resolution, ValidationError,
    DEFAULT_DIFFICULTY,
};
use rmcoin_core::{Block, Hash, Transaction, TransactionError, TransactionRequest};
use rmcoin_storage::{ChainStore, StorageError};
use thiserror::Error;
use tracing::{debug, info, warn};

/// Errors that can occur during node operations.
#[derive(Debug, Error)]
pub enum NodeError {
    #[error("malformed transaction: {0}")]
    MalformedTransaction(#[from] TransactionError),

    #[error("no peer addresses given")]
    NoPeers,

    #[error("invalid peer address: {0:?}")]
    InvalidPeerAddress(String),

    #[error("storage error: {0}")]
    Storage(#[from] StorageError),

    #[error("stored chain is invalid: {0}")]
    InvalidStoredChain(ValidationError),
}

pub type Result<T> = std::result::Result<T, NodeError>;

/// Node configuration.
#[derive(Debug, Clone)]
pub struct BlockchainConfig {
    /// Leading zero hex digits required of every proof. Must match the
    /// rest of the network.
    pub difficulty: usize,
    /// Amount credited to this node for each mined block.
    pub mining_reward: u64,
    /// Receiver of mining rewards.
    pub node_id: String,
}

impl Default for BlockchainConfig {
    fn default() -> Self {
        Self {
            difficulty: DEFAULT_DIFFICULTY,
            mining_reward: 1,
            node_id: hex::encode(rand::random::<[u8; 16]>()),
        }
    }
}

/// Acknowledgement for an accepted transaction.
///
/// Both fields are advisory: concurrent submissions and chain replacement
/// can change where the transaction ends up.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PendingReceipt {
    /// 0-based position in the pool at submission time.
    pub position: usize,
    /// Index of the block expected to include the transaction.
    pub block_index: u64,
}

/// A single blockchain node.
pub struct Blockchain {
    config: BlockchainConfig,
    miner: Miner,
    chain: RwLock<Chain>,
    mempool: Mutex<Mempool>,
    peers: RwLock<PeerSet>,
    store: Option<ChainStore>,
}

impl Blockchain {
    /// Create an in-memory node starting from genesis.
    pub fn new(config: BlockchainConfig) -> Self {
        Self::from_parts(config, Chain::new(), Mempool::new(), None)
    }

    /// Create a node backed by a snapshot store.
    ///
    /// A previously saved chain is loaded and validated; an invalid one is
    /// an error and is left untouched. An empty store is seeded with genesis.
    pub fn with_store(config: BlockchainConfig, store: ChainStore) -> Result<Self> {
        let pow = ProofOfWork::new(config.difficulty);

        let (chain, mempool) = if store.is_initialized()? {
            let blocks = store.load_chain()?;
            let chain = Chain::from_blocks(blocks, &pow).map_err(NodeError::InvalidStoredChain)?;
            let mempool = Mempool::from_transactions(store.load_pool()?);
            info!(
                length = chain.len(),
                pending = mempool.len(),
                "loaded chain from store"
            );
            (chain, mempool)
        } else {
            let chain = Chain::new();
            store.save_chain(chain.blocks())?;
            info!("initialized store with genesis");
            (chain, Mempool::new())
        };

        Ok(Self::from_parts(config, chain, mempool, Some(store)))
    }

    fn from_parts(
        config: BlockchainConfig,
        chain: Chain,
        mempool: Mempool,
        store: Option<ChainStore>,
    ) -> Self {
        let pow = ProofOfWork::new(config.difficulty);
        let miner = Miner::new(pow, config.node_id.clone(), config.mining_reward);
        Self {
            config,
            miner,
            chain: RwLock::new(chain),
            mempool: Mutex::new(mempool),
            peers: RwLock::new(PeerSet::new()),
            store,
        }
    }

    pub fn config(&self) -> &BlockchainConfig {
        &self.config
    }

    /// Proof of work rule used for mining and validation.
    pub fn pow(&self) -> &ProofOfWork {
        self.miner.pow()
    }

    pub fn node_id(&self) -> &str {
        self.miner.node_id()
    }

    // =========================================================================
    // Chain
    // =========================================================================

    /// Get a snapshot of the full chain.
    pub fn get_chain(&self) -> Vec<Block> {
        self.chain.read().blocks().to_vec()
    }

    /// Get the current chain length.
    pub fn len(&self) -> usize {
        self.chain.read().len()
    }

    /// Always false: the chain holds at least genesis.
    pub fn is_empty(&self) -> bool {
        self.chain.read().is_empty()
    }

    /// Get the latest block.
    pub fn last_block(&self) -> Block {
        self.chain.read().last_block().clone()
    }

    /// Check whether the local chain is valid.
    pub fn is_valid(&self) -> bool {
        self.validate().is_ok()
    }

    /// Validate the local chain, reporting the first violation.
    pub fn validate(&self) -> std::result::Result<(), ValidationError> {
        self.chain.read().validate(self.pow())
    }

    // =========================================================================
    // Transactions
    // =========================================================================

    /// Validate and submit an untyped transaction.
    ///
    /// A malformed request leaves the pool unchanged.
    pub fn add_transaction(&self, request: TransactionRequest) -> Result<PendingReceipt> {
        let tx = Transaction::try_from(request)?;
        Ok(self.submit(tx))
    }

    /// Submit an already-typed transaction.
    pub fn submit(&self, tx: Transaction) -> PendingReceipt {
        let chain = self.chain.read();
        let mut pool = self.mempool.lock();

        let block_index = chain.last_block().index + 1;
        let position = pool.submit(tx);
        debug!(position, block_index, "transaction added to pool");

        self.persist_pool(pool.transactions());
        PendingReceipt {
            position,
            block_index,
        }
    }

    /// Get a snapshot of the pending transactions.
    pub fn pending(&self) -> Vec<Transaction> {
        self.mempool.lock().pending()
    }

    /// Get the number of pending transactions.
    pub fn peek_count(&self) -> usize {
        self.mempool.lock().len()
    }

    // =========================================================================
    // Mining
    // =========================================================================

    /// Mine a block holding every pending transaction plus the reward.
    ///
    /// The proof search runs without locks. If the tip changes meanwhile
    /// (another block was mined or the chain was replaced) the search starts
    /// over on the new tip. Never fails; may run for a long time.
    pub fn mine_block(&self) -> Block {
        loop {
            let previous = self.last_block();
            debug!(target: "mining", index = previous.index + 1, "searching for proof");
            let proof = self.miner.search(&previous);

            let mut chain = self.chain.write();
            if chain.last_block().hash != previous.hash {
                debug!(target: "mining", "tip changed during proof search, retrying");
                continue;
            }

            let mut pool = self.mempool.lock();
            let block = self.miner.seal(&mut chain, &mut pool, proof);
            self.persist_block(&chain, &block, pool.transactions());

            info!(
                target: "mining",
                index = block.index,
                proof = block.proof,
                transactions = block.tx_count(),
                hash = %block.hash,
                "mined block"
            );
            return block;
        }
    }

    // =========================================================================
    // Peers & consensus
    // =========================================================================

    /// Register peer addresses, returning the full peer list.
    ///
    /// Every address is checked before any is added, so a bad entry leaves
    /// the peer set unchanged.
    pub fn connect_nodes<I, S>(&self, addresses: I) -> Result<Vec<String>>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let normalized = addresses
            .into_iter()
            .map(|address| {
                let address = address.as_ref();
                PeerSet::normalize(address)
                    .ok_or_else(|| NodeError::InvalidPeerAddress(address.to_string()))
            })
            .collect::<Result<Vec<_>>>()?;

        if normalized.is_empty() {
            return Err(NodeError::NoPeers);
        }

        let mut peers = self.peers.write();
        for address in normalized {
            if peers.insert(address.clone()) {
                info!(peer = %address, "registered peer");
            }
        }
        Ok(peers.peers().to_vec())
    }

    /// Get the registered peers in registration order.
    pub fn peers(&self) -> Vec<String> {
        self.peers.read().peers().to_vec()
    }

    /// Replace the local chain with the longest valid peer chain, if any
    /// peer has one strictly longer than ours.
    ///
    /// Unreachable peers are logged and skipped.
    pub async fn resolve_conflicts<F: ChainFetcher>(&self, fetcher: &F) -> Resolution {
        let peers = self.peers();
        if peers.is_empty() {
            debug!("no peers registered, keeping local chain");
            return Resolution::default();
        }

        let local = self.get_chain();
        let mut fetched = Vec::with_capacity(peers.len());
        let mut unreachable = Vec::new();
        for peer in peers {
            match fetcher.fetch_chain(&peer).await {
                Ok(chain) => fetched.push((peer, chain)),
                Err(error) => {
                    warn!(%peer, %error, "failed to fetch peer chain");
                    unreachable.push((peer, error));
                }
            }
        }

        self.adopt(&local, fetched, unreachable)
    }

    /// Pick a candidate against the `local` snapshot taken before fetching,
    /// then install it only if it still beats the live chain.
    fn adopt(
        &self,
        local: &[Block],
        fetched: Vec<(String, Vec<Block>)>,
        unreachable: Vec<(String, FetchError)>,
    ) -> Resolution {
        let mut resolution = resolve(local, fetched, self.pow());
        for (peer, error) in unreachable {
            resolution.unreachable(peer, error);
        }
        for rejection in &resolution.rejected {
            debug!(peer = rejection.peer(), %rejection, "peer chain rejected");
        }

        let Some(candidate) = resolution.chain.take() else {
            info!(length = local.len(), "local chain is authoritative");
            return resolution;
        };

        // Validation ran unlocked; the local chain may have grown since.
        let mut chain = self.chain.write();
        if candidate.len() <= chain.len() {
            info!(
                candidate = candidate.len(),
                local = chain.len(),
                "local chain grew during resolution, keeping it"
            );
            resolution.source = None;
            return resolution;
        }

        info!(
            source = resolution.source.as_deref().unwrap_or_default(),
            from = chain.len(),
            to = candidate.len(),
            "replacing local chain"
        );
        chain.replace(candidate.clone());
        self.persist_chain(chain.blocks());
        resolution.chain = Some(candidate);
        resolution
    }

    // =========================================================================
    // Stats & persistence
    // =========================================================================

    /// Get node statistics.
    pub fn stats(&self) -> BlockchainStats {
        let chain = self.chain.read();
        let mempool = self.mempool.lock().stats();
        let tip = chain.last_block();

        BlockchainStats {
            length: chain.len(),
            latest_block_hash: tip.hash,
            latest_timestamp: tip.timestamp,
            mempool,
            peer_count: self.peers.read().len(),
            difficulty: self.pow().difficulty(),
        }
    }

    fn persist_block(&self, chain: &Chain, block: &Block, pending: &[Transaction]) {
        let Some(store) = &self.store else { return };
        if let Err(error) = store.append_block(block, pending) {
            warn!(%error, index = block.index, "failed to append block, rewriting snapshot");
            if let Err(error) = store.save_snapshot(chain.blocks(), pending) {
                warn!(%error, length = chain.len(), "failed to save snapshot");
            }
        }
    }

    fn persist_chain(&self, blocks: &[Block]) {
        let Some(store) = &self.store else { return };
        if let Err(error) = store.save_chain(blocks) {
            warn!(%error, length = blocks.len(), "failed to save chain");
        }
    }

    fn persist_pool(&self, pending: &[Transaction]) {
        let Some(store) = &self.store else { return };
        if let Err(error) = store.save_pool(pending) {
            warn!(%error, pending = pending.len(), "failed to save pool");
        }
    }
}

/// Node statistics.
#[derive(Debug, Clone)]
pub struct BlockchainStats {
    /// Number of blocks, genesis included.
    pub length: usize,
    /// Hash of the latest block.
    pub latest_block_hash: Hash,
    /// Timestamp of the latest block.
    pub latest_timestamp: u64,
    /// Pool statistics.
    pub mempool: MempoolStats,
    /// Number of registered peers.
    pub peer_count: usize,
    /// Configured difficulty.
    pub difficulty: usize,
}

#[cfg(test)]
mod tests {
    use super::*;
    use rmcoin_consensus::{ConsensusError, MemoryFetcher};
    use rmcoin_core::REWARD_SENDER;
    use serde_json::json;
    use std::sync::Arc;

    fn config(node_id: &str) -> BlockchainConfig {
        BlockchainConfig {
            difficulty: 1,
            mining_reward: 1,
            node_id: node_id.to_string(),
        }
    }

    fn setup_blockchain() -> Blockchain {
        Blockchain::new(config("node-a"))
    }

    fn request(value: serde_json::Value) -> TransactionRequest {
        serde_json::from_value(value).unwrap()
    }

    #[test]
    fn test_blockchain_init() {
        let blockchain = setup_blockchain();

        assert_eq!(blockchain.len(), 1);
        assert!(!blockchain.is_empty());
        assert!(blockchain.last_block().is_genesis());
        assert!(blockchain.is_valid());
        assert_eq!(blockchain.peek_count(), 0);
    }

    #[test]
    fn test_default_config() {
        let a = BlockchainConfig::default();
        let b = BlockchainConfig::default();

        assert_eq!(a.difficulty, DEFAULT_DIFFICULTY);
        assert_eq!(a.mining_reward, 1);
        assert_eq!(a.node_id.len(), 32);
        assert_ne!(a.node_id, b.node_id);
    }

    #[test]
    fn test_add_transaction_receipt() {
        let blockchain = setup_blockchain();

        let first = blockchain
            .add_transaction(TransactionRequest::new("Alice", "Bob", 50))
            .unwrap();
        let second = blockchain
            .add_transaction(TransactionRequest::new("Bob", "Charlie", 25))
            .unwrap();

        assert_eq!(first, PendingReceipt { position: 0, block_index: 1 });
        assert_eq!(second, PendingReceipt { position: 1, block_index: 1 });
        assert_eq!(blockchain.peek_count(), 2);
    }

    #[test]
    fn test_malformed_transactions_rejected() {
        let blockchain = setup_blockchain();
        let bad = [
            json!({"sender": "Alice", "receiver": "Bob"}),
            json!({"sender": "Alice", "receiver": "Bob", "amount": -5}),
            json!({"sender": "Alice", "receiver": "Bob", "amount": 2.5}),
            json!({"sender": "Alice", "receiver": "Bob", "amount": "ten"}),
            json!({"sender": 7, "receiver": "Bob", "amount": 1}),
            json!({"sender": "", "receiver": "Bob", "amount": 1}),
            json!({"sender": REWARD_SENDER, "receiver": "Bob", "amount": 1}),
        ];

        for body in bad {
            let result = blockchain.add_transaction(request(body.clone()));
            assert!(
                matches!(result, Err(NodeError::MalformedTransaction(_))),
                "accepted {body}"
            );
        }
        assert_eq!(blockchain.peek_count(), 0);
    }

    #[test]
    fn test_mine_block_includes_pending_and_reward() {
        let blockchain = setup_blockchain();
        blockchain
            .add_transaction(TransactionRequest::new("Alice", "Bob", 25))
            .unwrap();

        let block = blockchain.mine_block();

        assert_eq!(block.index, 1);
        assert_eq!(block.transactions.len(), 2);
        assert_eq!(block.transactions[0], Transaction::new("Alice", "Bob", 25).unwrap());
        assert_eq!(block.transactions[1], Transaction::reward("node-a", 1));
        assert_eq!(blockchain.peek_count(), 0);
        assert_eq!(blockchain.last_block(), block);
    }

    #[test]
    fn test_mined_proof_is_valid() {
        let blockchain = setup_blockchain();
        let previous = blockchain.last_block();

        let block = blockchain.mine_block();

        assert!(blockchain.pow().is_valid_proof(previous.proof, block.proof));
        assert_eq!(block.previous_hash, previous.compute_hash());
        assert!(blockchain.is_valid());
    }

    #[test]
    fn test_receipt_tracks_next_block() {
        let blockchain = setup_blockchain();
        blockchain.mine_block();
        blockchain.mine_block();

        let receipt = blockchain.submit(Transaction::new("Alice", "Bob", 1).unwrap());
        assert_eq!(receipt.block_index, 3);
        assert_eq!(blockchain.mine_block().index, 3);
    }

    #[test]
    fn test_connect_nodes() {
        let blockchain = setup_blockchain();

        let peers = blockchain
            .connect_nodes(["http://127.0.0.1:5001", "http://127.0.0.1:5002/"])
            .unwrap();
        assert_eq!(peers, vec!["http://127.0.0.1:5001", "http://127.0.0.1:5002"]);

        let peers = blockchain
            .connect_nodes(["127.0.0.1:5001", "https://node.example"])
            .unwrap();
        assert_eq!(
            peers,
            vec![
                "http://127.0.0.1:5001",
                "http://127.0.0.1:5002",
                "https://node.example:443"
            ]
        );
    }

    #[test]
    fn test_connect_nodes_errors() {
        let blockchain = setup_blockchain();

        assert!(matches!(
            blockchain.connect_nodes(Vec::<String>::new()),
            Err(NodeError::NoPeers)
        ));
        assert!(matches!(
            blockchain.connect_nodes(["http://127.0.0.1:5001", "not a peer"]),
            Err(NodeError::InvalidPeerAddress(addr)) if addr == "not a peer"
        ));
        assert!(blockchain.peers().is_empty());
    }

    #[tokio::test]
    async fn test_resolve_adopts_longer_valid_chain() {
        let local = setup_blockchain();
        local.mine_block();

        let remote = Blockchain::new(config("node-b"));
        for _ in 0..3 {
            remote.mine_block();
        }

        local.connect_nodes(["localhost:5001"]).unwrap();
        let fetcher = MemoryFetcher::new().with_chain("http://localhost:5001", remote.get_chain());

        let resolution = local.resolve_conflicts(&fetcher).await;

        assert!(resolution.adopted());
        assert_eq!(resolution.source.as_deref(), Some("http://localhost:5001"));
        assert_eq!(local.get_chain(), remote.get_chain());
        assert!(local.is_valid());
    }

    #[tokio::test]
    async fn test_resolve_keeps_local_against_invalid_chain() {
        let local = setup_blockchain();
        local.mine_block();
        let before = local.get_chain();

        let remote = Blockchain::new(config("node-b"));
        for _ in 0..3 {
            remote.mine_block();
        }
        let mut forged = remote.get_chain();
        forged[2].transactions[0].amount = 1_000;

        local.connect_nodes(["localhost:5001"]).unwrap();
        let fetcher = MemoryFetcher::new().with_chain("http://localhost:5001", forged);

        let resolution = local.resolve_conflicts(&fetcher).await;

        assert!(!resolution.adopted());
        assert!(matches!(
            &resolution.rejected[..],
            [ConsensusError::InvalidChain { .. }]
        ));
        assert_eq!(local.get_chain(), before);
    }

    #[tokio::test]
    async fn test_resolve_skips_unreachable_peers() {
        let local = setup_blockchain();
        let remote = Blockchain::new(config("node-b"));
        remote.mine_block();

        local
            .connect_nodes(["localhost:5009", "localhost:5001"])
            .unwrap();
        let fetcher = MemoryFetcher::new().with_chain("http://localhost:5001", remote.get_chain());

        let resolution = local.resolve_conflicts(&fetcher).await;

        assert!(resolution.adopted());
        assert_eq!(resolution.rejected.len(), 1);
        assert_eq!(resolution.rejected[0].peer(), "http://localhost:5009");
        assert!(matches!(
            resolution.rejected[0],
            ConsensusError::PeerUnreachable { .. }
        ));
    }

    /// Serves a fixed chain, but mines a block on `node` before answering.
    struct MineDuringFetch {
        node: Arc<Blockchain>,
        chain: Vec<Block>,
    }

    impl ChainFetcher for MineDuringFetch {
        async fn fetch_chain(
            &self,
            _address: &str,
        ) -> std::result::Result<Vec<Block>, FetchError> {
            self.node.mine_block();
            Ok(self.chain.clone())
        }
    }

    #[tokio::test]
    async fn test_resolve_keeps_block_mined_during_fetch() {
        let local = Arc::new(setup_blockchain());
        let remote = Blockchain::new(config("node-b"));
        remote.mine_block();

        local.connect_nodes(["localhost:5001"]).unwrap();
        let fetcher = MineDuringFetch {
            node: Arc::clone(&local),
            chain: remote.get_chain(),
        };

        let resolution = local.resolve_conflicts(&fetcher).await;

        assert!(!resolution.adopted());
        assert!(resolution.source.is_none());
        assert_eq!(local.len(), 2);
        assert_eq!(local.last_block().transactions[0], Transaction::reward("node-a", 1));
        assert_ne!(local.get_chain(), remote.get_chain());
        assert!(local.is_valid());
    }

    #[test]
    fn test_adopt_rechecks_live_length() {
        let local = setup_blockchain();
        let snapshot = local.get_chain();
        let tip = local.mine_block();

        let remote = Blockchain::new(config("node-b"));
        remote.mine_block();
        let resolution = local.adopt(
            &snapshot,
            vec![("http://localhost:5001".to_string(), remote.get_chain())],
            Vec::new(),
        );

        assert!(!resolution.adopted());
        assert_eq!(local.last_block(), tip);
    }

    #[tokio::test]
    async fn test_resolve_without_peers() {
        let local = setup_blockchain();
        let resolution = local.resolve_conflicts(&MemoryFetcher::new()).await;

        assert!(!resolution.adopted());
        assert!(resolution.rejected.is_empty());
    }

    #[test]
    fn test_store_roundtrip() {
        let store = ChainStore::open_temporary().unwrap();

        let blockchain = Blockchain::with_store(config("node-a"), store.clone()).unwrap();
        blockchain.mine_block();
        blockchain.submit(Transaction::new("Alice", "Bob", 7).unwrap());
        let chain = blockchain.get_chain();
        drop(blockchain);

        let reloaded = Blockchain::with_store(config("node-a"), store).unwrap();
        assert_eq!(reloaded.get_chain(), chain);
        assert_eq!(reloaded.pending(), vec![Transaction::new("Alice", "Bob", 7).unwrap()]);
    }

    #[test]
    fn test_store_reload_after_mining_keeps_transactions_once() {
        let store = ChainStore::open_temporary().unwrap();

        let blockchain = Blockchain::with_store(config("node-a"), store.clone()).unwrap();
        blockchain.submit(Transaction::new("Alice", "Bob", 25).unwrap());
        blockchain.submit(Transaction::new("Bob", "Carol", 5).unwrap());
        blockchain.mine_block();
        blockchain.submit(Transaction::new("Carol", "Dave", 2).unwrap());
        drop(blockchain);

        let reloaded = Blockchain::with_store(config("node-a"), store).unwrap();
        let pending = reloaded.pending();
        assert_eq!(pending, vec![Transaction::new("Carol", "Dave", 2).unwrap()]);
        for block in reloaded.get_chain() {
            for tx in &block.transactions {
                assert!(!pending.contains(tx), "{tx:?} is both mined and pending");
            }
        }

        let block = reloaded.mine_block();
        assert_eq!(block.transactions.len(), 2);
        assert_eq!(block.transactions[0], Transaction::new("Carol", "Dave", 2).unwrap());
    }

    #[test]
    fn test_invalid_stored_chain_is_rejected() {
        let store = ChainStore::open_temporary().unwrap();
        let blockchain = Blockchain::new(config("node-a"));
        blockchain.mine_block();

        let mut blocks = blockchain.get_chain();
        blocks[1].proof += 1;
        store.save_chain(&blocks).unwrap();

        assert!(matches!(
            Blockchain::with_store(config("node-a"), store),
            Err(NodeError::InvalidStoredChain(_))
        ));
    }

    #[test]
    fn test_blockchain_stats() {
        let blockchain = setup_blockchain();
        blockchain.submit(Transaction::new("Alice", "Bob", 3).unwrap());
        blockchain.connect_nodes(["localhost:5001"]).unwrap();

        let stats = blockchain.stats();
        assert_eq!(stats.length, 1);
        assert_eq!(stats.latest_block_hash, Block::genesis().hash);
        assert_eq!(stats.mempool.total_transactions, 1);
        assert_eq!(stats.peer_count, 1);
        assert_eq!(stats.difficulty, 1);
    }
}
