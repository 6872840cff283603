use std::sync::Mutex;
use std::sync::atomic::AtomicBool;

use log::{debug, info, warn};

use super::Block;
use super::block::now_secs;
use super::pow;
use crate::error::LedgerError;
use crate::transaction::Transaction;

/// Chain and pending pool, always mutated together under one lock.
#[derive(Debug)]
struct LedgerState {
    chain: Vec<Block>,
    pending: Vec<Transaction>,
}

impl LedgerState {
    fn last_block(&self) -> &Block {
        self.chain
            .last()
            .expect("ledger always holds at least the genesis block")
    }

    /// Snapshot + clear the pool and append. Caller holds the lock.
    /// `reward`, if any, joins the pool last, in the same step.
    fn seal(&mut self, proof: u64, previous_hash: String, reward: Option<Transaction>) -> Block {
        let (index, timestamp) = {
            let last = self.last_block();
            (last.index + 1, now_secs().max(last.timestamp))
        };
        self.pending.extend(reward);
        let block = Block {
            index,
            timestamp,
            transactions: std::mem::take(&mut self.pending),
            proof,
            previous_hash,
        };
        self.chain.push(block.clone());
        block
    }
}

/// In-memory append-only ledger secured by proof-of-work.
#[derive(Debug)]
pub struct Ledger {
    state: Mutex<LedgerState>,
    workers: usize,
}

impl Ledger {
    /// New ledger holding only the genesis block. `workers` is the number of
    /// threads used by the proof search.
    pub fn new(workers: usize) -> Self {
        Self {
            state: Mutex::new(LedgerState {
                chain: vec![Block::genesis()],
                pending: Vec::new(),
            }),
            workers: workers.max(1),
        }
    }

    /// Queue a transaction. Returns the index of the block that will hold it.
    pub fn new_transaction(
        &self,
        sender: impl Into<String>,
        recipient: impl Into<String>,
        amount: u64,
    ) -> u64 {
        let mut st = self.state.lock().expect("mutex poisoned");
        st.pending.push(Transaction::new(sender, recipient, amount));
        let next = st.last_block().index + 1;
        debug!(
            "pending pool now {} tx(s), next block #{}",
            st.pending.len(),
            next
        );
        next
    }

    /// Seal the pending pool into a new block with an already-found `proof`.
    ///
    /// The proof is re-checked against the current tip. `previous_hash`, if
    /// given, must equal the hash of the tip; when `None` it is computed.
    pub fn new_block(&self, proof: u64, previous_hash: Option<&str>) -> Result<Block, LedgerError> {
        let mut st = self.state.lock().expect("mutex poisoned");
        let last = st.last_block();
        if !pow::verify(last.proof, proof) {
            return Err(LedgerError::InvalidProof {
                last_proof: last.proof,
                proof,
            });
        }
        let expected = last.compute_hash();
        if let Some(got) = previous_hash {
            if got != expected {
                return Err(LedgerError::PreviousHashMismatch {
                    expected,
                    got: got.to_string(),
                });
            }
        }
        Ok(st.seal(proof, expected, None))
    }

    /// Solve the puzzle for the current tip and seal a block. Never gives up.
    pub fn mine(&self) -> Block {
        let never = AtomicBool::new(false);
        self.mine_cancellable(&never)
            .unwrap_or_else(|| unreachable!("proof search only stops when asked to"))
    }

    /// Like [`Ledger::mine`], but abandons the search once `stop` is set.
    ///
    /// The search runs without the lock. If another miner appended first, the
    /// found proof is stale and the search restarts against the new tip.
    pub fn mine_cancellable(&self, stop: &AtomicBool) -> Option<Block> {
        self.mine_with_reward(None, stop)
    }

    /// Mine, crediting `reward` only if this call actually seals a block.
    ///
    /// An abandoned search or a stale proof never leaves the reward behind
    /// in the pending pool.
    pub fn mine_with_reward(&self, reward: Option<Transaction>, stop: &AtomicBool) -> Option<Block> {
        loop {
            let (tip_index, last_proof) = {
                let st = self.state.lock().expect("mutex poisoned");
                let last = st.last_block();
                (last.index, last.proof)
            };

            let proof = pow::solve_parallel(last_proof, self.workers, stop)?;

            let mut st = self.state.lock().expect("mutex poisoned");
            if st.last_block().index != tip_index {
                warn!(
                    "stale proof {} for tip #{}, chain advanced to #{}; re-solving",
                    proof,
                    tip_index,
                    st.last_block().index
                );
                continue;
            }
            let previous_hash = st.last_block().compute_hash();
            let block = st.seal(proof, previous_hash, reward);
            info!(
                "sealed block #{} (proof={}, txs={})",
                block.index,
                block.proof,
                block.transactions.len()
            );
            return Some(block);
        }
    }

    /// Check hash linkage and proof of every block after the first.
    pub fn valid_chain(chain: &[Block]) -> bool {
        for pair in chain.windows(2) {
            let (prev, block) = (&pair[0], &pair[1]);
            if block.previous_hash != prev.compute_hash() {
                debug!("block #{} has a bad previous_hash", block.index);
                return false;
            }
            if !pow::verify(prev.proof, block.proof) {
                debug!("block #{} has an invalid proof", block.index);
                return false;
            }
        }
        true
    }

    /// Validate this ledger's own chain.
    pub fn is_valid(&self) -> bool {
        let st = self.state.lock().expect("mutex poisoned");
        Self::valid_chain(&st.chain)
    }

    /// Snapshot of the chain and its length.
    pub fn get_chain(&self) -> (Vec<Block>, usize) {
        let st = self.state.lock().expect("mutex poisoned");
        (st.chain.clone(), st.chain.len())
    }

    pub fn last_block(&self) -> Block {
        let st = self.state.lock().expect("mutex poisoned");
        st.last_block().clone()
    }

    pub fn pending_transactions(&self) -> Vec<Transaction> {
        let st = self.state.lock().expect("mutex poisoned");
        st.pending.clone()
    }

    pub fn len(&self) -> usize {
        let st = self.state.lock().expect("mutex poisoned");
        st.chain.len()
    }
}

impl Default for Ledger {
    fn default() -> Self {
        Self::new(1)
    }
}

#[cfg(test)]
mod tests {
    use super::Ledger;
    use crate::blockchain::{GENESIS_PREVIOUS_HASH, pow};
    use crate::error::LedgerError;
    use crate::transaction::Transaction;
    use std::sync::Arc;
    use std::sync::atomic::AtomicBool;
    use std::thread;

    #[test]
    fn starts_with_genesis() {
        let ledger = Ledger::default();
        let (chain, len) = ledger.get_chain();
        assert_eq!(len, 1);
        assert_eq!(chain[0].index, 1);
        assert_eq!(chain[0].previous_hash, GENESIS_PREVIOUS_HASH);
        assert!(ledger.is_valid());
    }

    #[test]
    fn first_transaction_lands_in_block_two() {
        let ledger = Ledger::default();
        let genesis = ledger.last_block();

        assert_eq!(ledger.new_transaction("A", "B", 10), 2);
        let block = ledger.mine();

        assert_eq!(block.index, 2);
        assert_eq!(block.transactions, vec![Transaction::new("A", "B", 10)]);
        assert!(pow::verify(genesis.proof, block.proof));
        assert_eq!(block.previous_hash, genesis.compute_hash());
        assert_eq!(ledger.get_chain().1, 2);
    }

    #[test]
    fn mine_consumes_pool_in_submission_order() {
        let ledger = Ledger::default();
        ledger.new_transaction("a", "b", 1);
        ledger.new_transaction("b", "c", 2);
        ledger.new_transaction("c", "a", 3);

        let block = ledger.mine();
        let amounts: Vec<u64> = block.transactions.iter().map(|t| t.amount).collect();
        assert_eq!(amounts, vec![1, 2, 3]);
        assert!(ledger.pending_transactions().is_empty());
    }

    #[test]
    fn mining_empty_pool_still_advances() {
        let ledger = Ledger::default();
        let block = ledger.mine();
        assert_eq!(block.index, 2);
        assert!(block.transactions.is_empty());
        assert_eq!(ledger.len(), 2);
    }

    #[test]
    fn timestamps_never_decrease() {
        let ledger = Ledger::default();
        ledger.mine();
        ledger.mine();
        let (chain, _) = ledger.get_chain();
        assert!(chain.windows(2).all(|w| w[0].timestamp <= w[1].timestamp));
    }

    #[test]
    fn sequentially_built_chain_is_valid() {
        let ledger = Ledger::new(2);
        for i in 0..3 {
            ledger.new_transaction("x", "y", i);
            ledger.mine();
        }
        let (chain, len) = ledger.get_chain();
        assert_eq!(len, 4);
        assert!(Ledger::valid_chain(&chain));
    }

    #[test]
    fn tampered_previous_hash_is_invalid() {
        let ledger = Ledger::default();
        ledger.mine();
        ledger.mine();
        let (mut chain, _) = ledger.get_chain();
        chain[2].previous_hash = "not-a-hash".into();
        assert!(!Ledger::valid_chain(&chain));
    }

    #[test]
    fn tampered_proof_is_invalid() {
        let ledger = Ledger::default();
        ledger.mine();
        let (mut chain, _) = ledger.get_chain();
        let last_proof = chain[0].proof;
        chain[1].proof = (0..).find(|&p| !pow::verify(last_proof, p)).unwrap();
        assert!(!Ledger::valid_chain(&chain));
    }

    #[test]
    fn tampered_transaction_breaks_linkage() {
        let ledger = Ledger::default();
        ledger.new_transaction("A", "B", 10);
        ledger.mine();
        ledger.mine();
        let (mut chain, _) = ledger.get_chain();
        chain[1].transactions[0].amount = 1_000;
        assert!(!Ledger::valid_chain(&chain));
    }

    #[test]
    fn new_block_rejects_invalid_proof() {
        let ledger = Ledger::default();
        let last_proof = ledger.last_block().proof;
        let bad = (0..).find(|&p| !pow::verify(last_proof, p)).unwrap();
        ledger.new_transaction("A", "B", 1);

        let err = ledger.new_block(bad, None).unwrap_err();
        assert_eq!(
            err,
            LedgerError::InvalidProof {
                last_proof,
                proof: bad
            }
        );
        assert_eq!(ledger.len(), 1);
        assert_eq!(ledger.pending_transactions().len(), 1);
    }

    #[test]
    fn new_block_checks_previous_hash_override() {
        let ledger = Ledger::default();
        let tip = ledger.last_block();
        let proof = pow::solve(tip.proof);

        let err = ledger.new_block(proof, Some("1")).unwrap_err();
        assert!(matches!(err, LedgerError::PreviousHashMismatch { .. }));

        let block = ledger.new_block(proof, Some(&tip.compute_hash())).unwrap();
        assert_eq!(block.index, 2);
        assert!(ledger.is_valid());
    }

    #[test]
    fn stopped_mining_leaves_ledger_untouched() {
        let ledger = Ledger::default();
        ledger.new_transaction("A", "B", 1);
        let stop = AtomicBool::new(true);
        assert!(ledger.mine_cancellable(&stop).is_none());
        assert_eq!(ledger.len(), 1);
        assert_eq!(ledger.pending_transactions().len(), 1);
    }

    #[test]
    fn reward_is_sealed_after_pending_transactions() {
        let ledger = Ledger::default();
        ledger.new_transaction("A", "B", 10);
        let never = AtomicBool::new(false);
        let reward = Transaction::new("0", "miner", 1);

        let block = ledger
            .mine_with_reward(Some(reward.clone()), &never)
            .unwrap();
        assert_eq!(
            block.transactions,
            vec![Transaction::new("A", "B", 10), reward]
        );
        assert!(ledger.pending_transactions().is_empty());
    }

    #[test]
    fn abandoned_mining_drops_the_reward() {
        let ledger = Ledger::default();
        let stop = AtomicBool::new(true);
        for _ in 0..3 {
            let reward = Transaction::new("0", "miner", 1);
            assert!(ledger.mine_with_reward(Some(reward), &stop).is_none());
        }
        assert!(ledger.pending_transactions().is_empty());

        let block = ledger.mine();
        assert!(block.transactions.is_empty());
    }

    #[test]
    fn concurrent_rewarded_miners_pay_once_per_block() {
        let ledger = Arc::new(Ledger::default());
        let handles: Vec<_> = (0..3)
            .map(|i| {
                let ledger = Arc::clone(&ledger);
                thread::spawn(move || {
                    let never = AtomicBool::new(false);
                    let reward = Transaction::new("0", format!("miner-{i}"), 1);
                    ledger.mine_with_reward(Some(reward), &never).unwrap()
                })
            })
            .collect();
        for h in handles {
            let block = h.join().unwrap();
            let rewards = block.transactions.iter().filter(|t| t.sender == "0").count();
            assert_eq!(rewards, 1);
        }
        assert!(ledger.is_valid());
    }

    #[test]
    fn concurrent_miners_append_distinct_blocks() {
        let ledger = Arc::new(Ledger::default());
        let handles: Vec<_> = (0..4)
            .map(|_| {
                let ledger = Arc::clone(&ledger);
                thread::spawn(move || ledger.mine().index)
            })
            .collect();
        let mut indices: Vec<u64> = handles.into_iter().map(|h| h.join().unwrap()).collect();
        indices.sort_unstable();

        assert_eq!(indices, vec![2, 3, 4, 5]);
        assert!(ledger.is_valid());
    }

    #[test]
    fn concurrent_submissions_are_never_lost() {
        let ledger = Arc::new(Ledger::default());
        let submitters: Vec<_> = (0..4)
            .map(|t| {
                let ledger = Arc::clone(&ledger);
                thread::spawn(move || {
                    for i in 0..25 {
                        ledger.new_transaction(format!("s{t}"), "r", i);
                    }
                })
            })
            .collect();
        let miner = {
            let ledger = Arc::clone(&ledger);
            thread::spawn(move || {
                ledger.mine();
                ledger.mine();
            })
        };
        for h in submitters {
            h.join().unwrap();
        }
        miner.join().unwrap();

        let (chain, _) = ledger.get_chain();
        let sealed: usize = chain.iter().map(|b| b.transactions.len()).sum();
        assert_eq!(sealed + ledger.pending_transactions().len(), 100);
    }
}
