pub mod block;
pub mod ledger;
pub mod pow;

pub use block::Block;
pub use ledger::Ledger;

/// Proof stored in the genesis block.
pub const GENESIS_PROOF: u64 = 100;

/// Sentinel `previous_hash` of the genesis block (not a digest).
pub const GENESIS_PREVIOUS_HASH: &str = "1";

/// A proof is valid when the hex digest of `{last_proof}{proof}` starts with this.
pub const PROOF_PREFIX: &str = "0000";

/// Sender used for mining reward transactions ("the network").
pub const REWARD_SENDER: &str = "0";

/// Default amount credited to the miner per block.
pub const DEFAULT_REWARD: u64 = 1;
