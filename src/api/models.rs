use serde::{Deserialize, Serialize};
use std::time::Duration;

use crate::blockchain::{Block, Ledger};
use crate::config::Config;
use crate::transaction::Transaction;

/// Shared application state: the injected ledger plus the node's mining settings.
pub struct AppState {
    pub ledger: Ledger,
    pub node_id: String,
    pub mining_reward: u64,
    pub mine_timeout: Option<Duration>,
}

impl AppState {
    pub fn new(ledger: Ledger, config: &Config) -> Self {
        Self {
            ledger,
            node_id: config.node_id.clone(),
            mining_reward: config.mining_reward,
            mine_timeout: config.mine_timeout,
        }
    }
}

#[derive(Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    pub node_id: String,
    pub length: usize,
    pub pending: usize,
}

/* ---------- Chain API Models ---------- */

#[derive(Serialize)]
pub struct ChainResponse {
    pub chain: Vec<Block>,
    pub length: usize,
}

#[derive(Serialize)]
pub struct ValidateResponse {
    pub valid: bool,
    pub length: usize,
}

/* ---------- Mining API Models ---------- */

#[derive(Serialize)]
pub struct MineResponse {
    pub message: String,
    pub index: u64,
    pub transactions: Vec<Transaction>,
    pub proof: u64,
    pub previous_hash: String,
    pub timestamp: f64,
}

/* ---------- TX API Models ---------- */

/// Fields are optional so absent ones can be reported by name.
#[derive(Deserialize)]
pub struct NewTxRequest {
    pub sender: Option<String>,
    pub recipient: Option<String>,
    pub amount: Option<u64>,
}

#[derive(Serialize)]
pub struct NewTxResponse {
    pub message: String,
    pub index: u64,
}

#[derive(Serialize)]
pub struct PendingResponse {
    pub size: usize,
    pub transactions: Vec<Transaction>,
}

#[derive(Serialize)]
pub struct ErrorResponse {
    pub message: String,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub missing: Vec<&'static str>,
}
