use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use actix_web::{HttpResponse, Responder, get, rt, web};
use log::{error, info, warn};

use super::models::{AppState, ErrorResponse, MineResponse};
use crate::blockchain::REWARD_SENDER;
use crate::transaction::Transaction;

/// Solve and seal the next block, crediting this node's reward in the
/// same step.
///
/// The search runs on the blocking pool. With a configured timeout the
/// search is abandoned on expiry and the request answers 503; the ledger,
/// pending pool included, is left as it was.
#[get("/mine/")]
pub async fn mine_block(state: web::Data<AppState>) -> impl Responder {
    let reward = Transaction::new(REWARD_SENDER, state.node_id.as_str(), state.mining_reward);
    let stop = Arc::new(AtomicBool::new(false));
    let timer = match state.mine_timeout {
        Some(timeout) if timeout.is_zero() => {
            stop.store(true, Ordering::Relaxed);
            None
        }
        Some(timeout) => {
            let stop = Arc::clone(&stop);
            Some(rt::spawn(async move {
                rt::time::sleep(timeout).await;
                stop.store(true, Ordering::Relaxed);
            }))
        }
        None => None,
    };

    let worker = state.clone();
    let worker_stop = Arc::clone(&stop);
    let mined = web::block(move || worker.ledger.mine_with_reward(Some(reward), &worker_stop)).await;

    if let Some(timer) = timer {
        timer.abort();
    }

    match mined {
        Ok(Some(block)) => {
            info!("MINER - forged block #{} (proof={})", block.index, block.proof);
            HttpResponse::Ok().json(MineResponse {
                message: "New Block Forged".into(),
                index: block.index,
                transactions: block.transactions,
                proof: block.proof,
                previous_hash: block.previous_hash,
                timestamp: block.timestamp,
            })
        }
        Ok(None) => {
            warn!("MINER - proof search abandoned after timeout");
            HttpResponse::ServiceUnavailable().json(ErrorResponse {
                message: "mining abandoned before a proof was found".into(),
                missing: Vec::new(),
            })
        }
        Err(e) => {
            error!("MINER - blocking task failed: {e}");
            HttpResponse::InternalServerError().finish()
        }
    }
}
