//! Proof-of-Work: find `p` such that `sha256("{last_proof}{p}")` starts with
//! [`PROOF_PREFIX`]. Every function here is pure and holds no state.

use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::thread;

use sha2::{Digest, Sha256};

use super::PROOF_PREFIX;

/// Hex digest of the decimal concatenation `{last_proof}{proof}`.
pub fn proof_digest(last_proof: u64, proof: u64) -> String {
    let guess = format!("{last_proof}{proof}");
    hex::encode(Sha256::digest(guess.as_bytes()))
}

/// Does `proof` satisfy the difficulty predicate against `last_proof`?
pub fn verify(last_proof: u64, proof: u64) -> bool {
    proof_digest(last_proof, proof).starts_with(PROOF_PREFIX)
}

/// Smallest valid proof for `last_proof`, counting up from 0. Unbounded.
pub fn solve(last_proof: u64) -> u64 {
    let mut proof = 0;
    while !verify(last_proof, proof) {
        proof += 1;
    }
    proof
}

/// Strided search over `workers` threads.
///
/// Worker `i` tries `i, i + workers, i + 2 * workers, ...` and stops once its
/// next candidate is not below the best proof found so far, so the result is
/// the same proof [`solve`] returns. The `stop` flag is polled between
/// candidates; `None` means the search was abandoned before a proof was found.
pub fn solve_parallel(last_proof: u64, workers: usize, stop: &AtomicBool) -> Option<u64> {
    let stride = workers.max(1) as u64;
    let best = AtomicU64::new(u64::MAX);

    thread::scope(|s| {
        for offset in 0..stride {
            let best = &best;
            s.spawn(move || {
                let mut candidate = offset;
                while candidate < best.load(Ordering::Acquire) {
                    if stop.load(Ordering::Relaxed) {
                        return;
                    }
                    if verify(last_proof, candidate) {
                        best.fetch_min(candidate, Ordering::AcqRel);
                        return;
                    }
                    candidate += stride;
                }
            });
        }
    });

    match best.into_inner() {
        u64::MAX => None,
        proof => Some(proof),
    }
}
