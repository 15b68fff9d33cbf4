use crate::utils::sha256_hex;
use log::debug;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::thread;

/// Hex suffix a puzzle digest must end with (four zero nibbles)
pub const REQUIRED_SUFFIX: &str = "0000";

const PROGRESS_INTERVAL: u64 = 100_000;

/// Hashcash-style puzzle: find `proof` such that
/// `sha256("{last_proof}{proof}")` ends in [`REQUIRED_SUFFIX`].
pub struct ProofOfWork;

impl ProofOfWork {
    /// The puzzle predicate, re-checked during chain validation
    pub fn is_valid(last_proof: u64, proof: u64) -> bool {
        let guess = format!("{last_proof}{proof}");
        sha256_hex(guess.as_bytes()).ends_with(REQUIRED_SUFFIX)
    }

    /// Smallest valid proof for `last_proof`. Unbounded.
    pub fn solve(last_proof: u64) -> u64 {
        let never = AtomicBool::new(false);
        // Only cancellation or exhausting u64 ends the search without a hit
        Self::solve_until(last_proof, &never).unwrap_or(u64::MAX)
    }

    /// Sequential search that gives up once `cancel` is set.
    pub fn solve_until(last_proof: u64, cancel: &AtomicBool) -> Option<u64> {
        let mut proof = 0u64;
        loop {
            if cancel.load(Ordering::Relaxed) {
                debug!("Proof search for {last_proof} cancelled at candidate {proof}");
                return None;
            }
            if Self::is_valid(last_proof, proof) {
                debug!("Found proof {proof} for last proof {last_proof}");
                return Some(proof);
            }
            if proof > 0 && proof % PROGRESS_INTERVAL == 0 {
                debug!("Mining attempts for {last_proof}: {proof}");
            }
            proof = proof.checked_add(1)?;
        }
    }

    /// Same answer as [`ProofOfWork::solve`], searched on `workers` threads.
    ///
    /// Worker `i` tries `i, i + workers, i + 2 * workers, ...` and stops once
    /// its candidate passes the best proof found so far, so the smallest
    /// valid proof always wins.
    pub fn solve_parallel(last_proof: u64, workers: usize) -> u64 {
        let workers = workers.max(1) as u64;
        let best = AtomicU64::new(u64::MAX);

        thread::scope(|scope| {
            for start in 0..workers {
                let best = &best;
                scope.spawn(move || {
                    let mut proof = start;
                    while proof < best.load(Ordering::Acquire) {
                        if Self::is_valid(last_proof, proof) {
                            best.fetch_min(proof, Ordering::AcqRel);
                            return;
                        }
                        match proof.checked_add(workers) {
                            Some(next) => proof = next,
                            None => return,
                        }
                    }
                });
            }
        });

        best.into_inner()
    }
}
