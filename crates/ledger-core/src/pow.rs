use rayon::prelude::*;
use std::sync::atomic::{AtomicBool, Ordering};
use tracing::{debug, info};

use crate::block::{count_leading_zero_digits, Block};
use crate::constants::CANCEL_CHECK_INTERVAL;
use crate::error::{LedgerError, Result};

/// Mine `candidate` by incrementing the nonce from 0 until the hash has at least
/// `difficulty` leading zero hex digits.
///
/// The search gives up with [`LedgerError::MiningSuperseded`] once `superseded`
/// is raised. The flag is polled every [`CANCEL_CHECK_INTERVAL`] nonces. The
/// returned block is not committed anywhere.
pub fn mine(mut candidate: Block, difficulty: u32, superseded: &AtomicBool) -> Result<Block> {
    candidate.difficulty = difficulty;
    candidate.nonce = 0;
    loop {
        if candidate.nonce % CANCEL_CHECK_INTERVAL == 0 && superseded.load(Ordering::Relaxed) {
            debug!(
                index = candidate.index,
                nonce = candidate.nonce,
                "mining superseded"
            );
            return Err(LedgerError::MiningSuperseded);
        }
        candidate.seal();
        if count_leading_zero_digits(&candidate.hash) >= difficulty {
            info!(
                index = candidate.index,
                nonce = candidate.nonce,
                hash = %candidate.hash,
                "mined block"
            );
            return Ok(candidate);
        }
        candidate.nonce = candidate.nonce.wrapping_add(1);
    }
}

/// Same contract as [`mine`], with the nonce space split across the rayon pool.
/// The winning nonce is whichever thread finds one first, not the smallest.
pub fn mine_parallel(candidate: Block, difficulty: u32, superseded: &AtomicBool) -> Result<Block> {
    let mut template = candidate;
    template.difficulty = difficulty;

    let found = (0u64..u64::MAX).into_par_iter().find_any(|nonce| {
        if superseded.load(Ordering::Relaxed) {
            return true;
        }
        let mut attempt = template.clone();
        attempt.nonce = *nonce;
        count_leading_zero_digits(&attempt.compute_hash()) >= difficulty
    });

    let nonce = match found {
        Some(nonce) => nonce,
        None => return Err(LedgerError::Internal("nonce space exhausted".into())),
    };
    template.nonce = nonce;
    template.seal();

    if count_leading_zero_digits(&template.hash) < difficulty {
        debug!(index = template.index, "parallel mining superseded");
        return Err(LedgerError::MiningSuperseded);
    }
    info!(
        index = template.index,
        nonce,
        hash = %template.hash,
        "mined block"
    );
    Ok(template)
}
