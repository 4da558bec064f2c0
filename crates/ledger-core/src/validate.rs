use crate::block::{count_leading_zero_digits, Block};
use crate::error::ValidationError;

/// Hash recomputation, proof-of-work and transaction shape, without linkage.
fn check_self(block: &Block) -> Result<(), ValidationError> {
    let computed = block.compute_hash();
    if block.hash != computed {
        return Err(ValidationError::HashMismatch {
            stored: block.hash.clone(),
            computed,
        });
    }
    let zeros = count_leading_zero_digits(&block.hash);
    if zeros < block.difficulty {
        return Err(ValidationError::InsufficientWork {
            difficulty: block.difficulty,
            zeros,
        });
    }
    for tx in &block.transactions {
        if let Err(e) = tx.validate() {
            return Err(ValidationError::MalformedTransaction {
                index: block.index,
                reason: e.to_string(),
            });
        }
    }
    Ok(())
}

/// Check that `block` directly extends `predecessor` and carries its own proof.
pub fn check_block(block: &Block, predecessor: &Block) -> Result<(), ValidationError> {
    let expected = predecessor.index + 1;
    if block.index != expected {
        return Err(ValidationError::IndexGap {
            expected,
            found: block.index,
        });
    }
    if block.previous_hash != predecessor.hash {
        return Err(ValidationError::PreviousHashMismatch {
            expected: predecessor.hash.clone(),
            found: block.previous_hash.clone(),
        });
    }
    check_self(block)
}

pub fn is_valid_block(block: &Block, predecessor: &Block) -> bool {
    check_block(block, predecessor).is_ok()
}

/// Validate a whole chain. The genesis block is taken on trust apart from its
/// index and its own proof.
pub fn check_chain(chain: &[Block]) -> Result<(), ValidationError> {
    let genesis = chain.first().ok_or(ValidationError::EmptyChain)?;
    if genesis.index != 0 {
        return Err(ValidationError::IndexGap {
            expected: 0,
            found: genesis.index,
        });
    }
    check_self(genesis)?;
    chain
        .windows(2)
        .try_for_each(|pair| check_block(&pair[1], &pair[0]))
}

pub fn is_valid_chain(chain: &[Block]) -> bool {
    check_chain(chain).is_ok()
}
