/// Fraction of the on-chain index, in percent, a validator may trail or lead
/// by and still count as signing the latest checkpoint.
pub const MAX_LAG_PERCENT: u64 = 1;

/// Checks whether a validator's latest signed checkpoint is within
/// [`MAX_LAG_PERCENT`] of the latest checkpoint on-chain.
///
/// The difference must be strictly below the threshold, so with an on-chain
/// index of 0 only an exact match counts as current.
pub fn is_signing_latest_checkpoint(validator_index: u32, merkle_tree_index: u32) -> bool {
    let diff = u64::from(validator_index.abs_diff(merkle_tree_index));
    diff == 0 || diff * 100 < u64::from(merkle_tree_index) * MAX_LAG_PERCENT
}
