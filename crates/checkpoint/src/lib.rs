//! Checks whether validators keep up with the latest checkpoint recorded by a
//! Merkle tree hook.
//!
//! The on-chain side is read through [`contracts::MerkleTreeHook`] and
//! [`contracts::ValidatorAnnounce`], the off-chain side through
//! [`storage::ValidatorFactory`] and [`storage::CheckpointValidator`]. The
//! helpers in [`lookup`] never fail: errors are logged and turned into `None`.

pub mod contracts;
pub mod errors;
pub mod lag;
pub mod lookup;
pub mod storage;

pub use lag::is_signing_latest_checkpoint;
pub use lookup::{
    latest_merkle_tree_checkpoint_index, latest_validator_checkpoint, validator_storage_locations,
    ValidatorCheckpoint,
};
